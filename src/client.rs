use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    DEFAULT_API_BASE, parse_pool_identity, parse_share_id, pool_url, share_json_url,
};
use crate::types::PoolIdentity;
use crate::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Source of raw share payloads for one pool.
///
/// Implementations return the parsed JSON body untouched; shape checks
/// belong to [`crate::normalize`].
pub trait FetchPool {
    fn fetch(&mut self) -> impl Future<Output = Result<Value>> + Send;
}

/// GET `url` and decode the body, returning the response status with it.
async fn get_json(http: &reqwest::Client, url: &str, timeout: Duration) -> Result<(u16, Value)> {
    debug!(url = %url, ?timeout, "GET");
    let resp = http
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::from_request(url, e))?;

    let status = resp.status();
    debug!(url = %url, status = status.as_u16(), "GET returned");
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = resp
        .json::<Value>()
        .await
        .map_err(|e| Error::from_request(url, e))?;
    Ok((status.as_u16(), body))
}

pub struct PoolMathClientBuilder {
    identity: PoolIdentity,
    base_url: String,
    timeout: Duration,
    log_mode: Option<MessageLogMode>,
    log_path: Option<PathBuf>,
}

impl PoolMathClientBuilder {
    pub fn new(identity: PoolIdentity) -> Self {
        Self {
            identity,
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            log_mode: None,
            log_path: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<PathBuf>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<PoolMathClient> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, path)?),
            _ => None,
        };

        let url = pool_url(&self.base_url, &self.identity);
        info!(pool = %self.identity, url = %url, "Pool Math client configured");

        Ok(PoolMathClient {
            http,
            url,
            identity: self.identity,
            timeout: self.timeout,
            logger,
        })
    }
}

/// HTTP client for one shared Pool Math log.
pub struct PoolMathClient {
    http: reqwest::Client,
    url: String,
    identity: PoolIdentity,
    timeout: Duration,
    logger: Option<MessageLogger>,
}

impl PoolMathClient {
    pub fn builder(identity: PoolIdentity) -> PoolMathClientBuilder {
        PoolMathClientBuilder::new(identity)
    }

    pub fn identity(&self) -> &PoolIdentity {
        &self.identity
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the raw share payload using the configured timeout.
    pub async fn fetch_json(&mut self) -> Result<Value> {
        self.fetch_json_with_timeout(self.timeout).await
    }

    pub async fn fetch_json_with_timeout(&mut self, timeout: Duration) -> Result<Value> {
        if let Some(ref mut logger) = self.logger {
            logger.log_request(&self.url);
        }

        match get_json(&self.http, &self.url, timeout).await {
            Ok((status, body)) => {
                if let Some(ref mut logger) = self.logger {
                    logger.log_payload(status, &body);
                }
                Ok(body)
            }
            Err(e) => {
                if let Some(ref mut logger) = self.logger {
                    logger.log_failure(&self.url, &e.to_string());
                }
                Err(e)
            }
        }
    }
}

impl FetchPool for PoolMathClient {
    fn fetch(&mut self) -> impl Future<Output = Result<Value>> + Send {
        self.fetch_json()
    }
}

/// Turns a share link into the `(user_id, pool_id)` pair behind it.
#[derive(Clone)]
pub struct ShareResolver {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Default for ShareResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareResolver {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    /// Resolver against a custom API base (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve(&self, share_url: &str) -> Result<PoolIdentity> {
        let share_id = parse_share_id(share_url)
            .ok_or_else(|| Error::InvalidShareUrl(share_url.to_string()))?;
        self.resolve_share_id(&share_id).await
    }

    pub async fn resolve_share_id(&self, share_id: &str) -> Result<PoolIdentity> {
        let url = share_json_url(&self.base_url, share_id);
        let (_, body) = get_json(&self.http, &url, self.timeout).await?;
        match parse_pool_identity(&body) {
            Some(identity) => {
                debug!(share_id, pool = %identity, "resolved share link");
                Ok(identity)
            }
            None => Err(Error::MissingPoolIds { url }),
        }
    }
}
