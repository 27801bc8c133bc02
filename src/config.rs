//! Host-supplied configuration.
//!
//! Hosts persist an entry as two JSON objects, the original `data` captured at
//! setup and user-edited `options`. Options win over data, data wins over the
//! defaults here. Entries created by early releases only stored a `share_id`;
//! those must be migrated before a [`Config`] can be built.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{DEFAULT_TIMEOUT, ShareResolver};
use crate::monitor::DEFAULT_POOL_NAME;
use crate::targets::{DEFAULT_PROFILE, profile};
use crate::types::{PoolIdentity, TemperatureUnit};
use crate::{Error, Result};

pub const DEFAULT_POLL_MINUTES: u64 = 8;

/// One side (`data` or `options`) of a stored entry. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Poll interval in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<TemperatureUnit>,
}

impl EntrySettings {
    pub fn from_json(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidConfig(format!("unreadable entry: {e}")))
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn needs_migration(&self) -> bool {
        self.share_id.is_some() && (self.user_id.is_none() || self.pool_id.is_none())
    }

    /// `self` overlaid with every field `over` sets.
    pub fn overlay(&self, over: &EntrySettings) -> EntrySettings {
        EntrySettings {
            user_id: over.user_id.clone().or_else(|| self.user_id.clone()),
            pool_id: over.pool_id.clone().or_else(|| self.pool_id.clone()),
            share_id: over.share_id.clone().or_else(|| self.share_id.clone()),
            name: over.name.clone().or_else(|| self.name.clone()),
            target: over.target.clone().or_else(|| self.target.clone()),
            timeout: over.timeout.or(self.timeout),
            scan_interval: over.scan_interval.or(self.scan_interval),
            unit_of_measurement: over.unit_of_measurement.or(self.unit_of_measurement),
        }
    }

    /// Replace a legacy `share_id` with the ids behind it.
    ///
    /// `share_url` is what the user pasted into the repair form; without it the
    /// stored share id is resolved directly.
    pub async fn migrate(
        &self,
        resolver: &ShareResolver,
        share_url: Option<&str>,
    ) -> Result<EntrySettings> {
        let identity = match (share_url, self.share_id.as_deref()) {
            (Some(url), _) => resolver.resolve(url).await?,
            (None, Some(share_id)) => resolver.resolve_share_id(share_id).await?,
            (None, None) => {
                return Err(Error::InvalidConfig(
                    "nothing to migrate: no share id or share URL".to_string(),
                ));
            }
        };
        info!(pool = %identity, "migrated legacy share_id entry");

        Ok(EntrySettings {
            user_id: Some(identity.user_id().to_string()),
            pool_id: Some(identity.pool_id().to_string()),
            share_id: None,
            ..self.clone()
        })
    }
}

/// Fully resolved settings for one configured pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub identity: PoolIdentity,
    pub name: String,
    pub target_profile: String,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub temperature_unit: TemperatureUnit,
}

impl Config {
    pub fn new(identity: PoolIdentity) -> Self {
        Self {
            identity,
            name: DEFAULT_POOL_NAME.to_string(),
            target_profile: DEFAULT_PROFILE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_MINUTES * 60),
            temperature_unit: TemperatureUnit::default(),
        }
    }

    pub fn from_entry(data: &EntrySettings, options: &EntrySettings) -> Result<Self> {
        let merged = data.overlay(options);
        if merged.needs_migration() {
            return Err(Error::MigrationRequired);
        }

        let identity = PoolIdentity::new(
            merged.user_id.unwrap_or_default(),
            merged.pool_id.unwrap_or_default(),
        )?;

        let timeout = merged.timeout.unwrap_or(DEFAULT_TIMEOUT.as_secs_f64());
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "timeout must be positive, got {timeout}"
            )));
        }
        let timeout = Duration::try_from_secs_f64(timeout)
            .map_err(|e| Error::InvalidConfig(format!("timeout {timeout} out of range: {e}")))?;

        let minutes = merged.scan_interval.unwrap_or(DEFAULT_POLL_MINUTES);
        if minutes == 0 {
            return Err(Error::InvalidConfig(
                "scan_interval must be at least one minute".to_string(),
            ));
        }
        let poll_interval = minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| Error::InvalidConfig(format!("scan_interval {minutes} is too large")))?;

        let target_profile = merged.target.unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        if profile(&target_profile).is_none() {
            warn!(profile = %target_profile, "unknown target profile, only pool targets will apply");
        }

        Ok(Self {
            identity,
            name: merged
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_POOL_NAME.to_string()),
            target_profile,
            timeout,
            poll_interval,
            temperature_unit: merged.unit_of_measurement.unwrap_or_default(),
        })
    }

    /// Settings to persist as the entry's options.
    pub fn to_settings(&self) -> EntrySettings {
        EntrySettings {
            user_id: Some(self.identity.user_id().to_string()),
            pool_id: Some(self.identity.pool_id().to_string()),
            share_id: None,
            name: Some(self.name.clone()),
            target: Some(self.target_profile.clone()),
            timeout: Some(self.timeout.as_secs_f64()),
            scan_interval: Some(self.poll_interval.as_secs() / 60),
            unit_of_measurement: Some(self.temperature_unit),
        }
    }

    pub fn log_config(&self) {
        info!("Pool Math configuration:");
        info!("  pool          : {}", self.name);
        info!("  user_id       : {}", mask(self.identity.user_id()));
        info!("  pool_id       : {}", mask(self.identity.pool_id()));
        info!("  target        : {}", self.target_profile);
        info!("  timeout       : {:?}", self.timeout);
        info!("  poll interval : {:?}", self.poll_interval);
        info!("  temperature   : {}", self.temperature_unit.as_str());
    }
}

fn mask(id: &str) -> String {
    let shown: String = id.chars().take(2).collect();
    format!("{shown}****")
}
