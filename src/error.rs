use std::fmt;

#[derive(Debug)]
pub enum Error {
    Timeout { url: String },
    Connection { url: String, source: reqwest::Error },
    Status { url: String, status: u16 },
    Decode { url: String, source: reqwest::Error },
    InvalidShareUrl(String),
    MissingPoolIds { url: String },
    MigrationRequired,
    InvalidConfig(String),
    Io(std::io::Error),
}

/// Coarse classification a host uses to decide availability and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Timeout,
    Connection,
    Unexpected,
}

impl ErrorKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Connection)
    }
}

impl Error {
    pub(crate) fn from_request(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
            }
        } else if e.is_decode() {
            Error::Decode {
                url: url.to_string(),
                source: e,
            }
        } else {
            Error::Connection {
                url: url.to_string(),
                source: e,
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Connection { .. } | Error::Status { .. } => ErrorKind::Connection,
            _ => ErrorKind::Unexpected,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout { url } => write!(f, "timeout accessing {url}"),
            Error::Connection { url, source } => {
                write!(f, "network error accessing {url}: {source}")
            }
            Error::Status { url, status } => write!(f, "failed with status {status} from {url}"),
            Error::Decode { url, source } => write!(f, "invalid JSON from {url}: {source}"),
            Error::InvalidShareUrl(url) => write!(f, "invalid Pool Math share URL: {url}"),
            Error::MissingPoolIds { url } => write!(f, "no user/pool id in response from {url}"),
            Error::MigrationRequired => {
                write!(f, "entry uses a share_id and must be migrated to user_id/pool_id")
            }
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } | Error::Decode { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
