pub mod catalog;
mod client;
pub mod config;
pub mod diagnostics;
pub mod entities;
mod error;
mod evaluate;
mod logger;
mod monitor;
mod protocol;
pub mod targets;
mod transitions;
mod types;

pub use client::{DEFAULT_TIMEOUT, FetchPool, PoolMathClient, PoolMathClientBuilder, ShareResolver};
pub use config::{Config, EntrySettings};
pub use error::{Error, ErrorKind, Result};
pub use evaluate::evaluate;
pub use logger::MessageLogMode;
pub use monitor::{DEFAULT_POOL_NAME, PoolMonitor};
pub use protocol::{
    DEFAULT_API_BASE, configuration_url, normalize, parse_pool_identity, parse_share_id, pool_url,
};
pub use targets::{DEFAULT_PROFILE, resolve_target_range};
pub use transitions::{RangeState, RangeTracker};
pub use types::*;
