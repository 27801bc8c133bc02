use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// The opaque id pair Pool Math uses to address a shared pool log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolIdentity {
    user_id: String,
    pool_id: String,
}

impl PoolIdentity {
    pub fn new(user_id: impl Into<String>, pool_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let pool_id = pool_id.into();
        if user_id.trim().is_empty() || pool_id.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "user_id and pool_id are required".to_string(),
            ));
        }
        Ok(Self { user_id, pool_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    /// Stable id used to de-duplicate configured pools.
    pub fn unique_id(&self) -> String {
        format!("{}-{}", self.user_id, self.pool_id)
    }
}

impl fmt::Display for PoolIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.pool_id)
    }
}

/// Where the bounds of a resolved range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    Pool,
    Profile,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TargetRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub target: Option<f64>,
    #[serde(skip)]
    pub(crate) source: Option<TargetSource>,
}

impl TargetRange {
    pub const fn new(min: Option<f64>, max: Option<f64>, target: Option<f64>) -> Self {
        Self {
            min,
            max,
            target,
            source: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.target.is_none()
    }

    /// Both bounds, when the range is complete enough to judge a value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        Some((self.min?, self.max?))
    }

    /// In-range flag and deviation from the nearest bound, inclusive on both ends.
    pub fn check(&self, value: f64) -> Option<(bool, f64)> {
        let (min, max) = self.bounds()?;
        let deviation = if value < min {
            min - value
        } else if value > max {
            value - max
        } else {
            0.0
        };
        Some((min <= value && value <= max, deviation))
    }

    pub fn source(&self) -> Option<TargetSource> {
        self.source
    }
}

/// Tracking switches the user toggles in Pool Math for optional tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TrackingFlags {
    pub salt: bool,
    pub bor: bool,
    pub cc: bool,
    pub csi: bool,
}

/// The first pool of a share payload, reduced to what evaluation reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedPool {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub volume: Option<f64>,
    pub tracking: TrackingFlags,
    pub(crate) overview: Map<String, Value>,
    pub(crate) record: Map<String, Value>,
}

impl NormalizedPool {
    /// Latest reading for `key`; a non-numeric value reads as absent.
    pub fn reading(&self, key: &str) -> Option<f64> {
        self.overview.get(key)?.as_f64()
    }

    pub fn timestamp(&self, key: &str) -> Option<i64> {
        let ts = self.overview.get(&format!("{key}Ts"))?;
        ts.as_i64().or_else(|| ts.as_f64().map(|f| f as i64))
    }

    /// Pool-level number such as `phMin` or `saltTarget`.
    pub fn field(&self, name: &str) -> Option<f64> {
        self.record.get(name)?.as_f64()
    }

    pub fn overview_keys(&self) -> impl Iterator<Item = &str> {
        self.overview.keys().map(String::as_str)
    }
}

/// One evaluated measurement for a single poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub key: &'static str,
    pub value: f64,
    pub timestamp: Option<i64>,
    pub target: Option<TargetRange>,
    pub in_range: Option<bool>,
    pub deviation: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Measurement {
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp?, 0)
    }
}

/// Evaluation output in catalog order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Readings(pub(crate) Vec<Measurement>);

impl Readings {
    pub fn get(&self, key: &str) -> Option<&Measurement> {
        self.0.iter().find(|m| m.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|m| m.key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent measurement timestamp, if any reading carries one.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.0.iter().filter_map(|m| m.timestamp).max()
    }
}

impl<'a> IntoIterator for &'a Readings {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Events emitted when a measurement crosses its target range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    EnteredOutOfRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    ReturnedInRange {
        key: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Event {
    pub fn key(&self) -> &'static str {
        match self {
            Event::EnteredOutOfRange { key, .. } | Event::ReturnedInRange { key, .. } => key,
        }
    }
}

/// Everything published to the host after a successful poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub pool_name: String,
    pub volume: Option<f64>,
    pub last_updated: Option<i64>,
    pub measurements: Readings,
    pub transitions: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°F")]
    Fahrenheit,
    #[serde(rename = "°C")]
    Celsius,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Celsius => "°C",
        }
    }

    /// Pool Math reports water temperature in Fahrenheit.
    pub fn convert_fahrenheit(&self, f: f64) -> f64 {
        match self {
            TemperatureUnit::Fahrenheit => f,
            TemperatureUnit::Celsius => (f - 32.0) * 5.0 / 9.0,
        }
    }
}
