//! Host-facing projections of a [`PoolSnapshot`].
//!
//! These carry no state of their own; rebuild them from each snapshot.
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::catalog::{DeviceClass, lookup};
use crate::config::Config;
use crate::protocol::configuration_url;
use crate::types::{Measurement, PoolSnapshot};

pub const ATTRIBUTION: &str = "Data from Pool Math (Trouble Free Pool)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub configuration_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub key: &'static str,
    pub name: String,
    pub value: f64,
    pub unit: &'static str,
    pub icon: &'static str,
    pub device_class: Option<DeviceClass>,
    pub attributes: Map<String, Value>,
}

/// Out-of-range indicator; `is_on` means the reading is a problem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemState {
    pub unique_id: String,
    pub key: &'static str,
    pub is_on: Option<bool>,
    pub attributes: Map<String, Value>,
}

pub fn device_info(config: &Config, snapshot: Option<&PoolSnapshot>) -> DeviceInfo {
    DeviceInfo {
        identifier: config.identity.pool_id().to_string(),
        name: snapshot
            .map(|s| s.pool_name.clone())
            .unwrap_or_else(|| config.name.clone()),
        manufacturer: "Trouble Free Pool",
        model: "Pool Math",
        configuration_url: configuration_url(&config.identity),
    }
}

fn sensor_state(config: &Config, m: &Measurement) -> Option<SensorState> {
    let info = lookup(m.key)?;
    let mut attributes = m.attributes.clone();
    attributes.insert("attribution".into(), json!(ATTRIBUTION));
    if let Some(ts) = m.timestamp {
        attributes.insert("last_updated".into(), json!(ts));
    }
    if let Some(target) = m.target {
        if let Some(t) = target.target {
            attributes.insert("target".into(), json!(t));
        }
        if let Some(min) = target.min {
            attributes.insert("target_min".into(), json!(min));
        }
        if let Some(max) = target.max {
            attributes.insert("target_max".into(), json!(max));
        }
        if let Some(source) = target.source() {
            attributes.insert("target_source".into(), json!(source));
        }
    }

    let (value, unit) = if info.device_class == Some(DeviceClass::Temperature) {
        let unit = config.temperature_unit;
        (unit.convert_fahrenheit(m.value), unit.as_str())
    } else {
        (m.value, info.unit.as_str())
    };

    Some(SensorState {
        unique_id: format!(
            "poolmath_{}_{}_{}",
            config.identity.user_id(),
            config.identity.pool_id(),
            m.key
        ),
        key: m.key,
        name: format!("{} {}", config.name, info.name),
        value,
        unit,
        icon: info.icon,
        device_class: info.device_class,
        attributes,
    })
}

pub fn sensor_states(config: &Config, snapshot: &PoolSnapshot) -> Vec<SensorState> {
    snapshot
        .measurements
        .iter()
        .filter_map(|m| sensor_state(config, m))
        .collect()
}

/// One problem indicator per chemistry reading that has any target at all.
pub fn problem_states(config: &Config, snapshot: &PoolSnapshot) -> Vec<ProblemState> {
    snapshot
        .measurements
        .iter()
        .filter(|m| lookup(m.key).is_some_and(|info| info.chemistry) && m.target.is_some())
        .map(|m| {
            let mut attributes = Map::new();
            attributes.insert("current_value".into(), json!(m.value));
            if let (Some((min, max)), Some(deviation)) =
                (m.target.and_then(|t| t.bounds()), m.deviation)
            {
                attributes.insert("target_min".into(), json!(min));
                attributes.insert("target_max".into(), json!(max));
                attributes.insert("deviation".into(), json!((deviation * 100.0).round() / 100.0));
            }
            ProblemState {
                unique_id: format!(
                    "poolmath_{}_{}_{}_problem",
                    config.identity.user_id(),
                    config.identity.pool_id(),
                    m.key
                ),
                key: m.key,
                is_on: m.in_range.map(|ok| !ok),
                attributes,
            }
        })
        .collect()
}
