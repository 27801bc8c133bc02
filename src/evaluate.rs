use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::catalog::{MEASUREMENTS, TOTAL_CHLORINE};
use crate::targets::{profile, resolve_with};
use crate::types::{Measurement, NormalizedPool, Readings};

/// Evaluate every catalog measurement present in `pool` against its targets.
///
/// Absent or non-numeric readings are omitted, as are conditional readings
/// whose tracking flag is off. `tc` is added whenever both `fc` and `cc`
/// have readings.
pub fn evaluate(pool: Option<&NormalizedPool>, profile_name: &str) -> Readings {
    let Some(pool) = pool else {
        return Readings::default();
    };

    let target_profile = profile(profile_name);
    if target_profile.is_none() {
        warn!(profile = profile_name, "unknown target profile, using pool targets only");
    }

    let mut out = Vec::new();
    for info in MEASUREMENTS {
        let Some(value) = pool.reading(info.key) else {
            continue;
        };
        if let Some(flag) = info.tracked_by
            && !flag.is_enabled(&pool.tracking)
        {
            debug!(key = info.key, flag = flag.field_name(), "tracking disabled, skipping");
            continue;
        }

        let target = resolve_with(info.key, target_profile, Some(pool));
        let check = target.and_then(|t| t.check(value));
        out.push(Measurement {
            key: info.key,
            value,
            timestamp: pool.timestamp(info.key),
            target,
            in_range: check.map(|(ok, _)| ok),
            deviation: check.map(|(_, d)| d),
            attributes: Map::new(),
        });
    }

    if let (Some(fc), Some(cc)) = (pool.reading("fc"), pool.reading("cc")) {
        let mut attributes = Map::new();
        attributes.insert("fc".to_string(), json!(fc));
        attributes.insert("cc".to_string(), json!(cc));
        attributes.insert("calculated".to_string(), Value::Bool(true));
        out.push(Measurement {
            key: TOTAL_CHLORINE.key,
            value: fc + cc,
            timestamp: None,
            target: None,
            in_range: None,
            deviation: None,
            attributes,
        });
    }

    Readings(out)
}
