use tracing::debug;

use crate::types::{NormalizedPool, TargetRange, TargetSource};

pub const DEFAULT_PROFILE: &str = "tfp";

/// A named table of recommended chemistry levels.
#[derive(Debug)]
pub struct TargetProfile {
    pub name: &'static str,
    pub label: &'static str,
    levels: &'static [(&'static str, TargetRange)],
}

impl TargetProfile {
    pub fn levels(&self, key: &str) -> Option<TargetRange> {
        self.levels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, range)| *range)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.levels.iter().map(|(k, _)| *k)
    }
}

pub static TFP: TargetProfile = TargetProfile {
    name: DEFAULT_PROFILE,
    label: "Trouble Free Pool",
    levels: &[
        ("cc", TargetRange::new(Some(0.0), Some(0.1), None)),
        ("ph", TargetRange::new(Some(7.2), Some(7.8), Some(7.4))),
        ("ta", TargetRange::new(Some(50.0), Some(90.0), None)),
        ("salt", TargetRange::new(Some(3000.0), Some(3200.0), Some(3100.0))),
    ],
};

static PROFILES: &[&TargetProfile] = &[&TFP];

pub fn profile(name: &str) -> Option<&'static TargetProfile> {
    PROFILES.iter().copied().find(|p| p.name == name)
}

pub fn profile_names() -> impl Iterator<Item = &'static str> {
    PROFILES.iter().map(|p| p.name)
}

/// Resolve the target range for `key`.
///
/// Pool-specific `{key}Min`, `{key}Max` and `{key}Target` fields win field by
/// field; gaps are filled from the named profile. An unknown profile behaves as
/// an empty one. Returns `None` when nothing was found at all.
pub fn resolve_target_range(
    key: &str,
    profile_name: &str,
    pool: Option<&NormalizedPool>,
) -> Option<TargetRange> {
    let known = profile(profile_name);
    if known.is_none() {
        debug!(profile = profile_name, key, "unknown target profile, using pool targets only");
    }
    resolve_with(key, known, pool)
}

pub(crate) fn resolve_with(
    key: &str,
    profile: Option<&TargetProfile>,
    pool: Option<&NormalizedPool>,
) -> Option<TargetRange> {
    let mut range = TargetRange::default();
    if let Some(pool) = pool {
        range.min = pool.field(&format!("{key}Min"));
        range.max = pool.field(&format!("{key}Max"));
        range.target = pool.field(&format!("{key}Target"));
    }
    let from_pool = !range.is_empty();

    let mut from_profile = false;
    if let Some(levels) = profile.and_then(|p| p.levels(key)) {
        for (slot, fallback) in [
            (&mut range.min, levels.min),
            (&mut range.max, levels.max),
            (&mut range.target, levels.target),
        ] {
            if slot.is_none() && fallback.is_some() {
                *slot = fallback;
                from_profile = true;
            }
        }
    }

    range.source = match (from_pool, from_profile) {
        (true, true) => Some(TargetSource::Mixed),
        (true, false) => Some(TargetSource::Pool),
        (false, true) => Some(TargetSource::Profile),
        (false, false) => return None,
    };
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::normalize;
    use serde_json::json;

    fn pool_with(fields: serde_json::Value) -> NormalizedPool {
        let mut pool = json!({"overview": {}});
        for (k, v) in fields.as_object().unwrap() {
            pool[k] = v.clone();
        }
        normalize(&json!({"pools": [{"pool": pool}]})).unwrap()
    }

    #[test]
    fn profile_only() {
        let range = resolve_target_range("ph", "tfp", None).unwrap();
        assert_eq!(range.min, Some(7.2));
        assert_eq!(range.max, Some(7.8));
        assert_eq!(range.target, Some(7.4));
        assert_eq!(range.source(), Some(TargetSource::Profile));
    }

    #[test]
    fn pool_override_wins_per_field() {
        let pool = pool_with(json!({"phMin": 7.0}));
        let range = resolve_target_range("ph", "tfp", Some(&pool)).unwrap();
        assert_eq!(range.min, Some(7.0));
        assert_eq!(range.max, Some(7.8));
        assert_eq!(range.target, Some(7.4));
        assert_eq!(range.source(), Some(TargetSource::Mixed));
    }

    #[test]
    fn zero_override_counts_as_present() {
        let pool = pool_with(json!({"ccMin": 0, "ccMax": 0.5}));
        let range = resolve_target_range("cc", "tfp", Some(&pool)).unwrap();
        assert_eq!(range.min, Some(0.0));
        assert_eq!(range.max, Some(0.5));
        assert_eq!(range.source(), Some(TargetSource::Pool));
    }

    #[test]
    fn no_target_anywhere_is_none() {
        let pool = pool_with(json!({}));
        assert!(resolve_target_range("fc", "tfp", Some(&pool)).is_none());
        assert!(resolve_target_range("fc", "tfp", None).is_none());
    }

    #[test]
    fn unknown_profile_keeps_pool_overrides() {
        let pool = pool_with(json!({"fcMin": 3.0, "fcMax": 7.0, "fcTarget": 5.0}));
        let range = resolve_target_range("fc", "bioguard", Some(&pool)).unwrap();
        assert_eq!(range.bounds(), Some((3.0, 7.0)));
        assert_eq!(range.target, Some(5.0));
        assert!(resolve_target_range("ph", "bioguard", Some(&pool)).is_none());
    }

    #[test]
    fn non_numeric_override_is_ignored() {
        let pool = pool_with(json!({"phMin": "low"}));
        let range = resolve_target_range("ph", "tfp", Some(&pool)).unwrap();
        assert_eq!(range.min, Some(7.2));
        assert_eq!(range.source(), Some(TargetSource::Profile));
    }

    #[test]
    fn tfp_is_registered() {
        assert!(profile("tfp").is_some());
        assert!(profile("nope").is_none());
        assert_eq!(profile_names().collect::<Vec<_>>(), vec!["tfp"]);
        assert!(TFP.keys().any(|k| k == "salt"));
        assert!(TFP.levels("fc").is_none());
    }
}
