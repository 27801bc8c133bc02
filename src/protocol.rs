use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{NormalizedPool, PoolIdentity, TrackingFlags};

pub const DEFAULT_API_BASE: &str = "https://api.poolmathapp.com";

static SHARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:api\.poolmathapp\.com|(?:www\.)?troublefreepool\.com)/(?:share/|mypool/)([a-zA-Z0-9]+)",
    )
    .expect("share URL pattern is valid")
});

pub fn pool_url(base: &str, identity: &PoolIdentity) -> String {
    format!(
        "{}/share/pool?userId={}&poolId={}",
        base.trim_end_matches('/'),
        urlencoding::encode(identity.user_id()),
        urlencoding::encode(identity.pool_id()),
    )
}

pub fn share_json_url(base: &str, share_id: &str) -> String {
    format!("{}/share/{share_id}.json", base.trim_end_matches('/'))
}

/// Web page for the pool on troublefreepool.com.
pub fn configuration_url(identity: &PoolIdentity) -> String {
    format!(
        "https://www.troublefreepool.com/mypool/{}/{}",
        identity.user_id(),
        identity.pool_id()
    )
}

/// Extract the share id from a Pool Math / Trouble Free Pool share link.
pub fn parse_share_id(share_url: &str) -> Option<String> {
    SHARE_URL
        .captures(share_url.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Null) | None => false,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reduce a share payload to its first pool.
///
/// Returns `None` for anything that does not look like
/// `{"pools": [{"pool": {...}}]}`; never panics on odd shapes.
pub fn normalize(raw: &Value) -> Option<NormalizedPool> {
    let pools = match raw.get("pools") {
        Some(Value::Array(pools)) if !pools.is_empty() => pools,
        Some(Value::Array(_)) => {
            debug!("payload has an empty pools list");
            return None;
        }
        _ => {
            debug!("payload has no pools list");
            return None;
        }
    };
    let record = match pools[0].get("pool") {
        Some(Value::Object(record)) => record,
        _ => {
            debug!("first pools entry has no pool object");
            return None;
        }
    };

    let overview = match record.get("overview") {
        Some(Value::Object(overview)) => overview.clone(),
        _ => Map::new(),
    };
    let mut rest = record.clone();
    rest.remove("overview");

    Some(NormalizedPool {
        id: text(record.get("id")),
        user_id: text(record.get("userId")),
        name: text(record.get("name")),
        volume: record.get("volume").and_then(Value::as_f64),
        tracking: TrackingFlags {
            salt: truthy(record.get("trackSalt")),
            bor: truthy(record.get("trackBor")),
            cc: truthy(record.get("trackCC")),
            csi: truthy(record.get("trackCSI")),
        },
        overview,
        record: rest,
    })
}

/// The `(userId, id)` pair of the first pool, as returned by the share endpoint.
pub fn parse_pool_identity(raw: &Value) -> Option<PoolIdentity> {
    let pool = normalize(raw)?;
    PoolIdentity::new(pool.user_id?, pool.id?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_rejects_bad_shapes() {
        assert!(normalize(&Value::Null).is_none());
        assert!(normalize(&json!({})).is_none());
        assert!(normalize(&json!({"other": "data"})).is_none());
        assert!(normalize(&json!({"pools": []})).is_none());
        assert!(normalize(&json!({"pools": {"pool": {}}})).is_none());
        assert!(normalize(&json!({"pools": [null]})).is_none());
        assert!(normalize(&json!({"pools": ["string"]})).is_none());
        assert!(normalize(&json!({"pools": [{}]})).is_none());
        assert!(normalize(&json!({"pools": [{"pool": 5}]})).is_none());
    }

    #[test]
    fn normalize_empty_pool_has_empty_overview() {
        let pool = normalize(&json!({"pools": [{"pool": {}}]})).unwrap();
        assert_eq!(pool.overview_keys().count(), 0);
        assert_eq!(pool.tracking, TrackingFlags::default());
        assert!(pool.name.is_none());
    }

    #[test]
    fn normalize_reads_fields_and_flags() {
        let raw = json!({"pools": [{"pool": {
            "id": "p1", "userId": "u1", "name": "Backyard", "volume": 15000,
            "trackSalt": true, "trackBor": 0, "trackCC": 1, "trackCSI": null,
            "phMin": 7.1,
            "overview": {"fc": 5.0, "fcTs": 1704067200, "ph": "bad"}
        }}]});
        let pool = normalize(&raw).unwrap();
        assert_eq!(pool.id.as_deref(), Some("p1"));
        assert_eq!(pool.user_id.as_deref(), Some("u1"));
        assert_eq!(pool.name.as_deref(), Some("Backyard"));
        assert_eq!(pool.volume, Some(15000.0));
        assert!(pool.tracking.salt);
        assert!(!pool.tracking.bor);
        assert!(pool.tracking.cc);
        assert!(!pool.tracking.csi);
        assert_eq!(pool.reading("fc"), Some(5.0));
        assert_eq!(pool.timestamp("fc"), Some(1704067200));
        assert_eq!(pool.reading("ph"), None);
        assert_eq!(pool.field("phMin"), Some(7.1));
        assert_eq!(pool.field("overview"), None);
    }

    #[test]
    fn normalize_ignores_non_object_overview() {
        let pool = normalize(&json!({"pools": [{"pool": {"overview": [1, 2]}}]})).unwrap();
        assert_eq!(pool.overview_keys().count(), 0);
    }

    #[test]
    fn normalize_does_not_touch_input() {
        let raw = json!({"pools": [{"pool": {"overview": {"fc": 1.0}}}]});
        let before = raw.clone();
        let _ = normalize(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn share_ids() {
        assert_eq!(
            parse_share_id("https://api.poolmathapp.com/share/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            parse_share_id("https://www.troublefreepool.com/mypool/abc123").as_deref(),
            Some("abc123")
        );
        assert_eq!(
            parse_share_id("https://troublefreepool.com/share/XyZ9?x=1").as_deref(),
            Some("XyZ9")
        );
        assert!(parse_share_id("https://example.com/invalid").is_none());
        assert!(parse_share_id("").is_none());
    }

    #[test]
    fn urls() {
        let id = PoolIdentity::new("user 1", "pool").unwrap();
        assert_eq!(
            pool_url("https://api.poolmathapp.com/", &id),
            "https://api.poolmathapp.com/share/pool?userId=user%201&poolId=pool"
        );
        assert_eq!(
            share_json_url(DEFAULT_API_BASE, "abc"),
            "https://api.poolmathapp.com/share/abc.json"
        );
        let id = PoolIdentity::new("u", "p").unwrap();
        assert_eq!(configuration_url(&id), "https://www.troublefreepool.com/mypool/u/p");
    }

    #[test]
    fn identity_from_share_payload() {
        let raw = json!({"pools": [{"pool": {"id": "p", "userId": "u"}}]});
        let id = parse_pool_identity(&raw).unwrap();
        assert_eq!(id.user_id(), "u");
        assert_eq!(id.pool_id(), "p");
        assert!(parse_pool_identity(&json!({"pools": [{"pool": {}}]})).is_none());
    }
}
