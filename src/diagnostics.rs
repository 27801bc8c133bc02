use serde_json::{Map, Value, json};

use crate::client::FetchPool;
use crate::config::Config;
use crate::monitor::PoolMonitor;
use crate::types::PoolIdentity;

pub const REDACTED: &str = "**REDACTED**";

/// Keys whose values identify the user or the pool.
pub const SENSITIVE_KEYS: &[&str] = &[
    "user_id",
    "pool_id",
    "userId",
    "id",
    "email",
    "name",
    "configuration_url",
];

/// Copy of `value` with every matching key's value replaced, at any depth.
pub fn redact(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if keys.contains(&k.as_str()) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(v, keys)
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact(v, keys)).collect()),
        other => other.clone(),
    }
}

/// `text` with the pool's ids, raw or URL-encoded, replaced by [`REDACTED`].
///
/// Error messages embed the fetch URL, which carries both ids in its query.
pub fn scrub(text: &str, identity: &PoolIdentity) -> String {
    let mut out = text.to_string();
    for id in [identity.user_id(), identity.pool_id()] {
        let encoded = urlencoding::encode(id);
        if encoded != id {
            out = out.replace(&*encoded, REDACTED);
        }
        out = out.replace(id, REDACTED);
    }
    out
}

/// Support bundle for one pool, safe to paste into a public issue.
pub fn report<F: FetchPool>(config: &Config, monitor: &PoolMonitor<F>) -> Value {
    json!({
        "entry": {
            "unique_id": REDACTED,
            "settings": redact(&config.to_settings().to_json(), SENSITIVE_KEYS),
        },
        "monitor": {
            "last_update_success": monitor.last_update_success(),
            "last_error": monitor.last_error().map(|e| scrub(e, &config.identity)),
            "poll_interval_secs": config.poll_interval.as_secs(),
            "target_profile": monitor.profile(),
            "data": monitor.last_payload().map(|p| redact(p, SENSITIVE_KEYS)),
        },
    })
}
