use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::warn;

/// How fetched payloads are written to the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    /// Every payload in full.
    Full,
    /// First payload in full, then only changed leaf paths.
    Diffed,
}

/// NDJSON capture of Pool Math traffic for support requests.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: None,
        })
    }

    pub fn log_request(&mut self, url: &str) {
        self.write_line(&json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": "GET",
            "url": url,
        }));
    }

    pub fn log_failure(&mut self, url: &str, error: &str) {
        self.write_line(&json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "err",
            "url": url,
            "error": error,
        }));
    }

    pub fn log_payload(&mut self, status: u16, body: &Value) {
        let mut entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "resp",
            "status": status,
        });

        match (self.mode, self.previous.as_ref()) {
            (MessageLogMode::Full, _) => {
                entry["body"] = body.clone();
            }
            (MessageLogMode::Diffed, None) => {
                entry["full"] = Value::Bool(true);
                entry["body"] = body.clone();
            }
            (MessageLogMode::Diffed, Some(previous)) => {
                let mut changes = Vec::new();
                changed_paths(previous, body, "", &mut changes);
                entry["changes"] = Value::Array(changes);
            }
        }
        if self.mode == MessageLogMode::Diffed {
            self.previous = Some(body.clone());
        }
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write message log entry: {e}");
        }
    }
}

/// Collect `{path, old, new}` for every leaf that differs between two payloads.
/// Arrays are compared by index so `pools.0.pool.overview.fc` style paths stay stable.
fn changed_paths(previous: &Value, current: &Value, prefix: &str, out: &mut Vec<Value>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match (previous, current) {
        (Value::Object(prev), Value::Object(curr)) => {
            for (key, value) in curr {
                let blank = blank_like(value);
                changed_paths(prev.get(key).unwrap_or(&blank), value, &join(key), out);
            }
            for (key, value) in prev {
                if !curr.contains_key(key) {
                    out.push(json!({"path": join(key), "old": value, "new": Value::Null}));
                }
            }
        }
        (Value::Array(prev), Value::Array(curr)) => {
            for (i, value) in curr.iter().enumerate() {
                let blank = blank_like(value);
                changed_paths(prev.get(i).unwrap_or(&blank), value, &join(&i.to_string()), out);
            }
            for (i, value) in prev.iter().enumerate().skip(curr.len()) {
                out.push(json!({"path": join(&i.to_string()), "old": value, "new": Value::Null}));
            }
        }
        (old, new) if old != new => {
            out.push(json!({"path": prefix, "old": old, "new": new}));
        }
        _ => {}
    }
}

/// Stand-in for a value that did not exist before, so new containers diff down to leaves.
fn blank_like(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        Value::Array(_) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}
