use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::FetchPool;
use crate::evaluate::evaluate;
use crate::protocol::normalize;
use crate::targets::DEFAULT_PROFILE;
use crate::transitions::{RangeState, RangeTracker};
use crate::types::*;
use crate::Result;

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&PoolSnapshot) + Send + Sync>;

pub const DEFAULT_POOL_NAME: &str = "Pool";

/// Runs the poll cycle for a single pool.
///
/// The host calls [`PoolMonitor::poll`] on its own schedule, one call at a
/// time. Each pool needs its own monitor so range state is never shared.
pub struct PoolMonitor<F> {
    fetcher: F,
    profile: String,
    name: String,
    tracker: RangeTracker,
    snapshot: Option<PoolSnapshot>,
    last_payload: Option<Value>,
    last_error: Option<String>,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
}

impl<F: FetchPool> PoolMonitor<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            profile: DEFAULT_PROFILE.to_string(),
            name: DEFAULT_POOL_NAME.to_string(),
            tracker: RangeTracker::new(),
            snapshot: None,
            last_payload: None,
            last_error: None,
            event_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
        }
    }

    pub fn target_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Name used when the payload does not carry one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&PoolSnapshot) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Result of the last successful poll.
    pub fn snapshot(&self) -> Option<&PoolSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_payload(&self) -> Option<&Value> {
        self.last_payload.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_update_success(&self) -> bool {
        self.snapshot.is_some() && self.last_error.is_none()
    }

    pub fn range_state(&self, key: &str) -> RangeState {
        self.tracker.state(key)
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch, evaluate and publish one cycle.
    ///
    /// A failed fetch publishes nothing and leaves range state untouched.
    pub async fn poll(&mut self) -> Result<&PoolSnapshot> {
        let raw = match self.fetcher.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(kind = ?e.kind(), "error updating Pool Math data: {e}");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let snapshot = self.process(&raw);
        self.last_payload = Some(raw);
        self.last_error = None;

        for event in &snapshot.transitions {
            for cb in &self.event_callbacks {
                cb(event);
            }
        }
        for cb in &self.snapshot_callbacks {
            cb(&snapshot);
        }

        Ok(&*self.snapshot.insert(snapshot))
    }

    fn process(&mut self, raw: &Value) -> PoolSnapshot {
        let pool = normalize(raw);
        if pool.is_none() {
            debug!("payload did not contain a pool, publishing no measurements");
        }

        let measurements = evaluate(pool.as_ref(), &self.profile);
        let transitions = self.tracker.observe(&measurements);
        if !transitions.is_empty() {
            info!(count = transitions.len(), "range transitions detected");
        }

        let pool_name = pool
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| self.name.clone());

        PoolSnapshot {
            pool_name,
            volume: pool.as_ref().and_then(|p| p.volume),
            last_updated: measurements.latest_timestamp(),
            measurements,
            transitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    struct Scripted(VecDeque<crate::Result<Value>>);

    impl FetchPool for Scripted {
        fn fetch(&mut self) -> impl Future<Output = crate::Result<Value>> + Send {
            let next = self
                .0
                .pop_front()
                .unwrap_or_else(|| Err(Error::Timeout { url: "scripted".into() }));
            async move { next }
        }
    }

    fn payload(ph: f64) -> Value {
        json!({"pools": [{"pool": {
            "name": "Backyard",
            "volume": 20000,
            "overview": {"ph": ph, "phTs": 1704067200, "fc": 5.0, "fcTs": 1704070800}
        }}]})
    }

    #[tokio::test]
    async fn publishes_snapshot() {
        let mut monitor = PoolMonitor::new(Scripted(VecDeque::from([Ok(payload(7.4))])));
        let snap = monitor.poll().await.unwrap().clone();
        assert_eq!(snap.pool_name, "Backyard");
        assert_eq!(snap.volume, Some(20000.0));
        assert_eq!(snap.last_updated, Some(1704070800));
        assert!(snap.measurements.contains("ph"));
        assert!(snap.transitions.is_empty());
        assert!(monitor.last_update_success());
        assert_eq!(monitor.range_state("ph"), RangeState::InRange);
    }

    #[tokio::test]
    async fn failure_skips_cycle() {
        let script = VecDeque::from([
            Ok(payload(7.4)),
            Err(Error::Status { url: "u".into(), status: 500 }),
            Ok(payload(8.5)),
        ]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut monitor = PoolMonitor::new(Scripted(script))
            .on_event(move |e| sink.lock().unwrap().push(e.clone()));

        monitor.poll().await.unwrap();
        let err = monitor.poll().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Connection);
        assert!(!monitor.last_update_success());
        assert!(monitor.last_error().unwrap().contains("500"));
        assert_eq!(monitor.range_state("ph"), RangeState::InRange);
        assert!(monitor.snapshot().is_some());

        let snap = monitor.poll().await.unwrap();
        assert_eq!(snap.transitions.len(), 1);
        assert!(monitor.last_update_success());
        assert!(matches!(events.lock().unwrap().as_slice(), [Event::EnteredOutOfRange { key: "ph", .. }]));
    }

    #[tokio::test]
    async fn malformed_payload_is_an_empty_success() {
        let mut monitor = PoolMonitor::new(Scripted(VecDeque::from([Ok(json!({"pools": []}))])))
            .name("Fallback");
        let snap = monitor.poll().await.unwrap();
        assert_eq!(snap.pool_name, "Fallback");
        assert!(snap.measurements.is_empty());
        assert_eq!(snap.last_updated, None);
    }

    #[tokio::test]
    async fn snapshot_callback_sees_every_success() {
        let count = Arc::new(Mutex::new(0));
        let seen = count.clone();
        let mut monitor = PoolMonitor::new(Scripted(VecDeque::from([Ok(payload(7.4)), Ok(payload(7.5))])))
            .target_profile("tfp")
            .on_snapshot(move |_| *seen.lock().unwrap() += 1);
        monitor.poll().await.unwrap();
        monitor.poll().await.unwrap();
        assert!(monitor.poll().await.is_err());
        assert_eq!(*count.lock().unwrap(), 2);
        assert_eq!(monitor.profile(), "tfp");
    }
}
