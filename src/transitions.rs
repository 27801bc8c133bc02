use std::collections::HashMap;

use tracing::debug;

use crate::types::{Event, Readings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeState {
    #[default]
    Unknown,
    InRange,
    OutOfRange,
}

/// Remembers the last known in-range status per measurement and reports flips.
///
/// One tracker per pool. The first observation of a key is silent, and a
/// cycle without a complete range leaves the stored status alone.
#[derive(Debug, Default)]
pub struct RangeTracker {
    states: HashMap<&'static str, bool>,
}

impl RangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &str) -> RangeState {
        match self.states.get(key) {
            Some(true) => RangeState::InRange,
            Some(false) => RangeState::OutOfRange,
            None => RangeState::Unknown,
        }
    }

    pub fn observe(&mut self, readings: &Readings) -> Vec<Event> {
        let mut events = Vec::new();
        for m in readings {
            let (Some(in_range), Some((min, max))) =
                (m.in_range, m.target.and_then(|t| t.bounds()))
            else {
                continue;
            };

            let previous = self.states.insert(m.key, in_range);
            let event = match (previous, in_range) {
                (Some(true), false) => Event::EnteredOutOfRange {
                    key: m.key,
                    value: m.value,
                    min,
                    max,
                },
                (Some(false), true) => Event::ReturnedInRange {
                    key: m.key,
                    value: m.value,
                    min,
                    max,
                },
                _ => continue,
            };
            debug!(key = m.key, value = m.value, in_range, "range transition");
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Measurement, TargetRange};
    use serde_json::Map;

    fn ph(value: f64, range: Option<(f64, f64)>) -> Readings {
        let target = range.map(|(lo, hi)| TargetRange::new(Some(lo), Some(hi), None));
        let check = target.and_then(|t| t.check(value));
        Readings(vec![Measurement {
            key: "ph",
            value,
            timestamp: None,
            target,
            in_range: check.map(|c| c.0),
            deviation: check.map(|c| c.1),
            attributes: Map::new(),
        }])
    }

    #[test]
    fn first_observation_is_silent() {
        let mut tracker = RangeTracker::new();
        assert_eq!(tracker.state("ph"), RangeState::Unknown);
        assert!(tracker.observe(&ph(9.0, Some((7.2, 7.8)))).is_empty());
        assert_eq!(tracker.state("ph"), RangeState::OutOfRange);
    }

    #[test]
    fn emits_only_on_flips() {
        let mut tracker = RangeTracker::new();
        let values = [7.4, 7.5, 8.2, 8.4, 7.6];
        let events: Vec<(usize, Event)> = values
            .iter()
            .enumerate()
            .flat_map(|(i, v)| {
                tracker
                    .observe(&ph(*v, Some((7.2, 7.8))))
                    .into_iter()
                    .map(move |e| (i, e))
            })
            .collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 2);
        assert!(matches!(
            events[0].1,
            Event::EnteredOutOfRange { key: "ph", value, min, max }
                if value == 8.2 && min == 7.2 && max == 7.8
        ));
        assert_eq!(events[1].0, 4);
        assert!(matches!(events[1].1, Event::ReturnedInRange { key: "ph", .. }));
    }

    #[test]
    fn undefined_cycle_keeps_previous_state() {
        let mut tracker = RangeTracker::new();
        tracker.observe(&ph(7.4, Some((7.2, 7.8))));
        assert!(tracker.observe(&ph(9.0, None)).is_empty());
        assert_eq!(tracker.state("ph"), RangeState::InRange);

        let events = tracker.observe(&ph(9.0, Some((7.2, 7.8))));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key(), "ph");
        assert!(matches!(events[0], Event::EnteredOutOfRange { .. }));
    }

    #[test]
    fn missing_key_keeps_previous_state() {
        let mut tracker = RangeTracker::new();
        tracker.observe(&ph(8.5, Some((7.2, 7.8))));
        tracker.observe(&Readings::default());
        let events = tracker.observe(&ph(7.5, Some((7.2, 7.8))));
        assert!(matches!(events.as_slice(), [Event::ReturnedInRange { .. }]));
    }
}
