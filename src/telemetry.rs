use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::board::Readings;
use crate::channel::{ChannelId, Mode, Power};

/// One periodic status report. Built, serialized and dropped each cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub uptime_secs: u64,
    pub channels: BTreeMap<ChannelId, ChannelReport>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub readings: Readings,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelReport {
    pub state: Power,
    pub mode: Mode,
}

impl TelemetrySnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Non-blocking interval check for the cooperative loop.
///
/// `due` fires at most once per `interval`: the next deadline is always
/// measured from the moment the previous report actually went out, so a late
/// loop iteration delays the schedule instead of producing a burst.
#[derive(Debug, Clone)]
pub struct TelemetryTimer {
    interval: Duration,
    last: Instant,
}

impl TelemetryTimer {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last: start,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.last + self.interval
    }

    /// Returns true and restarts the interval when `now` has reached the deadline.
    pub fn due(&mut self, now: Instant) -> bool {
        if now < self.deadline() {
            return false;
        }
        self.last = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_json_shape() {
        let mut channels = BTreeMap::new();
        channels.insert(
            ChannelId::Light,
            ChannelReport {
                state: Power::On,
                mode: Mode::Manual,
            },
        );
        channels.insert(
            ChannelId::Fan,
            ChannelReport {
                state: Power::Off,
                mode: Mode::Auto,
            },
        );
        let snapshot = TelemetrySnapshot {
            uptime_secs: 42,
            channels,
            readings: Readings::new(),
        };

        let value: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["uptime_secs"], 42);
        assert_eq!(value["channels"]["light"]["state"], "ON");
        assert_eq!(value["channels"]["fan"]["mode"], "AUTO");
        assert!(value.get("readings").is_none());
    }

    #[test]
    fn snapshot_includes_readings_when_present() {
        let mut readings = Readings::new();
        readings.insert("temperature_c".to_string(), 21.5);
        let snapshot = TelemetrySnapshot {
            uptime_secs: 0,
            channels: BTreeMap::new(),
            readings,
        };

        let value: serde_json::Value =
            serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["readings"]["temperature_c"], 21.5);
    }

    #[test]
    fn timer_waits_a_full_interval() {
        let start = Instant::now();
        let mut timer = TelemetryTimer::new(Duration::from_secs(30), start);

        assert!(!timer.due(start));
        assert!(!timer.due(start + Duration::from_secs(29)));
        assert!(timer.due(start + Duration::from_secs(30)));
        assert!(!timer.due(start + Duration::from_secs(31)));
        assert!(timer.due(start + Duration::from_secs(60)));
    }

    #[test]
    fn timer_never_bursts_after_a_late_check() {
        let start = Instant::now();
        let mut timer = TelemetryTimer::new(Duration::from_secs(30), start);

        // Loop stalled for several intervals: one report, then a fresh interval.
        let late = start + Duration::from_secs(95);
        assert!(timer.due(late));
        assert!(!timer.due(late + Duration::from_secs(1)));
        assert_eq!(timer.deadline(), late + Duration::from_secs(30));
    }

    #[test]
    fn timer_counts_reports_over_a_window() {
        let start = Instant::now();
        let mut timer = TelemetryTimer::new(Duration::from_secs(10), start);

        let fired = (1..=100)
            .map(|s| start + Duration::from_secs(s))
            .filter(|now| timer.due(*now))
            .count();
        assert_eq!(fired, 10);
    }
}
