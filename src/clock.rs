//! Time sources for measuring the interval between controller updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// A source of current time for the control loop.
///
/// Any clock whose readings are non-decreasing under normal operation works;
/// the controller tolerates repeated readings at the same instant.
#[typetag::serde(tag = "type")]
pub trait Clock: Send + Sync {
    /// Read the current time.
    fn now(&self) -> SystemTime;
}

/// Wall-clock time from the operating system.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy)]
pub struct SystemClock;

#[typetag::serde]
impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock advanced by hand, for simulation and deterministic tests.
///
/// Clones share the same underlying time, so a driving task can hold one
/// handle while the controller owns another. Starts at the unix epoch.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct ManualClock {
    /// Nanoseconds since the unix epoch
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, dt: Duration) {
        self.nanos.fetch_add(dt.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Set the absolute time as an offset from the unix epoch.
    pub fn set(&self, t: Duration) {
        self.nanos.store(t.as_nanos() as u64, Ordering::Relaxed);
    }
}

#[typetag::serde]
impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);

        handle.advance(Duration::from_millis(1500));
        assert_eq!(
            clock.now(),
            SystemTime::UNIX_EPOCH + Duration::from_millis(1500),
            "advancing one handle should be visible through the other"
        );

        handle.set(Duration::from_secs(2));
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH + Duration::from_secs(2));
    }

    #[test]
    fn system_clock_is_nondecreasing() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(
            second.duration_since(first).is_ok(),
            "consecutive readings should not move backward"
        );
    }

    #[test]
    fn boxed_clock_round_trips() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));

        let boxed: Box<dyn Clock> = Box::new(clock);
        let serialized = serde_json::to_string(&boxed).unwrap();
        let deserialized: Box<dyn Clock> = serde_json::from_str(&serialized).unwrap();

        assert_eq!(
            deserialized.now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(3)
        );
    }
}
