//! Trace sinks receive the controller's intermediate values, usually for tuning or debug display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

mod log;
pub use log::LogTraceSink;

mod latest;
pub use latest::{LatestTraceSink, TraceHandle};

/// One update's worth of named intermediate values.
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct TraceRecord {
    pub system_time: String,
    pub values: Vec<(String, f64)>,
}

/// A diagnostic plugin that receives the controller's intermediate values
/// one update at a time.
///
/// Recording is infallible and must not perturb the numeric path; the
/// controller produces the same output whether or not a sink is attached.
#[typetag::serde(tag = "type")]
pub trait TraceSink: Send + Sync {
    /// Ingest the named values from one controller update.
    fn record(&mut self, time: SystemTime, values: &[(&str, f64)]);
}

/// Fixed-width ISO-8601 UTC timestamp with zero-padded sub-second nanoseconds and Z-suffix
pub fn fmt_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

#[cfg(test)]
mod tests {
    use super::fmt_time;
    use std::time::{Duration, SystemTime};

    #[test]
    fn fmt_time_has_consistent_width() {
        let t0 = SystemTime::UNIX_EPOCH;
        let expected_len = fmt_time(t0).len();

        let offsets_ns = [0_u64, 1, 999, 1_000_000, 999_999_999, 86_400_000_000_000];
        for offset in offsets_ns {
            let formatted = fmt_time(t0 + Duration::from_nanos(offset));
            assert_eq!(
                formatted.len(),
                expected_len,
                "length of `{formatted}` should be {expected_len} but is {}",
                formatted.len()
            );
            assert!(
                formatted.ends_with('Z'),
                "timestamp `{formatted}` should be Z-suffixed UTC"
            );
        }
    }
}
