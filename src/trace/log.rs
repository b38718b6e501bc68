use std::fmt::Write;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{TraceSink, fmt_time};

/// Sink that emits each record as a `tracing` debug event.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy)]
pub struct LogTraceSink;

#[typetag::serde]
impl TraceSink for LogTraceSink {
    fn record(&mut self, time: SystemTime, values: &[(&str, f64)]) {
        let mut line = String::new();
        for (name, value) in values {
            // String formatting can't actually fail here
            let _ = write!(line, " {name}={value}");
        }

        debug!("PID trace {}{line}", fmt_time(time));
    }
}
