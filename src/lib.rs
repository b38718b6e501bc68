//! Single-loop PID control with a swappable time source and trace dispatch.

pub mod clock;
pub mod pid;
pub mod trace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use pid::Pid;
pub use trace::{LatestTraceSink, LogTraceSink, TraceHandle, TraceRecord, TraceSink};
