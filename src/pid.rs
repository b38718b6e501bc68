//! A single-loop PID controller

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::trace::TraceSink;

/// Proportional-integral-derivative controller for a single feedback loop.
///
/// Each call to [`Pid::update`] takes the latest error value (setpoint minus
/// measurement), measures the elapsed interval on the controller's clock,
/// and returns the gain-weighted sum of the three terms. This is the bare
/// three-term form: no anti-windup, output clamping, or derivative
/// filtering. Gains are never validated and may be changed between updates.
///
/// The controller assumes exclusive ownership by a single caller; callers
/// that share one across threads must serialize access themselves.
#[derive(Serialize, Deserialize)]
pub struct Pid {
    // Gains
    kp: f64,
    ki: f64,
    kd: f64,

    // Internal state
    prev_time: SystemTime,
    prev_err: f64,

    // Raw term values from the most recent update, retained for inspection.
    // Gains are applied only in the returned output, so `integral` holds the
    // unscaled error-time sum and rescaling `ki` rescales the whole
    // accumulated contribution.
    proportional: f64,
    integral: f64,
    derivative: f64,

    clock: Box<dyn Clock>,
    trace: Option<Box<dyn TraceSink>>,
}

impl core::fmt::Debug for Pid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pid")
            .field("kp", &self.kp)
            .field("ki", &self.ki)
            .field("kd", &self.kd)
            .field("prev_err", &self.prev_err)
            .field("proportional", &self.proportional)
            .field("integral", &self.integral)
            .field("derivative", &self.derivative)
            .finish()
    }
}

impl Default for Pid {
    /// Proportional-only controller with unit gain over the system clock
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }
}

impl Pid {
    /// Controller over the operating system's wall clock.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self::with_clock(kp, ki, kd, Box::new(SystemClock))
    }

    /// Controller over an injected time source, for simulation or
    /// deterministic tests.
    pub fn with_clock(kp: f64, ki: f64, kd: f64, clock: Box<dyn Clock>) -> Self {
        let mut pid = Self {
            kp,
            ki,
            kd,
            prev_time: SystemTime::UNIX_EPOCH,
            prev_err: 0.0,
            proportional: 0.0,
            integral: 0.0,
            derivative: 0.0,
            clock,
            trace: None,
        };
        pid.reset();
        pid
    }

    /// Set proportional gain. Takes effect on the next update.
    pub fn set_kp(&mut self, kp: f64) {
        self.kp = kp;
    }

    /// Set integral gain. Takes effect on the next update.
    pub fn set_ki(&mut self, ki: f64) {
        self.ki = ki;
    }

    /// Set derivative gain. Takes effect on the next update.
    pub fn set_kd(&mut self, kd: f64) {
        self.kd = kd;
    }

    /// Overwrite the stored previous error, bypassing the normal update
    /// flow. Used to seed or correct controller state externally; triggers
    /// no recomputation.
    pub fn set_prev_err(&mut self, prev_err: f64) {
        self.prev_err = prev_err;
    }

    /// Attach a diagnostic sink; every later update records its
    /// intermediate values until the sink is taken back.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = Some(sink);
    }

    /// Detach the diagnostic sink, disabling tracing.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Raw proportional term (the error) from the most recent update.
    pub fn proportional(&self) -> f64 {
        self.proportional
    }

    /// Accumulated error-time sum, unscaled by `ki`.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Raw error rate from the most recent update; 0 when that update saw
    /// zero elapsed time.
    pub fn derivative(&self) -> f64 {
        self.derivative
    }

    /// Error value stored by the most recent update or `set_prev_err`.
    pub fn prev_err(&self) -> f64 {
        self.prev_err
    }

    /// Discard accumulated state and re-base the elapsed-time measurement
    /// at the current clock reading.
    ///
    /// Called at construction; call again after a long pause to avoid an
    /// integral or derivative spike from a stale timestamp.
    pub fn reset(&mut self) {
        self.prev_time = self.clock.now();
        self.prev_err = 0.0;
        self.proportional = 0.0;
        self.integral = 0.0;
        self.derivative = 0.0;
        debug!("PID controller state reset");
    }

    /// Run one PID computation for the latest error value and return the
    /// control output.
    ///
    /// The elapsed interval is measured on the controller's clock from the
    /// end of the previous update (or the latest reset). Two calls landing
    /// on the same clock tick read as zero elapsed time: the accumulator
    /// takes a zero increment and the derivative term is zero.
    pub fn update(&mut self, error: f64) -> f64 {
        let now = self.clock.now();

        // A clock reading at or before the previous one is zero elapsed time
        let dt = now
            .duration_since(self.prev_time)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let de = error - self.prev_err;

        self.proportional = error;
        self.integral += error * dt;
        self.derivative = if dt > 0.0 { de / dt } else { 0.0 };

        self.prev_time = now;
        self.prev_err = error;

        let p = self.kp * self.proportional;
        let i = self.ki * self.integral;
        let d = self.kd * self.derivative;
        let output = p + i + d;

        if let Some(sink) = self.trace.as_mut() {
            sink.record(
                now,
                &[
                    ("error", error),
                    ("dt", dt),
                    ("de", de),
                    ("p", p),
                    ("i", i),
                    ("d", d),
                    ("output", output),
                ],
            );
        }

        output
    }
}
