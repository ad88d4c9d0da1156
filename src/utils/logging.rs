//! Timing helpers for the stepping loop.

use log::{log_enabled, trace, warn, Level};
use std::time::{Duration, Instant};

/// Traces the wall-clock time of one solver pass when dropped.
pub struct StepTimer {
    solver: &'static str,
    start: Instant,
}

impl StepTimer {
    pub fn start(solver: &'static str) -> Self {
        Self {
            solver,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            trace!("{} step took {} µs", self.solver, self.start.elapsed().as_micros());
        }
    }
}

/// Wall-clock allowance for one interactive frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBudget {
    millis: f32,
}

impl FrameBudget {
    pub fn from_millis(millis: f32) -> Self {
        Self { millis }
    }

    pub fn millis(&self) -> f32 {
        self.millis
    }

    /// Warns when a frame of `substeps` solver passes overran the budget.
    pub fn check(&self, elapsed: Duration, substeps: u32) -> bool {
        let elapsed_ms = elapsed.as_secs_f32() * 1000.0;
        let over = elapsed_ms > self.millis;
        if over {
            warn!(
                "frame of {substeps} sub-steps took {elapsed_ms:.2} ms, budget is {:.2} ms",
                self.millis
            );
        }
        over
    }
}
