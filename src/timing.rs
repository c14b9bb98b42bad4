//! Duration logging for major operations.
//!
//! A [`Timer`] is started at the entry of an operation and logs the elapsed
//! time at `debug` level when dropped, so early returns and `?` exits are
//! measured too. Logging goes through the [`log`] facade and never affects
//! control flow.

use std::time::{Duration, Instant};

/// Log target used for timing records.
pub const TIMING_TARGET: &str = "hexlay::timing";

/// Scoped timer that logs its lifetime on drop.
#[derive(Debug)]
pub struct Timer {
    label: &'static str,
    detail: Option<String>,
    start: Instant,
}

impl Timer {
    /// Starts a timer for the named operation.
    pub fn start(label: &'static str) -> Self {
        log::trace!(target: TIMING_TARGET, "{} started", label);
        Self {
            label,
            detail: None,
            start: Instant::now(),
        }
    }

    /// Attaches a detail string reported with the duration.
    ///
    /// The closure only runs when debug logging is enabled.
    pub fn note<F: FnOnce() -> String>(&mut self, detail: F) {
        if log::log_enabled!(target: TIMING_TARGET, log::Level::Debug) {
            self.detail = Some(detail());
        }
    }

    /// Returns the time elapsed since the timer started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        match &self.detail {
            Some(detail) => {
                log::debug!(target: TIMING_TARGET, "{} took {:?} ({})", self.label, elapsed, detail)
            }
            None => log::debug!(target: TIMING_TARGET, "{} took {:?}", self.label, elapsed),
        }
    }
}
