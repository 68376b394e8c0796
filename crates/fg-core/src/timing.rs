//! Lightweight timing of node invocations.
//!
//! Timing is off unless enabled programmatically, through `EvalOptions::timing`,
//! or with the `FG_TIMING` environment variable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("FG_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    start: Option<Instant>,
}

impl Timer {
    /// Start a timer. A disabled timer never reads the clock.
    pub fn start(enabled: bool) -> Self {
        Self {
            start: enabled.then(Instant::now),
        }
    }

    /// Elapsed milliseconds, or `None` if the timer is disabled.
    pub fn stop_ms(self) -> Option<f64> {
        self.start.map(|s| s.elapsed().as_secs_f64() * 1e3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timer_reports_nothing() {
        assert_eq!(Timer::start(false).stop_ms(), None);
    }

    #[test]
    fn enabled_timer_reports_non_negative() {
        let ms = Timer::start(true).stop_ms().unwrap();
        assert!(ms >= 0.0);
    }
}
