#![forbid(unsafe_code)]

//! Wall-clock adapter for driving a [`Scheduler`](crate::Scheduler).
//!
//! Hosts with a real event loop measure elapsed time with [`FrameClock`]
//! and feed it to `tick(elapsed)`; tests skip the clock and pass synthetic
//! durations directly.

use web_time::{Duration, Instant};

/// Measures the time between successive host ticks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Start measuring from now.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time elapsed since the previous call (or since construction).
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        elapsed
    }

    /// Time elapsed since the previous tick, without resetting.
    pub fn peek(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last)
    }
}
