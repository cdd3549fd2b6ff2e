//! Time sources for transitions and animation.

use instant::Instant;

/// Monotonic time in seconds, in the same unit as the transition duration.
pub trait Clock {
    /// Seconds since the clock started.
    fn elapsed_time(&self) -> f32;

    /// Seconds since the previous call to `delta` (or since start on the first call).
    fn delta(&mut self) -> f32;
}

/// Wall clock backed by `instant`, so it works natively and in the browser.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed_time(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}
