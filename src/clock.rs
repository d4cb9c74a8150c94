//! Speed-scaled show time

use embassy_time::Instant;

/// Percent value at which show time runs in step with wall time
pub const NORMAL_SPEED: u16 = 100;

/// Converts monotonic timestamps into show milliseconds since a start point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowClock {
    start: Instant,
}

impl Default for ShowClock {
    fn default() -> Self {
        Self {
            start: Instant::from_millis(0),
        }
    }
}

impl ShowClock {
    pub const fn new(start: Instant) -> Self {
        Self { start }
    }

    /// Restart counting from `now`
    pub fn start(&mut self, now: Instant) {
        self.start = now;
    }

    pub const fn started_at(&self) -> Instant {
        self.start
    }

    /// Show time at `now` with `speed` given in percent
    pub fn scaled(&self, now: Instant, speed: u16) -> u64 {
        scale_ms(now.as_millis().saturating_sub(self.start.as_millis()), speed)
    }
}

/// Scale a wall-clock span by `speed` percent
pub const fn scale_ms(elapsed_ms: u64, speed: u16) -> u64 {
    elapsed_ms.saturating_mul(speed as u64) / NORMAL_SPEED as u64
}
