//! Building blocks shared by the pulse-style effects.

use alloc::vec::Vec;

use crate::segment::SegmentId;

/// Travel direction of a pulse along its line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// `-1` runs backward, anything else forward
    pub const fn from_raw(dir: i8) -> Self {
        if dir == -1 {
            Self::Backward
        } else {
            Self::Forward
        }
    }

    pub const fn sign(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Elapsed show time between consecutive idle passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleClock {
    last_cycle_ms: u64,
    elapsed_ms: u64,
}

impl CycleClock {
    pub fn advance(&mut self, now: u64) {
        self.elapsed_ms = now.saturating_sub(self.last_cycle_ms);
        self.last_cycle_ms = now;
    }

    pub fn restart(&mut self, now: u64) {
        self.last_cycle_ms = now;
    }

    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

/// Position of a pulse moving between `start` and `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Travel {
    pub(crate) loc: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) dir: Direction,
    pub(crate) repeat: Option<f64>,
}

impl Travel {
    /// Step one position.
    ///
    /// Past the bound a repeating pulse jumps back to its first position and
    /// waits `repeat` more ms; otherwise it reports that it is finished.
    pub(crate) fn advance(&mut self, next_step_ms: &mut f64) -> bool {
        let at_bound = match self.dir {
            Direction::Forward => self.loc >= self.end,
            Direction::Backward => self.loc <= self.start,
        };
        if !at_bound {
            match self.dir {
                Direction::Forward => self.loc += 1,
                Direction::Backward => self.loc -= 1,
            }
            return false;
        }

        let Some(repeat) = self.repeat else {
            return true;
        };
        self.loc = match self.dir {
            Direction::Forward => self.start,
            Direction::Backward => self.end,
        };
        *next_step_ms += repeat;
        false
    }
}

pub(crate) trait Instance {
    fn segment(&self) -> SegmentId;
    fn is_done(&self) -> bool;
    fn finish(&mut self);
}

/// Live instances of one effect across all segments
#[derive(Debug, Clone)]
pub(crate) struct LiveList<T> {
    items: Vec<T>,
}

impl<T> Default for LiveList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Instance> LiveList<T> {
    pub(crate) fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub(crate) fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Remove finished instances
    pub(crate) fn sweep(&mut self) {
        self.items.retain(|item| !item.is_done());
    }

    /// Finish and remove every instance on `segment`
    pub(crate) fn term(&mut self, segment: SegmentId) {
        for item in &mut self.items {
            if item.segment() == segment {
                item.finish();
            }
        }
        self.sweep();
    }
}

/// Whether show time `now` has passed the scheduled time `at`
#[allow(clippy::cast_precision_loss)]
pub(crate) fn reached(now: u64, at: f64) -> bool {
    now as f64 > at
}

/// Per-ms decay rate for a fade time constant; zero means no fade
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn fade_rate(ftb: f64) -> f32 {
    if ftb > 0.0 { (1.0 / ftb) as f32 } else { 0.0 }
}

/// Clamp a millisecond value into a decay duration
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn decay_ms(duration: f64) -> u32 {
    duration.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Step interval for moving across `len` positions in `duration` ms
#[allow(clippy::cast_precision_loss)]
pub(crate) fn step_interval(duration: f64, len: usize) -> f64 {
    duration / len.max(1) as f64
}
