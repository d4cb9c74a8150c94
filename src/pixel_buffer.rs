//! Shared per-pixel state of one display.
//!
//! Effects write target colors together with a decay rate and duration;
//! once per frame [`PixelBuffer::decay`] turns them into the output colors
//! that are sent to the LEDs.

use alloc::vec;
use alloc::vec::Vec;

use crate::color::{ColorMath, Rgb};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelBuffer {
    colors: Vec<Rgb>,
    rates: Vec<f32>,
    remaining: Vec<u32>,
    output: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            colors: vec![Rgb::default(); len],
            rates: vec![0.0; len],
            remaining: vec![0; len],
            output: vec![Rgb::default(); len],
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Resize to `len` pixels and blank everything
    pub fn reset(&mut self, len: usize) {
        *self = Self::new(len);
    }

    /// Store a target color for a physical pixel.
    ///
    /// Writes beyond the buffer are dropped; returns whether the write landed.
    pub fn set_pixel(&mut self, index: usize, color: Rgb, rate: f32, duration_ms: u32) -> bool {
        let Some(slot) = self.colors.get_mut(index) else {
            return false;
        };
        *slot = color;
        self.rates[index] = rate;
        self.remaining[index] = duration_ms;
        true
    }

    /// Target color of a physical pixel
    pub fn color(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    pub fn rate(&self, index: usize) -> Option<f32> {
        self.rates.get(index).copied()
    }

    pub fn remaining(&self, index: usize) -> Option<u32> {
        self.remaining.get(index).copied()
    }

    /// Colors as they leave the decay stage
    pub fn output(&self) -> &[Rgb] {
        &self.output
    }

    /// Run the decay stage for `elapsed_ms` of scaled time
    pub fn decay<M: ColorMath + ?Sized>(&mut self, elapsed_ms: u32, math: &M) {
        math.decay(
            elapsed_ms,
            &self.colors,
            &mut self.output,
            &self.rates,
            &mut self.remaining,
        );
    }
}
