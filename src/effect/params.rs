use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::color::ColorParam;

/// Parameters of a timeline trigger.
///
/// Every field is optional; each effect documents its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    /// Effect-specific behavior selector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    /// `1` forward, `-1` backward (`0` is meaningful to rainbow fields)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<i8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorParam>,
    /// Fade time constant in ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ftb: Option<f64>,
    /// Pause before a finished instance starts over, in ms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "pulseStepMS", skip_serializing_if = "Option::is_none")]
    pub pulse_step_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<usize>,
    /// Steps an instance lives before it ends or re-arms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life: Option<u32>,
    /// Line grouping: 1 horizontal, 2 vertical, 3 digits, 4 random
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<u8>,
    /// Sparkle density divisor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<f64>,
    /// Explicit pixel subset used instead of the segment's line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub some: Option<Vec<i32>>,
}

impl EffectParams {
    #[must_use]
    pub fn with_kind(mut self, kind: u8) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_dir(mut self, dir: i8) -> Self {
        self.dir = Some(dir);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<ColorParam>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn with_ftb(mut self, ftb: f64) -> Self {
        self.ftb = Some(ftb);
        self
    }

    #[must_use]
    pub fn with_repeat(mut self, repeat: f64) -> Self {
        self.repeat = Some(repeat);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_pulse_step_ms(mut self, step: f64) -> Self {
        self.pulse_step_ms = Some(step);
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, start: usize, end: usize) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    #[must_use]
    pub fn with_life(mut self, life: u32) -> Self {
        self.life = Some(life);
        self
    }

    #[must_use]
    pub fn with_variant(mut self, variant: u8) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn with_show(mut self, show: f64) -> Self {
        self.show = Some(show);
        self
    }

    #[must_use]
    pub fn with_some(mut self, pixels: Vec<i32>) -> Self {
        self.some = Some(pixels);
        self
    }
}
