//! Effect system with a closed set of effect kinds
//!
//! Every effect is a singleton state machine that keeps the live instances
//! it has been triggered with, across all segments it drives. The
//! [`EffectRegistry`] owns one [`EffectSlot`] per [`EffectTag`] and routes
//! calls to it.

mod live;
mod marquee;
mod params;
mod pulse;
mod pulse_all;
mod pulse_lines;
mod rainbow;
mod registry;

use fastrand::Rng;
pub use live::{CycleClock, Direction};
pub use marquee::{MAX_PALETTE, MarqueeEffect};
pub use params::EffectParams;
pub use pulse::PulseEffect;
pub use pulse_all::PulseAllEffect;
pub use pulse_lines::PulseLinesEffect;
pub use rainbow::RainbowEffect;
pub use registry::EffectRegistry;

use crate::color::{ColorMath, Rgb};
use crate::pixel_buffer::PixelBuffer;
use crate::segment::{Segment, SegmentId};

const EFFECT_TAG_PULSE: &str = "PULS";
const EFFECT_TAG_PULSE_ALL: &str = "PLSA";
const EFFECT_TAG_PULSE_LINES: &str = "PLSL";
const EFFECT_TAG_RAINBOW: &str = "RNBW";
const EFFECT_TAG_MARQUEE: &str = "MARQ";

const EFFECT_ID_PULSE: u8 = 0;
const EFFECT_ID_PULSE_ALL: u8 = 1;
const EFFECT_ID_PULSE_LINES: u8 = 2;
const EFFECT_ID_RAINBOW: u8 = 3;
const EFFECT_ID_MARQUEE: u8 = 4;

/// Number of effects in the registry
pub const EFFECT_COUNT: usize = 5;

/// Default length of one effect cycle
pub(crate) const DEFAULT_DURATION_MS: f64 = 1000.0;

/// Decay duration used by writes that do not fade
pub(crate) const HOLD_DURATION_MS: u32 = 1000;

/// Known effects, addressed by a four-letter tag in timeline files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EffectTag {
    Pulse = EFFECT_ID_PULSE,
    PulseAll = EFFECT_ID_PULSE_ALL,
    PulseLines = EFFECT_ID_PULSE_LINES,
    Rainbow = EFFECT_ID_RAINBOW,
    Marquee = EFFECT_ID_MARQUEE,
}

impl EffectTag {
    /// Every tag, in registry order
    pub const ALL: [Self; EFFECT_COUNT] = [
        Self::Pulse,
        Self::PulseAll,
        Self::PulseLines,
        Self::Rainbow,
        Self::Marquee,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            EFFECT_ID_PULSE => Self::Pulse,
            EFFECT_ID_PULSE_ALL => Self::PulseAll,
            EFFECT_ID_PULSE_LINES => Self::PulseLines,
            EFFECT_ID_RAINBOW => Self::Rainbow,
            EFFECT_ID_MARQUEE => Self::Marquee,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pulse => EFFECT_TAG_PULSE,
            Self::PulseAll => EFFECT_TAG_PULSE_ALL,
            Self::PulseLines => EFFECT_TAG_PULSE_LINES,
            Self::Rainbow => EFFECT_TAG_RAINBOW,
            Self::Marquee => EFFECT_TAG_MARQUEE,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            EFFECT_TAG_PULSE => Some(Self::Pulse),
            EFFECT_TAG_PULSE_ALL => Some(Self::PulseAll),
            EFFECT_TAG_PULSE_LINES => Some(Self::PulseLines),
            EFFECT_TAG_RAINBOW => Some(Self::Rainbow),
            EFFECT_TAG_MARQUEE => Some(Self::Marquee),
            _ => None,
        }
    }

    /// Create the effect singleton for this tag
    pub fn to_slot(self) -> EffectSlot {
        match self {
            Self::Pulse => EffectSlot::Pulse(PulseEffect::default()),
            Self::PulseAll => EffectSlot::PulseAll(PulseAllEffect::default()),
            Self::PulseLines => EffectSlot::PulseLines(PulseLinesEffect::default()),
            Self::Rainbow => EffectSlot::Rainbow(RainbowEffect::default()),
            Self::Marquee => EffectSlot::Marquee(MarqueeEffect::default()),
        }
    }
}

/// What an effect may touch while it runs
pub struct EffectContext<'a, M: ColorMath + ?Sized> {
    pub segments: &'a [Segment],
    pub buffer: &'a mut PixelBuffer,
    pub math: &'a M,
    pub rng: &'a mut Rng,
}

impl<M: ColorMath + ?Sized> EffectContext<'_, M> {
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    /// Write a layout-local pixel of segment `id`
    pub fn set_pixel(
        &mut self,
        id: SegmentId,
        pixel: i32,
        color: Rgb,
        rate: f32,
        duration_ms: u32,
    ) {
        if let Some(segment) = self.segments.get(id) {
            segment.set_pixel(self.buffer, pixel, color, rate, duration_ms);
        }
    }
}

pub trait Effect {
    const TAG: EffectTag;

    /// Prepare per-segment state before the first trigger
    fn init<M: ColorMath + ?Sized>(
        &mut self,
        _segment: SegmentId,
        _ctx: &mut EffectContext<'_, M>,
    ) {
    }

    /// Start a new instance on `segment`
    fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    );

    /// Advance every live instance to show time `now`
    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>);

    /// Drop every instance running on `segment`
    fn term(&mut self, segment: SegmentId);

    /// Elapsed-time bookkeeping, called before any effect idles
    fn op_first(&mut self, _now: u64) {}

    /// Number of live instances
    fn live_instances(&self) -> usize;
}

/// Effect slot - enum containing every effect singleton
#[derive(Debug, Clone)]
pub enum EffectSlot {
    Pulse(PulseEffect),
    PulseAll(PulseAllEffect),
    PulseLines(PulseLinesEffect),
    Rainbow(RainbowEffect),
    Marquee(MarqueeEffect),
}

impl EffectSlot {
    pub const fn tag(&self) -> EffectTag {
        match self {
            Self::Pulse(_) => PulseEffect::TAG,
            Self::PulseAll(_) => PulseAllEffect::TAG,
            Self::PulseLines(_) => PulseLinesEffect::TAG,
            Self::Rainbow(_) => RainbowEffect::TAG,
            Self::Marquee(_) => MarqueeEffect::TAG,
        }
    }

    pub fn init<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        ctx: &mut EffectContext<'_, M>,
    ) {
        match self {
            Self::Pulse(effect) => effect.init(segment, ctx),
            Self::PulseAll(effect) => effect.init(segment, ctx),
            Self::PulseLines(effect) => effect.init(segment, ctx),
            Self::Rainbow(effect) => effect.init(segment, ctx),
            Self::Marquee(effect) => effect.init(segment, ctx),
        }
    }

    pub fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    ) {
        match self {
            Self::Pulse(effect) => effect.trigger(segment, params, now, ctx),
            Self::PulseAll(effect) => effect.trigger(segment, params, now, ctx),
            Self::PulseLines(effect) => effect.trigger(segment, params, now, ctx),
            Self::Rainbow(effect) => effect.trigger(segment, params, now, ctx),
            Self::Marquee(effect) => effect.trigger(segment, params, now, ctx),
        }
    }

    pub fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        match self {
            Self::Pulse(effect) => effect.idle(now, ctx),
            Self::PulseAll(effect) => effect.idle(now, ctx),
            Self::PulseLines(effect) => effect.idle(now, ctx),
            Self::Rainbow(effect) => effect.idle(now, ctx),
            Self::Marquee(effect) => effect.idle(now, ctx),
        }
    }

    pub fn term(&mut self, segment: SegmentId) {
        match self {
            Self::Pulse(effect) => effect.term(segment),
            Self::PulseAll(effect) => effect.term(segment),
            Self::PulseLines(effect) => effect.term(segment),
            Self::Rainbow(effect) => effect.term(segment),
            Self::Marquee(effect) => effect.term(segment),
        }
    }

    pub fn op_first(&mut self, now: u64) {
        match self {
            Self::Pulse(effect) => effect.op_first(now),
            Self::PulseAll(effect) => effect.op_first(now),
            Self::PulseLines(effect) => effect.op_first(now),
            Self::Rainbow(effect) => effect.op_first(now),
            Self::Marquee(effect) => effect.op_first(now),
        }
    }

    pub fn live_instances(&self) -> usize {
        match self {
            Self::Pulse(effect) => effect.live_instances(),
            Self::PulseAll(effect) => effect.live_instances(),
            Self::PulseLines(effect) => effect.live_instances(),
            Self::Rainbow(effect) => effect.live_instances(),
            Self::Marquee(effect) => effect.live_instances(),
        }
    }
}
