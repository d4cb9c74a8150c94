//! Single traveling pixel
//!
//! Each instance lights one position at a time, stepping along the
//! segment's line (or an explicit `some` subset) and leaving a fading
//! trail behind it.

use alloc::vec::Vec;

use super::live::{Instance, LiveList, Travel, decay_ms, fade_rate, reached, step_interval};
use super::{
    CycleClock, DEFAULT_DURATION_MS, Direction, Effect, EffectContext, EffectParams, EffectTag,
};
use crate::color::{ColorMath, ColorParam, Rgb};
use crate::layout::NO_PIXEL;
use crate::segment::{Segment, SegmentId};

const DEFAULT_COLOR: u32 = 0x00_00ff;
const KIND_RAINBOW: u8 = 1;
const RAINBOW_SATURATION: f32 = 1.0;
const RAINBOW_VALUE: f32 = 0.8;

#[derive(Debug, Clone)]
struct Pulse {
    segment: SegmentId,
    travel: Travel,
    color: Rgb,
    kind: u8,
    fade: f32,
    duration: f64,
    step_ms: f64,
    next_step_ms: f64,
    some: Option<Vec<i32>>,
    done: bool,
}

impl Instance for Pulse {
    fn segment(&self) -> SegmentId {
        self.segment
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn finish(&mut self) {
        self.done = true;
    }
}

#[derive(Debug, Clone)]
pub struct PulseEffect {
    duration: f64,
    ftb: f64,
    dir: Direction,
    color: ColorParam,
    pulses: LiveList<Pulse>,
    cycle: CycleClock,
}

impl Default for PulseEffect {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            ftb: DEFAULT_DURATION_MS,
            dir: Direction::Forward,
            color: ColorParam::from(DEFAULT_COLOR),
            pulses: LiveList::default(),
            cycle: CycleClock::default(),
        }
    }
}

impl PulseEffect {
    /// Set the default cycle duration, which also becomes the fade constant
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self.ftb = duration;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<ColorParam>) -> Self {
        self.color = color.into();
        self
    }

    #[must_use]
    pub fn with_direction(mut self, dir: Direction) -> Self {
        self.dir = dir;
        self
    }

    pub const fn cycle(&self) -> &CycleClock {
        &self.cycle
    }
}

impl Effect for PulseEffect {
    const TAG: EffectTag = EffectTag::Pulse;

    fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    ) {
        let Some(len) = ctx.segment(segment).map(Segment::len) else {
            return;
        };

        let duration = params.duration.unwrap_or(self.duration);
        let (start, end) = match &params.some {
            Some(some) => (0, some.len().saturating_sub(1)),
            None => (
                params.start.unwrap_or(0),
                params.end.unwrap_or(len.saturating_sub(1)),
            ),
        };
        let dir = params.dir.map_or(self.dir, Direction::from_raw);
        let loc = match dir {
            Direction::Backward => end,
            Direction::Forward => params.loc.unwrap_or(0),
        };
        let color = params
            .color
            .as_ref()
            .unwrap_or(&self.color)
            .resolve_at(0, ctx.rng, ctx.math);

        #[allow(clippy::cast_precision_loss)]
        let next_step_ms = now as f64;
        self.pulses.push(Pulse {
            segment,
            travel: Travel {
                loc,
                start,
                end,
                dir,
                repeat: params.repeat,
            },
            color,
            kind: params.kind.unwrap_or(0),
            fade: fade_rate(params.ftb.unwrap_or(self.ftb)),
            duration,
            step_ms: params
                .pulse_step_ms
                .unwrap_or_else(|| step_interval(duration, len)),
            next_step_ms,
            some: params.some.clone(),
            done: false,
        });
    }

    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        for pulse in self.pulses.iter_mut() {
            if !reached(now, pulse.next_step_ms) {
                continue;
            }
            pulse.next_step_ms += pulse.step_ms;

            let loc = pulse.travel.loc;
            let pixel = match &pulse.some {
                Some(some) => some.get(loc).copied(),
                None => ctx
                    .segment(pulse.segment)
                    .and_then(|s| s.layout().line().get(loc).copied()),
            }
            .unwrap_or(NO_PIXEL);

            let color = if pulse.kind == KIND_RAINBOW {
                let cycle_ms = decay_ms(pulse.duration).max(1);
                #[allow(clippy::cast_precision_loss)]
                let hue = (now % u64::from(cycle_ms)) as f32 / cycle_ms as f32;
                ctx.math.hsv_to_rgb(hue, RAINBOW_SATURATION, RAINBOW_VALUE)
            } else {
                pulse.color
            };

            ctx.set_pixel(pulse.segment, pixel, color, pulse.fade, decay_ms(pulse.duration));
            pulse.done = pulse.travel.advance(&mut pulse.next_step_ms);
        }
        self.pulses.sweep();
    }

    fn term(&mut self, segment: SegmentId) {
        self.pulses.term(segment);
    }

    fn op_first(&mut self, now: u64) {
        self.cycle.advance(now);
    }

    fn live_instances(&self) -> usize {
        self.pulses.len()
    }
}
