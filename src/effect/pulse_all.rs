//! Whole-segment flashes and sparkle
//!
//! Kind 0 fills every pixel at once, optionally again every `repeat` ms.
//! Kind 1 sparkles: on each sparkle tick every pixel lights with
//! probability `1 / show`.

use alloc::vec::Vec;

use super::live::{Instance, LiveList, decay_ms, fade_rate, reached, step_interval};
use super::{CycleClock, DEFAULT_DURATION_MS, Effect, EffectContext, EffectParams, EffectTag};
use crate::color::{CYAN_SENTINEL, ColorMath, ColorParam};
use crate::layout::NO_PIXEL;
use crate::segment::{Segment, SegmentId};

const KIND_SPARKLE: u8 = 1;
const DEFAULT_SHOW: f64 = 10.0;

#[derive(Debug, Clone)]
struct Flash {
    segment: SegmentId,
    palette: ColorParam,
    kind: u8,
    fade: f32,
    duration: f64,
    some: Option<Vec<i32>>,
    repeat: Option<f64>,
    step_ms: f64,
    next_step_ms: f64,
    show: f64,
    /// Round-robin position in the palette
    iter: usize,
    done: bool,
}

impl Instance for Flash {
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

impl Flash {
    fn pixel(&self, segment: &Segment, index: usize) -> i32 {
        match &self.some {
            Some(some) => some.get(index).copied(),
            None => segment.layout().line().get(index).copied(),
        }
        .unwrap_or(NO_PIXEL)
    }

    fn pixel_count(&self, segment: &Segment) -> usize {
        self.some
            .as_ref()
            .map_or_else(|| segment.layout().line().len(), Vec::len)
    }

    /// Light one pixel with the next palette color
    fn light<M: ColorMath + ?Sized>(
        &mut self,
        segment: &Segment,
        index: usize,
        ctx: &mut EffectContext<'_, M>,
    ) {
        let color = self.palette.resolve_at(self.iter, ctx.rng, ctx.math);
        if self.palette.is_list() {
            self.iter = self.iter.wrapping_add(1);
        }
        let pixel = self.pixel(segment, index);
        segment.set_pixel(ctx.buffer, pixel, color, self.fade, decay_ms(self.duration));
    }
}

#[derive(Debug, Clone)]
pub struct PulseAllEffect {
    duration: f64,
    ftb: f64,
    kind: u8,
    pulses: LiveList<Flash>,
    cycle: CycleClock,
}

impl Default for PulseAllEffect {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            ftb: DEFAULT_DURATION_MS,
            kind: 0,
            pulses: LiveList::default(),
            cycle: CycleClock::default(),
        }
    }
}

impl PulseAllEffect {
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_ftb(mut self, ftb: f64) -> Self {
        self.ftb = ftb;
        self
    }

    pub const fn cycle(&self) -> &CycleClock {
        &self.cycle
    }
}

impl Effect for PulseAllEffect {
    const TAG: EffectTag = EffectTag::PulseAll;

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

        #[allow(clippy::cast_precision_loss)]
        let next_step_ms = now as f64 - 1.0;
        self.pulses.push(Flash {
            segment,
            palette: params
                .color
                .clone()
                .unwrap_or_else(|| ColorParam::from(CYAN_SENTINEL)),
            kind: params.kind.unwrap_or(self.kind),
            fade: fade_rate(params.ftb.unwrap_or(self.ftb)),
            duration,
            some: params.some.clone(),
            repeat: params.repeat,
            step_ms: step_interval(duration, len),
            next_step_ms,
            show: params.show.filter(|show| *show > 0.0).unwrap_or(DEFAULT_SHOW),
            iter: 0,
            done: false,
        });
    }

    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        let segments = ctx.segments;
        for flash in self.pulses.iter_mut() {
            let Some(segment) = segments.get(flash.segment) else {
                flash.done = true;
                continue;
            };
            let count = flash.pixel_count(segment);

            if flash.kind == KIND_SPARKLE {
                if !reached(now, flash.next_step_ms) {
                    continue;
                }
                let half = flash.step_ms / 2.0;
                flash.next_step_ms += half + half * ctx.rng.f64();

                let chance = 1.0 / flash.show;
                for index in 0..count {
                    if ctx.rng.f64() < chance {
                        flash.light(segment, index, ctx);
                    }
                }
                continue;
            }

            match flash.repeat {
                Some(repeat) => {
                    if !reached(now, flash.next_step_ms) {
                        continue;
                    }
                    flash.next_step_ms += repeat;
                }
                None => flash.done = true,
            }
            for index in 0..count {
                flash.light(segment, index, ctx);
            }
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
