//! Pulses running along every line of a grouping
//!
//! Kinds:
//! - 0/1: one pulse per line
//! - 2: two pulses per line, leaving the line's center in both directions
//! - 3: one pulse per line, each line starting 100 ms after the previous one
//! - 4: one flash per digit group
//! - 5: every pixel of a line flashed at once, lines staggered over `duration`

use super::live::{Instance, LiveList, Travel, decay_ms, fade_rate, reached, step_interval};
use super::{
    CycleClock, DEFAULT_DURATION_MS, Direction, Effect, EffectContext, EffectParams, EffectTag,
};
use crate::color::{ColorMath, ColorParam, Rgb};
use crate::layout::{LineSet, NO_PIXEL};
use crate::segment::SegmentId;

const DEFAULT_COLOR: u32 = 0x00_00ff;
const KIND_CENTER_OUT: u8 = 2;
const KIND_STAGGERED: u8 = 3;
const KIND_DIGITS: u8 = 4;
const KIND_FILL: u8 = 5;
const STAGGER_DELAY_MS: f64 = 100.0;

#[derive(Debug, Clone)]
struct LinePulse {
    segment: SegmentId,
    lines: LineSet,
    line: usize,
    travel: Travel,
    color: Rgb,
    kind: u8,
    fade: f32,
    duration: f64,
    step_ms: f64,
    next_step_ms: f64,
    life: Option<u32>,
    lifetime: Option<u32>,
    done: bool,
}

impl Instance for LinePulse {
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

impl LinePulse {
    /// Count down the remaining life; an exhausted pulse ends or re-arms.
    fn consume_life(&mut self) {
        let Some(life) = self.life.as_mut() else {
            return;
        };
        *life = life.saturating_sub(1);
        if *life > 0 {
            return;
        }
        match self.travel.repeat {
            None => self.done = true,
            Some(_) => {
                self.next_step_ms += self.duration;
                self.life = self.lifetime;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PulseLinesEffect {
    duration: f64,
    ftb: f64,
    kind: u8,
    color: ColorParam,
    pulses: LiveList<LinePulse>,
    cycle: CycleClock,
}

impl Default for PulseLinesEffect {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            ftb: DEFAULT_DURATION_MS,
            kind: 0,
            color: ColorParam::from(DEFAULT_COLOR),
            pulses: LiveList::default(),
            cycle: CycleClock::default(),
        }
    }
}

impl PulseLinesEffect {
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

    #[must_use]
    pub fn with_kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }

    pub const fn cycle(&self) -> &CycleClock {
        &self.cycle
    }
}

impl Effect for PulseLinesEffect {
    const TAG: EffectTag = EffectTag::PulseLines;

    #[allow(clippy::cast_precision_loss)]
    fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    ) {
        let Some(layout) = ctx.segments.get(segment).map(|s| s.layout()) else {
            return;
        };

        let kind = params.kind.unwrap_or(self.kind);
        let set = if kind == KIND_DIGITS {
            LineSet::Digits
        } else {
            LineSet::from_variant(params.variant, ctx.rng)
        };
        let lines = layout.lines_for(set);
        let duration = params.duration.unwrap_or(self.duration);
        let dir = Direction::from_raw(params.dir.unwrap_or(1));
        let fade = fade_rate(params.ftb.unwrap_or(self.ftb));
        let palette = params.color.as_ref().unwrap_or(&self.color);
        let lifetime = if kind == KIND_DIGITS {
            params.life.or(Some(1))
        } else {
            params.life
        };
        let now = now as f64;
        let mut loc = params.loc.unwrap_or(0);

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let step_ms = params
                .pulse_step_ms
                .unwrap_or_else(|| step_interval(duration, line.len()));
            let start = params.start.unwrap_or(0);
            let end = params.end.unwrap_or(line.len() - 1);
            let color = palette.resolve_at(i, ctx.rng, ctx.math);
            if dir == Direction::Backward {
                loc = end;
            }

            let pulse = |loc: usize, dir: Direction, next_step_ms: f64| LinePulse {
                segment,
                lines: set,
                line: i,
                travel: Travel {
                    loc,
                    start,
                    end,
                    dir,
                    repeat: params.repeat,
                },
                color,
                kind,
                fade,
                duration,
                step_ms,
                next_step_ms,
                life: lifetime,
                lifetime,
                done: false,
            };

            match kind {
                KIND_CENTER_OUT => {
                    let center = layout
                        .center()
                        .and_then(|center| center.get(i))
                        .and_then(|&c| usize::try_from(c).ok())
                        .unwrap_or((end + 1).saturating_sub(start) / 2);
                    self.pulses.push(pulse(center, Direction::Forward, now + step_ms));
                    self.pulses.push(pulse(center, Direction::Backward, now + step_ms));
                }
                KIND_STAGGERED => {
                    self.pulses.push(pulse(loc, dir, now + STAGGER_DELAY_MS * i as f64));
                }
                KIND_FILL => {
                    let delay = duration / lines.len() as f64;
                    for j in 0..line.len() {
                        let Some(at) = loc.checked_add_signed(dir.sign() * j.cast_signed()) else {
                            continue;
                        };
                        let mut flash = pulse(at, dir, now + delay * i as f64);
                        flash.life = Some(1);
                        flash.lifetime = Some(1);
                        self.pulses.push(flash);
                    }
                }
                _ => self.pulses.push(pulse(loc, dir, now)),
            }
        }
    }

    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        for pulse in self.pulses.iter_mut() {
            if !reached(now, pulse.next_step_ms) {
                continue;
            }
            pulse.next_step_ms += pulse.step_ms;

            let Some(segment) = ctx.segments.get(pulse.segment) else {
                pulse.done = true;
                continue;
            };
            let layout = segment.layout();
            let loc = pulse.travel.loc;
            let duration_ms = decay_ms(pulse.duration);

            let wide = layout
                .cross()
                .filter(|_| matches!(pulse.kind, 1 | KIND_CENTER_OUT))
                .and_then(|cross| cross.get(pulse.line))
                .and_then(|positions| positions.get(loc));
            if let Some(pixels) = wide {
                for &pixel in pixels {
                    segment.set_pixel(ctx.buffer, pixel, pulse.color, pulse.fade, duration_ms);
                }
            } else {
                let pixel = layout
                    .lines_for(pulse.lines)
                    .get(pulse.line)
                    .and_then(|line| line.get(loc))
                    .copied()
                    .unwrap_or(NO_PIXEL);
                segment.set_pixel(ctx.buffer, pixel, pulse.color, pulse.fade, duration_ms);
            }

            pulse.done = pulse.travel.advance(&mut pulse.next_step_ms);
            pulse.consume_life();
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
