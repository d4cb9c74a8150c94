//! Palette marching along a line
//!
//! Every `duration` ms the whole line is repainted with the palette shifted
//! by one color. Kind 2 paints every line of the layout, kind 3 fades
//! between steps instead of snapping.

use heapless::Vec as PaletteVec;

use super::live::{Instance, LiveList, decay_ms, fade_rate, reached};
use super::{
    CycleClock, DEFAULT_DURATION_MS, Direction, Effect, EffectContext, EffectParams, EffectTag,
};
use crate::color::{ColorMath, ColorParam, Rgb, named_color, rgb_from_u32};
use crate::segment::{Segment, SegmentId};

/// Maximum number of palette entries a marquee cycles through
pub const MAX_PALETTE: usize = 16;

const KIND_LINES: u8 = 2;
const KIND_BLEND: u8 = 3;

type Palette = PaletteVec<Rgb, MAX_PALETTE>;

#[derive(Debug, Clone)]
struct Crawl {
    segment: SegmentId,
    kind: u8,
    dir: Direction,
    palette: Palette,
    fade: f32,
    duration: f64,
    /// Palette index painted at the first pixel
    step: usize,
    next_step_ms: f64,
    done: bool,
}

impl Instance for Crawl {
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

impl Crawl {
    /// Paint `line` starting at palette index `self.step`
    fn paint<M: ColorMath + ?Sized>(
        &self,
        segment: &Segment,
        line: &[i32],
        ctx: &mut EffectContext<'_, M>,
    ) {
        let len = line.len();
        let duration_ms = decay_ms(self.duration);
        let mut color_idx = self.step;
        for j in 0..len {
            let px = match self.dir {
                Direction::Forward => j,
                Direction::Backward => len - j - 1,
            };
            let color = self.palette[color_idx];
            segment.set_pixel(ctx.buffer, line[px], color, self.fade, duration_ms);
            color_idx = (color_idx + 1) % self.palette.len();
        }
    }
}

fn resolve_palette<M: ColorMath + ?Sized>(
    color: Option<&ColorParam>,
    ctx: &mut EffectContext<'_, M>,
) -> Palette {
    let mut palette = Palette::new();
    match color {
        Some(ColorParam::List(list)) => {
            for literal in list.iter().take(MAX_PALETTE) {
                let _ = palette.push(literal.resolve(ctx.rng, ctx.math));
            }
        }
        Some(ColorParam::One(literal)) => {
            let _ = palette.push(literal.resolve(ctx.rng, ctx.math));
            let _ = palette.push(Rgb::default());
        }
        None => {
            for name in ["red", "green"] {
                let packed = named_color(name).unwrap_or_default();
                let _ = palette.push(rgb_from_u32(packed));
            }
        }
    }
    palette
}

#[derive(Debug, Clone)]
pub struct MarqueeEffect {
    duration: f64,
    kind: u8,
    dir: Direction,
    pulses: LiveList<Crawl>,
    cycle: CycleClock,
}

impl Default for MarqueeEffect {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            kind: 0,
            dir: Direction::Forward,
            pulses: LiveList::default(),
            cycle: CycleClock::default(),
        }
    }
}

impl MarqueeEffect {
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: u8) -> Self {
        self.kind = kind;
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

impl Effect for MarqueeEffect {
    const TAG: EffectTag = EffectTag::Marquee;

    fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    ) {
        self.cycle.restart(now);

        let kind = params.kind.unwrap_or(self.kind);
        let duration = params.duration.unwrap_or(self.duration);
        let fade = match params.ftb {
            Some(ftb) => fade_rate(ftb),
            None if kind == KIND_BLEND => fade_rate(duration),
            None => 0.0,
        };
        let palette = resolve_palette(params.color.as_ref(), ctx);
        if palette.is_empty() {
            tracing::warn!(segment, "marquee without colors ignored");
            return;
        }

        #[allow(clippy::cast_precision_loss)]
        let next_step_ms = now as f64 - 1.0;
        self.pulses.push(Crawl {
            segment,
            kind,
            dir: params.dir.map_or(self.dir, Direction::from_raw),
            palette,
            fade,
            duration,
            step: 0,
            next_step_ms,
            done: false,
        });
    }

    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        let segments = ctx.segments;
        for crawl in self.pulses.iter_mut() {
            if !reached(now, crawl.next_step_ms) {
                continue;
            }
            crawl.next_step_ms += crawl.duration;

            let Some(segment) = segments.get(crawl.segment) else {
                crawl.done = true;
                continue;
            };
            let layout = segment.layout();
            if crawl.kind == KIND_LINES {
                for line in layout.lines() {
                    crawl.paint(segment, line, ctx);
                }
            } else {
                crawl.paint(segment, layout.line(), ctx);
            }
            crawl.step = (crawl.step + 1) % crawl.palette.len();
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
