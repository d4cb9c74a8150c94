//! Continuous hue fields
//!
//! Unlike the pulse effects, a rainbow keeps exactly one field per segment
//! and repaints the whole segment on every idle pass.
//!
//! Kinds:
//! - 0: hue follows each pixel's angle, cycling once per `duration`
//! - 1: same, over the alternate `cangles`
//! - 2: hue follows the position within each line
//! - 3: rings around the bottom center of the horizontal grid ("sunrise")
//! - 5: rings around the grid center
//! - 6: rings around a center that wanders to a random spot every `duration`

use alloc::vec::Vec;

use libm::floorf;

use super::live::reached;
use super::{
    CycleClock, DEFAULT_DURATION_MS, Effect, EffectContext, EffectParams, EffectTag,
    HOLD_DURATION_MS,
};
use crate::color::ColorMath;
use crate::layout::{LineSet, NO_PIXEL};
use crate::segment::SegmentId;

const DEFAULT_SATURATION: f32 = 1.0;
const DEFAULT_VALUE: f32 = 0.8;
const DEGREES: f32 = 360.0;

const KIND_ALT_SCAN: u8 = 1;
const KIND_LINES: u8 = 2;
const KIND_SUNRISE: u8 = 3;
const KIND_TARGET: u8 = 5;
const KIND_MOVING_TARGET: u8 = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

/// Rainbow state of one segment
#[derive(Debug, Clone, PartialEq)]
struct HueField {
    segment: SegmentId,
    kind: u8,
    dir: i8,
    duration_ms: u64,
    step_per_ms: f32,
    lines: LineSet,
    saturation: f32,
    value: f32,
    width: f32,
    height: f32,
    center: Point,
    dest: Point,
    velocity: Point,
    motion_start: u64,
    last_moved_ms: u64,
}

impl HueField {
    fn new(segment: SegmentId) -> Self {
        Self {
            segment,
            kind: 0,
            dir: 1,
            duration_ms: 1000,
            step_per_ms: 1.0 / 1000.0,
            lines: LineSet::Lines,
            saturation: DEFAULT_SATURATION,
            value: DEFAULT_VALUE,
            width: 0.0,
            height: 0.0,
            center: Point::default(),
            dest: Point::default(),
            velocity: Point::default(),
            motion_start: 0,
            last_moved_ms: 0,
        }
    }

    /// Start moving from the previous destination towards a new random one
    #[allow(clippy::cast_precision_loss)]
    fn setup_moving(&mut self, now: u64, rng: &mut fastrand::Rng) {
        let duration = self.duration_ms as f32;
        self.center = self.dest;
        self.dest = Point {
            x: rng.f32() * self.width,
            y: rng.f32() * self.height,
        };
        self.velocity = Point {
            x: (self.dest.x - self.center.x) / duration,
            y: (self.dest.y - self.center.y) / duration,
        };
        self.motion_start = now;
    }

    /// Hue for a grid cell at distance `(dx, dy)` from the field center
    fn target_hue<M: ColorMath + ?Sized>(
        &self,
        math: &M,
        dx: f32,
        dy: f32,
        span: f32,
        offset: f32,
    ) -> f32 {
        let hue = math.hue_dist(dx, dy, span);
        if self.dir == 1 {
            let hue = hue - offset;
            if hue < 0.0 { hue - floorf(hue) } else { hue }
        } else {
            let hue = hue + offset;
            hue - floorf(hue)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RainbowEffect {
    duration: f64,
    kind: u8,
    dir: i8,
    fields: Vec<HueField>,
    cycle: CycleClock,
}

impl Default for RainbowEffect {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            kind: 0,
            dir: 1,
            fields: Vec::new(),
            cycle: CycleClock::default(),
        }
    }
}

impl RainbowEffect {
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
    pub fn with_direction(mut self, dir: i8) -> Self {
        self.dir = dir;
        self
    }

    /// Segments currently painted by this effect
    pub fn segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.fields.iter().map(|field| field.segment)
    }

    pub const fn cycle(&self) -> &CycleClock {
        &self.cycle
    }

    fn field_mut(&mut self, segment: SegmentId) -> &mut HueField {
        let index = match self.fields.iter().position(|f| f.segment == segment) {
            Some(index) => index,
            None => {
                self.fields.push(HueField::new(segment));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }
}

impl Effect for RainbowEffect {
    const TAG: EffectTag = EffectTag::Rainbow;

    fn init<M: ColorMath + ?Sized>(
        &mut self,
        segment: SegmentId,
        _ctx: &mut EffectContext<'_, M>,
    ) {
        self.field_mut(segment).last_moved_ms = 0;
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
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
        let dir = params.dir.unwrap_or(self.dir);
        let duration_ms = params.duration.unwrap_or(self.duration).max(1.0) as u64;
        let lines = if kind == KIND_LINES {
            LineSet::from_variant(params.variant.or(Some(1)), ctx.rng)
        } else {
            LineSet::Lines
        };
        let width = layout.linesh().first().map_or(0, Vec::len) as f32;
        let height = layout.linesh().len() as f32;

        let field = self.field_mut(segment);
        field.kind = kind;
        field.dir = dir;
        field.duration_ms = duration_ms;
        field.step_per_ms = 1.0 / duration_ms as f32;
        field.lines = lines;
        field.saturation = DEFAULT_SATURATION;
        field.value = DEFAULT_VALUE;
        field.width = width;
        field.height = height;
        field.dest = Point {
            x: width / 2.0,
            y: height / 2.0,
        };
        field.setup_moving(now, ctx.rng);
    }

    #[allow(clippy::cast_precision_loss)]
    fn idle<M: ColorMath + ?Sized>(&mut self, now: u64, ctx: &mut EffectContext<'_, M>) {
        let segments = ctx.segments;
        for field in &mut self.fields {
            let Some(segment) = segments.get(field.segment) else {
                continue;
            };
            let layout = segment.layout();

            let mut motion_elapsed = now.saturating_sub(field.motion_start);
            if reached(motion_elapsed, field.duration_ms as f64) {
                field.setup_moving(now, ctx.rng);
                motion_elapsed = 0;
            }
            let progress = (motion_elapsed % field.duration_ms) as f32;
            let moving = Point {
                x: field.center.x + field.velocity.x * progress,
                y: field.center.y + field.velocity.y * progress,
            };

            let phase = now.saturating_sub(field.last_moved_ms) % field.duration_ms;
            let mut offset = phase as f32 * field.step_per_ms;
            if field.dir == -1 {
                offset = 1.0 - offset;
            }

            let mut paint = |pixel: i32, hue: f32| {
                let color = ctx.math.hsv_to_rgb(hue, field.saturation, field.value);
                segment.set_pixel(ctx.buffer, pixel, color, 0.0, HOLD_DURATION_MS);
            };

            match field.kind {
                KIND_LINES => {
                    for line in layout.lines_for(field.lines) {
                        let len = line.len() as f32;
                        for (j, &pixel) in line.iter().enumerate() {
                            let hue = j as f32 / len + offset;
                            paint(pixel, hue - floorf(hue));
                        }
                    }
                }
                KIND_SUNRISE | KIND_TARGET | KIND_MOVING_TARGET => {
                    let grid = layout.linesh();
                    let h = grid.len() as f32;
                    let w = grid.first().map_or(0, Vec::len) as f32;
                    let center = match field.kind {
                        KIND_SUNRISE => Point { x: w / 2.0, y: h },
                        KIND_TARGET => Point {
                            x: w / 2.0,
                            y: h / 2.0,
                        },
                        _ => moving,
                    };
                    for (y, row) in grid.iter().enumerate() {
                        for (x, &pixel) in row.iter().enumerate() {
                            if pixel == NO_PIXEL {
                                continue;
                            }
                            let dx = x as f32 - center.x;
                            let dy = y as f32 - center.y;
                            let hue = field.target_hue(ctx.math, dx, dy, w, offset);
                            paint(pixel, hue);
                        }
                    }
                }
                kind => {
                    let angles = if kind == KIND_ALT_SCAN {
                        layout.cangles()
                    } else {
                        layout.angles()
                    };
                    for (i, &angle) in angles.iter().enumerate() {
                        let hue = angle / DEGREES + offset;
                        let Ok(pixel) = i32::try_from(i) else {
                            break;
                        };
                        paint(pixel, hue - floorf(hue));
                    }
                }
            }
        }
    }

    fn term(&mut self, segment: SegmentId) {
        self.fields.retain(|field| field.segment != segment);
    }

    fn op_first(&mut self, now: u64) {
        self.cycle.advance(now);
    }

    fn live_instances(&self) -> usize {
        self.fields.len()
    }
}
