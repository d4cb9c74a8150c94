//! Pixel-address layouts
//!
//! A [`Layout`] maps the logical shape of one display region (a strip, a
//! star, a grid, a seven-segment clock) onto its contiguous window of
//! physical pixels. Layouts are described by [`LayoutSpec`] records: a named
//! prototype from the [`PrototypeTable`] merged with the per-device
//! overrides, then expanded by [`LayoutBuilder`] into every grouping the
//! effects ask for.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::ChannelOrder;

/// Marks a logical slot with no physical pixel behind it
pub const NO_PIXEL: i32 = -1;

/// Ordered pixel indices, local to the layout
pub type PixelLine = Vec<i32>;

const SEVEN_SEGMENT_WIDTH: usize = 17;
const SEVEN_SEGMENT_HEIGHT: usize = 7;
const SEVEN_SEGMENT_DIGITS: usize = 4;
const COLON_COLUMN: usize = 8;

/// Layout description shared by prototypes and device entries.
///
/// Every field is optional so that a device entry can override any part of
/// its prototype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSpec {
    /// Prototype identifier, set on prototype table entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tok: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prototype this entry is based on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub len: Option<usize>,
    /// Explicit first physical pixel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<ChannelOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<PixelLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<PixelLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linesh: Option<Vec<PixelLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linesv: Option<Vec<PixelLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digits: Option<Vec<PixelLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colon: Option<PixelLine>,
    /// Seven-segment table: `[digit][segment] -> pixels`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Vec<PixelLine>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    /// Per-line start position for center-out effects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<PixelLine>,
    /// Wide lines: `[line][position] -> pixels`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross: Option<Vec<Vec<PixelLine>>>,
    /// Angle of every pixel in degrees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angles: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cangles: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<u8>,
}

impl LayoutSpec {
    /// Create a device entry referencing a prototype
    pub fn device(name: &str, layout_id: &str) -> Self {
        Self {
            name: Some(name.into()),
            layout_id: Some(layout_id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_len(mut self, len: usize) -> Self {
        self.len = Some(len);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: PixelLine) -> Self {
        self.line = Some(line);
        self
    }
}

/// Overlay `overrides` on `prototype`; every field present in `overrides` wins.
pub fn merge_layout_spec(prototype: &LayoutSpec, overrides: &LayoutSpec) -> LayoutSpec {
    macro_rules! merged {
        ($($field:ident),* $(,)?) => {
            LayoutSpec {
                $($field: overrides.$field.clone().or_else(|| prototype.$field.clone()),)*
            }
        };
    }

    merged!(
        tok, name, layout_id, len, offset, brightness, order, line, lines, linesh, linesv,
        digits, colon, segments, width, height, center, cross, angles, cangles, clock,
    )
}

/// Named layout shapes that device entries refer to by `layout_id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrototypeTable {
    prototypes: Vec<LayoutSpec>,
}

impl PrototypeTable {
    pub const fn new() -> Self {
        Self {
            prototypes: Vec::new(),
        }
    }

    /// Table with the shapes shipped with the library
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert(LayoutSpec {
            tok: Some("LINE".into()),
            len: Some(50),
            ..LayoutSpec::default()
        });
        table.insert(star_prototype());
        table.insert(clock_prototype());
        table
    }

    /// Add a prototype, replacing any previous one with the same `tok`
    pub fn insert(&mut self, prototype: LayoutSpec) {
        self.prototypes.retain(|known| known.tok != prototype.tok);
        self.prototypes.push(prototype);
    }

    pub fn find(&self, id: &str) -> Option<&LayoutSpec> {
        self.prototypes
            .iter()
            .find(|prototype| prototype.tok.as_deref() == Some(id))
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

/// Five-armed star, arms of six pixels running outward
fn star_prototype() -> LayoutSpec {
    const ARMS: i32 = 5;
    const ARM_LENGTH: i32 = 6;

    let lines = (0..ARMS)
        .map(|arm| (arm * ARM_LENGTH..(arm + 1) * ARM_LENGTH).collect())
        .collect();
    LayoutSpec {
        tok: Some("ZTR1".into()),
        len: Some((ARMS * ARM_LENGTH).unsigned_abs() as usize),
        lines: Some(lines),
        ..LayoutSpec::default()
    }
}

/// Four-digit clock with two pixels per segment and a two-pixel colon
fn clock_prototype() -> LayoutSpec {
    const SEGMENTS: i32 = 7;
    const PIXELS_PER_SEGMENT: i32 = 2;
    const DIGIT_PIXELS: i32 = SEGMENTS * PIXELS_PER_SEGMENT;

    let segments = (0..4)
        .map(|digit| {
            (0..SEGMENTS)
                .map(|segment| {
                    let first = digit * DIGIT_PIXELS + segment * PIXELS_PER_SEGMENT;
                    (first..first + PIXELS_PER_SEGMENT).collect()
                })
                .collect()
        })
        .collect();
    let colon_start = 4 * DIGIT_PIXELS;

    LayoutSpec {
        tok: Some("CLK4".into()),
        len: Some((colon_start + 2).unsigned_abs() as usize),
        segments: Some(segments),
        colon: Some(vec![colon_start, colon_start + 1]),
        width: Some(SEVEN_SEGMENT_WIDTH),
        height: Some(SEVEN_SEGMENT_HEIGHT),
        clock: Some(1),
        ..LayoutSpec::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// Neither the entry nor its prototype gives a length
    MissingLength,
    /// `layout_id` names no prototype and the entry cannot stand alone
    UnknownPrototype,
    /// The pixel window ends past [`MAX_DEVICE_PIXELS`]
    OffsetOverflow,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLength => write!(f, "layout has no length"),
            Self::UnknownPrototype => write!(f, "layout references an unknown prototype"),
            Self::OffsetOverflow => write!(f, "layout window exceeds the pixel range"),
        }
    }
}

/// Line grouping chosen by an effect's `variant` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSet {
    Lines,
    Horizontal,
    Vertical,
    Digits,
}

impl LineSet {
    /// Map a variant number to a grouping; variant 4 picks one at random.
    pub fn from_variant(variant: Option<u8>, rng: &mut Rng) -> Self {
        let variant = match variant {
            Some(4) => rng.u8(0..4),
            Some(other) => other,
            None => 0,
        };
        match variant {
            1 => Self::Horizontal,
            2 => Self::Vertical,
            3 => Self::Digits,
            _ => Self::Lines,
        }
    }
}

/// Physical grid of a seven-segment display
#[derive(Debug, Clone, PartialEq)]
pub struct SevenSegmentGrid {
    width: usize,
    height: usize,
    /// `loc[x][y]` holds the pixel at a grid cell, or [`NO_PIXEL`]
    loc: Vec<PixelLine>,
    /// Grid cell of every pixel
    xy: Vec<Option<(usize, usize)>>,
}

impl SevenSegmentGrid {
    fn build(
        segments: &[Vec<PixelLine>],
        colon: &[i32],
        width: usize,
        height: usize,
        length: usize,
    ) -> Self {
        let mut loc = vec![vec![NO_PIXEL; height]; width];
        let mut set_column = |x: usize, column: [i32; SEVEN_SEGMENT_HEIGHT]| {
            if let Some(cells) = loc.get_mut(x) {
                for (cell, pixel) in cells.iter_mut().zip(column) {
                    *cell = pixel;
                }
            }
        };

        let colon_at = |i: usize| colon.get(i).copied().unwrap_or(NO_PIXEL);
        let colon_column = if colon.len() == SEVEN_SEGMENT_HEIGHT {
            core::array::from_fn(colon_at)
        } else {
            [NO_PIXEL, NO_PIXEL, colon_at(0), NO_PIXEL, colon_at(1), NO_PIXEL, NO_PIXEL]
        };
        set_column(COLON_COLUMN, colon_column);

        for digit in 0..SEVEN_SEGMENT_DIGITS {
            let px = |segment: usize, k: usize| {
                segments
                    .get(digit)
                    .and_then(|d| d.get(segment))
                    .and_then(|s| s.get(k))
                    .copied()
                    .unwrap_or(NO_PIXEL)
            };
            let n = NO_PIXEL;
            let bx = digit * 4 + usize::from(digit > 1);
            set_column(bx, [n, px(1, 0), px(1, 1), n, px(2, 0), px(2, 1), n]);
            set_column(bx + 1, [px(0, 1), n, n, px(6, 1), n, n, px(3, 1)]);
            set_column(bx + 2, [px(0, 0), n, n, px(6, 0), n, n, px(3, 0)]);
            set_column(bx + 3, [n, px(5, 0), px(5, 1), n, px(4, 0), px(4, 1), n]);
        }

        let mut xy = vec![None; length];
        for (x, column) in loc.iter().enumerate() {
            for (y, &pixel) in column.iter().enumerate() {
                if let Some(slot) = usize::try_from(pixel).ok().and_then(|p| xy.get_mut(p)) {
                    *slot = Some((x, y));
                }
            }
        }

        Self {
            width,
            height,
            loc,
            xy,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at grid cell `(x, y)`
    pub fn pixel_at(&self, x: usize, y: usize) -> i32 {
        self.loc
            .get(x)
            .and_then(|column| column.get(y))
            .copied()
            .unwrap_or(NO_PIXEL)
    }

    /// Grid cell of `pixel`
    pub fn position_of(&self, pixel: usize) -> Option<(usize, usize)> {
        self.xy.get(pixel).copied().flatten()
    }

    fn rows(&self) -> Vec<PixelLine> {
        (0..self.height)
            .map(|y| (0..self.width).map(|x| self.pixel_at(x, y)).collect())
            .collect()
    }

    fn columns(&self) -> Vec<PixelLine> {
        self.loc.clone()
    }
}

/// Pixel-address mapping for one display region
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    length: usize,
    offset: usize,
    brightness: Option<u8>,
    order: ChannelOrder,
    line: PixelLine,
    lines: Vec<PixelLine>,
    linesh: Vec<PixelLine>,
    linesv: Vec<PixelLine>,
    digits: Vec<PixelLine>,
    colon: PixelLine,
    center: Option<PixelLine>,
    cross: Option<Vec<Vec<PixelLine>>>,
    angles: Vec<f32>,
    cangles: Option<Vec<f32>>,
    grid: Option<SevenSegmentGrid>,
    clock: bool,
    pix_on: Vec<Option<bool>>,
}

impl Layout {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of physical pixels owned
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// First physical pixel
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn line(&self) -> &[i32] {
        &self.line
    }

    /// Half-lines reading outward from the middle, unless the shape says otherwise
    pub fn lines(&self) -> &[PixelLine] {
        &self.lines
    }

    pub fn linesh(&self) -> &[PixelLine] {
        &self.linesh
    }

    pub fn linesv(&self) -> &[PixelLine] {
        &self.linesv
    }

    pub fn digits(&self) -> &[PixelLine] {
        &self.digits
    }

    pub fn colon(&self) -> &[i32] {
        &self.colon
    }

    pub fn center(&self) -> Option<&[i32]> {
        self.center.as_deref()
    }

    pub fn cross(&self) -> Option<&[Vec<PixelLine>]> {
        self.cross.as_deref()
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    /// Angles for the alternate rainbow scan, falling back to `angles`
    pub fn cangles(&self) -> &[f32] {
        self.cangles.as_deref().unwrap_or(&self.angles)
    }

    pub fn grid(&self) -> Option<&SevenSegmentGrid> {
        self.grid.as_ref()
    }

    pub fn is_clock(&self) -> bool {
        self.clock
    }

    pub fn lines_for(&self, set: LineSet) -> &[PixelLine] {
        match set {
            LineSet::Lines => &self.lines,
            LineSet::Horizontal => &self.linesh,
            LineSet::Vertical => &self.linesv,
            LineSet::Digits => &self.digits,
        }
    }

    /// Switch a seven-segment pixel on or off; other layouts ignore it.
    pub fn set_pixel_on(&mut self, pixel: usize, on: bool) {
        if let Some(slot) = self.pix_on.get_mut(pixel) {
            *slot = Some(on);
        }
    }

    /// `false` when writes to `pixel` must be blanked
    pub fn is_pixel_on(&self, pixel: usize) -> bool {
        self.pix_on.get(pixel).copied().flatten() != Some(false)
    }
}

/// Pixels one device may address across all of its layouts
pub const MAX_DEVICE_PIXELS: usize = 1 << 16;

/// Builds the layouts of one device, assigning consecutive pixel windows.
///
/// One builder covers one rebuild of all segments; a rebuild starts over
/// with a new builder at offset zero.
pub struct LayoutBuilder<'a> {
    prototypes: &'a PrototypeTable,
    next_offset: usize,
}

impl<'a> LayoutBuilder<'a> {
    pub const fn new(prototypes: &'a PrototypeTable) -> Self {
        Self {
            prototypes,
            next_offset: 0,
        }
    }

    /// Total pixels claimed so far
    pub const fn total_length(&self) -> usize {
        self.next_offset
    }

    pub fn build(&mut self, entry: &LayoutSpec) -> Result<Layout, LayoutError> {
        let prototype = match entry.layout_id.as_deref() {
            Some(id) => {
                let found = self.prototypes.find(id);
                if found.is_none() {
                    if entry.len.is_none() && entry.line.is_none() {
                        return Err(LayoutError::UnknownPrototype);
                    }
                    tracing::warn!(layout_id = id, "unknown layout prototype");
                }
                found
            }
            None => None,
        };
        let spec = match prototype {
            Some(prototype) => merge_layout_spec(prototype, entry),
            None => entry.clone(),
        };

        let length = spec
            .len
            .or_else(|| spec.line.as_ref().map(Vec::len))
            .ok_or(LayoutError::MissingLength)?;
        let offset = spec.offset.unwrap_or(self.next_offset);
        let within = |start: usize| {
            start
                .checked_add(length)
                .filter(|&end| end <= MAX_DEVICE_PIXELS)
        };
        let (Some(_), Some(next_offset)) = (within(offset), within(self.next_offset)) else {
            return Err(LayoutError::OffsetOverflow);
        };
        self.next_offset = next_offset;

        Ok(expand(spec, length, offset))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn identity_line(length: usize) -> PixelLine {
    (0..length).map(|i| i as i32).collect()
}

/// Split `line` at the middle into two halves that both read outward
fn split_from_center(line: &[i32], length: usize) -> Vec<PixelLine> {
    let center = length / 2;
    let at = |i: usize| line.get(i).copied().unwrap_or(NO_PIXEL);
    let inward = (0..center).map(|i| at(center - i - 1)).collect();
    let outward = (0..center).map(|i| at(center + i)).collect();
    vec![inward, outward]
}

#[allow(clippy::cast_precision_loss)]
fn expand(spec: LayoutSpec, length: usize, offset: usize) -> Layout {
    let line = spec.line.unwrap_or_else(|| identity_line(length));
    let lines = spec
        .lines
        .unwrap_or_else(|| split_from_center(&line, length));
    let colon = spec.colon.unwrap_or_default();

    let grid = spec.segments.as_ref().map(|segments| {
        SevenSegmentGrid::build(
            segments,
            &colon,
            spec.width.unwrap_or(SEVEN_SEGMENT_WIDTH),
            spec.height.unwrap_or(SEVEN_SEGMENT_HEIGHT),
            length,
        )
    });

    let (linesh, linesv, digits) = match (&grid, &spec.segments) {
        (Some(grid), Some(segments)) => (
            spec.linesh.unwrap_or_else(|| grid.rows()),
            spec.linesv.unwrap_or_else(|| grid.columns()),
            spec.digits.unwrap_or_else(|| {
                segments
                    .iter()
                    .map(|digit| digit.iter().flatten().copied().collect())
                    .collect()
            }),
        ),
        _ => (
            spec.linesh.unwrap_or_else(|| lines.clone()),
            spec.linesv.unwrap_or_else(|| lines.clone()),
            spec.digits.unwrap_or_else(|| lines.clone()),
        ),
    };

    let angles = spec.angles.unwrap_or_else(|| {
        let step = 360.0 / line.len().max(1) as f32;
        (0..line.len()).map(|k| k as f32 * step).collect()
    });
    let pix_on = if grid.is_some() {
        vec![None; length]
    } else {
        Vec::new()
    };

    Layout {
        name: spec.name.or(spec.layout_id).unwrap_or_default(),
        length,
        offset,
        brightness: spec.brightness,
        order: spec.order.unwrap_or_default(),
        line,
        lines,
        linesh,
        linesv,
        digits,
        colon,
        center: spec.center,
        cross: spec.cross,
        angles,
        cangles: spec.cangles,
        grid,
        clock: spec.clock.is_some_and(|clock| clock != 0),
        pix_on,
    }
}
