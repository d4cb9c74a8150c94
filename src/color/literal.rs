//! Color literals accepted by effect parameters.
//!
//! A literal is a packed `0xRRGGBB` integer, a `"0xRRGGBB"` hex string, a
//! decimal string or one of a small set of names. Anything else resolves to
//! [`CYAN_SENTINEL`] instead of failing.

use alloc::string::String;
use alloc::vec::Vec;

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ColorMath, Rgb, rgb_from_u32};

/// Color used when a literal cannot be understood
pub const CYAN_SENTINEL: u32 = 0x00_ffff;

const RANDOM_SATURATION: f32 = 1.0;
const RANDOM_VALUE: f32 = 0.8;

/// Packed value of a named color, `random` excluded
pub fn named_color(name: &str) -> Option<u32> {
    Some(match name {
        "gold" => 0xd4_af37,
        "silver" => 0xaa_a9ad,
        "white" => 0xbb_bbbb,
        "red" => 0xff_0000,
        "orange" => 0xff_a500,
        "yellow" => 0xff_ff33,
        "green" => 0x00_ff00,
        "blue" => 0x19_40ff,
        "indigo" => 0x4b_0082,
        "violet" => 0x8f_00ff,
        _ => return None,
    })
}

/// A single color literal as written in a timeline file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorLiteral {
    Packed(u32),
    Text(String),
    Other(Value),
}

impl ColorLiteral {
    /// Resolve the literal to a color.
    ///
    /// `random` draws a fresh hue on every call.
    pub fn resolve<M: ColorMath + ?Sized>(&self, rng: &mut Rng, math: &M) -> Rgb {
        match self {
            Self::Packed(value) => rgb_from_u32(*value),
            Self::Text(text) => {
                let lowered = text.trim().to_ascii_lowercase();
                if lowered == "random" {
                    return math.hsv_to_rgb(rng.f32(), RANDOM_SATURATION, RANDOM_VALUE);
                }
                rgb_from_u32(parse_text(&lowered))
            }
            Self::Other(_) => rgb_from_u32(CYAN_SENTINEL),
        }
    }
}

impl From<u32> for ColorLiteral {
    fn from(value: u32) -> Self {
        Self::Packed(value)
    }
}

impl From<&str> for ColorLiteral {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

/// The `color` parameter: one literal or a palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorParam {
    List(Vec<ColorLiteral>),
    One(ColorLiteral),
}

impl ColorParam {
    /// Literal at palette position `index`, wrapping around the palette
    pub fn at(&self, index: usize) -> Option<&ColorLiteral> {
        match self {
            Self::One(literal) => Some(literal),
            Self::List(items) if items.is_empty() => None,
            Self::List(items) => items.get(index % items.len()),
        }
    }

    /// Resolve the literal at `index`; an empty palette gives the sentinel
    pub fn resolve_at<M: ColorMath + ?Sized>(&self, index: usize, rng: &mut Rng, math: &M) -> Rgb {
        self.at(index)
            .map_or(rgb_from_u32(CYAN_SENTINEL), |literal| literal.resolve(rng, math))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

impl From<u32> for ColorParam {
    fn from(value: u32) -> Self {
        Self::One(value.into())
    }
}

impl From<&str> for ColorParam {
    fn from(value: &str) -> Self {
        Self::One(value.into())
    }
}

fn parse_text(text: &str) -> u32 {
    if let Some(name) = named_color(text) {
        return name;
    }
    if let Some(hex) = text.strip_prefix("0x") {
        let channel = |range: core::ops::Range<usize>| {
            hex.get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map_or(0, u32::from)
        };
        return channel(0..2) << 16 | channel(2..4) << 8 | channel(4..6);
    }
    parse_leading_decimal(text).unwrap_or(CYAN_SENTINEL)
}

/// Leading decimal digits of `text`, ignoring whatever follows them
fn parse_leading_decimal(text: &str) -> Option<u32> {
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(text.len(), |(index, _)| index);
    text[..end].parse().ok()
}
