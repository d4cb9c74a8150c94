//! Pixel math used by effects and by the frame flush.
//!
//! The engine only depends on the [`ColorMath`] trait, so a platform can
//! plug in accelerated routines. [`SoftwareColorMath`] is the portable
//! implementation used by default and in tests.

use libm::{fmodf, sqrtf};
use serde::{Deserialize, Serialize};

use super::{Rgb, scale_color};

/// Channel order of the physical LED chips
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    #[default]
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "GRB")]
    Grb,
    #[serde(rename = "RGBW")]
    Rgbw,
}

pub trait ColorMath {
    /// Convert a hue/saturation/value triple (all 0.0 - 1.0) to RGB
    fn hsv_to_rgb(&self, hue: f32, saturation: f32, value: f32) -> Rgb;

    /// Normalized radial distance of `(dx, dy)` relative to `span`
    fn hue_dist(&self, dx: f32, dy: f32, span: f32) -> f32;

    /// Advance every pixel's decay by `elapsed_ms`, writing into `out`.
    ///
    /// `rates` holds the per-ms scale of each pixel and `remaining` its
    /// remaining decay time, which is consumed by this call.
    fn decay(
        &self,
        elapsed_ms: u32,
        colors: &[Rgb],
        out: &mut [Rgb],
        rates: &[f32],
        remaining: &mut [u32],
    );

    /// Apply brightness and pack the color into a native output word
    fn brightness_convert(&self, color: Rgb, brightness: u8, order: ChannelOrder) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareColorMath;

impl ColorMath for SoftwareColorMath {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::many_single_char_names
    )]
    fn hsv_to_rgb(&self, hue: f32, saturation: f32, value: f32) -> Rgb {
        let mut hue = fmodf(hue, 1.0);
        if hue < 0.0 {
            hue += 1.0;
        }
        let s = saturation.clamp(0.0, 1.0);
        let v = value.clamp(0.0, 1.0);

        let sector = (hue * 6.0) as u8;
        let f = hue * 6.0 - f32::from(sector);
        let p = v * (1.0 - s);
        let q = v * (1.0 - f * s);
        let t = v * (1.0 - (1.0 - f) * s);

        let (r, g, b) = match sector {
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            5 => (v, p, q),
            _ => (v, t, p),
        };

        Rgb {
            r: (r * 255.0) as u8,
            g: (g * 255.0) as u8,
            b: (b * 255.0) as u8,
        }
    }

    fn hue_dist(&self, dx: f32, dy: f32, span: f32) -> f32 {
        if span == 0.0 {
            return 0.0;
        }
        sqrtf(dx * dx + dy * dy) / span
    }

    #[allow(clippy::cast_precision_loss)]
    fn decay(
        &self,
        elapsed_ms: u32,
        colors: &[Rgb],
        out: &mut [Rgb],
        rates: &[f32],
        remaining: &mut [u32],
    ) {
        let pixels = colors
            .iter()
            .zip(out.iter_mut())
            .zip(rates.iter().zip(remaining.iter_mut()));

        for ((color, out), (&rate, remaining)) in pixels {
            if rate == 0.0 {
                *out = *color;
                continue;
            }
            // An exhausted pixel keeps its last output until rewritten
            if *remaining == 0 {
                continue;
            }

            let amount = if *remaining < elapsed_ms {
                *remaining = 0;
                if rate < 0.0 { 1.0 } else { 0.0 }
            } else {
                *remaining -= elapsed_ms;
                let left = *remaining as f32;
                if rate < 0.0 {
                    let amount = 1.0 + rate * left;
                    if (0.0..=1.0).contains(&amount) { amount } else { 1.0 }
                } else {
                    (rate * left).min(1.0)
                }
            };

            *out = scale_color(*color, amount);
        }
    }

    fn brightness_convert(&self, color: Rgb, brightness: u8, order: ChannelOrder) -> u32 {
        let scale = |channel: u8| (u32::from(channel) * u32::from(brightness)) >> 8;
        let (r, g, b) = (scale(color.r), scale(color.g), scale(color.b));

        match order {
            ChannelOrder::Rgb => r << 16 | g << 8 | b,
            ChannelOrder::Grb => g << 16 | r << 8 | b,
            ChannelOrder::Rgbw => r << 24 | g << 16 | b << 8,
        }
    }
}
