use crate::color::Rgb;

/// Create an RGB color from a u32 value (0xRRGGBB format)
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}

/// Pack an RGB color into a u32 value (0xRRGGBB format)
#[allow(clippy::cast_lossless)]
pub const fn rgb_to_u32(color: Rgb) -> u32 {
    (color.r as u32) << 16 | (color.g as u32) << 8 | color.b as u32
}

/// Scale every channel of a color by `amount` (0.0 - 1.0)
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_color(color: Rgb, amount: f32) -> Rgb {
    let amount = amount.clamp(0.0, 1.0);
    Rgb {
        r: (f32::from(color.r) * amount) as u8,
        g: (f32::from(color.g) * amount) as u8,
        b: (f32::from(color.b) * amount) as u8,
    }
}
