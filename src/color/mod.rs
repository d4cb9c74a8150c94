//! Color types, literal parsing and the pixel math strategy.

mod literal;
mod math;
mod utils;

pub use literal::{CYAN_SENTINEL, ColorLiteral, ColorParam, named_color};
pub use math::{ChannelOrder, ColorMath, SoftwareColorMath};
use smart_leds::RGB8;
pub use utils::{rgb_from_u32, rgb_to_u32, scale_color};

pub type Rgb = RGB8;
