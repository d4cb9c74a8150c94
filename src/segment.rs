use crate::color::Rgb;
use crate::effect::EffectTag;
use crate::layout::Layout;
use crate::pixel_buffer::PixelBuffer;

/// Index of a segment within the current device
pub type SegmentId = usize;

/// A layout together with the effect currently driving it
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    layout: Layout,
    action: Option<EffectTag>,
}

impl Segment {
    pub const fn new(layout: Layout) -> Self {
        Self {
            layout,
            action: None,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Effect attached by the sequencer, if any
    pub const fn action(&self) -> Option<EffectTag> {
        self.action
    }

    pub(crate) fn set_action(&mut self, action: Option<EffectTag>) {
        self.action = action;
    }

    /// Write a layout-local pixel into the shared buffer.
    ///
    /// [`NO_PIXEL`](crate::layout::NO_PIXEL) and other negative indices are
    /// dropped, and pixels switched off in the layout are written black.
    pub fn set_pixel(
        &self,
        buffer: &mut PixelBuffer,
        pixel: i32,
        color: Rgb,
        rate: f32,
        duration_ms: u32,
    ) {
        let Ok(pixel) = usize::try_from(pixel) else {
            return;
        };
        let color = if self.layout.is_pixel_on(pixel) {
            color
        } else {
            Rgb::default()
        };
        if let Some(index) = pixel.checked_add(self.layout.offset()) {
            buffer.set_pixel(index, color, rate, duration_ms);
        }
    }
}
