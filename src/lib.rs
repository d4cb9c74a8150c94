#![no_std]

extern crate alloc;

pub mod clock;
pub mod color;
pub mod effect;
pub mod frame_scheduler;
pub mod intent;
pub mod layout;
pub mod pixel_buffer;
pub mod renderer;
pub mod segment;
pub mod storage;
pub mod timeline;

pub use clock::ShowClock;
pub use color::{ChannelOrder, ColorMath, Rgb, SoftwareColorMath};
pub use effect::{EffectParams, EffectRegistry, EffectSlot, EffectTag};
pub use frame_scheduler::{FrameResult, FrameScheduler};
pub use intent::{IntentChannel, IntentError, IntentReceiver, IntentSender, ShowIntent};
pub use layout::{Layout, LayoutBuilder, LayoutError, LayoutSpec, PrototypeTable};
pub use pixel_buffer::PixelBuffer;
pub use renderer::{Renderer, ShowConfig};
pub use segment::{Segment, SegmentId};
pub use storage::{DeviceFile, MemoryStore, ShowStore, StoreError};
pub use timeline::{
    NextMode, SegmentTarget, SequenceFile, SequenceRequest, Stage, TimelineEntry, TimelineSequencer,
    TimelineStep,
};

pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms. Each word
/// is one pixel, already brightness-scaled and packed in the layout's
/// channel order.
pub trait OutputDriver {
    /// Write one frame to the LEDs
    fn write(&mut self, frame: &[u32]);
}
