use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use embassy_time::Instant;
use fastrand::Rng;

use crate::clock::{NORMAL_SPEED, scale_ms};
use crate::color::{ColorMath, Rgb};
use crate::effect::EffectRegistry;
use crate::intent::{IntentReceiver, ShowIntent};
use crate::layout::PrototypeTable;
use crate::pixel_buffer::PixelBuffer;
use crate::segment::Segment;
use crate::storage::{DEFAULT_NAME, DeviceFile, ShowStore, builtin_sequence};
use crate::timeline::{NextMode, SequenceFile, SequenceRequest, Stage, TimelineSequencer};

/// Display brightness used by layouts that do not set their own
pub const DEFAULT_BRIGHTNESS: u8 = 36;

const DEFAULT_SEED: u64 = 0x5eed_1ed5;

/// Sequence switches followed within one frame before the rest is dropped
const MAX_SWITCHES_PER_FRAME: usize = 4;

/// Configuration for the show renderer
#[derive(Debug, Clone)]
pub struct ShowConfig {
    pub brightness: u8,
    /// Show speed in percent
    pub speed: u16,
    pub device: String,
    pub sequence: String,
    /// Seed of the generator behind every random choice
    pub seed: u64,
    pub prototypes: PrototypeTable,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            speed: NORMAL_SPEED,
            device: DEFAULT_NAME.into(),
            sequence: DEFAULT_NAME.into(),
            seed: DEFAULT_SEED,
            prototypes: PrototypeTable::builtin(),
        }
    }
}

impl ShowConfig {
    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: &str) -> Self {
        self.device = device.into();
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: &str) -> Self {
        self.sequence = sequence.into();
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_prototypes(mut self, prototypes: PrototypeTable) -> Self {
        self.prototypes = prototypes;
        self
    }
}

/// Borrow the parts of a renderer the sequencer drives
macro_rules! stage {
    ($renderer:expr) => {
        Stage {
            segments: &mut $renderer.segments,
            registry: &mut $renderer.registry,
            buffer: &mut $renderer.buffer,
            math: &$renderer.math,
            rng: &mut $renderer.rng,
        }
    };
}

/// Show renderer - owns the display state and runs one frame per call
pub struct Renderer<'a, S: ShowStore, M: ColorMath, const INTENT_CHANNEL_SIZE: usize> {
    // External dependencies
    intents: IntentReceiver<'a, INTENT_CHANNEL_SIZE>,
    store: S,
    math: M,
    prototypes: PrototypeTable,

    // Show state
    rng: Rng,
    segments: Vec<Segment>,
    buffer: PixelBuffer,
    registry: EffectRegistry,
    sequencer: TimelineSequencer,
    /// Store key of the loaded sequence
    sequence: String,
    device: String,
    speed: u16,
    brightness: u8,
    started: bool,
    last_dimmed: Option<Instant>,
    frame: Vec<u32>,
}

impl<'a, S: ShowStore, M: ColorMath, const INTENT_CHANNEL_SIZE: usize>
    Renderer<'a, S, M, INTENT_CHANNEL_SIZE>
{
    /// Create a renderer for the configured device and sequence.
    ///
    /// Files that cannot be read fall back to the built-in defaults. The
    /// sequence starts with the first rendered frame.
    pub fn new(
        intents: IntentReceiver<'a, INTENT_CHANNEL_SIZE>,
        store: S,
        math: M,
        config: ShowConfig,
    ) -> Self {
        let mut renderer = Self {
            intents,
            store,
            math,
            prototypes: config.prototypes,
            rng: Rng::with_seed(config.seed),
            segments: Vec::new(),
            buffer: PixelBuffer::default(),
            registry: EffectRegistry::new(),
            sequencer: TimelineSequencer::default(),
            sequence: String::new(),
            device: String::new(),
            speed: config.speed,
            brightness: config.brightness,
            started: false,
            last_dimmed: None,
            frame: Vec::new(),
        };
        renderer.setup_device(&config.device);
        let (key, sequence) = renderer.read_sequence(&config.sequence);
        renderer.sequencer.load(sequence);
        renderer.sequence = key;
        renderer
    }

    /// Process one frame and return the native pixel words
    pub fn render(&mut self, now: Instant) -> &[u32] {
        if !self.started {
            self.start(now);
        }
        self.process_intents(now);

        let mut stage = stage!(self);
        let requests = self.sequencer.idle(now, self.speed, &mut stage);
        stage.idle_effects(now, self.speed);
        self.resolve_requests(now, requests);

        self.dim(now);
        self.flush();
        &self.frame
    }

    /// Start (or restart) the loaded sequence at `now`
    pub fn start(&mut self, now: Instant) {
        let key = self.sequence.clone();
        let sequence = self.sequencer.sequence().clone();
        self.switch_to(now, key, sequence);
    }

    /// Rebuild every segment from the named device file.
    ///
    /// Running effects are stopped; call [`start`](Self::start) (or render
    /// the next frame) to run the sequence on the new segments.
    pub fn setup_device(&mut self, name: &str) {
        let (device, segments) = match self.read_device(name) {
            Some(loaded) => loaded,
            None => {
                let device = DeviceFile::builtin();
                match device.build_segments(&self.prototypes) {
                    Ok(segments) => (device, segments),
                    Err(err) => {
                        tracing::warn!(error = %err, "built-in device cannot be built");
                        (device, Vec::new())
                    }
                }
            }
        };
        let total = segments
            .iter()
            .map(|segment| segment.layout().offset().saturating_add(segment.len()))
            .max()
            .unwrap_or(0);
        tracing::info!(
            device = %device.name,
            segments = segments.len(),
            pixels = total,
            "device loaded"
        );

        self.segments = segments;
        self.registry = EffectRegistry::new();
        self.buffer.reset(total);
        self.frame = vec![0; total];
        self.device = device.name;
        self.last_dimmed = None;
        self.started = false;
    }

    /// Stop the running sequence and start the named one at `now`
    pub fn load_sequence(&mut self, now: Instant, name: &str) {
        let (key, sequence) = self.read_sequence(name);
        self.switch_to(now, key, sequence);
    }

    /// Advance to the stored sequence after the current one, or a random one
    pub fn next_sequence(&mut self, now: Instant, mode: NextMode) {
        if let Some((key, sequence)) = self.pick_next(mode) {
            self.switch_to(now, key, sequence);
        }
    }

    fn pick_next(&mut self, mode: NextMode) -> Option<(String, SequenceFile)> {
        let names = self.store.sequence_names();
        if names.is_empty() {
            return None;
        }
        let pick = match mode {
            NextMode::Random => self.rng.usize(0..names.len()),
            NextMode::Sequential => {
                let current = self.sequence.as_str();
                let Some(position) = names.iter().position(|name| name == current) else {
                    tracing::warn!(sequence = current, "current sequence not stored, next ignored");
                    return None;
                };
                (position + 1) % names.len()
            }
        };
        Some(self.read_sequence(&names[pick]))
    }

    fn switch_to(&mut self, now: Instant, key: String, sequence: SequenceFile) {
        let requests = self.restart_with(now, key, sequence);
        self.resolve_requests(now, requests);
    }

    /// Stop the running sequence, then start `sequence` stored under `key` at `now`
    fn restart_with(
        &mut self,
        now: Instant,
        key: String,
        sequence: SequenceFile,
    ) -> Vec<SequenceRequest> {
        self.sequence = key;
        let mut stage = stage!(self);
        self.sequencer.stop(&mut stage);
        self.sequencer.load(sequence);
        self.started = true;
        self.sequencer.start(now, self.speed, &mut stage)
    }

    fn resolve_requests(&mut self, now: Instant, mut pending: Vec<SequenceRequest>) {
        for _ in 0..MAX_SWITCHES_PER_FRAME {
            // The last request of a pass wins
            let Some(request) = pending.pop() else {
                return;
            };
            let (key, sequence) = match request {
                SequenceRequest::Load(name) => self.read_sequence(&name),
                SequenceRequest::Next(mode) => match self.pick_next(mode) {
                    Some(picked) => picked,
                    None => return,
                },
            };
            tracing::info!(sequence = %key, title = %sequence.name, "switching sequence");
            pending = self.restart_with(now, key, sequence);
        }
        if !pending.is_empty() {
            tracing::warn!("sequence switches keep chaining, dropping the rest for this frame");
        }
    }

    /// Process pending intents from the channel (non-blocking)
    fn process_intents(&mut self, now: Instant) {
        while let Some(intent) = self.intents.try_receive() {
            tracing::debug!(?intent, "show intent");
            match intent {
                ShowIntent::LoadSequence(name) => self.load_sequence(now, &name),
                ShowIntent::Next { random } => {
                    let mode = if random {
                        NextMode::Random
                    } else {
                        NextMode::Sequential
                    };
                    self.next_sequence(now, mode);
                }
                ShowIntent::LoadDevice(name) => {
                    self.setup_device(&name);
                    self.start(now);
                }
                ShowIntent::SetSpeed(speed) => self.speed = speed,
                ShowIntent::SetBrightness(brightness) => self.brightness = brightness,
                ShowIntent::Restart => self.start(now),
            }
        }
    }

    /// Run the decay stage for the scaled time since the previous frame
    fn dim(&mut self, now: Instant) {
        let Some(previous) = self.last_dimmed.replace(now) else {
            return;
        };
        let elapsed = scale_ms(
            now.as_millis().saturating_sub(previous.as_millis()),
            self.speed,
        );
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
        self.buffer.decay(elapsed, &self.math);
    }

    /// Convert every segment's output colors into native pixel words
    fn flush(&mut self) {
        self.frame.fill(0);
        let output = self.buffer.output();
        for segment in &self.segments {
            let layout = segment.layout();
            let brightness = layout.brightness().unwrap_or(self.brightness);
            for &pixel in layout.line() {
                let Ok(pixel) = usize::try_from(pixel) else {
                    continue;
                };
                let Some(index) = pixel.checked_add(layout.offset()) else {
                    continue;
                };
                if let (Some(color), Some(word)) = (output.get(index), self.frame.get_mut(index)) {
                    *word = self.math.brightness_convert(*color, brightness, layout.order());
                }
            }
        }
    }

    /// Read a sequence with the key it is stored under, or the default one
    fn read_sequence(&self, name: &str) -> (String, SequenceFile) {
        match self.store.read_sequence(name) {
            Ok(sequence) => (name.into(), sequence),
            Err(err) => {
                tracing::warn!(name, error = %err, "falling back to the default sequence");
                let sequence = self
                    .store
                    .read_sequence(DEFAULT_NAME)
                    .unwrap_or_else(|_| builtin_sequence());
                (DEFAULT_NAME.into(), sequence)
            }
        }
    }

    fn read_device(&self, name: &str) -> Option<(DeviceFile, Vec<Segment>)> {
        let device = match self.store.read_device(name) {
            Ok(device) => device,
            Err(err) => {
                tracing::warn!(name, error = %err, "falling back to the default device");
                return None;
            }
        };
        match device.build_segments(&self.prototypes) {
            Ok(segments) => Some((device, segments)),
            Err(err) => {
                tracing::warn!(name, error = %err, "device layout invalid, using the default");
                None
            }
        }
    }

    /// Native pixel words of the last frame
    pub fn frame(&self) -> &[u32] {
        &self.frame
    }

    /// Colors after decay, before brightness and channel order
    pub fn output_colors(&self) -> &[Rgb] {
        self.buffer.output()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub const fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub const fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub const fn sequencer(&self) -> &TimelineSequencer {
        &self.sequencer
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }

    /// Store key of the running sequence
    pub fn sequence_name(&self) -> &str {
        &self.sequence
    }

    pub const fn speed(&self) -> u16 {
        self.speed
    }

    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
