//! Persistence of device and sequence files
//!
//! Files are kept as serialized JSON under prefixed keys (`dev_<name>`,
//! `seq_<name>`), the way a flat key-value flash store would hold them.

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::effect::EffectParams;
use crate::layout::{LayoutBuilder, LayoutError, LayoutSpec, PrototypeTable};
use crate::segment::Segment;
use crate::timeline::{SegmentTarget, SequenceFile, TimelineEntry};

/// Name of the built-in device and sequence
pub const DEFAULT_NAME: &str = "default";

const DEVICE_PREFIX: &str = "dev_";
const SEQUENCE_PREFIX: &str = "seq_";
const DEFAULT_BRIGHTNESS: u8 = 60;

/// A named list of layouts, one per segment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFile {
    pub name: String,
    pub dev: Vec<LayoutSpec>,
}

impl DeviceFile {
    pub fn new(name: &str, dev: Vec<LayoutSpec>) -> Self {
        Self {
            name: name.into(),
            dev,
        }
    }

    /// The built-in device: a star followed by a light strip
    pub fn builtin() -> Self {
        Self::new(
            DEFAULT_NAME,
            vec![
                LayoutSpec::device("star", "ZTR1").with_brightness(DEFAULT_BRIGHTNESS),
                LayoutSpec::device("lights", "LINE").with_brightness(DEFAULT_BRIGHTNESS),
            ],
        )
    }

    /// Build one segment per entry, laid out back to back
    pub fn build_segments(&self, prototypes: &PrototypeTable) -> Result<Vec<Segment>, LayoutError> {
        let mut builder = LayoutBuilder::new(prototypes);
        self.dev
            .iter()
            .map(|entry| builder.build(entry).map(Segment::new))
            .collect()
    }
}

/// The built-in show: flashes, a staggered wave and a rainbow, looping every 10 s
pub fn builtin_sequence() -> SequenceFile {
    let mut sequence = SequenceFile::new(DEFAULT_NAME);
    for (seg, color) in [(0, "yellow"), (1, "orange")] {
        sequence.seq.push(TimelineEntry::trigger(
            0,
            SegmentTarget::Index(seg),
            "PLSA",
            EffectParams::default().with_color(color),
        ));
    }
    for seg in 0..2 {
        sequence.seq.push(TimelineEntry::trigger(
            2000,
            SegmentTarget::Index(seg),
            "PLSL",
            EffectParams::default()
                .with_kind(3)
                .with_color("gold")
                .with_dir(-1)
                .with_repeat(750.0),
        ));
    }
    for seg in 0..2 {
        sequence.seq.push(TimelineEntry::trigger(
            5000,
            SegmentTarget::Index(seg),
            "RNBW",
            EffectParams::default(),
        ));
    }
    sequence.with_entry(TimelineEntry::restart(10_000))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No file under that name
    NotFound(String),
    /// The stored file is not valid JSON for its type
    Parse(String),
    /// The device file describes an unbuildable layout
    Layout(LayoutError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "no file named '{name}'"),
            Self::Parse(name) => write!(f, "file '{name}' could not be parsed"),
            Self::Layout(err) => write!(f, "invalid layout: {err}"),
        }
    }
}

impl From<LayoutError> for StoreError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

/// Storage of named device and sequence files
pub trait ShowStore {
    fn sequence_names(&self) -> Vec<String>;
    fn read_sequence(&self, name: &str) -> Result<SequenceFile, StoreError>;
    fn write_sequence(&mut self, name: &str, sequence: &SequenceFile) -> Result<(), StoreError>;

    fn device_names(&self) -> Vec<String>;
    fn read_device(&self, name: &str) -> Result<DeviceFile, StoreError>;
    fn write_device(&mut self, name: &str, device: &DeviceFile) -> Result<(), StoreError>;
}

/// In-memory [`ShowStore`], seeded with the built-in device and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    /// `(key, json)` pairs in insertion order
    files: Vec<(String, String)>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let mut store = Self::empty();
        // Built-ins always serialize
        let _ = store.write_device(DEFAULT_NAME, &DeviceFile::builtin());
        let _ = store.write_sequence(DEFAULT_NAME, &builtin_sequence());
        store
    }

    /// A store without any files
    pub const fn empty() -> Self {
        Self { files: Vec::new() }
    }

    /// Store raw text under `name`, e.g. a file received from elsewhere
    pub fn insert_raw_sequence(&mut self, name: &str, json: &str) {
        self.put(SEQUENCE_PREFIX, name, json.into());
    }

    pub fn insert_raw_device(&mut self, name: &str, json: &str) {
        self.put(DEVICE_PREFIX, name, json.into());
    }

    fn key(prefix: &str, name: &str) -> String {
        let mut key = String::with_capacity(prefix.len() + name.len());
        key.push_str(prefix);
        key.push_str(name);
        key
    }

    fn get(&self, prefix: &str, name: &str) -> Result<&str, StoreError> {
        let key = Self::key(prefix, name);
        self.files
            .iter()
            .find(|(stored, _)| *stored == key)
            .map(|(_, json)| json.as_str())
            .ok_or_else(|| StoreError::NotFound(name.into()))
    }

    fn put(&mut self, prefix: &str, name: &str, json: String) {
        let key = Self::key(prefix, name);
        match self.files.iter_mut().find(|(stored, _)| *stored == key) {
            Some((_, stored)) => *stored = json,
            None => self.files.push((key, json)),
        }
    }

    fn names(&self, prefix: &str) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|(key, _)| key.strip_prefix(prefix))
            .map(ToString::to_string)
            .collect()
    }
}

impl ShowStore for MemoryStore {
    fn sequence_names(&self) -> Vec<String> {
        self.names(SEQUENCE_PREFIX)
    }

    fn read_sequence(&self, name: &str) -> Result<SequenceFile, StoreError> {
        let json = self.get(SEQUENCE_PREFIX, name)?;
        SequenceFile::from_json(json).map_err(|err| {
            tracing::warn!(name, error = %err, "malformed sequence file");
            StoreError::Parse(name.into())
        })
    }

    fn write_sequence(&mut self, name: &str, sequence: &SequenceFile) -> Result<(), StoreError> {
        let json = sequence
            .to_json()
            .map_err(|_| StoreError::Parse(name.into()))?;
        self.put(SEQUENCE_PREFIX, name, json);
        Ok(())
    }

    fn device_names(&self) -> Vec<String> {
        self.names(DEVICE_PREFIX)
    }

    fn read_device(&self, name: &str) -> Result<DeviceFile, StoreError> {
        let json = self.get(DEVICE_PREFIX, name)?;
        serde_json::from_str(json).map_err(|err| {
            tracing::warn!(name, error = %err, "malformed device file");
            StoreError::Parse(name.into())
        })
    }

    fn write_device(&mut self, name: &str, device: &DeviceFile) -> Result<(), StoreError> {
        let json = serde_json::to_string(device).map_err(|_| StoreError::Parse(name.into()))?;
        self.put(DEVICE_PREFIX, name, json);
        Ok(())
    }
}
