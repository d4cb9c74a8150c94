//! JSON-described show timelines
//!
//! A [`SequenceFile`] is an ordered list of entries, each due at a show-time
//! offset. Segment entries attach an effect to one or all segments; the
//! remaining entries are control directives that switch or loop the show.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use embassy_time::Instant;
use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::clock::ShowClock;
use crate::color::ColorMath;
use crate::effect::{EffectContext, EffectParams, EffectRegistry};
use crate::pixel_buffer::PixelBuffer;
use crate::segment::{Segment, SegmentId};

const ALL_SEGMENTS: &str = "all";
const NEXT_RANDOM: &str = "random";

/// A named, ordered list of timeline entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceFile {
    pub name: String,
    pub seq: Vec<TimelineEntry>,
}

impl SequenceFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            seq: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: TimelineEntry) -> Self {
        self.seq.push(entry);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Which segments a trigger entry addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SegmentRef", into = "SegmentRef")]
pub enum SegmentTarget {
    All,
    Index(SegmentId),
    /// A label that names no segment; the entry fires without effect
    Unknown(String),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SegmentRef {
    Index(SegmentId),
    Label(String),
}

impl From<SegmentRef> for SegmentTarget {
    fn from(value: SegmentRef) -> Self {
        match value {
            SegmentRef::Index(index) => Self::Index(index),
            SegmentRef::Label(label) if label == ALL_SEGMENTS => Self::All,
            SegmentRef::Label(label) => match label.parse() {
                Ok(index) => Self::Index(index),
                Err(_) => Self::Unknown(label),
            },
        }
    }
}

impl From<SegmentTarget> for SegmentRef {
    fn from(value: SegmentTarget) -> Self {
        match value {
            SegmentTarget::All => Self::Label(ALL_SEGMENTS.into()),
            SegmentTarget::Index(index) => Self::Index(index),
            SegmentTarget::Unknown(label) => Self::Label(label),
        }
    }
}

/// How a `next` directive picks the following sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextMode {
    Sequential,
    Random,
}

/// What an entry does once it is due
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineStep {
    Trigger {
        seg: SegmentTarget,
        action: String,
        params: EffectParams,
    },
    Next(NextMode),
    File(String),
    Restart,
}

/// One timed entry of a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct TimelineEntry {
    pub when: u64,
    pub step: TimelineStep,
    done: bool,
}

impl TimelineEntry {
    pub const fn new(when: u64, step: TimelineStep) -> Self {
        Self {
            when,
            step,
            done: false,
        }
    }

    /// Attach `action` to `seg` with `params`
    pub fn trigger(when: u64, seg: SegmentTarget, action: &str, params: EffectParams) -> Self {
        Self::new(
            when,
            TimelineStep::Trigger {
                seg,
                action: action.into(),
                params,
            },
        )
    }

    pub const fn restart(when: u64) -> Self {
        Self::new(when, TimelineStep::Restart)
    }

    pub const fn next(when: u64, mode: NextMode) -> Self {
        Self::new(when, TimelineStep::Next(mode))
    }

    pub fn file(when: u64, name: &str) -> Self {
        Self::new(when, TimelineStep::File(name.into()))
    }

    /// Whether the entry already fired since the last start or restart
    pub const fn is_done(&self) -> bool {
        self.done
    }
}

/// Entry without a segment or any directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyEntryError {
    pub when: u64,
}

impl fmt::Display for EmptyEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry at {} ms has neither a segment nor a directive", self.when)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Self::Bool(set) => *set,
            Self::Number(value) => *value != 0,
            Self::Text(text) => !text.is_empty(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct RawEntry {
    #[serde(default)]
    when: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seg: Option<SegmentTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<EffectParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next: Option<Flag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    restart: Option<Flag>,
}

impl TryFrom<RawEntry> for TimelineEntry {
    type Error = EmptyEntryError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let step = if let Some(seg) = raw.seg {
            TimelineStep::Trigger {
                seg,
                action: raw.action.unwrap_or_default(),
                params: raw.params.unwrap_or_default(),
            }
        } else if let Some(next) = raw.next.filter(Flag::is_set) {
            match next {
                Flag::Text(mode) if mode == NEXT_RANDOM => TimelineStep::Next(NextMode::Random),
                _ => TimelineStep::Next(NextMode::Sequential),
            }
        } else if let Some(file) = raw.file {
            TimelineStep::File(file)
        } else if raw.restart.as_ref().is_some_and(Flag::is_set) {
            TimelineStep::Restart
        } else {
            return Err(EmptyEntryError { when: raw.when });
        };
        Ok(Self::new(raw.when, step))
    }
}

impl From<TimelineEntry> for RawEntry {
    fn from(entry: TimelineEntry) -> Self {
        let mut raw = Self {
            when: entry.when,
            seg: None,
            action: None,
            params: None,
            next: None,
            file: None,
            restart: None,
        };
        match entry.step {
            TimelineStep::Trigger { seg, action, params } => {
                raw.seg = Some(seg);
                raw.action = Some(action);
                raw.params = Some(params);
            }
            TimelineStep::Next(NextMode::Sequential) => raw.next = Some(Flag::Bool(true)),
            TimelineStep::Next(NextMode::Random) => {
                raw.next = Some(Flag::Text(NEXT_RANDOM.into()));
            }
            TimelineStep::File(file) => raw.file = Some(file),
            TimelineStep::Restart => raw.restart = Some(Flag::Number(1)),
        }
        raw
    }
}

/// Sequence switch requested by a due directive, resolved by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceRequest {
    Next(NextMode),
    Load(String),
}

/// Everything the sequencer drives while it runs
pub struct Stage<'a, M: ColorMath + ?Sized> {
    pub segments: &'a mut [Segment],
    pub registry: &'a mut EffectRegistry,
    pub buffer: &'a mut PixelBuffer,
    pub math: &'a M,
    pub rng: &'a mut Rng,
}

impl<M: ColorMath + ?Sized> Stage<'_, M> {
    fn split(&mut self) -> (&mut EffectRegistry, EffectContext<'_, M>) {
        (
            &mut *self.registry,
            EffectContext {
                segments: &*self.segments,
                buffer: &mut *self.buffer,
                math: self.math,
                rng: &mut *self.rng,
            },
        )
    }

    /// Run the registry's idle pass over every segment
    pub fn idle_effects(&mut self, now: Instant, speed: u16) {
        let (registry, mut ctx) = self.split();
        registry.idle_all(now, speed, &mut ctx);
    }

    /// Stop the effect running on every segment
    pub fn term_all(&mut self) {
        for (id, segment) in self.segments.iter().enumerate() {
            if let Some(tag) = segment.action() {
                self.registry.term_tag(tag, id);
            }
        }
    }

    /// Replace the effect on `id` and trigger it at show time `now`
    fn setup_segment(&mut self, id: SegmentId, action: &str, params: &EffectParams, now: u64) {
        let Some(tag) = EffectRegistry::lookup(action) else {
            tracing::warn!(action, segment = id, "unknown effect tag, segment left unchanged");
            return;
        };
        let Some(segment) = self.segments.get_mut(id) else {
            tracing::warn!(segment = id, "timeline addresses a missing segment");
            return;
        };
        if let Some(old) = segment.action() {
            self.registry.term_tag(old, id);
        }
        segment.set_action(Some(tag));

        let (registry, mut ctx) = self.split();
        registry.init(tag, id, &mut ctx);
        registry.trigger(tag, id, params, now, &mut ctx);
    }
}

/// Interprets one [`SequenceFile`] against the show clock.
#[derive(Debug, Clone, Default)]
pub struct TimelineSequencer {
    sequence: SequenceFile,
    clock: ShowClock,
    running: bool,
}

impl TimelineSequencer {
    pub fn new(sequence: SequenceFile) -> Self {
        Self {
            sequence,
            clock: ShowClock::default(),
            running: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.sequence.name
    }

    pub const fn sequence(&self) -> &SequenceFile {
        &self.sequence
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn clock(&self) -> &ShowClock {
        &self.clock
    }

    /// Swap in another sequence; call [`start`](Self::start) to run it
    pub fn load(&mut self, sequence: SequenceFile) {
        self.sequence = sequence;
        self.running = false;
    }

    /// Arm every entry, restart both clocks at `now` and fire what is due.
    pub fn start<M: ColorMath + ?Sized>(
        &mut self,
        now: Instant,
        speed: u16,
        stage: &mut Stage<'_, M>,
    ) -> Vec<SequenceRequest> {
        tracing::info!(sequence = %self.sequence.name, "sequence started");
        self.rearm(now, stage);
        self.running = true;
        self.idle(now, speed, stage)
    }

    /// Stop every segment's effect
    pub fn stop<M: ColorMath + ?Sized>(&mut self, stage: &mut Stage<'_, M>) {
        stage.term_all();
        self.running = false;
    }

    /// Fire every entry due at `now`, in declaration order.
    ///
    /// Returns the sequence switches requested by due directives; the
    /// caller resolves them once the idle pass is complete.
    pub fn idle<M: ColorMath + ?Sized>(
        &mut self,
        now: Instant,
        speed: u16,
        stage: &mut Stage<'_, M>,
    ) -> Vec<SequenceRequest> {
        let mut requests = Vec::new();
        if !self.running {
            return requests;
        }
        let scaled = self.clock.scaled(now, speed);
        let mut restart = false;

        for entry in &mut self.sequence.seq {
            if entry.done || scaled < entry.when {
                continue;
            }
            entry.done = true;
            tracing::debug!(when = entry.when, at = scaled, "timeline entry due");

            match &entry.step {
                TimelineStep::Trigger { seg, action, params } => match seg {
                    SegmentTarget::All => {
                        for id in 0..stage.segments.len() {
                            stage.setup_segment(id, action, params, scaled);
                        }
                    }
                    SegmentTarget::Index(id) => stage.setup_segment(*id, action, params, scaled),
                    SegmentTarget::Unknown(label) => {
                        tracing::warn!(label = %label, "timeline addresses an unknown segment");
                    }
                },
                TimelineStep::Next(mode) => requests.push(SequenceRequest::Next(*mode)),
                TimelineStep::File(name) => requests.push(SequenceRequest::Load(name.clone())),
                TimelineStep::Restart => {
                    // Rearmed entries become due on the next pass
                    restart = true;
                    break;
                }
            }
        }

        if restart {
            tracing::info!(sequence = %self.sequence.name, "sequence restarted");
            stage.term_all();
            self.rearm(now, stage);
        }
        requests
    }

    fn rearm<M: ColorMath + ?Sized>(&mut self, now: Instant, stage: &mut Stage<'_, M>) {
        for entry in &mut self.sequence.seq {
            entry.done = false;
        }
        self.clock.start(now);
        stage.registry.start(now);
    }
}
