use embassy_time::Instant;

use super::{EFFECT_COUNT, EffectContext, EffectParams, EffectSlot, EffectTag};
use crate::clock::ShowClock;
use crate::color::ColorMath;
use crate::segment::SegmentId;

/// Fixed table of effect singletons, indexed by [`EffectTag`].
///
/// The registry keeps its own show clock so that effects see the same
/// scaled time base no matter which caller drives the idle pass.
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    slots: [EffectSlot; EFFECT_COUNT],
    clock: ShowClock,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self {
            slots: EffectTag::ALL.map(EffectTag::to_slot),
            clock: ShowClock::default(),
        }
    }

    /// Restart the global effect clock at `now`
    pub fn start(&mut self, now: Instant) {
        self.clock.start(now);
    }

    pub const fn clock(&self) -> &ShowClock {
        &self.clock
    }

    pub fn slot(&self, tag: EffectTag) -> &EffectSlot {
        &self.slots[tag as usize]
    }

    pub fn slot_mut(&mut self, tag: EffectTag) -> &mut EffectSlot {
        &mut self.slots[tag as usize]
    }

    /// Look up a tag by its four-letter name; unknown names yield `None`
    pub fn lookup(name: &str) -> Option<EffectTag> {
        EffectTag::parse_from_str(name)
    }

    pub fn init<M: ColorMath + ?Sized>(
        &mut self,
        tag: EffectTag,
        segment: SegmentId,
        ctx: &mut EffectContext<'_, M>,
    ) {
        self.slot_mut(tag).init(segment, ctx);
    }

    /// Start an instance of `tag` on `segment` at show time `now`
    pub fn trigger<M: ColorMath + ?Sized>(
        &mut self,
        tag: EffectTag,
        segment: SegmentId,
        params: &EffectParams,
        now: u64,
        ctx: &mut EffectContext<'_, M>,
    ) {
        self.slot_mut(tag).trigger(segment, params, now, ctx);
    }

    /// Stop whatever effect currently drives `segment`
    pub fn term<M: ColorMath + ?Sized>(&mut self, segment: SegmentId, ctx: &EffectContext<'_, M>) {
        if let Some(tag) = ctx.segment(segment).and_then(|s| s.action()) {
            self.term_tag(tag, segment);
        }
    }

    /// Drop every instance `tag` runs on `segment`
    pub fn term_tag(&mut self, tag: EffectTag, segment: SegmentId) {
        self.slot_mut(tag).term(segment);
    }

    /// One idle pass: every `op_first` hook, then every effect's idle
    pub fn idle_all<M: ColorMath + ?Sized>(
        &mut self,
        now: Instant,
        speed: u16,
        ctx: &mut EffectContext<'_, M>,
    ) {
        let now = self.clock.scaled(now, speed);
        for slot in &mut self.slots {
            slot.op_first(now);
        }
        for slot in &mut self.slots {
            slot.idle(now, ctx);
        }
    }

    /// Live instances summed over all effects
    pub fn live_instances(&self) -> usize {
        self.slots.iter().map(EffectSlot::live_instances).sum()
    }
}
