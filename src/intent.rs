//! Runtime show control
//!
//! The platform layer (buttons, a web UI, a serial console) sends
//! [`ShowIntent`]s through a bounded [`IntentChannel`]; the renderer drains
//! the queue at the start of every frame. The queue lives behind a
//! `critical-section` mutex so senders may run in interrupt context.

use alloc::string::String;
use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use heapless::Deque;

/// Change requested by the platform layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowIntent {
    /// Stop the running sequence and start the named one
    LoadSequence(String),
    /// Advance to the next stored sequence, or a random one
    Next { random: bool },
    /// Rebuild every segment from the named device file
    LoadDevice(String),
    /// Show speed in percent
    SetSpeed(u16),
    /// Display-wide brightness, used by layouts without their own
    SetBrightness(u8),
    /// Restart the running sequence from its beginning
    Restart,
}

/// The queue was full; the rejected intent is handed back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentError(pub ShowIntent);

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent queue is full, dropped {:?}", self.0)
    }
}

/// Bounded intent queue shared between the platform layer and the renderer.
pub struct IntentChannel<const SIZE: usize> {
    queue: Mutex<RefCell<Deque<ShowIntent, SIZE>>>,
}

impl<const SIZE: usize> Default for IntentChannel<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> IntentChannel<SIZE> {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    pub const fn sender(&self) -> IntentSender<'_, SIZE> {
        IntentSender { channel: self }
    }

    pub const fn receiver(&self) -> IntentReceiver<'_, SIZE> {
        IntentReceiver { channel: self }
    }

    fn push(&self, intent: ShowIntent) -> Result<(), IntentError> {
        critical_section::with(|cs| {
            self.queue
                .borrow(cs)
                .borrow_mut()
                .push_back(intent)
                .map_err(IntentError)
        })
    }

    fn pop(&self) -> Option<ShowIntent> {
        critical_section::with(|cs| self.queue.borrow(cs).borrow_mut().pop_front())
    }
}

#[derive(Clone, Copy)]
pub struct IntentSender<'a, const SIZE: usize> {
    channel: &'a IntentChannel<SIZE>,
}

impl<const SIZE: usize> IntentSender<'_, SIZE> {
    /// Queue an intent without blocking
    pub fn send(&self, intent: ShowIntent) -> Result<(), IntentError> {
        self.channel.push(intent)
    }
}

#[derive(Clone, Copy)]
pub struct IntentReceiver<'a, const SIZE: usize> {
    channel: &'a IntentChannel<SIZE>,
}

impl<const SIZE: usize> IntentReceiver<'_, SIZE> {
    /// Take the oldest queued intent, if any
    pub fn try_receive(&self) -> Option<ShowIntent> {
        self.channel.pop()
    }

    /// Iterate over everything queued right now
    pub fn drain(&self) -> impl Iterator<Item = ShowIntent> + '_ {
        core::iter::from_fn(|| self.channel.pop())
    }
}
