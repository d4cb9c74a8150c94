//! Frame pacing for the show renderer.
//!
//! The caller owns the timer: it calls [`FrameScheduler::tick`] with the
//! current monotonic time and sleeps for the returned duration.

use embassy_time::{Duration, Instant};

use crate::color::ColorMath;
use crate::storage::ShowStore;
use crate::{OutputDriver, Renderer};

/// Nominal show tick period in milliseconds.
pub const DEFAULT_FRAME_MS: u64 = 50;

/// Default frame duration (20 FPS).
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(DEFAULT_FRAME_MS);

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (zero when behind schedule).
    pub sleep_duration: Duration,
}

/// Drives a [`Renderer`] and an [`OutputDriver`] at a fixed frame period.
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(renderer, driver);
///
/// loop {
///     let result = scheduler.tick(Instant::now());
///     Timer::after(result.sleep_duration).await;
/// }
/// ```
pub struct FrameScheduler<'a, O, S, M, const INTENT_CHANNEL_SIZE: usize>
where
    O: OutputDriver,
    S: ShowStore,
    M: ColorMath,
{
    output: O,
    renderer: Renderer<'a, S, M, INTENT_CHANNEL_SIZE>,
    next_frame: Instant,
    frame_duration: Duration,
}

impl<'a, O, S, M, const INTENT_CHANNEL_SIZE: usize> FrameScheduler<'a, O, S, M, INTENT_CHANNEL_SIZE>
where
    O: OutputDriver,
    S: ShowStore,
    M: ColorMath,
{
    /// Create a scheduler running at [`DEFAULT_FRAME_DURATION`].
    pub fn new(renderer: Renderer<'a, S, M, INTENT_CHANNEL_SIZE>, driver: O) -> Self {
        Self::with_frame_duration(renderer, driver, DEFAULT_FRAME_DURATION)
    }

    pub fn with_frame_duration(
        renderer: Renderer<'a, S, M, INTENT_CHANNEL_SIZE>,
        driver: O,
        frame_duration: Duration,
    ) -> Self {
        Self {
            output: driver,
            renderer,
            next_frame: Instant::from_millis(0),
            frame_duration,
        }
    }

    /// Render one frame, hand it to the driver and schedule the next one.
    ///
    /// Falling more than two frames behind drops the backlog instead of
    /// rendering a burst of catch-up frames.
    pub fn tick(&mut self, now: Instant) -> FrameResult {
        let max_drift_ms = self.frame_duration.as_millis() * 2;
        if now.as_millis() > self.next_frame.as_millis() + max_drift_ms {
            self.next_frame = now;
        }

        let frame = self.renderer.render(now);
        self.output.write(frame);

        self.next_frame += self.frame_duration;
        let sleep_duration = Duration::from_millis(
            self.next_frame.as_millis().saturating_sub(now.as_millis()),
        );

        FrameResult {
            next_deadline: self.next_frame,
            sleep_duration,
        }
    }

    pub fn renderer(&self) -> &Renderer<'a, S, M, INTENT_CHANNEL_SIZE> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<'a, S, M, INTENT_CHANNEL_SIZE> {
        &mut self.renderer
    }

    pub fn output(&self) -> &O {
        &self.output
    }
}
