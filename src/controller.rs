use std::time::{Duration, Instant};

use crate::PixelSink;
use crate::config::Config;
use crate::frame_store::FrameStore;
use crate::geometry::PIXEL_COUNT;
use crate::pixel::Rgb;
use crate::protocol::{DisplayMode, SET_FRAME_LEN};
use crate::scheduler::{Scheduler, Tick};

/// Everything that decides what the strip shows.
///
/// The dispatcher (see [`Controller::handle`]) is the only writer of the
/// mode and the frame store; the scheduler (see [`Controller::tick`]) owns
/// its cursor and only reads the store. Both run on the caller's thread, so
/// the sink is never written from two places at once.
pub struct Controller<S: PixelSink> {
    pub(crate) mode: DisplayMode,
    pub(crate) store: FrameStore,
    pub(crate) scheduler: Scheduler,
    pub(crate) sink: S,
    pub(crate) socket_timeout: Duration,
    /// Receive buffer for `SetFrame`, allocated once
    pub(crate) frame_payload: Box<[u8; SET_FRAME_LEN]>,
}

impl<S: PixelSink> Controller<S> {
    /// Create a controller in [`DisplayMode::Sleep`] with an empty store.
    ///
    /// The strip is left untouched until [`Controller::blank`] is called.
    pub fn new(sink: S, config: &Config) -> Self {
        Self {
            mode: DisplayMode::Sleep,
            store: FrameStore::new(),
            scheduler: Scheduler::new(),
            sink,
            socket_timeout: config.socket_timeout,
            frame_payload: Box::new([0; SET_FRAME_LEN]),
        }
    }

    #[inline]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    #[inline]
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    #[inline]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[inline]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[inline]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Turn every pixel off and show it immediately.
    pub fn blank(&mut self) -> Result<(), S::Error> {
        self.sink.latch(&[Rgb::BLACK; PIXEL_COUNT])
    }

    /// Advance frame playback by one step.
    pub fn tick(&mut self, now: Instant) -> Result<Tick, S::Error> {
        self.scheduler.tick(now, &self.store, &mut self.sink)
    }
}

impl<S: PixelSink + std::fmt::Debug> std::fmt::Debug for Controller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("mode", &self.mode)
            .field("used_slots", &self.store.used_slots().count())
            .field("scheduler", &self.scheduler)
            .field("sink", &self.sink)
            .field("socket_timeout", &self.socket_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingSink;

    #[test]
    fn starts_asleep_with_empty_store() {
        let controller = Controller::new(RecordingSink::new(), &Config::default());

        assert_eq!(controller.mode(), DisplayMode::Sleep);
        assert_eq!(controller.store().used_slots().count(), 0);
        assert!(!controller.scheduler().is_playing());
        assert_eq!(controller.sink().show_count(), 0);
    }

    #[test]
    fn blank_shows_all_black() {
        let mut sink = RecordingSink::new();
        sink.set_all(&[Rgb::new(9, 9, 9); PIXEL_COUNT]);
        let mut controller = Controller::new(sink, &Config::default());

        controller.blank().unwrap();

        let sink = controller.into_sink();
        assert_eq!(sink.show_count(), 1);
        assert!(sink.pixels().iter().all(|&p| p == Rgb::BLACK));
    }

    #[test]
    fn tick_is_idle_while_asleep() {
        let mut controller = Controller::new(RecordingSink::new(), &Config::default());
        assert_eq!(controller.tick(Instant::now()), Ok(Tick::Idle));
    }
}
