use std::time::{Duration, Instant};

use crate::PixelSink;
use crate::frame_store::{FrameStore, SlotIndex};

/// Whether frame playback is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Playback {
    #[default]
    Stopped,
    /// `repeat` keeps playing after the last slot instead of stopping.
    Playing { repeat: bool },
}

/// Outcome of a single scheduler step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Playback is stopped
    Idle,
    /// Slot was empty and the cursor moved past it
    Skipped(SlotIndex),
    /// Slot's delay has not elapsed yet
    Waiting(SlotIndex),
    /// Slot was shown on the strip
    Latched(SlotIndex),
}

/// Steps through the frame store, showing each used slot once its delay has
/// passed since the previous frame was shown.
///
/// Time is passed in by the caller so playback can be driven from tests.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    playback: Playback,
    cursor: SlotIndex,
    last_latch: Option<Instant>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn playback(&self) -> Playback {
        self.playback
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    /// Slot the next tick looks at.
    #[inline]
    pub fn cursor(&self) -> SlotIndex {
        self.cursor
    }

    /// Start playback, or change `repeat` if already playing.
    ///
    /// Starting from stopped rewinds to slot 0 and forgets the last latch
    /// time, so the first used slot is shown on the next tick.
    pub fn start(&mut self, repeat: bool) {
        if !self.is_playing() {
            self.cursor = SlotIndex::FIRST;
            self.last_latch = None;
        }
        self.playback = Playback::Playing { repeat };
    }

    pub fn stop(&mut self) {
        self.playback = Playback::Stopped;
    }

    /// Run one playback step against `store`, latching to `sink` if due.
    ///
    /// A failed latch leaves the cursor in place so the slot is retried.
    pub fn tick<S: PixelSink>(
        &mut self,
        now: Instant,
        store: &FrameStore,
        sink: &mut S,
    ) -> Result<Tick, S::Error> {
        let Playback::Playing { repeat } = self.playback else {
            return Ok(Tick::Idle);
        };

        let slot = self.cursor;
        let frame = store.read(slot);
        if !frame.is_used() {
            self.advance(repeat);
            return Ok(Tick::Skipped(slot));
        }

        let delay = Duration::from_millis(frame.delay_ms().into());
        let due = self
            .last_latch
            .is_none_or(|last| now.saturating_duration_since(last) >= delay);
        if !due {
            return Ok(Tick::Waiting(slot));
        }

        log::debug!("showing frame {}", slot.value());
        sink.latch(frame.pixels())?;
        self.last_latch = Some(now);
        self.advance(repeat);
        Ok(Tick::Latched(slot))
    }

    fn advance(&mut self, repeat: bool) {
        let (next, wrapped) = self.cursor.next();
        self.cursor = next;
        if wrapped && !repeat {
            log::info!("frame buffer finished, playback stopped");
            self.playback = Playback::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_store::{FRAME_COUNT, Frame};
    use crate::geometry::PIXEL_COUNT;
    use crate::mock::RecordingSink;
    use crate::pixel::Rgb;

    fn slot(i: usize) -> SlotIndex {
        SlotIndex::new(i).expect("slot in range")
    }

    /// Frame whose first pixel encodes its slot, so latches can be told apart.
    fn tagged(i: usize, delay_ms: u32) -> Frame {
        let mut pixels = [Rgb::BLACK; PIXEL_COUNT];
        pixels[0] = Rgb::new(i as u8, 1, 1);
        Frame::new(pixels, delay_ms)
    }

    fn full_store() -> FrameStore {
        let mut store = FrameStore::new();
        for i in 0..FRAME_COUNT {
            store.write(slot(i), tagged(i, 10 + i as u32));
        }
        store
    }

    /// Tick once per millisecond for `ms` milliseconds, collecting latches
    /// with the time they happened.
    fn run_for(
        scheduler: &mut Scheduler,
        store: &FrameStore,
        sink: &mut RecordingSink,
        start: Instant,
        ms: u64,
    ) -> Vec<(usize, u64)> {
        let mut latched = Vec::new();
        for t in 0..ms {
            let now = start + Duration::from_millis(t);
            if let Tick::Latched(s) = scheduler.tick(now, store, sink).unwrap() {
                latched.push((s.value(), t));
            }
        }
        latched
    }

    #[test]
    fn stopped_scheduler_never_latches() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();

        let latched = run_for(&mut scheduler, &store, &mut sink, Instant::now(), 200);

        assert!(latched.is_empty());
        assert_eq!(sink.show_count(), 0);
    }

    #[test]
    fn first_used_slot_is_shown_immediately() {
        let mut store = FrameStore::new();
        store.write(slot(0), tagged(0, 5_000));
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);

        let tick = scheduler.tick(Instant::now(), &store, &mut sink).unwrap();

        assert_eq!(tick, Tick::Latched(slot(0)));
        assert_eq!(sink.last_shown(), Some(store.read(slot(0)).pixels()));
    }

    #[test]
    fn unused_slots_are_skipped_one_per_tick() {
        let mut store = FrameStore::new();
        store.write(slot(2), tagged(2, 0));
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);
        let now = Instant::now();

        assert_eq!(scheduler.tick(now, &store, &mut sink), Ok(Tick::Skipped(slot(0))));
        assert_eq!(scheduler.tick(now, &store, &mut sink), Ok(Tick::Skipped(slot(1))));
        assert_eq!(scheduler.tick(now, &store, &mut sink), Ok(Tick::Latched(slot(2))));
        assert_eq!(sink.show_count(), 1);
    }

    #[test]
    fn waits_for_slot_delay() {
        let mut store = FrameStore::new();
        store.write(slot(0), tagged(0, 0));
        store.write(slot(1), tagged(1, 100));
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);
        let t0 = Instant::now();

        assert_eq!(scheduler.tick(t0, &store, &mut sink), Ok(Tick::Latched(slot(0))));
        let early = t0 + Duration::from_millis(99);
        assert_eq!(scheduler.tick(early, &store, &mut sink), Ok(Tick::Waiting(slot(1))));
        assert_eq!(scheduler.cursor(), slot(1), "cursor stays while waiting");
        let due = t0 + Duration::from_millis(100);
        assert_eq!(scheduler.tick(due, &store, &mut sink), Ok(Tick::Latched(slot(1))));
    }

    #[test]
    fn loop_visits_every_slot_in_order_and_wraps() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);

        // One pass takes sum(10..40) = 735 ms; run for well over two passes
        let latched = run_for(&mut scheduler, &store, &mut sink, Instant::now(), 2_000);

        assert!(latched.len() > 2 * FRAME_COUNT);
        for (n, &(s, _)) in latched.iter().enumerate() {
            assert_eq!(s, n % FRAME_COUNT, "latch {n} out of order");
        }
        for pair in latched.windows(2) {
            let (next_slot, next_t) = pair[1];
            let dwell = next_t - pair[0].1;
            assert!(
                dwell >= 10 + next_slot as u64,
                "slot {next_slot} shown after {dwell} ms"
            );
        }
        assert!(scheduler.is_playing(), "loop never stops on its own");
    }

    #[test]
    fn once_stops_after_single_pass() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(false);

        let latched = run_for(&mut scheduler, &store, &mut sink, Instant::now(), 2_000);

        let slots: Vec<_> = latched.iter().map(|&(s, _)| s).collect();
        assert_eq!(slots, (0..FRAME_COUNT).collect::<Vec<_>>());
        assert_eq!(scheduler.playback(), Playback::Stopped);
        assert_eq!(scheduler.cursor(), SlotIndex::FIRST);
        assert_eq!(sink.show_count(), FRAME_COUNT);
    }

    #[test]
    fn once_with_sparse_store_stops_at_wrap() {
        let mut store = FrameStore::new();
        store.write(slot(3), tagged(3, 0));
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(false);

        let latched = run_for(&mut scheduler, &store, &mut sink, Instant::now(), 100);

        assert_eq!(latched, vec![(3, 3)]);
        assert!(!scheduler.is_playing());
    }

    #[test]
    fn cleared_store_produces_no_latches() {
        let mut store = full_store();
        store.clear();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);

        let latched = run_for(&mut scheduler, &store, &mut sink, Instant::now(), 200);

        assert!(latched.is_empty());
        assert_eq!(sink.show_count(), 0);
    }

    #[test]
    fn restarting_while_playing_keeps_cursor() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);
        scheduler.tick(Instant::now(), &store, &mut sink).unwrap();
        assert_eq!(scheduler.cursor(), slot(1));

        scheduler.start(false);

        assert_eq!(scheduler.cursor(), slot(1));
        assert_eq!(scheduler.playback(), Playback::Playing { repeat: false });
    }

    #[test]
    fn starting_after_stop_rewinds() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        let mut scheduler = Scheduler::new();
        scheduler.start(true);
        scheduler.tick(Instant::now(), &store, &mut sink).unwrap();

        scheduler.stop();
        scheduler.start(true);

        assert_eq!(scheduler.cursor(), SlotIndex::FIRST);
    }

    #[test]
    fn failed_latch_retries_same_slot() {
        let store = full_store();
        let mut sink = RecordingSink::new();
        sink.fail_shows(true);
        let mut scheduler = Scheduler::new();
        scheduler.start(true);

        assert!(scheduler.tick(Instant::now(), &store, &mut sink).is_err());
        assert_eq!(scheduler.cursor(), SlotIndex::FIRST);
    }
}
