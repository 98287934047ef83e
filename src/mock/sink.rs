use thiserror::Error;

use crate::PixelSink;
use crate::geometry::PIXEL_COUNT;
use crate::pixel::{PixelIndex, Rgb};

/// Error returned by [`RecordingSink`] when failures are switched on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("simulated strip failure")]
pub struct SimulatedFailure;

/// In-memory strip that records every `show`.
///
/// Used by tests and by the headless simulator.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    pixels: [Rgb; PIXEL_COUNT],
    shown: Vec<[Rgb; PIXEL_COUNT]>,
    show_count: usize,
    keep_history: bool,
    fail_shows: bool,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    /// Create an all-black strip that has never been shown.
    pub fn new() -> Self {
        Self {
            pixels: [Rgb::BLACK; PIXEL_COUNT],
            shown: Vec::new(),
            show_count: 0,
            keep_history: true,
            fail_shows: false,
        }
    }

    /// Like [`RecordingSink::new`] but only counts shows, so memory stays
    /// flat on long runs.
    pub fn headless() -> Self {
        Self {
            keep_history: false,
            ..Self::new()
        }
    }

    /// Buffered colour of one pixel.
    #[inline]
    pub fn pixel(&self, index: PixelIndex) -> Rgb {
        self.pixels[index.value()]
    }

    /// Buffered colours of the whole strip.
    #[inline]
    pub fn pixels(&self) -> &[Rgb; PIXEL_COUNT] {
        &self.pixels
    }

    /// Number of successful `show` calls.
    #[inline]
    pub fn show_count(&self) -> usize {
        self.show_count
    }

    /// Strip contents at every successful `show`, oldest first.
    /// Empty for [`RecordingSink::headless`] sinks.
    pub fn shown(&self) -> &[[Rgb; PIXEL_COUNT]] {
        &self.shown
    }

    pub fn last_shown(&self) -> Option<&[Rgb; PIXEL_COUNT]> {
        self.shown.last()
    }

    /// Make subsequent `show` calls fail.
    pub fn fail_shows(&mut self, fail: bool) {
        self.fail_shows = fail;
    }
}

impl PixelSink for RecordingSink {
    type Error = SimulatedFailure;

    fn set_pixel(&mut self, index: PixelIndex, color: Rgb) {
        self.pixels[index.value()] = color;
    }

    fn set_all(&mut self, pixels: &[Rgb; PIXEL_COUNT]) {
        self.pixels = *pixels;
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        if self.fail_shows {
            return Err(SimulatedFailure);
        }
        self.show_count += 1;
        if self.keep_history {
            self.shown.push(self.pixels);
        }
        Ok(())
    }
}
