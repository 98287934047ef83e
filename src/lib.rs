use geometry::PIXEL_COUNT;
use pixel::{PixelIndex, Rgb};

pub mod config;
pub mod connection;
pub mod controller;
pub mod dispatcher;
pub mod frame_store;
pub mod geometry;
pub mod pixel;
pub mod protocol;
pub mod scheduler;
pub mod server;

/// Destination for pixel colours: the LED strip or a stand-in for it.
///
/// Colours written with [`set_pixel`](PixelSink::set_pixel) are buffered
/// until [`show`](PixelSink::show) commits them. The buffered state is the
/// live state; the sink never forgets what it was last told.
pub trait PixelSink {
    /// Error type for output failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Buffer a colour for one pixel.
    fn set_pixel(&mut self, index: PixelIndex, color: Rgb);

    /// Buffer a colour for every pixel.
    fn set_all(&mut self, pixels: &[Rgb; PIXEL_COUNT]) {
        for (index, &color) in PixelIndex::all().zip(pixels.iter()) {
            self.set_pixel(index, color);
        }
    }

    /// Push the buffered colours to the strip.
    fn show(&mut self) -> Result<(), Self::Error>;

    /// Replace the whole strip and show it in one step.
    fn latch(&mut self, pixels: &[Rgb; PIXEL_COUNT]) -> Result<(), Self::Error> {
        self.set_all(pixels);
        self.show()
    }
}

#[cfg(target_os = "espidf")]
pub mod esp32;

#[cfg(not(target_os = "espidf"))]
pub mod mock;
