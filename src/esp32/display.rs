use esp_idf_svc::hal::gpio::OutputPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::rmt::config::TransmitConfig;
use esp_idf_svc::hal::rmt::{PinState, Pulse, RmtChannel, TxRmtDriver, VariableLengthSignal};
use esp_idf_svc::sys::EspError;
use std::time::Duration;

use crate::PixelSink;
use crate::geometry::PIXEL_COUNT;
use crate::pixel::{PixelIndex, Rgb};

/// Error types for ESP32 LED strip operations.
#[derive(Debug, thiserror::Error)]
pub enum LedDisplayError {
    #[error("LED driver initialization failed: {0}")]
    DriverInit(EspError),
    #[error("LED update error: {0}")]
    UpdateError(EspError),
}

/// High/low pulse pairs for a 0 bit and a 1 bit.
#[derive(Debug, Clone, Copy)]
struct BitPulses {
    zero: (Pulse, Pulse),
    one: (Pulse, Pulse),
}

/// WS2812 strip (GRB byte order) driven via the ESP32 RMT peripheral.
///
/// Colours are buffered in RAM; `show` encodes the whole strip into one RMT
/// signal and blocks until it has been clocked out.
pub struct Esp32StripSink<'d> {
    tx: TxRmtDriver<'d>,
    pulses: BitPulses,
    pixels: [Rgb; PIXEL_COUNT],
}

impl<'d> Esp32StripSink<'d> {
    pub fn new<C: RmtChannel>(
        channel: impl Peripheral<P = C> + 'd,
        pin: impl Peripheral<P = impl OutputPin> + 'd,
    ) -> Result<Self, LedDisplayError> {
        let config = TransmitConfig::new().clock_divider(1);
        let tx = TxRmtDriver::new(channel, pin, &config).map_err(LedDisplayError::DriverInit)?;
        let ticks_hz = tx.counter_clock().map_err(LedDisplayError::DriverInit)?;

        let pulse = |state, ns| {
            Pulse::new_with_duration(ticks_hz, state, &Duration::from_nanos(ns))
                .map_err(LedDisplayError::DriverInit)
        };
        let pulses = BitPulses {
            zero: (pulse(PinState::High, 350)?, pulse(PinState::Low, 800)?),
            one: (pulse(PinState::High, 700)?, pulse(PinState::Low, 600)?),
        };

        Ok(Self {
            tx,
            pulses,
            pixels: [Rgb::BLACK; PIXEL_COUNT],
        })
    }

    fn encode(&self) -> Result<VariableLengthSignal, EspError> {
        let mut signal = VariableLengthSignal::with_capacity(PIXEL_COUNT * 24 * 2);
        for color in &self.pixels {
            for byte in [color.g, color.r, color.b] {
                for bit in (0..8).rev() {
                    let (high, low) = if byte & (1 << bit) != 0 {
                        &self.pulses.one
                    } else {
                        &self.pulses.zero
                    };
                    signal.push([high, low])?;
                }
            }
        }
        Ok(signal)
    }
}

impl PixelSink for Esp32StripSink<'_> {
    type Error = LedDisplayError;

    fn set_pixel(&mut self, index: PixelIndex, color: Rgb) {
        self.pixels[index.value()] = color;
    }

    fn set_all(&mut self, pixels: &[Rgb; PIXEL_COUNT]) {
        self.pixels = *pixels;
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        let signal = self.encode().map_err(LedDisplayError::UpdateError)?;
        self.tx
            .start_blocking(&signal)
            .map_err(LedDisplayError::UpdateError)
    }
}
