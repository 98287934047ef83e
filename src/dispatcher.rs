//! Decodes and executes the single command carried by a connection.

use crate::PixelSink;
use crate::connection::{CommandStream, read_payload};
use crate::controller::Controller;
use crate::frame_store::{Frame, SlotIndex};
use crate::geometry::PIXEL_COUNT;
use crate::pixel::{PixelIndex, Rgb};
use crate::protocol::{CommandError, DisplayMode, Opcode, PIXEL_ITEM_LEN};

fn sink_error(err: impl std::fmt::Display) -> CommandError {
    CommandError::Sink(err.to_string())
}

/// Validate one `(index, r, g, b)` item.
fn decode_pixel([index, r, g, b]: [u8; PIXEL_ITEM_LEN]) -> Result<(PixelIndex, Rgb), CommandError> {
    let idx = PixelIndex::new(index.into()).ok_or(CommandError::PixelOutOfRange(index))?;
    Ok((idx, Rgb::new(r, g, b)))
}

impl<S: PixelSink> Controller<S> {
    /// Read one opcode and execute its command.
    ///
    /// Every payload is waited for in full before it is read; if it does not
    /// arrive within the socket timeout the command is dropped. Errors are
    /// for the local log only. The caller closes the connection afterwards
    /// whatever the outcome.
    pub fn handle<C>(&mut self, stream: &mut C) -> Result<Opcode, CommandError>
    where
        C: CommandStream + ?Sized,
    {
        let mut byte = [0u8; 1];
        read_payload(stream, &mut byte, self.socket_timeout)?;
        let opcode = Opcode::try_from(byte[0])?;

        match opcode {
            Opcode::ChangeMode => self.read_mode(stream)?,
            Opcode::SetFrame => {
                log::info!("receiving frame");
                self.read_frame(stream)?;
            }
            Opcode::SetFrames => return Err(CommandError::NotImplemented("SetFrames")),
            Opcode::SetPixel => {
                log::info!("receiving pixel");
                self.read_pixel(stream)?;
            }
            Opcode::SetPixels => {
                log::info!("receiving pixels");
                self.read_pixels(stream)?;
            }
            Opcode::ClearFrameBuffer => {
                log::info!("clearing frame buffer");
                self.store.clear();
            }
        }

        Ok(opcode)
    }

    fn read_mode<C>(&mut self, stream: &mut C) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        let mut byte = [0u8; 1];
        read_payload(stream, &mut byte, self.socket_timeout)?;
        let requested = DisplayMode::from_byte(byte[0]);
        log::info!(
            "setting mode from {:?} to {:?} ({:#04x})",
            self.mode,
            requested,
            byte[0]
        );

        match requested {
            Some(DisplayMode::SingleFrame) => {
                self.mode = DisplayMode::SingleFrame;
                self.scheduler.stop();
            }
            Some(mode @ (DisplayMode::FrameBufferOnce | DisplayMode::FrameBufferLoop)) => {
                self.mode = mode;
                self.scheduler.start(mode == DisplayMode::FrameBufferLoop);
            }
            Some(DisplayMode::Animation) => {
                self.mode = DisplayMode::Animation;
                self.scheduler.start(true);
                return self.read_animation(stream);
            }
            Some(DisplayMode::Sleep) | None => {
                self.mode = DisplayMode::Sleep;
                self.scheduler.stop();
                self.store.clear();
                self.blank().map_err(sink_error)?;
            }
        }
        Ok(())
    }

    /// Procedural animation parameters (snake, fade, breath) have no decoder.
    /// The mode change itself has already been applied.
    fn read_animation<C>(&mut self, _stream: &mut C) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        Err(CommandError::NotImplemented("animation parameters"))
    }

    fn read_frame<C>(&mut self, stream: &mut C) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        read_payload(stream, &mut self.frame_payload[..], self.socket_timeout)?;

        let (header, data) = self.frame_payload.split_at(5);
        let slot = SlotIndex::new(header[0].into()).ok_or(CommandError::SlotOutOfRange(header[0]))?;
        let delay_ms = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

        self.store.write(slot, Frame::from_rgb_bytes(data, delay_ms));
        log::debug!("stored frame {} with {delay_ms} ms delay", slot.value());

        if slot == SlotIndex::FIRST && self.mode == DisplayMode::SingleFrame {
            self.sink
                .latch(self.store.read(slot).pixels())
                .map_err(sink_error)?;
        }
        Ok(())
    }

    fn read_pixel<C>(&mut self, stream: &mut C) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        let mut item = [0u8; PIXEL_ITEM_LEN];
        read_payload(stream, &mut item, self.socket_timeout)?;
        let (index, color) = decode_pixel(item)?;

        log::debug!("setting pixel {} to {} {} {}", index.value(), color.r, color.g, color.b);
        self.sink.set_pixel(index, color);
        self.sink.show().map_err(sink_error)
    }

    /// Items are applied as they arrive. If the stream stalls or an item is
    /// invalid, the items before it stay applied and are still shown.
    fn read_pixels<C>(&mut self, stream: &mut C) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        let mut count = [0u8; 1];
        read_payload(stream, &mut count, self.socket_timeout)?;
        let count = count[0];
        if usize::from(count) > PIXEL_COUNT {
            return Err(CommandError::CountOutOfRange(count));
        }

        let applied = self.apply_pixels(stream, count);
        if let Err(e) = &applied {
            log::warn!("pixel update interrupted, showing partial result: {e}");
        }
        let shown = self.sink.show().map_err(sink_error);
        applied.and(shown)
    }

    fn apply_pixels<C>(&mut self, stream: &mut C, count: u8) -> Result<(), CommandError>
    where
        C: CommandStream + ?Sized,
    {
        for _ in 0..count {
            let mut item = [0u8; PIXEL_ITEM_LEN];
            read_payload(stream, &mut item, self.socket_timeout)?;
            let (index, color) = decode_pixel(item)?;

            log::debug!("setting pixel {} to {} {} {}", index.value(), color.r, color.g, color.b);
            self.sink.set_pixel(index, color);
        }
        Ok(())
    }
}
