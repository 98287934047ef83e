//! Wire protocol spoken by LAN clients.
//!
//! Each TCP connection carries exactly one command: a single opcode byte
//! followed by its payload. The controller never answers; outcomes are only
//! visible on the strip and in the device log. Keeping a connection open for
//! further commands would be a protocol change, not a fix.
//!
//! | Opcode | Command          | Payload                                          |
//! |--------|------------------|--------------------------------------------------|
//! | `0x01` | ChangeMode       | mode byte                                        |
//! | `0x02` | SetFrame         | slot, delay (u32 BE, ms), `PIXEL_COUNT` × RGB     |
//! | `0x03` | SetFrames        | reserved                                         |
//! | `0x04` | SetPixel         | index, r, g, b                                   |
//! | `0x05` | SetPixels        | count, then count × (index, r, g, b)             |
//! | `0x06` | ClearFrameBuffer | none                                             |

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::frame_store::FRAME_COUNT;
use crate::geometry::PIXEL_COUNT;
use crate::pixel::Rgb;

/// Bytes of pixel data carried by a `SetFrame` command
pub const FRAME_PIXEL_BYTES: usize = PIXEL_COUNT * 3;

/// `SetFrame` payload: slot byte, four delay bytes, then pixel data
pub const SET_FRAME_LEN: usize = 1 + 4 + FRAME_PIXEL_BYTES;

/// `SetPixel` payload and each `SetPixels` item: index, r, g, b
pub const PIXEL_ITEM_LEN: usize = 4;

/// Largest number of bytes any single read waits for
pub const MAX_READ_LEN: usize = SET_FRAME_LEN;

/// Command identifier, the first byte of every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    ChangeMode = 0x01,
    SetFrame = 0x02,
    /// Reserved for bulk frame upload; not implemented.
    SetFrames = 0x03,
    SetPixel = 0x04,
    SetPixels = 0x05,
    ClearFrameBuffer = 0x06,
}

impl TryFrom<u8> for Opcode {
    type Error = CommandError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(Self::ChangeMode),
            0x02 => Ok(Self::SetFrame),
            0x03 => Ok(Self::SetFrames),
            0x04 => Ok(Self::SetPixel),
            0x05 => Ok(Self::SetPixels),
            0x06 => Ok(Self::ClearFrameBuffer),
            other => Err(CommandError::UnknownOpcode(other)),
        }
    }
}

/// What the strip is currently doing. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum DisplayMode {
    /// Strip blank, frame store empty
    #[default]
    Sleep = 0x00,
    /// Slot 0 is shown as soon as it is written
    SingleFrame = 0x01,
    /// Play every used slot once, then stop
    FrameBufferOnce = 0x02,
    /// Play every used slot, forever
    FrameBufferLoop = 0x03,
    /// Reserved for procedural animations
    Animation = 0x04,
}

impl DisplayMode {
    /// Decode a mode byte. Unknown bytes yield `None`; `ChangeMode` treats
    /// them like [`DisplayMode::Sleep`].
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Sleep),
            0x01 => Some(Self::SingleFrame),
            0x02 => Some(Self::FrameBufferOnce),
            0x03 => Some(Self::FrameBufferLoop),
            0x04 => Some(Self::Animation),
            _ => None,
        }
    }
}

/// A command as sent by a client.
///
/// The controller decodes commands incrementally off the socket; this type is
/// the client-side view used to build wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Raw mode byte, so clients can also send unknown modes
    ChangeMode(u8),
    SetFrame {
        slot: u8,
        delay_ms: u32,
        pixels: Vec<Rgb>,
    },
    SetPixel {
        index: u8,
        color: Rgb,
    },
    SetPixels(Vec<(u8, Rgb)>),
    ClearFrameBuffer,
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::ChangeMode(_) => Opcode::ChangeMode,
            Self::SetFrame { .. } => Opcode::SetFrame,
            Self::SetPixel { .. } => Opcode::SetPixel,
            Self::SetPixels(_) => Opcode::SetPixels,
            Self::ClearFrameBuffer => Opcode::ClearFrameBuffer,
        }
    }

    /// Encode to the exact bytes a client writes on a fresh connection.
    ///
    /// `SetFrame` pixel lists are padded with black or truncated to
    /// [`PIXEL_COUNT`]; `SetPixels` lists longer than 255 items are
    /// rejected since the count is a single byte.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = vec![self.opcode() as u8];
        match self {
            Self::ChangeMode(mode) => out.push(*mode),
            Self::SetFrame {
                slot,
                delay_ms,
                pixels,
            } => {
                out.reserve(SET_FRAME_LEN);
                out.push(*slot);
                out.extend_from_slice(&delay_ms.to_be_bytes());
                let padding = std::iter::repeat(Rgb::BLACK);
                for color in pixels.iter().copied().chain(padding).take(PIXEL_COUNT) {
                    out.extend_from_slice(&color.to_array());
                }
            }
            Self::SetPixel { index, color } => {
                out.push(*index);
                out.extend_from_slice(&color.to_array());
            }
            Self::SetPixels(items) => {
                let count =
                    u8::try_from(items.len()).map_err(|_| EncodeError::TooManyPixels(items.len()))?;
                out.push(count);
                for (index, color) in items {
                    out.push(*index);
                    out.extend_from_slice(&color.to_array());
                }
            }
            Self::ClearFrameBuffer => {}
        }
        Ok(out)
    }
}

/// Error building a command on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{0} pixels do not fit in a single-byte count")]
    TooManyPixels(usize),
}

/// Why a command was abandoned.
///
/// None of these are reported to the peer. All of them end the current
/// connection and none of them stop the controller.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Payload bytes did not arrive before the socket timeout.
    #[error("timed out after {waited:?} waiting for {needed} bytes ({available} available)")]
    Timeout {
        needed: usize,
        available: usize,
        waited: Duration,
    },

    #[error("frame slot {0} out of range (0..{max})", max = FRAME_COUNT)]
    SlotOutOfRange(u8),

    #[error("pixel index {0} out of range (0..{max})", max = PIXEL_COUNT)]
    PixelOutOfRange(u8),

    #[error("pixel count {0} exceeds strip length {max}", max = PIXEL_COUNT)]
    CountOutOfRange(u8),

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("{0} is reserved and not implemented")]
    NotImplemented(&'static str),

    #[error("connection error: {0}")]
    Io(#[from] io::Error),

    #[error("pixel output failed: {0}")]
    Sink(String),
}

impl CommandError {
    /// Out-of-range slot, index or count.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::SlotOutOfRange(_) | Self::PixelOutOfRange(_) | Self::CountOutOfRange(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0x01, Opcode::ChangeMode)]
    #[test_case(0x02, Opcode::SetFrame)]
    #[test_case(0x03, Opcode::SetFrames)]
    #[test_case(0x04, Opcode::SetPixel)]
    #[test_case(0x05, Opcode::SetPixels)]
    #[test_case(0x06, Opcode::ClearFrameBuffer)]
    fn opcode_from_byte(byte: u8, expected: Opcode) {
        assert_eq!(Opcode::try_from(byte).ok(), Some(expected));
        assert_eq!(expected as u8, byte);
    }

    #[test_case(0x00; "zero")]
    #[test_case(0x07; "past table")]
    #[test_case(0xFF; "max")]
    fn unknown_opcode_is_rejected(byte: u8) {
        assert!(matches!(
            Opcode::try_from(byte),
            Err(CommandError::UnknownOpcode(b)) if b == byte
        ));
    }

    #[test]
    fn mode_bytes() {
        assert_eq!(DisplayMode::from_byte(0), Some(DisplayMode::Sleep));
        assert_eq!(DisplayMode::from_byte(3), Some(DisplayMode::FrameBufferLoop));
        assert_eq!(DisplayMode::from_byte(5), None);
        assert_eq!(DisplayMode::default(), DisplayMode::Sleep);
    }

    #[test]
    fn set_frame_length_matches_strip() {
        assert_eq!(SET_FRAME_LEN, 737);
    }

    #[test]
    fn encode_set_pixel() {
        let cmd = Command::SetPixel {
            index: 5,
            color: Rgb::new(255, 0, 0),
        };
        assert_eq!(cmd.encode().unwrap(), vec![0x04, 5, 255, 0, 0]);
    }

    #[test]
    fn encode_set_pixels() {
        let cmd = Command::SetPixels(vec![(0, Rgb::new(10, 0, 0)), (1, Rgb::new(0, 20, 0))]);
        assert_eq!(
            cmd.encode().unwrap(),
            vec![0x05, 2, 0, 10, 0, 0, 1, 0, 20, 0]
        );
    }

    #[test]
    fn encode_set_frame_pads_and_uses_big_endian_delay() {
        let cmd = Command::SetFrame {
            slot: 3,
            delay_ms: 0x0102_0304,
            pixels: vec![Rgb::new(9, 8, 7)],
        };
        let bytes = cmd.encode().unwrap();

        assert_eq!(bytes.len(), 1 + SET_FRAME_LEN);
        assert_eq!(&bytes[..6], &[0x02, 3, 1, 2, 3, 4]);
        assert_eq!(&bytes[6..9], &[9, 8, 7]);
        assert!(bytes[9..].iter().all(|&b| b == 0));
    }

    #[test]
    fn encode_rejects_oversized_pixel_list() {
        let cmd = Command::SetPixels(vec![(0, Rgb::BLACK); 256]);
        assert_eq!(cmd.encode(), Err(EncodeError::TooManyPixels(256)));
    }

    #[test]
    fn encode_change_mode_and_clear() {
        assert_eq!(Command::ChangeMode(0x03).encode().unwrap(), vec![0x01, 0x03]);
        assert_eq!(Command::ClearFrameBuffer.encode().unwrap(), vec![0x06]);
    }

    #[test]
    fn protocol_error_family() {
        assert!(CommandError::SlotOutOfRange(30).is_protocol_error());
        assert!(CommandError::PixelOutOfRange(250).is_protocol_error());
        assert!(CommandError::CountOutOfRange(250).is_protocol_error());
        assert!(!CommandError::UnknownOpcode(9).is_protocol_error());
    }
}
