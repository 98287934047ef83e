use crate::geometry::PIXEL_COUNT;
use crate::pixel::{PixelIndex, Rgb};

/// Number of frame slots held in memory
pub const FRAME_COUNT: usize = 30;

/// A full-strip snapshot plus how long playback waits before showing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: [Rgb; PIXEL_COUNT],
    delay_ms: u32,
    used: bool,
}

impl Frame {
    /// Create a populated frame.
    pub fn new(pixels: [Rgb; PIXEL_COUNT], delay_ms: u32) -> Self {
        Self {
            pixels,
            delay_ms,
            used: true,
        }
    }

    /// Decode a frame from wire-order RGB bytes.
    ///
    /// Missing trailing bytes leave their pixels black.
    pub fn from_rgb_bytes(bytes: &[u8], delay_ms: u32) -> Self {
        let mut pixels = [Rgb::BLACK; PIXEL_COUNT];
        for (pixel, rgb) in pixels.iter_mut().zip(bytes.chunks_exact(3)) {
            *pixel = Rgb::new(rgb[0], rgb[1], rgb[2]);
        }
        Self::new(pixels, delay_ms)
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgb; PIXEL_COUNT] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, index: PixelIndex) -> Rgb {
        self.pixels[index.value()]
    }

    /// Playback dwell time in milliseconds.
    #[inline]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// `false` for slots that were never written (or were cleared).
    #[inline]
    pub fn is_used(&self) -> bool {
        self.used
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            pixels: [Rgb::BLACK; PIXEL_COUNT],
            delay_ms: 0,
            used: false,
        }
    }
}

/// Frame store slot (0..FRAME_COUNT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: Self = Self(0);

    pub const fn new(value: usize) -> Option<Self> {
        if value < FRAME_COUNT {
            Some(Self(value as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0 as usize
    }

    /// The following slot and whether the store wrapped back to slot 0.
    pub const fn next(self) -> (Self, bool) {
        if self.value() + 1 < FRAME_COUNT {
            (Self(self.0 + 1), false)
        } else {
            (Self::FIRST, true)
        }
    }
}

impl Default for SlotIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Fixed-capacity storage for [`FRAME_COUNT`] frames.
///
/// Slots live in a single heap allocation made at construction; writes and
/// clears reuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStore {
    slots: Box<[Frame]>,
}

impl FrameStore {
    /// Create a store with every slot unused.
    pub fn new() -> Self {
        let slots = std::iter::repeat_with(Frame::default)
            .take(FRAME_COUNT)
            .collect();
        Self { slots }
    }

    /// Overwrite exactly the named slot.
    #[inline]
    pub fn write(&mut self, index: SlotIndex, frame: Frame) {
        self.slots[index.value()] = frame;
    }

    #[inline]
    pub fn read(&self, index: SlotIndex) -> &Frame {
        &self.slots[index.value()]
    }

    /// Reset every slot to an unused, black, zero-delay frame.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Frame::default();
        }
    }

    /// Slots currently holding a frame.
    pub fn used_slots(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, frame)| frame.is_used())
            .filter_map(|(i, _)| SlotIndex::new(i))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}
