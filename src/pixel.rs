use crate::geometry::PIXEL_COUNT;

/// A single LED colour, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels in wire order (red, green, blue).
    #[inline]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Index of a pixel along the perimeter (0 = bottom-left corner).
///
/// Only constructible for indices below [`PIXEL_COUNT`], so holders of a
/// `PixelIndex` can address pixel buffers without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelIndex(u16);

impl PixelIndex {
    pub const fn new(value: usize) -> Option<Self> {
        if value < PIXEL_COUNT {
            Some(Self(value as u16))
        } else {
            None
        }
    }

    #[inline]
    pub const fn value(self) -> usize {
        self.0 as usize
    }

    /// All valid indices in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PIXEL_COUNT as u16).map(Self)
    }
}
