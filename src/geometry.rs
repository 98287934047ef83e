//! Perimeter geometry of the LED frame.
//!
//! The strip runs around the edge of a rectangular window frame. Index 0 is
//! the bottom-left corner and indices increase anti-clockwise: along the
//! bottom edge to the right, up the right edge, back along the top edge and
//! down the left edge. The vertical edges own the corners.

/// LEDs along each vertical edge
pub const HEIGHT: u16 = 78;

/// LEDs along each horizontal edge, corners included
pub const WIDTH: u16 = 46;

/// Total number of LEDs on the strip
pub const PIXEL_COUNT: usize = Perimeter::MATRIX.pixel_count();

/// Physical position of an LED; `(0, 0)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

/// A rectangle whose border is populated with LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perimeter {
    width: u16,
    height: u16,
}

impl Perimeter {
    /// The frame this firmware drives.
    pub const MATRIX: Self = Self {
        width: WIDTH,
        height: HEIGHT,
    };

    /// Returns `None` for rectangles too small to have a border of their own.
    pub const fn new(width: u16, height: u16) -> Option<Self> {
        if width >= 2 && height >= 2 {
            Some(Self { width, height })
        } else {
            None
        }
    }

    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of LEDs along the border: `2 * height + 2 * (width - 2)`.
    pub const fn pixel_count(&self) -> usize {
        2 * self.height as usize + 2 * (self.width as usize - 2)
    }

    /// Map a linear strip index to its position on the border.
    pub fn position(&self, index: usize) -> Option<Position> {
        if index >= self.pixel_count() {
            return None;
        }

        let w = self.width as usize;
        let h = self.height as usize;
        let bottom_end = w - 1; // first index of the right edge
        let right_end = bottom_end + h; // first index of the top edge
        let top_end = right_end + (w - 2); // first index of the left edge

        let (x, y) = if index < bottom_end {
            (index, 0)
        } else if index < right_end {
            (w - 1, index - bottom_end)
        } else if index < top_end {
            (w - 2 - (index - right_end), h - 1)
        } else {
            (0, h - 1 - (index - top_end))
        };

        Some(Position {
            x: x as u16,
            y: y as u16,
        })
    }

    /// All positions in strip order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.pixel_count()).filter_map(|i| self.position(i))
    }

    /// Inverse of [`Perimeter::position`].
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        let w = self.width as usize;
        let h = self.height as usize;
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= w || y >= h {
            return None;
        }

        if x == 0 {
            // Left edge: the corner at the bottom is index 0, the rest
            // are walked downwards at the end of the strip.
            if y == 0 {
                Some(0)
            } else {
                Some(2 * w - 3 + h + (h - 1 - y))
            }
        } else if x == w - 1 {
            Some(w - 1 + y)
        } else if y == 0 {
            Some(x)
        } else if y == h - 1 {
            Some(w - 1 + h + (w - 2 - x))
        } else {
            None
        }
    }
}
