use std::io::{self, Write};

use crate::PixelSink;
use crate::geometry::{PIXEL_COUNT, Perimeter, Position};
use crate::pixel::{PixelIndex, Rgb};

/// Terminal-based strip display for development on the host.
///
/// Renders the perimeter as a frame of 24-bit ANSI coloured half blocks,
/// two LED rows per terminal line, laid out with the same geometry as the
/// window.
#[derive(Debug)]
pub struct TerminalSink {
    perimeter: Perimeter,
    pixels: [Rgb; PIXEL_COUNT],
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSink {
    /// Create a new terminal display.
    pub fn new() -> Self {
        Self {
            perimeter: Perimeter::MATRIX,
            pixels: [Rgb::BLACK; PIXEL_COUNT],
        }
    }
}

/// Error type for terminal display operations.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

impl PixelSink for TerminalSink {
    type Error = DisplayError;

    fn set_pixel(&mut self, index: PixelIndex, color: Rgb) {
        self.pixels[index.value()] = color;
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        let mut out = io::stdout().lock();
        // Clear screen and home the cursor before each frame
        write!(out, "\x1B[2J\x1B[H")?;
        render_strip(&mut out, &self.perimeter, &self.pixels)
    }
}

/// Render strip colours to any writer. Extracted for testability.
fn render_strip(
    w: &mut impl Write,
    perimeter: &Perimeter,
    pixels: &[Rgb],
) -> Result<(), DisplayError> {
    let color_at = |x: u16, y: u16| {
        perimeter
            .index_of(Position { x, y })
            .and_then(|i| pixels.get(i).copied())
    };

    let height = perimeter.height();
    // Walk from the top edge down, two LED rows per line
    for upper in (0..height).rev().step_by(2) {
        for x in 0..perimeter.width() {
            let top = color_at(x, upper);
            let bottom = upper.checked_sub(1).and_then(|y| color_at(x, y));
            write!(w, "{}", format_cell(top, bottom))?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

/// Map an upper/lower LED pair to an ANSI-coloured half block.
fn format_cell(top: Option<Rgb>, bottom: Option<Rgb>) -> String {
    match (top, bottom) {
        (None, None) => " ".to_string(),
        (Some(t), None) => format!("\x1b[38;2;{};{};{}m▀\x1b[0m", t.r, t.g, t.b),
        (None, Some(b)) => format!("\x1b[38;2;{};{};{}m▄\x1b[0m", b.r, b.g, b.b),
        (Some(t), Some(b)) => format!(
            "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m▀\x1b[0m",
            t.r, t.g, t.b, b.r, b.g, b.b
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(perimeter: &Perimeter, pixels: &[Rgb]) -> String {
        let mut buf = Vec::new();
        render_strip(&mut buf, perimeter, pixels).expect("rendering to buffer should succeed");
        String::from_utf8(buf).expect("output should be valid UTF-8")
    }

    #[test]
    fn window_renders_half_height() {
        let output = render_to_string(&Perimeter::MATRIX, &[Rgb::BLACK; PIXEL_COUNT]);

        assert_eq!(output.lines().count(), 39);
    }

    #[test]
    fn edge_rows_use_half_blocks() {
        let p = Perimeter::new(4, 4).unwrap();
        let pixels = vec![Rgb::new(1, 1, 1); p.pixel_count()];

        let output = render_to_string(&p, &pixels);
        let lines: Vec<_> = output.lines().collect();

        // Middle two columns of the bottom line: only the bottom LED is lit
        assert!(lines[1].contains('▄'));
        // Middle columns of the top line: only the top LED is lit
        assert!(lines[0].contains('▀'));
    }

    #[test]
    fn origin_colour_appears_in_bottom_line() {
        let p = Perimeter::new(4, 4).unwrap();
        let mut pixels = vec![Rgb::BLACK; p.pixel_count()];
        pixels[0] = Rgb::new(255, 0, 0);

        let output = render_to_string(&p, &pixels);
        let last_line = output.lines().last().expect("at least one line");

        assert!(
            last_line.starts_with("\x1b[38;2;0;0;0m\x1b[48;2;255;0;0m"),
            "bottom-left LED should be the lower half of the first cell"
        );
    }

    #[test]
    fn odd_height_has_unpaired_bottom_row() {
        let p = Perimeter::new(3, 3).unwrap();
        let pixels = vec![Rgb::new(2, 2, 2); p.pixel_count()];

        let output = render_to_string(&p, &pixels);

        assert_eq!(output.lines().count(), 2);
        assert!(output.lines().last().unwrap().contains('▀'));
        assert!(!output.lines().last().unwrap().contains("48;2"));
    }

    #[test]
    fn empty_cells_have_no_ansi_codes() {
        assert_eq!(format_cell(None, None), " ");
    }
}
