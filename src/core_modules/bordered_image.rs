// THEORY:
// A `BorderedImage` is a rectangular grid of pixels surrounded by a fixed-depth halo.
// It is the unit of ownership in the engine: the coordinator holds one for the whole
// picture, and every rank holds two of them (current and next) for its tile.
//
// Key architectural principles:
// 1.  **Interior-relative addressing**: Callers never see the border offset. `(0, 0)`
//     is the first interior pixel; the halo is reached with negative coordinates or
//     coordinates past `width`/`height`. All `+border` arithmetic lives in `index`.
// 2.  **Zero by construction**: Allocation fills the halo with black. A tile edge
//     with no neighboring rank keeps that black border for the whole run, which is
//     the engine's edge-padding policy.
// 3.  **Flat storage**: Pixels live in one row-major `Vec<Pixel>` with a row stride of
//     `width + 2 * border`. `(x, y)` always means (column, row).

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use std::fmt::Write;

/// Signed interior-relative coordinate; negative values address the halo.
pub type Coord = isize;

/// An owned pixel grid with a halo of `border` pixels on every side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderedImage {
    width: usize,
    height: usize,
    border: usize,
    pixels: Vec<Pixel>,
}

impl BorderedImage {
    /// Allocates a black image with the given interior size and halo depth.
    pub fn new(width: usize, height: usize, border: usize) -> Self {
        let total = (width + 2 * border) * (height + 2 * border);
        Self {
            width,
            height,
            border,
            pixels: vec![Pixel::BLACK; total],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn border(&self) -> usize {
        self.border
    }

    fn stride(&self) -> usize {
        self.width + 2 * self.border
    }

    /// The single place where interior-relative coordinates become storage offsets.
    /// Addresses outside the bordered extent are a programming error.
    #[inline]
    fn index(&self, x: Coord, y: Coord) -> usize {
        let border = self.border as Coord;
        let column = x + border;
        let row = y + border;
        assert!(
            column >= 0
                && row >= 0
                && (column as usize) < self.stride()
                && (row as usize) < self.height + 2 * self.border,
            "pixel ({}, {}) lies outside a {}x{} image with border {}",
            x,
            y,
            self.width,
            self.height,
            self.border
        );
        row as usize * self.stride() + column as usize
    }

    #[inline]
    pub fn pixel(&self, x: Coord, y: Coord) -> Pixel {
        self.pixels[self.index(x, y)]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: Coord, y: Coord) -> &mut Pixel {
        let index = self.index(x, y);
        &mut self.pixels[index]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: Coord, y: Coord, pixel: Pixel) {
        *self.pixel_mut(x, y) = pixel;
    }

    /// One row of `len` pixels starting at `(x, y)`; the row may extend into the halo.
    pub fn row(&self, x: Coord, y: Coord, len: usize) -> &[Pixel] {
        let start = self.index(x, y);
        &self.pixels[start..start + len]
    }

    pub fn row_mut(&mut self, x: Coord, y: Coord, len: usize) -> &mut [Pixel] {
        let start = self.index(x, y);
        &mut self.pixels[start..start + len]
    }

    /// Renders one channel of the full bordered grid, halo included, as a text table.
    pub fn channel_dump(&self, channel: usize) -> String {
        let mut out = String::new();
        for row in self.pixels.chunks(self.stride()) {
            for pixel in row {
                let _ = write!(out, "{:3} ", pixel.channel(channel));
            }
            out.push('\n');
        }
        out
    }
}

/// Renders one channel of a flat interleaved RGB buffer as a `width`-wide text table.
pub fn buffer_channel_dump(buffer: &[u8], width: usize, height: usize, channel: usize) -> String {
    let mut out = String::new();
    for y in 0..height {
        for x in 0..width {
            let _ = write!(out, "{:3} ", buffer[(y * width + x) * CHANNELS + channel]);
        }
        out.push('\n');
    }
    out
}
