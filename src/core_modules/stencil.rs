// THEORY:
// The stencil engine is the only part of the system that changes pixel values. It
// reads a tile whose halo is current and writes a blurred interior into a second
// tile of the same size. The halo of the output is never touched here; only
// allocation and halo exchange ever write halo cells.
//
// The kernel is the 5x5 binomial approximation of a Gaussian, pre-normalized so its
// weights sum to exactly 1. Every weight is a multiple of 1/256, so the weighted sum
// of byte values is exact in f64 and truncation gives the same byte on every rank
// regardless of where the tile boundaries fall.

use crate::core_modules::bordered_image::{BorderedImage, Coord};
use crate::core_modules::pixel::pixel::Pixel;

/// Half the kernel width; also the halo depth every tile carries.
pub const STENCIL_RADIUS: usize = 2;

const KERNEL_SIZE: usize = 2 * STENCIL_RADIUS + 1;

pub static GAUSSIAN_KERNEL: [[f64; KERNEL_SIZE]; KERNEL_SIZE] = [
    [1.0 / 256.0, 4.0 / 256.0, 6.0 / 256.0, 4.0 / 256.0, 1.0 / 256.0],
    [4.0 / 256.0, 16.0 / 256.0, 24.0 / 256.0, 16.0 / 256.0, 4.0 / 256.0],
    [6.0 / 256.0, 24.0 / 256.0, 36.0 / 256.0, 24.0 / 256.0, 6.0 / 256.0],
    [4.0 / 256.0, 16.0 / 256.0, 24.0 / 256.0, 16.0 / 256.0, 4.0 / 256.0],
    [1.0 / 256.0, 4.0 / 256.0, 6.0 / 256.0, 4.0 / 256.0, 1.0 / 256.0],
];

/// Convolves every interior pixel of `input` with `GAUSSIAN_KERNEL` into `output`.
pub fn apply_gaussian_blur(input: &BorderedImage, output: &mut BorderedImage) {
    assert!(
        input.border() >= STENCIL_RADIUS,
        "tile border {} is shallower than the stencil radius",
        input.border()
    );
    assert_eq!(
        (input.width(), input.height()),
        (output.width(), output.height()),
        "ping-pong tiles must have the same interior"
    );
    let radius = STENCIL_RADIUS as Coord;

    for y in 0..input.height() as Coord {
        for x in 0..input.width() as Coord {
            let mut red = 0.0f64;
            let mut green = 0.0f64;
            let mut blue = 0.0f64;

            for dy in -radius..=radius {
                let weights = &GAUSSIAN_KERNEL[(dy + radius) as usize];
                let window = input.row(x - radius, y + dy, KERNEL_SIZE);
                for (pixel, weight) in window.iter().zip(weights) {
                    red += pixel.red as f64 * weight;
                    green += pixel.green as f64 * weight;
                    blue += pixel.blue as f64 * weight;
                }
            }

            // Truncate, never round.
            output.set_pixel(x, y, Pixel::new(red as u8, green as u8, blue as u8));
        }
    }
}
