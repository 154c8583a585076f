// THEORY:
// The buffer codec is the bridge between the 2D `BorderedImage` world and the flat
// byte world of messages and files. A buffer is a row-major run of interleaved
// (R, G, B) triples for some rectangle; it carries no border information. The
// caller picks the rectangle, and may place it partly or wholly inside the halo by
// using negative or past-the-end interior-relative offsets.
//
// Both directions are pure data movement: no channel value is ever transformed,
// so packing a region and unpacking it back is byte-exact.

use crate::core_modules::bordered_image::{BorderedImage, Coord};
use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};

/// A flat interleaved RGB byte sequence, used only for transport and file I/O.
pub type ImageBuffer = Vec<u8>;

/// A rectangle in interior-relative coordinates of some `BorderedImage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: Coord,
    pub y: Coord,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x: Coord, y: Coord, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Number of bytes a buffer for this region occupies.
    pub fn byte_len(&self) -> usize {
        self.width * self.height * CHANNELS
    }
}

/// Copies `region.byte_len()` bytes from `buffer` into `target`, row by row,
/// starting at the region's top-left corner.
pub fn image_from_buffer(buffer: &[u8], region: Region, target: &mut BorderedImage) {
    if region.byte_len() == 0 {
        return;
    }
    let stride = region.width * CHANNELS;
    for (row_index, row_bytes) in buffer[..region.byte_len()]
        .chunks_exact(stride)
        .enumerate()
    {
        let row = target.row_mut(region.x, region.y + row_index as Coord, region.width);
        for (pixel, bytes) in row.iter_mut().zip(row_bytes.chunks_exact(CHANNELS)) {
            *pixel = Pixel::from(bytes);
        }
    }
}

/// Copies the pixels of `region` out of `image` into the front of `target`.
pub fn buffer_from_image(image: &BorderedImage, region: Region, target: &mut [u8]) {
    if region.byte_len() == 0 {
        return;
    }
    let stride = region.width * CHANNELS;
    for (row_index, row_bytes) in target[..region.byte_len()]
        .chunks_exact_mut(stride)
        .enumerate()
    {
        let row = image.row(region.x, region.y + row_index as Coord, region.width);
        for (pixel, bytes) in row.iter().zip(row_bytes.chunks_exact_mut(CHANNELS)) {
            bytes.copy_from_slice(&<[u8; CHANNELS]>::from(*pixel));
        }
    }
}

/// Packs `region` into a freshly allocated buffer of exactly its size.
pub fn pack(image: &BorderedImage, region: Region) -> ImageBuffer {
    let mut buffer = vec![0u8; region.byte_len()];
    buffer_from_image(image, region, &mut buffer);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_image(width: usize, height: usize, border: usize) -> BorderedImage {
        let mut image = BorderedImage::new(width, height, border);
        let b = border as Coord;
        let mut value = 0u8;
        for y in -b..(height as Coord + b) {
            for x in -b..(width as Coord + b) {
                image.set_pixel(x, y, Pixel::new(value, value.wrapping_add(1), value.wrapping_add(2)));
                value = value.wrapping_add(3);
            }
        }
        image
    }

    #[test]
    fn packing_is_row_major_and_interleaved() {
        let mut image = BorderedImage::new(2, 2, 1);
        image.set_pixel(0, 0, Pixel::new(1, 2, 3));
        image.set_pixel(1, 0, Pixel::new(4, 5, 6));
        image.set_pixel(0, 1, Pixel::new(7, 8, 9));
        image.set_pixel(1, 1, Pixel::new(10, 11, 12));
        let buffer = pack(&image, Region::new(0, 0, 2, 2));
        assert_eq!(buffer, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn halo_region_round_trips() {
        let source = numbered_image(5, 4, 2);
        let region = Region::new(-2, -1, 4, 3);
        let buffer = pack(&source, region);

        let mut target = BorderedImage::new(5, 4, 2);
        image_from_buffer(&buffer, region, &mut target);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(target.pixel(x - 2, y - 1), source.pixel(x - 2, y - 1));
            }
        }
        // Nothing outside the region is touched.
        assert_eq!(target.pixel(2, 2), Pixel::BLACK);
    }

    #[test]
    fn unpacking_into_a_shifted_region_moves_pixels() {
        let source = numbered_image(3, 3, 2);
        let buffer = pack(&source, Region::new(0, 0, 2, 2));
        let mut target = BorderedImage::new(3, 3, 2);
        image_from_buffer(&buffer, Region::new(-2, 3, 2, 2), &mut target);
        assert_eq!(target.pixel(-2, 3), source.pixel(0, 0));
        assert_eq!(target.pixel(-1, 4), source.pixel(1, 1));
    }

    #[test]
    fn oversized_buffers_only_use_the_region_prefix() {
        let source = numbered_image(2, 2, 0);
        let mut buffer = vec![0xAAu8; 64];
        buffer_from_image(&source, Region::new(0, 0, 2, 1), &mut buffer);
        assert_eq!(&buffer[..6], &pack(&source, Region::new(0, 0, 2, 1))[..]);
        assert!(buffer[6..].iter().all(|&b| b == 0xAA));
    }
}
