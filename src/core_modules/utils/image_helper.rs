// THEORY:
// `image_helper` is the engine's only contact with files. It turns a bitmap on disk
// into a flat interleaved RGB buffer and back, and nothing else; all pixel work
// happens on `BorderedImage`s inside the engine.

pub mod image_helper {
    use crate::error::BlurError;
    use image::ImageEncoder;
    use std::fs::File;
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// A whole image as row-major interleaved RGB bytes.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RgbBuffer {
        pub width: usize,
        pub height: usize,
        pub data: Vec<u8>,
    }

    impl RgbBuffer {
        pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
            assert_eq!(
                data.len(),
                width * height * 3,
                "RGB buffer does not match {}x{}",
                width,
                height
            );
            Self { width, height, data }
        }

        /// A buffer where every pixel has the same color.
        pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
            let data = rgb.iter().copied().cycle().take(width * height * 3).collect();
            Self::new(width, height, data)
        }
    }

    /// Where the coordinator obtains the image to blur.
    pub trait PixelSource: Send + Sync {
        fn load(&self) -> Result<RgbBuffer, BlurError>;
    }

    /// A bitmap file on disk.
    #[derive(Debug, Clone)]
    pub struct BmpFile(pub PathBuf);

    impl PixelSource for BmpFile {
        fn load(&self) -> Result<RgbBuffer, BlurError> {
            load_rgb(&self.0)
        }
    }

    impl PixelSource for RgbBuffer {
        fn load(&self) -> Result<RgbBuffer, BlurError> {
            Ok(self.clone())
        }
    }

    /// Decodes any format the `image` crate understands into 8-bit RGB.
    pub fn load_rgb(path: &Path) -> Result<RgbBuffer, BlurError> {
        let decoded = image::open(path)?.into_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(RgbBuffer::new(
            width as usize,
            height as usize,
            decoded.into_raw(),
        ))
    }

    pub fn save_bmp(path: &Path, buffer: &RgbBuffer) -> Result<(), BlurError> {
        let mut output = BufWriter::new(File::create(path)?);
        let encoder = image::codecs::bmp::BmpEncoder::new(&mut output);

        encoder.write_image(
            &buffer.data,
            buffer.width as u32,
            buffer.height as u32,
            image::ExtendedColorType::Rgb8,
        )?;
        output.flush()?;

        Ok(())
    }
}
