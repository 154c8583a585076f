// THEORY:
// The `Pixel` module is the most fundamental unit of the blur engine. It is a
// "dumb" data container for a single RGB pixel. It knows how to be built from,
// and flattened back into, the interleaved byte triples that every buffer in the
// system uses for transport and file I/O. It knows nothing about its position.
//
// Alpha is deliberately absent: every image that flows through the engine has
// exactly three 8-bit channels.

pub mod pixel {
    pub type Byte = u8;
    pub type Bytes = Vec<Byte>;
    pub type Channel = Byte;

    /// Number of interleaved bytes one pixel occupies in a flat buffer.
    pub const CHANNELS: usize = 3;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub const BLACK: Pixel = Pixel { red: 0, green: 0, blue: 0 };

        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Reads channel `index` (0 = red, 1 = green, 2 = blue).
        pub fn channel(&self, index: usize) -> Channel {
            match index {
                0 => self.red,
                1 => self.green,
                2 => self.blue,
                _ => panic!("Pixel has no channel {}.", index),
            }
        }
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Pixel> for [Byte; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue]
        }
    }

    impl From<Pixel> for Bytes {
        fn from(pixel: Pixel) -> Self {
            vec![pixel.red, pixel.green, pixel.blue]
        }
    }
}
