pub mod bordered_image;
pub mod buffer_codec;
pub mod halo_exchange;
pub mod partition;
pub mod pixel;
pub mod scatter_gather;
pub mod stencil;
pub mod topology;
pub mod utils;
