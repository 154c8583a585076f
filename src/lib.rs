// THEORY:
// This file is the main entry point for the `halo_blur` library crate. It exports
// the `BlurPipeline` and its configuration and report types as the high-level
// interface, while the building blocks (`core_modules`) stay available for callers
// that want to drive tiles, halos or the rank world directly.
//
// Layering, bottom up:
// - `core_modules::pixel`, `bordered_image`, `buffer_codec`: the data model
// - `core_modules::topology`, `partition`: pure geometry of the process grid
// - `parallel_pipeline`: the rank world and its channels
// - `core_modules::scatter_gather`, `halo_exchange`, `stencil`: the distributed algorithm
// - `pipeline`: one complete run

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use crate::core_modules::utils::image_helper::image_helper::{BmpFile, PixelSource, RgbBuffer};
pub use crate::error::BlurError;
pub use crate::pipeline::{BlurPipeline, BlurReport, PipelineConfig, blur_reference};
