// THEORY:
// The `pipeline` module is the top-level API for the blur engine. It wires the
// core modules into one run:
//
//   environment -> load (coordinator) -> broadcast size -> topology -> partition
//   -> scatter -> (stencil, swap, halo exchange) x repetitions -> gather -> teardown
//
// Every rank runs the same program; only the coordinator touches the global image.
// The result is bit-identical to a single-rank run for any number of ranks, because
// each tile's halo always holds exactly the pixels a whole-image pass would read.

use crate::core_modules::bordered_image::BorderedImage;
use crate::core_modules::buffer_codec::{Region, image_from_buffer, pack};
use crate::core_modules::halo_exchange::exchange_halos;
use crate::core_modules::partition::PartitionPlan;
use crate::core_modules::scatter_gather::{gather, scatter};
use crate::core_modules::stencil::{STENCIL_RADIUS, apply_gaussian_blur};
use crate::core_modules::topology::{GridShape, ProcessTopology};
use crate::core_modules::utils::image_helper::image_helper::{PixelSource, RgbBuffer};
use crate::error::BlurError;
use crate::parallel_pipeline::{Communicator, World, root_cause};
use crate::core_modules::bordered_image::buffer_channel_dump;
use log::{Level, debug, info, log_enabled, trace};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Repetitions used when none are given.
pub const DEFAULT_REPETITIONS: u32 = 5;

/// Configuration for the BlurPipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Number of ranks the image is split across.
    pub processes: usize,
    /// Number of stencil + halo exchange cycles.
    pub repetitions: u32,
}

/// The coordinator's outcome of a successful run.
#[derive(Debug, Clone)]
pub struct BlurReport {
    pub image: RgbBuffer,
    pub processes: usize,
    pub repetitions: u32,
    /// Longest compute+exchange time over all ranks; excludes load, scatter and gather.
    pub elapsed: Duration,
}

impl BlurReport {
    /// `processes,repetitions,seconds`
    pub fn summary_line(&self) -> String {
        format!(
            "{},{},{:.6}",
            self.processes,
            self.repetitions,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The main, top-level struct for the blur engine.
pub struct BlurPipeline {
    config: PipelineConfig,
}

impl BlurPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Blurs the image the coordinator loads from `source`.
    pub async fn run<S: PixelSource + 'static>(&self, source: S) -> Result<BlurReport, BlurError> {
        let source: Arc<dyn PixelSource> = Arc::new(source);
        let repetitions = self.config.repetitions;
        let shape = GridShape::balanced(self.config.processes.max(1));
        info!(
            "blurring with {} ranks on a {}x{} grid, {} repetitions",
            self.config.processes, shape.grid_x, shape.grid_y, repetitions
        );

        let mut outcomes = World::launch(self.config.processes, |comm| {
            run_rank(comm, Arc::clone(&source), repetitions)
        })
        .await?;

        if let Some(error) = root_cause(&mut outcomes) {
            return Err(error);
        }
        match outcomes.into_iter().next() {
            Some(Ok(Some(report))) => Ok(report),
            _ => Err(BlurError::Environment(
                "coordinator finished without a report".to_string(),
            )),
        }
    }
}

fn bordered_from_rgb(buffer: &RgbBuffer, border: usize) -> BorderedImage {
    let mut image = BorderedImage::new(buffer.width, buffer.height, border);
    image_from_buffer(
        &buffer.data,
        Region::new(0, 0, buffer.width, buffer.height),
        &mut image,
    );
    image
}

fn rgb_from_bordered(image: &BorderedImage) -> RgbBuffer {
    let data = pack(image, Region::new(0, 0, image.width(), image.height()));
    RgbBuffer::new(image.width(), image.height(), data)
}

/// The program every rank runs. Only the coordinator returns a report.
async fn run_rank(
    mut comm: Communicator,
    source: Arc<dyn PixelSource>,
    repetitions: u32,
) -> Result<Option<BlurReport>, BlurError> {
    let border = STENCIL_RADIUS;

    let mut global = if comm.is_coordinator() {
        let loaded = source.load()?;
        info!("loaded {}x{} image", loaded.width, loaded.height);
        if log_enabled!(Level::Trace) {
            trace!(
                "input red channel:\n{}",
                buffer_channel_dump(&loaded.data, loaded.width, loaded.height, 0)
            );
        }
        Some(bordered_from_rgb(&loaded, border))
    } else {
        None
    };

    let dimensions = global.as_ref().map(|g| (g.width(), g.height()));
    let (width, height) = comm.broadcast_dimensions(dimensions).await?;

    let shape = GridShape::balanced(comm.size());
    let plan = PartitionPlan::new(width, height, shape, border)?;
    let topology = ProcessTopology::new(shape, comm.rank());
    let tile = plan.tile(topology.coord);
    debug!(
        "rank {} at {:?} owns {}x{} at ({}, {}){}{}",
        topology.rank,
        topology.coord,
        tile.width,
        tile.height,
        tile.origin_x,
        tile.origin_y,
        if topology.is_last_column() { ", remainder column" } else { "" },
        if topology.is_last_row() { ", remainder row" } else { "" },
    );

    let mut current = scatter(&mut comm, &plan, border, global.as_ref()).await?;
    let mut next = BorderedImage::new(current.width(), current.height(), border);
    if log_enabled!(Level::Trace) {
        trace!("rank {} scattered red channel:\n{}", comm.rank(), current.channel_dump(0));
    }

    let started = Instant::now();
    for _ in 0..repetitions {
        apply_gaussian_blur(&current, &mut next);
        std::mem::swap(&mut current, &mut next);
        exchange_halos(&mut comm, &topology, &mut current).await?;
    }
    let longest = comm.reduce_max_elapsed(started.elapsed()).await?;
    drop(next);

    gather(&mut comm, &plan, &current, global.as_mut()).await?;

    Ok(match (global, longest) {
        (Some(global), Some(elapsed)) => Some(BlurReport {
            image: rgb_from_bordered(&global),
            processes: comm.size(),
            repetitions,
            elapsed,
        }),
        _ => None,
    })
}

/// Blurs `input` as one tile with no communication at all; the halo stays black.
pub fn blur_reference(input: &RgbBuffer, repetitions: u32) -> RgbBuffer {
    let mut current = bordered_from_rgb(input, STENCIL_RADIUS);
    let mut next = BorderedImage::new(input.width, input.height, STENCIL_RADIUS);
    for _ in 0..repetitions {
        apply_gaussian_blur(&current, &mut next);
        std::mem::swap(&mut current, &mut next);
    }
    rgb_from_bordered(&current)
}
