// THEORY:
// Scatter and gather move tiles between the coordinator's global image and the ranks.
//
// Scatter: for every rank, the coordinator packs that rank's tile *plus* a halo of
// `border` pixels on each side. Tiles on the image edge simply read into the global
// image's own black border, so no edge needs special treatment. One send buffer,
// sized for the largest tile, is reused for every rank, and only the bytes a rank
// needs are sent. The coordinator's own tile goes through the same pack/unpack path.
//
// Gather: every rank packs only its interior and the coordinator unpacks each one
// at that rank's offset. Tiles partition the interior, so every interior pixel of
// the global image is written exactly once.

use crate::core_modules::bordered_image::{BorderedImage, Coord};
use crate::core_modules::buffer_codec::{Region, buffer_from_image, image_from_buffer, pack};
use crate::core_modules::partition::{PartitionPlan, Tile};
use crate::error::BlurError;
use crate::parallel_pipeline::{COORDINATOR, Communicator, Message};
use log::debug;

/// Where a received scatter buffer lands inside a fresh local tile.
fn local_halo_region(tile: &Tile, border: usize) -> Region {
    let b = border as Coord;
    Region::new(-b, -b, tile.width + 2 * border, tile.height + 2 * border)
}

fn unpack_tile(buffer: &[u8], tile: &Tile, border: usize) -> BorderedImage {
    let mut local = BorderedImage::new(tile.width, tile.height, border);
    image_from_buffer(buffer, local_halo_region(tile, border), &mut local);
    local
}

/// Distributes tiles with their initial halo. The coordinator passes the global
/// image; every rank gets back its own freshly allocated tile.
pub async fn scatter(
    comm: &mut Communicator,
    plan: &PartitionPlan,
    border: usize,
    global: Option<&BorderedImage>,
) -> Result<BorderedImage, BlurError> {
    let own_tile = plan.tile_for_rank(comm.rank());

    if !comm.is_coordinator() {
        let expected = local_halo_region(&own_tile, border).byte_len();
        let buffer = comm.recv_pixels(COORDINATOR, expected).await?;
        debug!("rank {} received its {}x{} tile", comm.rank(), own_tile.width, own_tile.height);
        return Ok(unpack_tile(&buffer, &own_tile, border));
    }

    let global = global.ok_or_else(|| {
        BlurError::Environment("coordinator has no image to scatter".to_string())
    })?;
    let mut send_buffer = vec![0u8; plan.largest_tile().with_halo(border).byte_len()];
    let mut own = None;

    for rank in 0..comm.size() {
        let tile = plan.tile_for_rank(rank);
        let region = tile.with_halo(border);
        buffer_from_image(global, region, &mut send_buffer);
        let payload = &send_buffer[..region.byte_len()];
        if rank == COORDINATOR {
            own = Some(unpack_tile(payload, &tile, border));
        } else {
            debug!("scattering {:?} to rank {}", region, rank);
            comm.send(rank, Message::Pixels(payload.to_vec()))?;
        }
    }

    own.ok_or_else(|| BlurError::Environment("coordinator tile was never extracted".to_string()))
}

/// Collects every rank's interior into the coordinator's `global` image.
pub async fn gather(
    comm: &mut Communicator,
    plan: &PartitionPlan,
    tile: &BorderedImage,
    global: Option<&mut BorderedImage>,
) -> Result<(), BlurError> {
    let interior = Region::new(0, 0, tile.width(), tile.height());

    if !comm.is_coordinator() {
        return comm.send(COORDINATOR, Message::Pixels(pack(tile, interior)));
    }

    let global = global.ok_or_else(|| {
        BlurError::Environment("coordinator has no image to gather into".to_string())
    })?;
    for rank in 0..comm.size() {
        let target = plan.tile_for_rank(rank).interior();
        let buffer = if rank == COORDINATOR {
            pack(tile, interior)
        } else {
            comm.recv_pixels(rank, target.byte_len()).await?
        };
        debug!("gathering {:?} from rank {}", target, rank);
        image_from_buffer(&buffer, target, global);
    }
    Ok(())
}
