// THEORY:
// After every stencil pass, a rank's fresh tile has a stale halo. The halo exchange
// refreshes it from the up-to-eight neighbors so the next pass sees exactly what it
// would see if the whole image were local.
//
// Key architectural principles:
// 1.  **Four phases, two sub-steps each**: vertical strips, horizontal strips, then
//     the two diagonal pairs of corner blocks. In each sub-step a rank addresses at
//     most one partner, chosen by `Phase::partner_direction`; adjacent ranks always
//     pick each other, so every `send_recv` has a matching counterpart.
// 2.  **Interior out, halo in**: a rank only ever sends interior pixels and only ever
//     writes halo pixels. No phase can disturb what another phase sends, so the
//     phase order does not affect the result.
// 3.  **Missing neighbors are skipped**: on a grid edge nothing is sent and the halo
//     keeps the black padding from allocation.

use crate::core_modules::bordered_image::{BorderedImage, Coord};
use crate::core_modules::buffer_codec::{Region, image_from_buffer, pack};
use crate::core_modules::topology::{Direction, Phase, ProcessTopology, SUBSTEPS};
use crate::error::BlurError;
use crate::parallel_pipeline::Communicator;
use log::trace;

/// One paired exchange a rank performs in one sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledExchange {
    pub phase: Phase,
    pub substep: usize,
    pub direction: Direction,
    pub peer: usize,
}

/// Every exchange `topology`'s rank performs in one halo refresh, in execution order.
pub fn exchange_schedule(topology: &ProcessTopology) -> Vec<ScheduledExchange> {
    let mut schedule = Vec::with_capacity(Phase::ALL.len() * SUBSTEPS);
    for phase in Phase::ALL {
        for substep in 0..SUBSTEPS {
            let direction = phase.partner_direction(topology.coord, substep);
            if let Some(peer) = topology.neighbor(direction) {
                schedule.push(ScheduledExchange {
                    phase,
                    substep,
                    direction,
                    peer,
                });
            }
        }
    }
    schedule
}

/// Along one axis: (send start, receive start, length) for a step of -1, 0 or +1.
fn span(step: isize, extent: usize, border: usize) -> (Coord, Coord, usize) {
    let b = border as Coord;
    let e = extent as Coord;
    match step {
        -1 => (0, -b, border),
        1 => (e - b, e, border),
        _ => (0, 0, extent),
    }
}

/// The interior block a rank sends toward `direction`, and the halo block it fills
/// with what comes back.
pub fn exchange_regions(
    direction: Direction,
    width: usize,
    height: usize,
    border: usize,
) -> (Region, Region) {
    let (dx, dy) = direction.offset();
    let (send_x, recv_x, span_w) = span(dx, width, border);
    let (send_y, recv_y, span_h) = span(dy, height, border);
    (
        Region::new(send_x, send_y, span_w, span_h),
        Region::new(recv_x, recv_y, span_w, span_h),
    )
}

/// Refreshes the halo of `tile` from every present neighbor.
pub async fn exchange_halos(
    comm: &mut Communicator,
    topology: &ProcessTopology,
    tile: &mut BorderedImage,
) -> Result<(), BlurError> {
    for exchange in exchange_schedule(topology) {
        let (send_region, recv_region) =
            exchange_regions(exchange.direction, tile.width(), tile.height(), tile.border());
        trace!(
            "rank {} {:?} sub-step {}: {:?} with rank {}",
            topology.rank,
            exchange.phase,
            exchange.substep,
            exchange.direction,
            exchange.peer
        );
        let outgoing = pack(tile, send_region);
        let incoming = comm
            .send_recv(exchange.peer, outgoing, recv_region.byte_len())
            .await?;
        image_from_buffer(&incoming, recv_region, tile);
    }
    Ok(())
}
