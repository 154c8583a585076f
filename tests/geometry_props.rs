//! Property-based tests for the partition, topology and buffer codec modules.

use halo_blur::core_modules::bordered_image::{BorderedImage, Coord};
use halo_blur::core_modules::buffer_codec::{Region, image_from_buffer, pack};
use halo_blur::core_modules::partition::PartitionPlan;
use halo_blur::core_modules::pixel::pixel::Pixel;
use halo_blur::core_modules::topology::{Direction, GridCoord, GridShape, Phase, SUBSTEPS};
use halo_blur::{BlurPipeline, PipelineConfig, RgbBuffer, blur_reference};
use proptest::prelude::*;

proptest! {
    /// Tiles along any grid row sum to the image width, along any column to its height,
    /// and sit edge to edge with no gaps.
    #[test]
    fn prop_partition_covers_the_image(
        grid_x in 1usize..8,
        grid_y in 1usize..8,
        extra_w in 0usize..40,
        extra_h in 0usize..40,
    ) {
        let width = grid_x * 2 + extra_w;
        let height = grid_y * 2 + extra_h;
        let shape = GridShape { grid_x, grid_y };
        let plan = PartitionPlan::new(width, height, shape, 2).unwrap();

        for y in 0..grid_y {
            let mut cursor = 0;
            for x in 0..grid_x {
                let tile = plan.tile(GridCoord { x, y });
                prop_assert_eq!(tile.origin_x, cursor);
                cursor += tile.width;
            }
            prop_assert_eq!(cursor, width);
        }
        for x in 0..grid_x {
            let mut cursor = 0;
            for y in 0..grid_y {
                let tile = plan.tile(GridCoord { x, y });
                prop_assert_eq!(tile.origin_y, cursor);
                cursor += tile.height;
            }
            prop_assert_eq!(cursor, height);
        }
    }

    /// Tile sizes differ only by the remainder, and only in the last row/column.
    #[test]
    fn prop_tiles_are_balanced(processes in 1usize..40, width in 80usize..200, height in 80usize..200) {
        let shape = GridShape::balanced(processes);
        let plan = PartitionPlan::new(width, height, shape, 2).unwrap();
        for coord in shape.coords() {
            let tile = plan.tile(coord);
            prop_assert!(tile.width >= plan.base_width && tile.width < plan.base_width + shape.grid_x);
            prop_assert!(tile.height >= plan.base_height && tile.height < plan.base_height + shape.grid_y);
        }
    }

    /// The balanced shape is an exact factorization with the factors as close as possible.
    #[test]
    fn prop_balanced_shape_is_squarest(processes in 1usize..2000) {
        let shape = GridShape::balanced(processes);
        prop_assert_eq!(shape.processes(), processes);
        prop_assert!(shape.grid_x >= shape.grid_y);
        for d in 1..=processes {
            if processes % d == 0 {
                let other = processes / d;
                prop_assert!(d.abs_diff(other) >= shape.grid_x - shape.grid_y);
            }
        }
    }

    /// If A sees B in direction d, B sees A in the opposite direction.
    #[test]
    fn prop_neighbor_lookup_is_symmetric(processes in 1usize..64, rank_seed in 0usize..1000) {
        let shape = GridShape::balanced(processes);
        let coord = shape.coord_of(rank_seed % processes);
        let rank = shape.rank_of(coord);
        for direction in Direction::ALL {
            let (dx, dy) = direction.offset();
            if let Some(peer) = shape.neighbor(coord, dx, dy) {
                let (ox, oy) = direction.opposite().offset();
                prop_assert_eq!(shape.neighbor(shape.coord_of(peer), ox, oy), Some(rank));
            }
        }
    }

    /// In every phase and sub-step, a rank's chosen partner chooses it back.
    #[test]
    fn prop_pairing_is_mutual(grid_x in 1usize..9, grid_y in 1usize..9) {
        let shape = GridShape { grid_x, grid_y };
        for coord in shape.coords() {
            for phase in Phase::ALL {
                for substep in 0..SUBSTEPS {
                    let direction = phase.partner_direction(coord, substep);
                    let (dx, dy) = direction.offset();
                    if let Some(peer) = shape.neighbor(coord, dx, dy) {
                        let back = phase.partner_direction(shape.coord_of(peer), substep);
                        prop_assert_eq!(back, direction.opposite());
                    }
                }
            }
        }
    }

    /// Packing a region and unpacking it at the same place reproduces it exactly.
    #[test]
    fn prop_pack_unpack_round_trip(
        width in 1usize..12,
        height in 1usize..12,
        x in -2isize..12,
        y in -2isize..12,
        region_w in 1usize..14,
        region_h in 1usize..14,
        seed in any::<u8>(),
    ) {
        let border = 2usize;
        let b = border as Coord;
        // Clamp the region to the bordered extent.
        let x = x.min(width as Coord + b - 1);
        let y = y.min(height as Coord + b - 1);
        let region_w = region_w.min((width as Coord + b - x) as usize);
        let region_h = region_h.min((height as Coord + b - y) as usize);
        let region = Region::new(x, y, region_w, region_h);

        let mut source = BorderedImage::new(width, height, border);
        let mut value = seed;
        for py in -b..(height as Coord + b) {
            for px in -b..(width as Coord + b) {
                source.set_pixel(px, py, Pixel::new(value, value ^ 0x55, value.wrapping_mul(3)));
                value = value.wrapping_add(17);
            }
        }

        let buffer = pack(&source, region);
        prop_assert_eq!(buffer.len(), region.byte_len());
        let mut target = BorderedImage::new(width, height, border);
        image_from_buffer(&buffer, region, &mut target);
        for py in y..y + region_h as Coord {
            for px in x..x + region_w as Coord {
                prop_assert_eq!(target.pixel(px, py), source.pixel(px, py));
            }
        }
        prop_assert_eq!(pack(&target, region), buffer);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Random images, rank counts and repetition counts all match the single-tile run.
    #[test]
    fn prop_distributed_run_matches_reference(
        processes in 1usize..10,
        extra_w in 0usize..9,
        extra_h in 0usize..9,
        repetitions in 0u32..4,
        seed in any::<u64>(),
    ) {
        let shape = GridShape::balanced(processes);
        let width = shape.grid_x * 2 + extra_w;
        let height = shape.grid_y * 2 + extra_h;
        let mut state = seed | 1;
        let data = (0..width * height * 3)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 56) as u8
            })
            .collect();
        let input = RgbBuffer::new(width, height, data);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let pipeline = BlurPipeline::new(PipelineConfig { processes, repetitions });
        let report = runtime.block_on(pipeline.run(input.clone())).unwrap();
        prop_assert_eq!(report.image, blur_reference(&input, repetitions));
    }
}
