// THEORY:
// The partitioner cuts the global interior into one tile per rank. Every tile gets
// `global / grid` pixels along each axis; the remainder of that division goes only
// to the last column (width) and the last row (height). Tiles therefore never
// overlap, never leave gaps, and the tiles along any grid row sum to the image
// width (any grid column sums to the image height).
//
// The plan is computed identically on every rank from the broadcast image size, so
// no rank ever has to be told its tile geometry.

use crate::core_modules::bordered_image::Coord;
use crate::core_modules::buffer_codec::Region;
use crate::core_modules::topology::{GridCoord, GridShape};
use crate::error::BlurError;

/// Tile geometry for a whole process grid over one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPlan {
    pub global_width: usize,
    pub global_height: usize,
    pub shape: GridShape,
    /// Width of every tile outside the last grid column.
    pub base_width: usize,
    /// Height of every tile outside the last grid row.
    pub base_height: usize,
    pub remainder_width: usize,
    pub remainder_height: usize,
}

/// One rank's slice of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Interior-relative position of the tile's first pixel in the global image.
    pub origin_x: usize,
    pub origin_y: usize,
    pub width: usize,
    pub height: usize,
}

impl Tile {
    /// The tile's interior within the global image.
    pub fn interior(&self) -> Region {
        Region::new(
            self.origin_x as Coord,
            self.origin_y as Coord,
            self.width,
            self.height,
        )
    }

    /// The tile's interior plus `border` pixels of halo on every side, in global coordinates.
    pub fn with_halo(&self, border: usize) -> Region {
        let b = border as Coord;
        Region::new(
            self.origin_x as Coord - b,
            self.origin_y as Coord - b,
            self.width + 2 * border,
            self.height + 2 * border,
        )
    }
}

impl PartitionPlan {
    /// Splits a `global_width` x `global_height` image across `shape`.
    ///
    /// Every tile must be at least `border` pixels wide and tall, otherwise a
    /// neighbor could not fill a full-depth halo from its own interior.
    pub fn new(
        global_width: usize,
        global_height: usize,
        shape: GridShape,
        border: usize,
    ) -> Result<Self, BlurError> {
        let too_small = BlurError::ImageTooSmall {
            width: global_width,
            height: global_height,
            grid_x: shape.grid_x,
            grid_y: shape.grid_y,
        };
        if global_width < shape.grid_x || global_height < shape.grid_y {
            return Err(too_small);
        }
        let base_width = global_width / shape.grid_x;
        let base_height = global_height / shape.grid_y;
        if base_width < border.max(1) || base_height < border.max(1) {
            return Err(too_small);
        }
        Ok(Self {
            global_width,
            global_height,
            shape,
            base_width,
            base_height,
            remainder_width: global_width % shape.grid_x,
            remainder_height: global_height % shape.grid_y,
        })
    }

    pub fn tile(&self, coord: GridCoord) -> Tile {
        let mut width = self.base_width;
        let mut height = self.base_height;
        if coord.x + 1 == self.shape.grid_x {
            width += self.remainder_width;
        }
        if coord.y + 1 == self.shape.grid_y {
            height += self.remainder_height;
        }
        Tile {
            origin_x: coord.x * self.base_width,
            origin_y: coord.y * self.base_height,
            width,
            height,
        }
    }

    pub fn tile_for_rank(&self, rank: usize) -> Tile {
        self.tile(self.shape.coord_of(rank))
    }

    /// The largest tile in the plan: the one in the last column and last row.
    pub fn largest_tile(&self) -> Tile {
        self.tile(GridCoord {
            x: self.shape.grid_x - 1,
            y: self.shape.grid_y - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainders_go_to_the_last_row_and_column() {
        let plan = PartitionPlan::new(11, 7, GridShape { grid_x: 3, grid_y: 2 }, 2).unwrap();
        assert_eq!(plan.tile(GridCoord { x: 0, y: 0 }), Tile { origin_x: 0, origin_y: 0, width: 3, height: 3 });
        assert_eq!(plan.tile(GridCoord { x: 2, y: 0 }), Tile { origin_x: 6, origin_y: 0, width: 5, height: 3 });
        assert_eq!(plan.tile(GridCoord { x: 1, y: 1 }), Tile { origin_x: 3, origin_y: 3, width: 3, height: 4 });
        assert_eq!(plan.largest_tile(), Tile { origin_x: 6, origin_y: 3, width: 5, height: 4 });
    }

    #[test]
    fn halo_region_extends_into_the_global_border() {
        let plan = PartitionPlan::new(8, 8, GridShape { grid_x: 2, grid_y: 2 }, 2).unwrap();
        let region = plan.tile(GridCoord { x: 0, y: 1 }).with_halo(2);
        assert_eq!(region, Region::new(-2, 2, 8, 8));
    }

    #[test]
    fn image_narrower_than_grid_is_rejected() {
        let err = PartitionPlan::new(3, 40, GridShape { grid_x: 4, grid_y: 1 }, 2).unwrap_err();
        assert!(matches!(err, BlurError::ImageTooSmall { grid_x: 4, .. }));
    }

    #[test]
    fn tiles_thinner_than_the_halo_are_rejected() {
        let err = PartitionPlan::new(5, 20, GridShape { grid_x: 3, grid_y: 1 }, 2).unwrap_err();
        assert!(matches!(err, BlurError::ImageTooSmall { .. }));
        assert!(PartitionPlan::new(6, 20, GridShape { grid_x: 3, grid_y: 1 }, 2).is_ok());
    }

    #[test]
    fn zero_border_still_needs_one_pixel_per_tile() {
        assert!(PartitionPlan::new(4, 4, GridShape { grid_x: 4, grid_y: 4 }, 0).is_ok());
    }
}
