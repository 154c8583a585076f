// THEORY:
// The topology planner arranges P ranks on a 2D grid and answers every "who is next
// to whom" question the rest of the engine asks. It is pure arithmetic: no channels,
// no pixels, nothing that can fail once a shape exists.
//
// Key architectural principles:
// 1.  **Balanced shape**: P is factored into `grid_x * grid_y` with the two factors as
//     close as possible and `grid_x >= grid_y`. Squarer grids mean less halo
//     perimeter per tile area. `grid_x` splits the image width, `grid_y` the height.
// 2.  **Rank layout**: `rank = cx * grid_y + cy`, a bijection over `[0, P)`.
// 3.  **Edges are absences**: a neighbor lookup that leaves the grid yields `None`.
//     The halo on that side is never written after allocation, so it stays the black
//     padding the tile was born with for the entire run.
// 4.  **Pairing is a pure function**: which of two opposite neighbors a rank talks to
//     in a given exchange sub-step depends only on the parity of its own coordinate,
//     so it can be tested without any transport at all.

/// A rank's column (`x`, along the image width) and row (`y`, along the height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: usize,
    pub y: usize,
}

/// The 2D arrangement of ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    /// Number of grid columns; splits the image width.
    pub grid_x: usize,
    /// Number of grid rows; splits the image height.
    pub grid_y: usize,
}

impl GridShape {
    /// The most square factorization of `processes`, larger factor first.
    pub fn balanced(processes: usize) -> Self {
        assert!(processes > 0, "a process grid needs at least one rank");
        let mut grid_y = (processes as f64).sqrt() as usize;
        // Guard against float rounding on either side of the true root.
        while grid_y * grid_y > processes {
            grid_y -= 1;
        }
        while (grid_y + 1) * (grid_y + 1) <= processes {
            grid_y += 1;
        }
        while processes % grid_y != 0 {
            grid_y -= 1;
        }
        Self {
            grid_x: processes / grid_y,
            grid_y,
        }
    }

    pub fn processes(&self) -> usize {
        self.grid_x * self.grid_y
    }

    pub fn coord_of(&self, rank: usize) -> GridCoord {
        debug_assert!(rank < self.processes());
        GridCoord {
            x: rank / self.grid_y,
            y: rank % self.grid_y,
        }
    }

    pub fn rank_of(&self, coord: GridCoord) -> usize {
        debug_assert!(coord.x < self.grid_x && coord.y < self.grid_y);
        coord.x * self.grid_y + coord.y
    }

    /// The rank at `coord + (dx, dy)`, or `None` when that falls off the grid.
    pub fn neighbor(&self, coord: GridCoord, dx: isize, dy: isize) -> Option<usize> {
        let x = coord.x as isize + dx;
        let y = coord.y as isize + dy;
        if x < 0 || y < 0 || x >= self.grid_x as isize || y >= self.grid_y as isize {
            return None;
        }
        Some(self.rank_of(GridCoord {
            x: x as usize,
            y: y as usize,
        }))
    }

    /// Iterates every coordinate in rank order.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.processes()).map(|rank| self.coord_of(rank))
    }
}

/// The eight compass directions a halo segment can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
    NorthWest,
    SouthEast,
    SouthWest,
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthEast,
    ];

    /// Grid offset `(dx, dy)`; north is `-y`, west is `-x`.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::East => (1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
            Direction::NorthEast => (1, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
            Direction::NorthEast => Direction::SouthWest,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            Direction::North | Direction::South => Phase::Vertical,
            Direction::West | Direction::East => Phase::Horizontal,
            Direction::NorthWest | Direction::SouthEast => Phase::Diagonal,
            Direction::SouthWest | Direction::NorthEast => Phase::AntiDiagonal,
        }
    }

    /// Whether this direction points toward the lower coordinate on its phase's parity axis.
    fn is_lower(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::West | Direction::NorthWest | Direction::SouthWest
        )
    }
}

/// One of the four halo exchange phases, each pairing two opposite directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Top and bottom strips with the north/south neighbors.
    Vertical,
    /// Left and right strips with the west/east neighbors.
    Horizontal,
    /// Corner blocks with the northwest/southeast neighbors.
    Diagonal,
    /// Corner blocks with the southwest/northeast neighbors.
    AntiDiagonal,
}

/// Sub-steps per phase; in each one every rank addresses one of its two partners.
pub const SUBSTEPS: usize = 2;

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Vertical,
        Phase::Horizontal,
        Phase::Diagonal,
        Phase::AntiDiagonal,
    ];

    /// The (lower, upper) directions of this phase.
    pub fn directions(self) -> (Direction, Direction) {
        match self {
            Phase::Vertical => (Direction::North, Direction::South),
            Phase::Horizontal => (Direction::West, Direction::East),
            Phase::Diagonal => (Direction::NorthWest, Direction::SouthEast),
            Phase::AntiDiagonal => (Direction::SouthWest, Direction::NorthEast),
        }
    }

    /// The grid coordinate component whose parity splits this phase.
    fn parity_axis(self, coord: GridCoord) -> usize {
        match self {
            Phase::Vertical => coord.y,
            Phase::Horizontal | Phase::Diagonal | Phase::AntiDiagonal => coord.x,
        }
    }

    /// The direction a rank at `coord` addresses during `substep`.
    pub fn partner_direction(self, coord: GridCoord, substep: usize) -> Direction {
        let (lower, upper) = self.directions();
        if should_initiate(lower, coord, substep) {
            lower
        } else {
            upper
        }
    }
}

/// Whether a rank at `coord` exchanges toward `direction` in `substep` of that
/// direction's phase. Two adjacent ranks differ in parity along the phase axis, so
/// in every sub-step they either address each other or both look away.
pub fn should_initiate(direction: Direction, coord: GridCoord, substep: usize) -> bool {
    let odd = (direction.phase().parity_axis(coord) + substep) % 2 == 1;
    odd == direction.is_lower()
}

/// A rank's fixed place in the process grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTopology {
    pub shape: GridShape,
    pub rank: usize,
    pub coord: GridCoord,
}

impl ProcessTopology {
    pub fn new(shape: GridShape, rank: usize) -> Self {
        Self {
            shape,
            rank,
            coord: shape.coord_of(rank),
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Option<usize> {
        let (dx, dy) = direction.offset();
        self.shape.neighbor(self.coord, dx, dy)
    }

    pub fn is_last_column(&self) -> bool {
        self.coord.x + 1 == self.shape.grid_x
    }

    pub fn is_last_row(&self) -> bool {
        self.coord.y + 1 == self.shape.grid_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_shapes() {
        let expected = [
            (1, (1, 1)),
            (2, (2, 1)),
            (3, (3, 1)),
            (4, (2, 2)),
            (6, (3, 2)),
            (7, (7, 1)),
            (8, (4, 2)),
            (9, (3, 3)),
            (12, (4, 3)),
            (16, (4, 4)),
            (18, (6, 3)),
        ];
        for (processes, (grid_x, grid_y)) in expected {
            let shape = GridShape::balanced(processes);
            assert_eq!((shape.grid_x, shape.grid_y), (grid_x, grid_y), "P = {}", processes);
        }
    }

    #[test]
    fn rank_mapping_is_a_bijection() {
        let shape = GridShape::balanced(12);
        let mut seen = vec![false; 12];
        for rank in 0..12 {
            let coord = shape.coord_of(rank);
            assert_eq!(shape.rank_of(coord), rank);
            assert!(!seen[rank]);
            seen[rank] = true;
        }
    }

    #[test]
    fn corners_have_three_neighbors() {
        let shape = GridShape::balanced(9);
        let topology = ProcessTopology::new(shape, 0);
        let present: Vec<_> = Direction::ALL
            .iter()
            .filter(|d| topology.neighbor(**d).is_some())
            .collect();
        assert_eq!(
            present,
            vec![&Direction::South, &Direction::East, &Direction::SouthEast]
        );
        let center = ProcessTopology::new(shape, 4);
        assert!(Direction::ALL.iter().all(|d| center.neighbor(*d).is_some()));
    }

    #[test]
    fn single_rank_has_no_neighbors() {
        let topology = ProcessTopology::new(GridShape::balanced(1), 0);
        assert!(Direction::ALL.iter().all(|d| topology.neighbor(*d).is_none()));
    }

    #[test]
    fn pairing_matches_on_both_sides() {
        let shape = GridShape { grid_x: 5, grid_y: 4 };
        for coord in shape.coords() {
            for phase in Phase::ALL {
                for substep in 0..SUBSTEPS {
                    let direction = phase.partner_direction(coord, substep);
                    let (dx, dy) = direction.offset();
                    let Some(peer) = shape.neighbor(coord, dx, dy) else {
                        continue;
                    };
                    let peer_coord = shape.coord_of(peer);
                    assert_eq!(
                        phase.partner_direction(peer_coord, substep),
                        direction.opposite(),
                        "{:?} -> {:?} in {:?} sub-step {}",
                        coord,
                        peer_coord,
                        phase,
                        substep
                    );
                }
            }
        }
    }

    #[test]
    fn each_partner_is_addressed_exactly_once_per_phase() {
        let coord = GridCoord { x: 3, y: 2 };
        for phase in Phase::ALL {
            let chosen: Vec<_> = (0..SUBSTEPS)
                .map(|substep| phase.partner_direction(coord, substep))
                .collect();
            let (lower, upper) = phase.directions();
            assert!(chosen.contains(&lower) && chosen.contains(&upper));
        }
    }

    #[test]
    fn even_rows_look_south_first() {
        let coord = GridCoord { x: 0, y: 0 };
        assert!(should_initiate(Direction::South, coord, 0));
        assert!(!should_initiate(Direction::North, coord, 0));
        assert!(should_initiate(Direction::North, coord, 1));
    }
}
