use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random draws attempted before falling back to scanning every free cell.
pub const RANDOM_CELL_ATTEMPTS: usize = 100;

/// Grid position in logical cell coordinates (column, row).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the cell offset by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// How an out-of-bounds head is brought back onto the board when the move
/// is survived (invincibility).
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge.
    #[default]
    Wrap,
    /// Stop at the edge.
    Clamp,
}

/// Logical grid dimensions and the cell space they define.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridWorld {
    pub width: u16,
    pub height: u16,
}

impl GridWorld {
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Returns the total number of cells in the grid.
    #[must_use]
    pub fn total_cells(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Returns true when `cell` lies inside the grid.
    #[must_use]
    pub fn in_bounds(self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.x < i32::from(self.width)
            && cell.y < i32::from(self.height)
    }

    /// Maps `cell` back inside the grid according to `policy`.
    #[must_use]
    pub fn resolve(self, cell: Cell, policy: BoundaryPolicy) -> Cell {
        match policy {
            BoundaryPolicy::Wrap => Cell {
                x: wrap_axis(cell.x, i32::from(self.width)),
                y: wrap_axis(cell.y, i32::from(self.height)),
            },
            BoundaryPolicy::Clamp => Cell {
                x: cell.x.clamp(0, i32::from(self.width) - 1),
                y: cell.y.clamp(0, i32::from(self.height) - 1),
            },
        }
    }

    /// Iterates every cell row by row.
    pub fn cells(self) -> impl Iterator<Item = Cell> {
        let width = i32::from(self.width);
        (0..i32::from(self.height)).flat_map(move |y| (0..width).map(move |x| Cell { x, y }))
    }

    /// Picks a cell not contained in `excluding`.
    ///
    /// Samples uniformly for [`RANDOM_CELL_ATTEMPTS`] draws, then scans the
    /// remaining free cells and picks one of them. Returns `None` only when
    /// every cell is excluded.
    pub fn random_cell<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        excluding: &HashSet<Cell>,
    ) -> Option<Cell> {
        if excluding.len() < self.total_cells() {
            for _ in 0..RANDOM_CELL_ATTEMPTS {
                let cell = Cell {
                    x: rng.gen_range(0..i32::from(self.width)),
                    y: rng.gen_range(0..i32::from(self.height)),
                };
                if !excluding.contains(&cell) {
                    return Some(cell);
                }
            }
        }

        let free: Vec<Cell> = self.cells().filter(|cell| !excluding.contains(cell)).collect();
        if free.is_empty() {
            return None;
        }
        Some(free[rng.gen_range(0..free.len())])
    }
}

fn wrap_axis(value: i32, upper_bound: i32) -> i32 {
    let wrapped = value % upper_bound;
    if wrapped < 0 {
        wrapped + upper_bound
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{BoundaryPolicy, Cell, GridWorld};

    #[test]
    fn in_bounds_covers_edges() {
        let grid = GridWorld::new(10, 8);

        assert!(grid.in_bounds(Cell::new(0, 0)));
        assert!(grid.in_bounds(Cell::new(9, 7)));
        assert!(!grid.in_bounds(Cell::new(10, 7)));
        assert!(!grid.in_bounds(Cell::new(9, 8)));
        assert!(!grid.in_bounds(Cell::new(-1, 0)));
    }

    #[test]
    fn wrapping_keeps_coordinates_inside_bounds() {
        let grid = GridWorld::new(10, 8);

        assert_eq!(
            grid.resolve(Cell::new(-1, 3), BoundaryPolicy::Wrap),
            Cell::new(9, 3)
        );
        assert_eq!(
            grid.resolve(Cell::new(4, 8), BoundaryPolicy::Wrap),
            Cell::new(4, 0)
        );
    }

    #[test]
    fn clamping_stops_at_the_edge() {
        let grid = GridWorld::new(10, 8);

        assert_eq!(
            grid.resolve(Cell::new(10, 3), BoundaryPolicy::Clamp),
            Cell::new(9, 3)
        );
        assert_eq!(
            grid.resolve(Cell::new(2, -1), BoundaryPolicy::Clamp),
            Cell::new(2, 0)
        );
    }

    #[test]
    fn random_cell_finds_the_last_free_cell() {
        let grid = GridWorld::new(5, 5);
        let mut rng = StdRng::seed_from_u64(11);
        let mut excluding: HashSet<Cell> = grid.cells().collect();
        excluding.remove(&Cell::new(3, 4));

        assert_eq!(grid.random_cell(&mut rng, &excluding), Some(Cell::new(3, 4)));
    }

    #[test]
    fn random_cell_returns_none_on_a_full_grid() {
        let grid = GridWorld::new(3, 2);
        let mut rng = StdRng::seed_from_u64(5);
        let excluding: HashSet<Cell> = grid.cells().collect();

        assert_eq!(grid.random_cell(&mut rng, &excluding), None);
    }

    #[test]
    fn random_cell_avoids_excluded_cells() {
        let grid = GridWorld::new(4, 4);
        let mut rng = StdRng::seed_from_u64(3);
        let excluding: HashSet<Cell> = [Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
            .into_iter()
            .collect();

        for _ in 0..200 {
            let cell = grid.random_cell(&mut rng, &excluding).expect("free cells remain");
            assert!(grid.in_bounds(cell));
            assert!(!excluding.contains(&cell));
        }
    }
}
