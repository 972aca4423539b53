pub mod forest;
pub mod grid;
pub mod lattice;
pub mod river;

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use forest::{ForestRegistry, Stump, Tree};
pub use grid::{Combine, NeighborhoodEdit, TerrainGrid};
pub use lattice::LatticeNoise;
pub use river::RiverPath;

/// A grid cell address. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Cell {
        Cell { x, y }
    }

    pub fn distance_sq(self, other: Cell) -> usize {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Cell) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }
}

/// Maps grid cells onto world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub cell_size: f32,
}

impl CellGeometry {
    pub fn new(cell_size: f32) -> CellGeometry {
        CellGeometry { cell_size }
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            cell.x as f32 * self.cell_size + self.cell_size / 2.0,
            cell.y as f32 * self.cell_size + self.cell_size / 2.0,
        )
    }
}

/// Everything a disaster can touch: the coverage grid (which owns the river),
/// the forest, and the transient flooded area.
#[derive(Debug, Clone, PartialEq)]
pub struct Landscape {
    pub grid: TerrainGrid,
    pub forest: ForestRegistry,
    pub flooded: BTreeSet<Cell>,
}

impl Landscape {
    pub fn new(grid: TerrainGrid, forest: ForestRegistry) -> Landscape {
        Landscape {
            grid,
            forest,
            flooded: BTreeSet::new(),
        }
    }

    pub fn river(&self) -> &RiverPath {
        self.grid.river()
    }
}
