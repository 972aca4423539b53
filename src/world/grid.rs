use std::collections::BTreeSet;

use crate::world::river::RiverPath;
use crate::world::Cell;

/// How a neighborhood edit merges with the existing coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Keep the larger value (vegetation only grows).
    Max,
    /// Keep the smaller value (vegetation only shrinks).
    Min,
}

impl Combine {
    pub fn apply(self, current: f32, value: f32) -> f32 {
        match self {
            Combine::Max => current.max(value),
            Combine::Min => current.min(value),
        }
    }
}

/// A 3x3 edit centered on one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborhoodEdit {
    pub center: f32,
    pub ring: f32,
    pub combine: Combine,
}

impl NeighborhoodEdit {
    /// A planted tree: full cover under the crown, partial cover around it.
    pub const PLANT: NeighborhoodEdit = NeighborhoodEdit {
        center: 1.0,
        ring: 0.7,
        combine: Combine::Max,
    };

    /// A felled tree: bare center, thinned ring.
    pub const CLEAR: NeighborhoodEdit = NeighborhoodEdit {
        center: 0.0,
        ring: 0.3,
        combine: Combine::Min,
    };

    /// A tree killed by a disaster caps the whole neighborhood.
    pub const DISASTER_DAMAGE: NeighborhoodEdit = NeighborhoodEdit {
        center: 0.1,
        ring: 0.1,
        combine: Combine::Min,
    };
}

/// Vegetation coverage per cell, in `[0, 1]`.
///
/// Stored row-major (`y * size + x`). River cells always hold 0; writes to
/// them are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    size: usize,
    coverage: Vec<f32>,
    river: RiverPath,
}

impl TerrainGrid {
    pub fn new(river: RiverPath, initial_coverage: f32) -> TerrainGrid {
        let size = river.grid_size();
        let mut grid = TerrainGrid {
            size,
            coverage: vec![initial_coverage.clamp(0.0, 1.0); size * size],
            river,
        };
        grid.dry_river();
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn river(&self) -> &RiverPath {
        &self.river
    }

    pub fn in_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    /// Coverage at `(x, y)`; coordinates outside the grid read the nearest edge cell.
    pub fn get(&self, x: isize, y: isize) -> f32 {
        let max = self.size as isize - 1;
        let cx = x.clamp(0, max) as usize;
        let cy = y.clamp(0, max) as usize;
        self.coverage[cy * self.size + cx]
    }

    pub fn at(&self, cell: Cell) -> f32 {
        self.get(cell.x as isize, cell.y as isize)
    }

    /// Write a coverage value. Returns false for out-of-range or river cells.
    pub fn set(&mut self, x: isize, y: isize, value: f32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let cell = Cell::new(x as usize, y as usize);
        if self.river.contains(cell) {
            return false;
        }
        self.coverage[cell.y * self.size + cell.x] = value.clamp(0.0, 1.0);
        true
    }

    /// Apply `edit` to the 3x3 block around `cell`, skipping river cells and
    /// anything outside the grid. Returns the number of cells written.
    pub fn apply_neighborhood(&mut self, cell: Cell, edit: NeighborhoodEdit) -> usize {
        let mut written = 0;
        for dx in -1isize..=1 {
            for dy in -1isize..=1 {
                let x = cell.x as isize + dx;
                let y = cell.y as isize + dy;
                if !self.in_bounds(x, y) {
                    continue;
                }
                let target = if dx == 0 && dy == 0 { edit.center } else { edit.ring };
                let merged = edit.combine.apply(self.get(x, y), target);
                if self.set(x, y, merged) {
                    written += 1;
                }
            }
        }
        written
    }

    /// Mean of the four lattice corners of `(x, y)` for smooth shading.
    ///
    /// In-range corners on the river or the flooded area count as 0.
    /// Out-of-range corners read the clamped edge value.
    pub fn bilinear_coverage(&self, x: isize, y: isize, flooded: &BTreeSet<Cell>) -> f32 {
        let corner = |cx: isize, cy: isize| -> f32 {
            if self.in_bounds(cx, cy) {
                let cell = Cell::new(cx as usize, cy as usize);
                if self.river.contains(cell) || flooded.contains(&cell) {
                    return 0.0;
                }
            }
            self.get(cx, cy)
        };
        (corner(x, y) + corner(x + 1, y) + corner(x, y + 1) + corner(x + 1, y + 1)) / 4.0
    }

    /// Multiply every non-river cell by `factor`.
    pub fn scale_all(&mut self, factor: f32) {
        for y in 0..self.size {
            for x in 0..self.size {
                let idx = y * self.size + x;
                if self.river.contains(Cell::new(x, y)) {
                    continue;
                }
                self.coverage[idx] = (self.coverage[idx] * factor).clamp(0.0, 1.0);
            }
        }
    }

    /// Force every river cell to zero coverage.
    pub fn dry_river(&mut self) {
        for cell in self.river.cells() {
            self.coverage[cell.y * self.size + cell.x] = 0.0;
        }
    }

    /// Iterate `(cell, coverage)` over cells that are not river.
    pub fn land(&self) -> impl Iterator<Item = (Cell, f32)> + '_ {
        (0..self.size * self.size).filter_map(move |idx| {
            let cell = Cell::new(idx % self.size, idx / self.size);
            if self.river.contains(cell) {
                None
            } else {
                Some((cell, self.coverage[idx]))
            }
        })
    }

    /// Raw row-major coverage values.
    pub fn values(&self) -> &[f32] {
        &self.coverage
    }
}
