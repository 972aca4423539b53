use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::grid::{NeighborhoodEdit, TerrainGrid};
use crate::world::{Cell, CellGeometry};

/// Trees whose health falls below this are converted to stumps.
pub const DEATH_HEALTH: f32 = 0.15;
/// Cutting only reaches trees closer than this many cell widths.
pub const CUT_REACH_CELLS: f32 = 1.5;

/// A living tree. At most one per grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub position: Vec2,
    pub cell: Cell,
    pub health: f32,
    pub dying: bool,
}

/// What is left after a tree is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    pub position: Vec2,
    pub cell: Cell,
}

/// Owns the living trees and the stumps.
///
/// Trees live in a plain vector; removal always goes through [`fell_where`]
/// or [`fell`], which swap-remove in descending index order so a pass over
/// the arena never observes a half-updated list.
///
/// [`fell_where`]: ForestRegistry::fell_where
/// [`fell`]: ForestRegistry::fell
#[derive(Debug, Clone, PartialEq)]
pub struct ForestRegistry {
    grid_size: usize,
    geometry: CellGeometry,
    trees: Vec<Tree>,
    stumps: Vec<Stump>,
    occupied: Vec<bool>,
}

impl ForestRegistry {
    pub fn new(grid_size: usize, geometry: CellGeometry) -> ForestRegistry {
        ForestRegistry {
            grid_size,
            geometry,
            trees: Vec::new(),
            stumps: Vec::new(),
            occupied: vec![false; grid_size * grid_size],
        }
    }

    pub fn geometry(&self) -> CellGeometry {
        self.geometry
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn stumps(&self) -> &[Stump] {
        &self.stumps
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        cell.x < self.grid_size
            && cell.y < self.grid_size
            && self.occupied[cell.y * self.grid_size + cell.x]
    }

    /// Plant a tree on `cell`.
    ///
    /// Fails on river cells, occupied cells and cells outside the grid.
    /// A stump on the same cell is cleared away.
    pub fn plant(&mut self, grid: &mut TerrainGrid, cell: Cell) -> bool {
        if cell.x >= self.grid_size || cell.y >= self.grid_size {
            return false;
        }
        if grid.river().contains(cell) || self.is_occupied(cell) {
            return false;
        }

        self.trees.push(Tree {
            position: self.geometry.cell_center(cell),
            cell,
            health: 1.0,
            dying: false,
        });
        self.occupied[cell.y * self.grid_size + cell.x] = true;
        self.stumps.retain(|s| s.cell != cell);
        grid.apply_neighborhood(cell, NeighborhoodEdit::PLANT);
        true
    }

    /// Index and squared distance of the tree closest to `point`.
    pub fn nearest(&self, point: Vec2) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, tree) in self.trees.iter().enumerate() {
            let d = tree.position.distance_squared(point);
            if best.is_none_or(|(_, b)| d < b) {
                best = Some((idx, d));
            }
        }
        best
    }

    /// Cut the tree nearest to `point` if it is within reach.
    pub fn cut_nearest(&mut self, grid: &mut TerrainGrid, point: Vec2) -> Option<Tree> {
        let reach = self.geometry.cell_size * CUT_REACH_CELLS;
        let (idx, dist_sq) = self.nearest(point)?;
        if dist_sq >= reach * reach {
            return None;
        }
        Some(self.fell(grid, idx, Some(NeighborhoodEdit::CLEAR)))
    }

    /// Cut `floor(count * fraction)` trees chosen uniformly without replacement.
    pub fn cut_fraction<R: Rng + ?Sized>(
        &mut self,
        grid: &mut TerrainGrid,
        fraction: f32,
        rng: &mut R,
    ) -> Vec<Tree> {
        let fraction = fraction.clamp(0.0, 1.0);
        let count = ((self.trees.len() as f32 * fraction).floor() as usize).min(self.trees.len());
        if count == 0 {
            return Vec::new();
        }

        let mut chosen = rand::seq::index::sample(rng, self.trees.len(), count).into_vec();
        chosen.sort_unstable_by(|a, b| b.cmp(a));
        chosen
            .into_iter()
            .map(|idx| self.fell(grid, idx, Some(NeighborhoodEdit::CLEAR)))
            .collect()
    }

    /// Remove the tree at `idx`, leave a stump, and apply `edit` to its neighborhood.
    pub fn fell(&mut self, grid: &mut TerrainGrid, idx: usize, edit: Option<NeighborhoodEdit>) -> Tree {
        let tree = self.trees.swap_remove(idx);
        self.occupied[tree.cell.y * self.grid_size + tree.cell.x] = false;
        self.stumps.push(Stump {
            position: tree.position,
            cell: tree.cell,
        });
        if let Some(edit) = edit {
            grid.apply_neighborhood(tree.cell, edit);
        }
        tree
    }

    /// Visit every tree in arena order and fell those for which `doomed`
    /// returns true. `doomed` may update the tree (e.g. health) before deciding.
    pub fn fell_where<F>(
        &mut self,
        grid: &mut TerrainGrid,
        edit: Option<NeighborhoodEdit>,
        mut doomed: F,
    ) -> Vec<Tree>
    where
        F: FnMut(&mut Tree) -> bool,
    {
        let mut marked = Vec::new();
        for (idx, tree) in self.trees.iter_mut().enumerate() {
            if doomed(tree) {
                marked.push(idx);
            }
        }

        let mut felled: Vec<Tree> = marked
            .into_iter()
            .rev()
            .map(|idx| self.fell(grid, idx, edit))
            .collect();
        felled.reverse();
        felled
    }

    /// Drop every tree and stump.
    pub fn clear(&mut self) {
        self.trees.clear();
        self.stumps.clear();
        self.occupied.iter_mut().for_each(|o| *o = false);
    }
}
