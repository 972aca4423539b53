use std::collections::BTreeSet;

use crate::simulation::disaster::{DisasterKind, DisasterPhase};
use crate::world::{Cell, RiverPath};

/// River radius while a drought is active.
pub const DROUGHT_RIVER_RADIUS: f32 = 0.5;
/// Extra flood reach, in cells, per unit of erosion risk.
pub const FLOOD_RISK_REACH: f32 = 3.0;

/// Union of discs around every river cell.
///
/// The disc radius is `radius + 3 * erosion_risk`, so a degraded landscape
/// floods further. Cells outside the grid are dropped.
pub fn flooded_area(river: &RiverPath, radius: u32, erosion_risk: f32) -> BTreeSet<Cell> {
    let effective = radius as f32 + FLOOD_RISK_REACH * erosion_risk.clamp(0.0, 1.0);
    let reach = effective.floor() as i64;
    let limit = effective * effective;
    let size = river.grid_size() as i64;

    let mut flooded = BTreeSet::new();
    for cell in river.cells() {
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if ((dx * dx + dy * dy) as f32) > limit {
                    continue;
                }
                let x = cell.x as i64 + dx;
                let y = cell.y as i64 + dy;
                if x < 0 || y < 0 || x >= size || y >= size {
                    continue;
                }
                flooded.insert(Cell::new(x as usize, y as usize));
            }
        }
    }
    flooded
}

/// River radius used for rendering and hit-testing.
///
/// Shrinks while a drought is active; river membership itself never changes.
pub fn effective_river_radius(phase: &DisasterPhase, river_width: f32) -> f32 {
    match phase {
        DisasterPhase::Active {
            kind: DisasterKind::Drought,
            ..
        } => DROUGHT_RIVER_RADIUS,
        _ => river_width,
    }
}

/// Whether `cell` shows as open water at the given effective radius.
pub fn is_visible_river(river: &RiverPath, cell: Cell, effective_radius: f32) -> bool {
    river.contains(cell) && river.distance_to_center(cell) <= effective_radius
}
