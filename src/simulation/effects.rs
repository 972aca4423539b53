use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::simulation::disaster::DisasterKind;
use crate::simulation::events::{Debris, SimEvent};
use crate::simulation::spatial::flooded_area;
use crate::world::forest::DEATH_HEALTH;
use crate::world::{Cell, Landscape, NeighborhoodEdit};

/// Landslide footprint radius in cells. Membership is strict (`< 4`).
pub const LANDSLIDE_RADIUS: usize = 4;
/// Minimum distance of a landslide epicenter from the grid edge.
pub const LANDSLIDE_MARGIN: usize = 3;
/// River expansion marked as flooded by a landslide.
pub const LANDSLIDE_FLOOD_RADIUS: u32 = 1;

pub const FLOOD_RADIUS: u32 = 5;
/// Chance that a tree outside the flooded area is still damaged.
pub const FLOOD_STRAY_DAMAGE_CHANCE: f32 = 0.05;
pub const FLOOD_HEALTH_FACTOR: f32 = 0.7;
pub const FLOOD_DIEBACK: f32 = 0.90;

/// Earthquakes spare a tree whose draw is at or below this.
pub const EARTHQUAKE_SURVIVAL: f32 = 0.8;

pub const DROUGHT_DAMAGE_CHANCE: f32 = 0.4;
pub const DROUGHT_HEALTH_FACTOR: f32 = 0.6;
pub const DROUGHT_DIEBACK: f32 = 0.85;

/// Summary of one effect application.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectOutcome {
    pub kind: DisasterKind,
    pub trees_killed: u32,
    /// Landslide center; `None` for the other kinds.
    pub epicenter: Option<Cell>,
}

/// Apply the full effect of `kind` once.
///
/// The flooded area is cleared first, so only water-driven disasters leave
/// one behind. Debris bursts are pushed onto `events`.
pub fn apply_effect<R: Rng + ?Sized>(
    kind: DisasterKind,
    landscape: &mut Landscape,
    erosion_risk: f32,
    events: &mut Vec<SimEvent>,
    rng: &mut R,
) -> EffectOutcome {
    landscape.flooded.clear();
    match kind {
        DisasterKind::Landslide => landslide(landscape, erosion_risk, events, rng),
        DisasterKind::Flood => flood(landscape, erosion_risk, events, rng),
        DisasterKind::Earthquake => earthquake(landscape, events, rng),
        DisasterKind::Drought => drought(landscape, events, rng),
    }
}

fn epicenter_range(grid_size: usize) -> (usize, usize) {
    let lo = LANDSLIDE_MARGIN.min(grid_size / 2);
    let hi = grid_size.saturating_sub(LANDSLIDE_MARGIN + 1).max(lo);
    (lo, hi)
}

/// Strip a disc of ground bare and flatten every tree on it.
pub fn landslide<R: Rng + ?Sized>(
    landscape: &mut Landscape,
    erosion_risk: f32,
    events: &mut Vec<SimEvent>,
    rng: &mut R,
) -> EffectOutcome {
    landscape.flooded = flooded_area(landscape.river(), LANDSLIDE_FLOOD_RADIUS, erosion_risk);

    let size = landscape.grid.size();
    let (lo, hi) = epicenter_range(size);
    let center = Cell::new(rng.gen_range(lo..=hi), rng.gen_range(lo..=hi));
    let radius_sq = LANDSLIDE_RADIUS * LANDSLIDE_RADIUS;
    let geometry = landscape.forest.geometry();

    let x_range = center.x.saturating_sub(LANDSLIDE_RADIUS)..=(center.x + LANDSLIDE_RADIUS).min(size - 1);
    for x in x_range {
        let y_range =
            center.y.saturating_sub(LANDSLIDE_RADIUS)..=(center.y + LANDSLIDE_RADIUS).min(size - 1);
        for y in y_range {
            let cell = Cell::new(x, y);
            if cell.distance_sq(center) >= radius_sq {
                continue;
            }
            if !landscape.river().contains(cell) && !landscape.flooded.contains(&cell) {
                landscape.grid.set(x as isize, y as isize, 0.0);
            }
            let count = rng.gen_range(1..=3);
            events.push(SimEvent::DebrisSpawned(Debris::soil(geometry.cell_center(cell), count)));
        }
    }

    let buried = landscape
        .forest
        .fell_where(&mut landscape.grid, None, |tree| tree.cell.distance_sq(center) < radius_sq);
    for tree in &buried {
        events.push(SimEvent::DebrisSpawned(Debris::foliage(tree.position)));
    }

    debug!(?center, trees_killed = buried.len(), "Landslide");
    EffectOutcome {
        kind: DisasterKind::Landslide,
        trees_killed: buried.len() as u32,
        epicenter: Some(center),
    }
}

/// Drown the river banks, weakening every tree in the water.
pub fn flood<R: Rng + ?Sized>(
    landscape: &mut Landscape,
    erosion_risk: f32,
    events: &mut Vec<SimEvent>,
    rng: &mut R,
) -> EffectOutcome {
    landscape.flooded = flooded_area(landscape.river(), FLOOD_RADIUS, erosion_risk);

    let flooded = &landscape.flooded;
    let drowned = landscape.forest.fell_where(
        &mut landscape.grid,
        Some(NeighborhoodEdit::DISASTER_DAMAGE),
        |tree| {
            if flooded.contains(&tree.cell) || rng.r#gen::<f32>() < FLOOD_STRAY_DAMAGE_CHANCE {
                tree.health *= FLOOD_HEALTH_FACTOR;
                tree.dying = true;
            }
            tree.health < DEATH_HEALTH
        },
    );
    for tree in &drowned {
        events.push(SimEvent::DebrisSpawned(Debris::deadwood(tree.position)));
    }
    landscape.grid.scale_all(FLOOD_DIEBACK);

    debug!(
        flooded_cells = landscape.flooded.len(),
        trees_killed = drowned.len(),
        "Flood"
    );
    EffectOutcome {
        kind: DisasterKind::Flood,
        trees_killed: drowned.len() as u32,
        epicenter: None,
    }
}

/// Topple a random fifth of the forest.
pub fn earthquake<R: Rng + ?Sized>(
    landscape: &mut Landscape,
    events: &mut Vec<SimEvent>,
    rng: &mut R,
) -> EffectOutcome {
    let toppled = landscape.forest.fell_where(
        &mut landscape.grid,
        Some(NeighborhoodEdit::DISASTER_DAMAGE),
        |_| rng.r#gen::<f32>() > EARTHQUAKE_SURVIVAL,
    );
    for tree in &toppled {
        events.push(SimEvent::DebrisSpawned(Debris::rubble(tree.position)));
    }

    debug!(trees_killed = toppled.len(), "Earthquake");
    EffectOutcome {
        kind: DisasterKind::Earthquake,
        trees_killed: toppled.len() as u32,
        epicenter: None,
    }
}

/// Parch the forest. The river narrowing is a view concern and lives in
/// `spatial::effective_river_radius`.
pub fn drought<R: Rng + ?Sized>(
    landscape: &mut Landscape,
    events: &mut Vec<SimEvent>,
    rng: &mut R,
) -> EffectOutcome {
    let withered = landscape.forest.fell_where(
        &mut landscape.grid,
        Some(NeighborhoodEdit::DISASTER_DAMAGE),
        |tree| {
            if rng.r#gen::<f32>() < DROUGHT_DAMAGE_CHANCE {
                tree.health *= DROUGHT_HEALTH_FACTOR;
                tree.dying = true;
            }
            tree.health < DEATH_HEALTH
        },
    );
    for tree in &withered {
        events.push(SimEvent::DebrisSpawned(Debris::deadwood(tree.position)));
    }
    landscape.grid.scale_all(DROUGHT_DIEBACK);

    debug!(trees_killed = withered.len(), "Drought");
    EffectOutcome {
        kind: DisasterKind::Drought,
        trees_killed: withered.len() as u32,
        epicenter: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CellGeometry, ForestRegistry, RiverPath, TerrainGrid};
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fixed(value: f32) -> StepRng {
        StepRng::new(((value * (1u32 << 24) as f32) as u64) << 8, 0)
    }

    fn landscape() -> Landscape {
        let grid = TerrainGrid::new(RiverPath::generate(20, 2.0, 12345), 0.9);
        let forest = ForestRegistry::new(20, CellGeometry::new(30.0));
        Landscape::new(grid, forest)
    }

    /// Plant on the first `n` land cells in row-major order.
    fn planted(n: usize) -> Landscape {
        let mut land = landscape();
        let cells: Vec<Cell> = land.grid.land().map(|(c, _)| c).take(n).collect();
        for cell in cells {
            assert!(land.forest.plant(&mut land.grid, cell));
        }
        land
    }

    /// A land cell right next to the river.
    fn bank_cell(land: &Landscape) -> Cell {
        land.grid
            .land()
            .map(|(c, _)| c)
            .find(|c| land.river().cells().any(|r| r.distance_sq(*c) == 1))
            .unwrap()
    }

    fn debris_count(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::DebrisSpawned(_)))
            .count()
    }

    #[test]
    fn earthquake_spares_low_draws() {
        let mut land = planted(30);
        let mut events = Vec::new();
        let outcome = earthquake(&mut land, &mut events, &mut fixed(0.5));
        assert_eq!(outcome.trees_killed, 0);
        assert_eq!(land.forest.tree_count(), 30);
        assert!(land.forest.stumps().is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn earthquake_topples_high_draws() {
        for draw in [0.9, 0.95] {
            let mut land = planted(30);
            let mut events = Vec::new();
            let outcome = earthquake(&mut land, &mut events, &mut fixed(draw));
            assert_eq!(outcome.trees_killed, 30);
            assert!(land.forest.is_empty());
            assert_eq!(land.forest.stumps().len(), 30);
            assert_eq!(debris_count(&events), 30);
            for stump in land.forest.stumps() {
                assert!(land.grid.at(stump.cell) <= 0.1 + 1e-6);
            }
        }
    }

    #[test]
    fn earthquake_kills_about_a_fifth() {
        let mut land = planted(200);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let outcome = earthquake(&mut land, &mut Vec::new(), &mut rng);
        assert!((20..=60).contains(&outcome.trees_killed), "killed {}", outcome.trees_killed);
        assert_eq!(land.forest.tree_count() + outcome.trees_killed as usize, 200);
    }

    #[test]
    fn flood_health_chain_is_multiplicative() {
        let mut land = landscape();
        let cell = bank_cell(&land);
        assert!(land.forest.plant(&mut land.grid, cell));

        // Draws above the stray chance: only flooded trees are damaged.
        let mut rng = fixed(0.99);
        let mut expected = 1.0_f32;
        for round in 1..=5 {
            let outcome = flood(&mut land, 0.0, &mut Vec::new(), &mut rng);
            expected *= 0.7;
            assert_eq!(outcome.trees_killed, 0, "round {}", round);
            let tree = &land.forest.trees()[0];
            assert!((tree.health - expected).abs() < 1e-5, "round {}: {}", round, tree.health);
            assert!(tree.dying);
        }
        // 0.7^6 ~= 0.118 drops below the death threshold.
        let mut events = Vec::new();
        let outcome = flood(&mut land, 0.0, &mut events, &mut rng);
        assert_eq!(outcome.trees_killed, 1);
        assert!(land.forest.is_empty());
        assert_eq!(land.forest.stumps().len(), 1);
        assert_eq!(debris_count(&events), 1);
    }

    #[test]
    fn flood_marks_flooded_area_and_dies_back() {
        let mut land = landscape();
        let before: Vec<(Cell, f32)> = land.grid.land().collect();
        flood(&mut land, 0.2, &mut Vec::new(), &mut fixed(0.99));
        assert_eq!(land.flooded, flooded_area(land.river(), 5, 0.2));
        for (cell, value) in before {
            assert!((land.grid.at(cell) - value * 0.9).abs() < 1e-6);
        }
    }

    #[test]
    fn stray_flood_damage_reaches_dry_trees() {
        let mut land = planted(5);
        flood(&mut land, 0.0, &mut Vec::new(), &mut fixed(0.01));
        for tree in land.forest.trees() {
            assert!((tree.health - 0.7).abs() < 1e-6);
        }
    }

    #[test]
    fn drought_damage_chain() {
        let mut land = planted(10);
        let mut rng = fixed(0.3);
        for _ in 0..3 {
            let outcome = drought(&mut land, &mut Vec::new(), &mut rng);
            assert_eq!(outcome.trees_killed, 0);
        }
        assert!((land.forest.trees()[0].health - 0.216).abs() < 1e-5);
        // 0.6^4 ~= 0.13
        let outcome = drought(&mut land, &mut Vec::new(), &mut rng);
        assert_eq!(outcome.trees_killed, 10);
        assert!(land.flooded.is_empty());
    }

    #[test]
    fn drought_misses_leave_trees_but_scale_grid() {
        let mut land = planted(10);
        let before = land.grid.values().to_vec();
        let outcome = drought(&mut land, &mut Vec::new(), &mut fixed(0.5));
        assert_eq!(outcome.trees_killed, 0);
        for tree in land.forest.trees() {
            assert_eq!(tree.health, 1.0);
            assert!(!tree.dying);
        }
        for (after, before) in land.grid.values().iter().zip(before) {
            assert!((after - before * 0.85).abs() < 1e-6);
        }
    }

    #[test]
    fn landslide_clears_its_disc() {
        let mut land = planted(400);
        let total = land.forest.tree_count();
        let mut events = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let outcome = landslide(&mut land, 0.4, &mut events, &mut rng);

        let center = outcome.epicenter.unwrap();
        assert!((3..=16).contains(&center.x));
        assert!((3..=16).contains(&center.y));
        assert_eq!(land.flooded, flooded_area(land.river(), 1, 0.4));

        for tree in land.forest.trees() {
            assert!(tree.cell.distance_sq(center) >= 16);
        }
        assert_eq!(land.forest.tree_count() + outcome.trees_killed as usize, total);
        for (cell, value) in land.grid.land() {
            if cell.distance_sq(center) < 16 && !land.flooded.contains(&cell) {
                assert_eq!(value, 0.0, "{:?}", cell);
            }
        }
        // One soil burst per disc cell plus foliage per buried tree.
        let disc = (0..20usize)
            .flat_map(|x| (0..20usize).map(move |y| Cell::new(x, y)))
            .filter(|c| c.distance_sq(center) < 16)
            .count();
        assert_eq!(debris_count(&events), disc + outcome.trees_killed as usize);
    }

    #[test]
    fn epicenter_range_shrinks_for_small_grids() {
        assert_eq!(epicenter_range(20), (3, 16));
        assert_eq!(epicenter_range(8), (3, 4));
        assert_eq!(epicenter_range(4), (2, 2));
    }

    #[test]
    fn apply_effect_clears_stale_flooding() {
        let mut land = landscape();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        apply_effect(DisasterKind::Flood, &mut land, 0.5, &mut Vec::new(), &mut rng);
        assert!(!land.flooded.is_empty());
        apply_effect(DisasterKind::Earthquake, &mut land, 0.5, &mut Vec::new(), &mut rng);
        assert!(land.flooded.is_empty());
    }
}
