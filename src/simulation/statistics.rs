use serde::Serialize;

use crate::simulation::erosion::WarningLevel;
use crate::simulation::Simulation;

/// Aggregate metrics for logging and degenerate-state detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandscapeStatistics {
    pub ticks: u64,
    pub land_cells: u32,
    pub river_cells: u32,
    pub mean_coverage: f32,
    pub tree_count: u32,
    pub stump_count: u32,
    pub dying_trees: u32,
    pub mean_tree_health: f32,
    pub erosion_risk: f32,
    pub warning_level: WarningLevel,
    pub total_disasters: u32,
    pub trees_lost: u32,
}

/// Summarise the current state of `sim`.
pub fn compute_statistics(sim: &Simulation) -> LandscapeStatistics {
    let grid = sim.grid();
    let trees = sim.forest().trees();

    let mut land_cells = 0_u32;
    let mut total_coverage = 0.0_f64;
    for (_, coverage) in grid.land() {
        land_cells += 1;
        total_coverage += coverage as f64;
    }

    let mut total_health = 0.0_f64;
    let mut dying_trees = 0_u32;
    for tree in trees {
        total_health += tree.health as f64;
        if tree.dying {
            dying_trees += 1;
        }
    }

    let erosion = sim.erosion();
    let counters = sim.counters();
    LandscapeStatistics {
        ticks: sim.ticks(),
        land_cells,
        river_cells: sim.river().len() as u32,
        mean_coverage: mean(total_coverage, land_cells as usize),
        tree_count: trees.len() as u32,
        stump_count: sim.forest().stumps().len() as u32,
        dying_trees,
        mean_tree_health: mean(total_health, trees.len()),
        erosion_risk: erosion.risk,
        warning_level: erosion.level,
        total_disasters: counters.total_disasters,
        trees_lost: counters.trees_lost,
    }
}

fn mean(total: f64, count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        (total / count as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn sim(attempts: u32, coverage: f32) -> Simulation {
        Simulation::new(SimulationConfig {
            seed: 42,
            initial_tree_attempts: attempts,
            initial_coverage: coverage,
            ..SimulationConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn cells_add_up_to_the_grid() {
        let sim = sim(200, 0.9);
        let stats = compute_statistics(&sim);
        assert_eq!(stats.land_cells + stats.river_cells, 400);
        assert_eq!(stats.tree_count as usize, sim.forest().tree_count());
        assert_eq!(stats.stump_count, 0);
    }

    #[test]
    fn empty_forest_has_zero_health() {
        let stats = compute_statistics(&sim(0, 0.5));
        assert_eq!(stats.tree_count, 0);
        assert_eq!(stats.mean_tree_health, 0.0);
        assert!((stats.mean_coverage - 0.5).abs() < 1e-6);
        assert!((stats.erosion_risk - 0.5).abs() < 1e-5);
        assert_eq!(stats.warning_level, WarningLevel::High);
    }

    #[test]
    fn fresh_trees_are_healthy() {
        let stats = compute_statistics(&sim(200, 0.9));
        assert!(stats.tree_count > 0);
        assert_eq!(stats.mean_tree_health, 1.0);
        assert_eq!(stats.dying_trees, 0);
        assert!(stats.mean_coverage > 0.9);
    }

    #[test]
    fn mass_cut_shows_in_counters() {
        let mut sim = sim(200, 0.9);
        let cut = sim.cut_fraction(0.5);
        let stats = compute_statistics(&sim);
        assert_eq!(stats.trees_lost as usize, cut);
        assert_eq!(stats.stump_count as usize, cut);
    }
}
