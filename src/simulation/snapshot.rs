use serde::Serialize;

use crate::simulation::disaster::DisasterStatus;
use crate::simulation::erosion::ErosionAssessment;
use crate::simulation::{Counters, Simulation};
use crate::world::forest::{Stump, Tree};
use crate::world::Cell;

/// Owned, read-only view of a simulation for renderers and `inspect --json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSnapshot {
    pub grid_size: usize,
    pub cell_size: f32,
    /// Row-major vegetation coverage.
    pub coverage: Vec<f32>,
    pub river: Vec<Cell>,
    pub visible_river: Vec<Cell>,
    pub flooded: Vec<Cell>,
    pub effective_river_radius: f32,
    pub trees: Vec<Tree>,
    pub stumps: Vec<Stump>,
    pub erosion: ErosionAssessment,
    pub disaster: DisasterStatus,
    pub counters: Counters,
    pub river_seed: u32,
    pub ticks: u64,
    pub elapsed_secs: f64,
}

impl SimulationSnapshot {
    pub fn capture(sim: &Simulation) -> SimulationSnapshot {
        let river = sim.river();
        SimulationSnapshot {
            grid_size: sim.grid().size(),
            cell_size: sim.config().cell_size,
            coverage: sim.grid().values().to_vec(),
            river: river.cells().collect(),
            visible_river: river.cells().filter(|c| sim.is_visible_river(*c)).collect(),
            flooded: sim.flooded().iter().copied().collect(),
            effective_river_radius: sim.effective_river_radius(),
            trees: sim.forest().trees().to_vec(),
            stumps: sim.forest().stumps().to_vec(),
            erosion: *sim.erosion(),
            disaster: sim.disaster().status(),
            counters: *sim.counters(),
            river_seed: sim.river_seed(),
            ticks: sim.ticks(),
            elapsed_secs: sim.elapsed_secs(),
        }
    }
}
