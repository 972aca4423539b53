pub mod disaster;
pub mod effects;
pub mod erosion;
pub mod events;
pub mod snapshot;
pub mod spatial;
pub mod statistics;

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::simulation::disaster::{
    ASSUMED_TICK_RATE_HZ, DisasterEngine, DisasterKind, DisasterState, PhaseTransition,
};
use crate::simulation::effects::EffectOutcome;
use crate::simulation::erosion::ErosionAssessment;
use crate::simulation::events::{Debris, SimEvent};
use crate::simulation::snapshot::SimulationSnapshot;
use crate::world::forest::Tree;
use crate::world::{Cell, CellGeometry, ForestRegistry, Landscape, RiverPath, TerrainGrid};

/// Lifetime tallies, cleared on reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Disasters that reached the active phase.
    pub total_disasters: u32,
    /// Every tree removal, whatever the cause.
    pub trees_lost: u32,
    pub trees_lost_to_disaster: u32,
    /// Trees lost since the current or most recent disaster went active.
    pub episode_trees_lost: u32,
}

/// The whole simulation: landscape, disaster lifecycle, counters and the one
/// random stream every draw comes from.
///
/// The host owns this exclusively and serialises commands and `advance`
/// calls; nothing here blocks or spawns.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    seed: u64,
    river_seed: u32,
    rng: ChaCha8Rng,
    landscape: Landscape,
    engine: DisasterEngine,
    erosion: ErosionAssessment,
    counters: Counters,
    events: Vec<SimEvent>,
    ticks: u64,
    elapsed_secs: f64,
}

impl Simulation {
    /// Validate `config` and build the initial landscape.
    pub fn new(config: SimulationConfig) -> Result<Simulation, String> {
        config.validate()?;
        if config.tick_rate_hz != ASSUMED_TICK_RATE_HZ {
            warn!(
                tick_rate_hz = config.tick_rate_hz,
                calibrated_hz = ASSUMED_TICK_RATE_HZ,
                "Disaster odds are per tick; this rate changes how often they fire"
            );
        }

        let seed = if config.seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            config.seed
        };
        let river_seed = config.river_seed;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let landscape = build_landscape(&config, river_seed, &mut rng);
        let erosion = erosion::recompute(&landscape.grid);
        let engine = DisasterEngine::new(config.rain_warning_secs, config.cooldown_secs);

        info!(
            seed,
            river_seed,
            grid_size = config.grid_size,
            river_cells = landscape.river().len(),
            trees = landscape.forest.tree_count(),
            risk = erosion.risk,
            "Simulation initialized"
        );

        Ok(Simulation {
            config,
            seed,
            river_seed,
            rng,
            landscape,
            engine,
            erosion,
            counters: Counters::default(),
            events: Vec::new(),
            ticks: 0,
            elapsed_secs: 0.0,
        })
    }

    /// Rebuild every piece of owned state. The random stream carries on, so
    /// a reset simulation does not replay the previous episode.
    pub fn reset(&mut self) {
        if self.config.reseed_river_on_reset {
            self.river_seed = self.rng.r#gen();
        }
        self.landscape = build_landscape(&self.config, self.river_seed, &mut self.rng);
        self.engine.reset();
        self.counters = Counters::default();
        self.events.clear();
        self.events.push(SimEvent::Reset);
        self.ticks = 0;
        self.elapsed_secs = 0.0;
        self.refresh_erosion();

        info!(
            river_seed = self.river_seed,
            trees = self.landscape.forest.tree_count(),
            risk = self.erosion.risk,
            "Simulation reset"
        );
    }

    // ---- Commands ----

    /// Plant a tree on cell `(x, y)`. No-op on river, occupied or out-of-range cells.
    pub fn plant(&mut self, x: usize, y: usize) -> bool {
        self.plant_cell(Cell::new(x, y))
    }

    pub fn plant_cell(&mut self, cell: Cell) -> bool {
        let planted = self.landscape.forest.plant(&mut self.landscape.grid, cell);
        if planted {
            self.refresh_erosion();
            debug!(x = cell.x, y = cell.y, risk = self.erosion.risk, "Tree planted");
        }
        planted
    }

    /// Cut the tree nearest the world point, if one is within reach.
    pub fn cut_near(&mut self, world_x: f32, world_y: f32) -> bool {
        let point = Vec2::new(world_x, world_y);
        let Some(tree) = self
            .landscape
            .forest
            .cut_nearest(&mut self.landscape.grid, point)
        else {
            return false;
        };

        self.record_cuts(std::slice::from_ref(&tree));
        self.refresh_erosion();
        debug!(x = tree.cell.x, y = tree.cell.y, risk = self.erosion.risk, "Tree cut");
        true
    }

    /// Cut `floor(count * fraction)` trees chosen at random. Returns how many fell.
    pub fn cut_fraction(&mut self, fraction: f32) -> usize {
        if fraction.is_nan() || fraction <= 0.0 || fraction > 1.0 {
            warn!(fraction, "cut_fraction outside (0, 1], clamping");
        }
        let fraction = if fraction.is_nan() { 0.0 } else { fraction };

        let felled = self.landscape.forest.cut_fraction(
            &mut self.landscape.grid,
            fraction,
            &mut self.rng,
        );
        if felled.is_empty() {
            return 0;
        }

        self.record_cuts(&felled);
        self.refresh_erosion();
        info!(
            cut = felled.len(),
            remaining = self.landscape.forest.tree_count(),
            risk = self.erosion.risk,
            "Mass cut"
        );
        felled.len()
    }

    /// Advance the disaster lifecycle by `dt` seconds. Negative or
    /// non-finite ticks still count but carry no time.
    pub fn advance(&mut self, dt: f32) -> PhaseTransition {
        if !dt.is_finite() || dt < 0.0 {
            warn!(dt, "Ignoring unusable tick length");
        }
        let dt = disaster::sanitize_dt(dt);
        self.ticks += 1;
        self.elapsed_secs += dt as f64;
        let transition = self.engine.step(dt, self.erosion.risk, &mut self.rng);
        self.handle_transition(transition);
        transition
    }

    /// Start `kind` immediately, bypassing the random trigger. Returns false
    /// unless the engine is idle.
    pub fn trigger_disaster(&mut self, kind: DisasterKind) -> bool {
        let transition = self.engine.trigger(kind, &mut self.rng);
        if transition == PhaseTransition::None {
            debug!(kind = kind.name(), "Disaster trigger ignored, engine busy");
            return false;
        }
        self.handle_transition(transition);
        true
    }

    /// Apply one round of `kind`'s effect outside the lifecycle.
    ///
    /// The lifecycle applies each effect once per episode; this entry point
    /// lets a host or test apply extra rounds. Outside an active disaster
    /// the flooded area is dropped again, since no episode end will clear it.
    pub fn apply_disaster_effect(&mut self, kind: DisasterKind) -> EffectOutcome {
        let outcome = effects::apply_effect(
            kind,
            &mut self.landscape,
            self.erosion.risk,
            &mut self.events,
            &mut self.rng,
        );
        self.counters.trees_lost += outcome.trees_killed;
        self.counters.trees_lost_to_disaster += outcome.trees_killed;
        self.counters.episode_trees_lost += outcome.trees_killed;
        if self.engine.phase().state() != DisasterState::Active {
            self.landscape.flooded.clear();
        }
        self.refresh_erosion();
        outcome
    }

    /// Take every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Queries ----

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The seed the random stream was built from (resolved if configured as 0).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn river_seed(&self) -> u32 {
        self.river_seed
    }

    pub fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.landscape.grid
    }

    pub fn river(&self) -> &RiverPath {
        self.landscape.river()
    }

    pub fn forest(&self) -> &ForestRegistry {
        &self.landscape.forest
    }

    pub fn flooded(&self) -> &BTreeSet<Cell> {
        &self.landscape.flooded
    }

    pub fn erosion(&self) -> &ErosionAssessment {
        &self.erosion
    }

    pub fn disaster(&self) -> &DisasterEngine {
        &self.engine
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn pending_events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn effective_river_radius(&self) -> f32 {
        spatial::effective_river_radius(self.engine.phase(), self.config.river_width)
    }

    pub fn is_visible_river(&self, cell: Cell) -> bool {
        spatial::is_visible_river(self.river(), cell, self.effective_river_radius())
    }

    /// Smoothed coverage for rendering. Flooded cells read as bare.
    pub fn bilinear_coverage(&self, x: isize, y: isize) -> f32 {
        self.landscape
            .grid
            .bilinear_coverage(x, y, &self.landscape.flooded)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot::capture(self)
    }

    // ---- Internals ----

    fn handle_transition(&mut self, transition: PhaseTransition) {
        match transition {
            PhaseTransition::None => {}
            PhaseTransition::RainWarningStarted { kind } => {
                info!(kind = kind.name(), risk = self.erosion.risk, "Heavy rain warning");
                self.events.push(SimEvent::RainWarning { kind });
            }
            PhaseTransition::Activated { kind, duration } => {
                self.counters.total_disasters += 1;
                self.counters.episode_trees_lost = 0;
                self.events.push(SimEvent::DisasterStarted {
                    kind,
                    duration_secs: duration,
                });
                let outcome = self.apply_disaster_effect(kind);
                info!(
                    kind = kind.name(),
                    duration,
                    trees_killed = outcome.trees_killed,
                    risk = self.erosion.risk,
                    "Disaster active"
                );
            }
            PhaseTransition::Ended { kind } => {
                self.landscape.flooded.clear();
                self.events.push(SimEvent::DisasterEnded {
                    kind,
                    trees_lost: self.counters.episode_trees_lost,
                });
                info!(
                    kind = kind.name(),
                    trees_lost = self.counters.episode_trees_lost,
                    "Disaster over, cooling down"
                );
            }
        }
    }

    fn record_cuts(&mut self, felled: &[Tree]) {
        for tree in felled {
            self.events
                .push(SimEvent::DebrisSpawned(Debris::wood_chips(tree.position)));
        }
        self.counters.trees_lost += felled.len() as u32;
    }

    fn refresh_erosion(&mut self) {
        self.erosion = erosion::recompute(&self.landscape.grid);
    }
}

/// Fresh river, grid and forest. Initial planting draws from `rng`.
fn build_landscape<R: Rng + ?Sized>(
    config: &SimulationConfig,
    river_seed: u32,
    rng: &mut R,
) -> Landscape {
    let n = config.grid_size;
    let river = RiverPath::generate(n, config.river_width, river_seed);
    let grid = TerrainGrid::new(river, config.initial_coverage);
    let forest = ForestRegistry::new(n, CellGeometry::new(config.cell_size));
    let mut landscape = Landscape::new(grid, forest);

    for _ in 0..config.initial_tree_attempts {
        let x = rng.gen_range(1..=n - 2);
        let y = rng.gen_range(1..=n - 2);
        landscape
            .forest
            .plant(&mut landscape.grid, Cell::new(x, y));
    }
    landscape
}
