use tracing::info;

use crate::config::simulation::SimulationConfig;
use crate::simulation::events::SimEvent;
use crate::simulation::statistics::{compute_statistics, LandscapeStatistics};
use crate::simulation::Simulation;
use crate::world::Cell;

/// Options for a headless `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub ticks: u64,
    /// Mass-cut this fraction of the forest at `cut_at`.
    pub cut_fraction: Option<f32>,
    pub cut_at: u64,
    /// Log statistics every this many ticks; 0 disables periodic logging.
    pub every: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            ticks: 600,
            cut_fraction: None,
            cut_at: 0,
            every: 60,
        }
    }
}

/// Drive the simulation at the configured tick rate without a renderer.
///
/// Events are drained every tick the way a host frame loop would; only the
/// lifecycle ones are counted.
pub fn run_simulation(
    config: &SimulationConfig,
    options: &RunOptions,
) -> Result<LandscapeStatistics, String> {
    let mut sim = Simulation::new(config.clone())?;
    let dt = config.tick_seconds();
    let mut debris_bursts = 0u64;
    let mut warnings = 0u64;

    info!(
        ticks = options.ticks,
        tick_rate_hz = config.tick_rate_hz,
        "Simulation running"
    );

    for tick in 0..options.ticks {
        if let Some(fraction) = options.cut_fraction {
            if tick == options.cut_at {
                sim.cut_fraction(fraction);
            }
        }

        sim.advance(dt);

        for event in sim.drain_events() {
            match event {
                SimEvent::DebrisSpawned(_) => debris_bursts += 1,
                SimEvent::RainWarning { .. } => warnings += 1,
                _ => {}
            }
        }

        if options.every > 0 && (tick + 1) % options.every == 0 {
            let stats = compute_statistics(&sim);
            info!(
                tick = stats.ticks,
                trees = stats.tree_count,
                coverage = stats.mean_coverage,
                risk = stats.erosion_risk,
                level = stats.warning_level.level(),
                disaster = ?sim.disaster().phase().state(),
                "Tick"
            );
        }
    }

    let stats = compute_statistics(&sim);
    info!(
        debris_bursts,
        warnings,
        total_disasters = stats.total_disasters,
        trees_lost = stats.trees_lost,
        "Simulation finished"
    );
    Ok(stats)
}

/// Build a simulation from `config` and print it, as a map or as JSON.
pub fn inspect(config: &SimulationConfig, json: bool) -> Result<(), String> {
    let sim = Simulation::new(config.clone())?;

    if json {
        let out = serde_json::to_string_pretty(&sim.snapshot())
            .map_err(|e| format!("Cannot serialize snapshot: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    println!("{}", render_map(&sim));
    print_summary(&compute_statistics(&sim));
    Ok(())
}

/// One character per cell, rows top to bottom.
///
/// `~` open water, `-` river bed exposed by drought, `%` flooded land,
/// `T` tree, `x` stump, then coverage shading from ` ` (bare) to `#`.
pub fn render_map(sim: &Simulation) -> String {
    const SHADES: [char; 5] = [' ', '.', ':', '+', '#'];

    let size = sim.grid().size();
    let mut stumps = vec![false; size * size];
    for stump in sim.forest().stumps() {
        stumps[stump.cell.y * size + stump.cell.x] = true;
    }

    let mut out = String::with_capacity((size + 1) * size);
    for y in 0..size {
        for x in 0..size {
            let cell = Cell::new(x, y);
            let c = if sim.river().contains(cell) {
                if sim.is_visible_river(cell) { '~' } else { '-' }
            } else if sim.forest().is_occupied(cell) {
                'T'
            } else if stumps[y * size + x] {
                'x'
            } else if sim.flooded().contains(&cell) {
                '%'
            } else {
                let coverage = sim.grid().at(cell);
                let idx = ((coverage * (SHADES.len() - 1) as f32).round() as usize)
                    .min(SHADES.len() - 1);
                SHADES[idx]
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

pub fn print_summary(stats: &LandscapeStatistics) {
    println!("=== Landscape Summary ===");
    println!("Ticks:           {}", stats.ticks);
    println!(
        "Cells:           {} land, {} river",
        stats.land_cells, stats.river_cells
    );
    println!("Mean coverage:   {:.3}", stats.mean_coverage);
    println!(
        "Trees:           {} ({} dying, mean health {:.2})",
        stats.tree_count, stats.dying_trees, stats.mean_tree_health
    );
    println!("Stumps:          {}", stats.stump_count);
    println!(
        "Erosion risk:    {:.3} ({:?}, level {})",
        stats.erosion_risk,
        stats.warning_level,
        stats.warning_level.level()
    );
    println!("Disasters:       {}", stats.total_disasters);
    println!("Trees lost:      {}", stats.trees_lost);
}
