use serde::Deserialize;
use std::path::Path;

use crate::world::lattice::DEFAULT_RIVER_SEED;
use crate::world::river::MIN_GRID_SIZE;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Seed for every random draw. 0 picks a random seed at construction.
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_river_seed")]
    pub river_seed: u32,
    #[serde(default)]
    pub reseed_river_on_reset: bool,
    #[serde(default = "default_river_width")]
    pub river_width: f32,
    #[serde(default = "default_initial_coverage")]
    pub initial_coverage: f32,
    #[serde(default = "default_initial_tree_attempts")]
    pub initial_tree_attempts: u32,
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f32,
    #[serde(default = "default_rain_warning_secs")]
    pub rain_warning_secs: f32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_grid_size() -> usize {
    20
}
fn default_cell_size() -> f32 {
    30.0
}
fn default_river_seed() -> u32 {
    DEFAULT_RIVER_SEED
}
fn default_river_width() -> f32 {
    2.0
}
fn default_initial_coverage() -> f32 {
    0.9
}
fn default_initial_tree_attempts() -> u32 {
    200
}
fn default_tick_rate() -> f32 {
    60.0
}
fn default_rain_warning_secs() -> f32 {
    5.0
}
fn default_cooldown_secs() -> f32 {
    10.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            grid_size: default_grid_size(),
            cell_size: default_cell_size(),
            seed: 0,
            river_seed: default_river_seed(),
            reseed_river_on_reset: false,
            river_width: default_river_width(),
            initial_coverage: default_initial_coverage(),
            initial_tree_attempts: default_initial_tree_attempts(),
            tick_rate_hz: default_tick_rate(),
            rain_warning_secs: default_rain_warning_secs(),
            cooldown_secs: default_cooldown_secs(),
            log_level: default_log_level(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Seconds per tick at the configured rate.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.grid_size < MIN_GRID_SIZE {
            errors.push(format!(
                "grid_size must be >= {}, got {}. Example: grid_size = 20",
                MIN_GRID_SIZE, self.grid_size
            ));
        }

        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            errors.push(format!(
                "cell_size must be > 0.0, got {}. Example: cell_size = 30.0",
                self.cell_size
            ));
        }

        if !(self.river_width >= 0.0 && self.river_width.is_finite()) {
            errors.push(format!(
                "river_width must be >= 0.0, got {}. Example: river_width = 2.0",
                self.river_width
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_coverage) {
            errors.push(format!(
                "initial_coverage must be 0.0-1.0, got {}. Example: initial_coverage = 0.9",
                self.initial_coverage
            ));
        }

        if !(self.tick_rate_hz > 0.0 && self.tick_rate_hz.is_finite()) {
            errors.push(format!(
                "tick_rate_hz must be > 0.0, got {}. Example: tick_rate_hz = 60.0",
                self.tick_rate_hz
            ));
        }

        if !(self.rain_warning_secs >= 0.0 && self.rain_warning_secs.is_finite()) {
            errors.push(format!(
                "rain_warning_secs must be >= 0.0, got {}. Example: rain_warning_secs = 5.0",
                self.rain_warning_secs
            ));
        }

        if !(self.cooldown_secs >= 0.0 && self.cooldown_secs.is_finite()) {
            errors.push(format!(
                "cooldown_secs must be >= 0.0, got {}. Example: cooldown_secs = 10.0",
                self.cooldown_secs
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
