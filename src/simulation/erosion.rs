use serde::Serialize;

use crate::world::TerrainGrid;

/// Discrete erosion warning shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Safe,
    Elevated,
    High,
    Critical,
}

impl WarningLevel {
    pub fn from_risk(risk: f32) -> WarningLevel {
        if risk < 0.3 {
            WarningLevel::Safe
        } else if risk < 0.5 {
            WarningLevel::Elevated
        } else if risk < 0.7 {
            WarningLevel::High
        } else {
            WarningLevel::Critical
        }
    }

    /// Numeric level, 0 (safe) through 3 (critical).
    pub fn level(self) -> u8 {
        match self {
            WarningLevel::Safe => 0,
            WarningLevel::Elevated => 1,
            WarningLevel::High => 2,
            WarningLevel::Critical => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErosionAssessment {
    pub risk: f32,
    pub level: WarningLevel,
}

impl ErosionAssessment {
    pub fn from_risk(risk: f32) -> ErosionAssessment {
        let risk = risk.clamp(0.0, 1.0);
        ErosionAssessment {
            risk,
            level: WarningLevel::from_risk(risk),
        }
    }
}

/// Erosion risk is one minus the mean coverage of all non-river cells.
/// A grid that is entirely river has no protective cover and scores 1.
pub fn recompute(grid: &TerrainGrid) -> ErosionAssessment {
    let mut land = 0usize;
    let mut total = 0.0_f64;
    for (_, coverage) in grid.land() {
        land += 1;
        total += coverage as f64;
    }

    let coverage = if land > 0 { total / land as f64 } else { 0.0 };
    ErosionAssessment::from_risk((1.0 - coverage) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Cell, RiverPath};

    fn grid(coverage: f32) -> TerrainGrid {
        TerrainGrid::new(RiverPath::generate(20, 2.0, 12345), coverage)
    }

    #[test]
    fn full_cover_means_no_risk() {
        let a = recompute(&grid(1.0));
        assert!(a.risk.abs() < 1e-6);
        assert_eq!(a.level, WarningLevel::Safe);
    }

    #[test]
    fn bare_ground_means_full_risk() {
        let a = recompute(&grid(0.0));
        assert_eq!(a.risk, 1.0);
        assert_eq!(a.level, WarningLevel::Critical);
    }

    #[test]
    fn river_cells_do_not_count() {
        // Initial coverage 0.9 everywhere except the dry river.
        let a = recompute(&grid(0.9));
        assert!((a.risk - 0.1).abs() < 1e-5);
    }

    #[test]
    fn level_thresholds() {
        assert_eq!(WarningLevel::from_risk(0.0), WarningLevel::Safe);
        assert_eq!(WarningLevel::from_risk(0.29), WarningLevel::Safe);
        assert_eq!(WarningLevel::from_risk(0.3), WarningLevel::Elevated);
        assert_eq!(WarningLevel::from_risk(0.49), WarningLevel::Elevated);
        assert_eq!(WarningLevel::from_risk(0.5), WarningLevel::High);
        assert_eq!(WarningLevel::from_risk(0.69), WarningLevel::High);
        assert_eq!(WarningLevel::from_risk(0.7), WarningLevel::Critical);
        assert_eq!(WarningLevel::from_risk(1.0), WarningLevel::Critical);
        assert_eq!(WarningLevel::Critical.level(), 3);
        assert_eq!(WarningLevel::Safe.level(), 0);
    }

    #[test]
    fn risk_is_clamped() {
        assert_eq!(ErosionAssessment::from_risk(1.4).risk, 1.0);
        assert_eq!(ErosionAssessment::from_risk(-0.2).risk, 0.0);
    }

    #[test]
    fn risk_never_decreases_as_cells_are_cleared() {
        let mut grid = grid(0.9);
        let land: Vec<Cell> = grid.land().map(|(c, _)| c).collect();
        let mut previous = recompute(&grid).risk;
        for cell in land {
            grid.set(cell.x as isize, cell.y as isize, 0.0);
            let risk = recompute(&grid).risk;
            assert!(risk >= previous, "risk fell from {} to {}", previous, risk);
            assert!((0.0..=1.0).contains(&risk));
            previous = risk;
        }
        assert_eq!(previous, 1.0);
    }
}
