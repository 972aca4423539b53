use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Host tick rate the trigger probabilities are calibrated against. Other
/// rates change how often disasters fire per second.
pub const ASSUMED_TICK_RATE_HZ: f32 = 60.0;

/// Risk above which landslides and floods become possible.
pub const MODERATE_RISK: f32 = 0.5;
/// Risk above which earthquakes and droughts join the pool.
pub const SEVERE_RISK: f32 = 0.7;
/// Per-tick trigger chance for `MODERATE_RISK < risk <= SEVERE_RISK`.
pub const MODERATE_TRIGGER_CHANCE: f32 = 0.001;
/// Per-tick trigger chance for `risk > SEVERE_RISK`.
pub const SEVERE_TRIGGER_CHANCE: f32 = 0.005;

pub const MIN_ACTIVE_SECS: f32 = 5.0;
pub const MAX_ACTIVE_SECS: f32 = 8.0;
/// After the first active tick, visual intensity is
/// `remaining / INTENSITY_DECAY_SECS`, clamped to 1.
pub const INTENSITY_DECAY_SECS: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterKind {
    Landslide,
    Flood,
    Earthquake,
    Drought,
}

impl DisasterKind {
    pub fn all() -> &'static [DisasterKind] {
        &[
            DisasterKind::Landslide,
            DisasterKind::Flood,
            DisasterKind::Earthquake,
            DisasterKind::Drought,
        ]
    }

    /// Water-driven disasters are preceded by a rain warning.
    pub fn is_water_driven(self) -> bool {
        matches!(self, DisasterKind::Landslide | DisasterKind::Flood)
    }

    pub fn name(self) -> &'static str {
        match self {
            DisasterKind::Landslide => "landslide",
            DisasterKind::Flood => "flood",
            DisasterKind::Earthquake => "earthquake",
            DisasterKind::Drought => "drought",
        }
    }
}

/// Coarse phase label for snapshots and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterState {
    Idle,
    RainWarning,
    Active,
    Cooldown,
}

/// Where the disaster lifecycle currently is.
///
/// `Idle -> RainWarning -> Active -> Cooldown -> Idle` for landslides and
/// floods; earthquakes and droughts go straight from `Idle` to `Active`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisasterPhase {
    Idle,
    RainWarning { kind: DisasterKind, elapsed: f32 },
    Active {
        kind: DisasterKind,
        remaining: f32,
        intensity: f32,
    },
    Cooldown { remaining: f32 },
}

impl DisasterPhase {
    pub fn state(&self) -> DisasterState {
        match self {
            DisasterPhase::Idle => DisasterState::Idle,
            DisasterPhase::RainWarning { .. } => DisasterState::RainWarning,
            DisasterPhase::Active { .. } => DisasterState::Active,
            DisasterPhase::Cooldown { .. } => DisasterState::Cooldown,
        }
    }

    pub fn kind(&self) -> Option<DisasterKind> {
        match self {
            DisasterPhase::RainWarning { kind, .. } | DisasterPhase::Active { kind, .. } => {
                Some(*kind)
            }
            DisasterPhase::Idle | DisasterPhase::Cooldown { .. } => None,
        }
    }
}

/// What changed during one engine step. The owner applies effects and
/// bookkeeping in response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseTransition {
    None,
    RainWarningStarted { kind: DisasterKind },
    Activated { kind: DisasterKind, duration: f32 },
    Ended { kind: DisasterKind },
}

/// Read-only view of the engine for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisasterStatus {
    pub state: DisasterState,
    pub kind: Option<DisasterKind>,
    pub remaining_secs: f32,
    pub rain_warning_elapsed_secs: f32,
    pub cooldown_secs: f32,
    pub visual_intensity: f32,
}

/// Chance that an idle engine triggers a disaster on one tick.
pub fn trigger_chance(risk: f32) -> f32 {
    if risk > SEVERE_RISK {
        SEVERE_TRIGGER_CHANCE
    } else if risk > MODERATE_RISK {
        MODERATE_TRIGGER_CHANCE
    } else {
        0.0
    }
}

/// Disasters that can be drawn at this risk, all equally likely.
pub fn candidate_kinds(risk: f32) -> Vec<DisasterKind> {
    let mut kinds = Vec::with_capacity(4);
    if risk > MODERATE_RISK {
        kinds.extend([DisasterKind::Landslide, DisasterKind::Flood]);
    }
    if risk > SEVERE_RISK {
        kinds.extend([DisasterKind::Earthquake, DisasterKind::Drought]);
    }
    kinds
}

/// Timed disaster lifecycle. Holds no landscape state; effects are applied by
/// the owner when a step reports [`PhaseTransition::Activated`].
#[derive(Debug, Clone, PartialEq)]
pub struct DisasterEngine {
    phase: DisasterPhase,
    rain_warning_secs: f32,
    cooldown_secs: f32,
}

impl DisasterEngine {
    pub fn new(rain_warning_secs: f32, cooldown_secs: f32) -> DisasterEngine {
        DisasterEngine {
            phase: DisasterPhase::Idle,
            rain_warning_secs,
            cooldown_secs,
        }
    }

    pub fn phase(&self) -> &DisasterPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == DisasterPhase::Idle
    }

    /// 1.0 at the start of the active phase, decaying linearly to 0.
    pub fn visual_intensity(&self) -> f32 {
        match self.phase {
            DisasterPhase::Active { intensity, .. } => intensity,
            _ => 0.0,
        }
    }

    pub fn status(&self) -> DisasterStatus {
        let (remaining_secs, rain_warning_elapsed_secs, cooldown_secs) = match self.phase {
            DisasterPhase::Idle => (0.0, 0.0, 0.0),
            DisasterPhase::RainWarning { elapsed, .. } => (0.0, elapsed, 0.0),
            DisasterPhase::Active { remaining, .. } => (remaining.max(0.0), 0.0, 0.0),
            DisasterPhase::Cooldown { remaining } => (0.0, 0.0, remaining),
        };
        DisasterStatus {
            state: self.phase.state(),
            kind: self.phase.kind(),
            remaining_secs,
            rain_warning_elapsed_secs,
            cooldown_secs,
            visual_intensity: self.visual_intensity(),
        }
    }

    /// Back to idle with no cooldown.
    pub fn reset(&mut self) {
        self.phase = DisasterPhase::Idle;
    }

    /// Advance the lifecycle by `dt` seconds. A negative or non-finite `dt`
    /// counts as no time at all.
    ///
    /// Only an idle engine rolls for a new disaster; the roll is drawn on
    /// every idle tick so the random sequence does not depend on the risk.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, risk: f32, rng: &mut R) -> PhaseTransition {
        let dt = sanitize_dt(dt);
        match self.phase {
            DisasterPhase::Idle => self.roll(risk, rng),
            DisasterPhase::RainWarning { kind, elapsed } => {
                let elapsed = elapsed + dt;
                if elapsed >= self.rain_warning_secs {
                    self.activate(kind, rng)
                } else {
                    self.phase = DisasterPhase::RainWarning { kind, elapsed };
                    PhaseTransition::None
                }
            }
            DisasterPhase::Active { kind, remaining, .. } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.phase = DisasterPhase::Cooldown {
                        remaining: self.cooldown_secs,
                    };
                    PhaseTransition::Ended { kind }
                } else {
                    self.phase = DisasterPhase::Active {
                        kind,
                        remaining,
                        intensity: (remaining / INTENSITY_DECAY_SECS).clamp(0.0, 1.0),
                    };
                    PhaseTransition::None
                }
            }
            DisasterPhase::Cooldown { remaining } => {
                let remaining = (remaining - dt).max(0.0);
                if remaining <= 0.0 {
                    self.phase = DisasterPhase::Idle;
                    self.roll(risk, rng)
                } else {
                    self.phase = DisasterPhase::Cooldown { remaining };
                    PhaseTransition::None
                }
            }
        }
    }

    /// Start `kind` from idle. Returns `PhaseTransition::None` when busy.
    pub fn trigger<R: Rng + ?Sized>(&mut self, kind: DisasterKind, rng: &mut R) -> PhaseTransition {
        if !self.is_idle() {
            return PhaseTransition::None;
        }
        if kind.is_water_driven() {
            self.phase = DisasterPhase::RainWarning { kind, elapsed: 0.0 };
            PhaseTransition::RainWarningStarted { kind }
        } else {
            self.activate(kind, rng)
        }
    }

    fn roll<R: Rng + ?Sized>(&mut self, risk: f32, rng: &mut R) -> PhaseTransition {
        let draw: f32 = rng.r#gen();
        if draw >= trigger_chance(risk) {
            return PhaseTransition::None;
        }
        match candidate_kinds(risk).choose(rng) {
            Some(&kind) => self.trigger(kind, rng),
            None => PhaseTransition::None,
        }
    }

    fn activate<R: Rng + ?Sized>(&mut self, kind: DisasterKind, rng: &mut R) -> PhaseTransition {
        let duration = rng.gen_range(MIN_ACTIVE_SECS..=MAX_ACTIVE_SECS);
        self.phase = DisasterPhase::Active {
            kind,
            remaining: duration,
            intensity: 1.0,
        };
        PhaseTransition::Activated { kind, duration }
    }
}

/// Clamp a host-supplied tick length to a usable, non-negative value.
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}
