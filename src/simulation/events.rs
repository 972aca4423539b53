use glam::Vec2;
use serde::Serialize;

use crate::simulation::disaster::DisasterKind;

/// A burst of particles for the renderer. The core only says where, what
/// colour, and how many; motion and fading belong to the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Debris {
    pub position: Vec2,
    pub color: [u8; 3],
    /// Inclusive particle size range in world units.
    pub size_range: (f32, f32),
    pub count: u32,
}

impl Debris {
    pub fn wood_chips(position: Vec2) -> Debris {
        Debris {
            position,
            color: [120, 80, 40],
            size_range: (3.0, 7.0),
            count: 10,
        }
    }

    pub fn soil(position: Vec2, count: u32) -> Debris {
        Debris {
            position,
            color: [150, 90, 40],
            size_range: (3.0, 6.0),
            count,
        }
    }

    pub fn foliage(position: Vec2) -> Debris {
        Debris {
            position,
            color: [50, 150, 50],
            size_range: (4.0, 6.0),
            count: 10,
        }
    }

    pub fn rubble(position: Vec2) -> Debris {
        Debris {
            position,
            color: [150, 150, 150],
            size_range: (5.0, 10.0),
            count: 15,
        }
    }

    /// Dead wood left by trees lost to flood or drought.
    pub fn deadwood(position: Vec2) -> Debris {
        Debris {
            position,
            color: [90, 70, 40],
            size_range: (3.0, 6.0),
            count: 8,
        }
    }
}

/// Notifications queued by the core and drained by the host each frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    DebrisSpawned(Debris),
    RainWarning { kind: DisasterKind },
    DisasterStarted { kind: DisasterKind, duration_secs: f32 },
    DisasterEnded { kind: DisasterKind, trees_lost: u32 },
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_their_styles() {
        let at = Vec2::new(10.0, 20.0);
        assert_eq!(Debris::wood_chips(at).color, [120, 80, 40]);
        assert_eq!(Debris::wood_chips(at).count, 10);
        assert_eq!(Debris::soil(at, 2).count, 2);
        assert_eq!(Debris::foliage(at).size_range, (4.0, 6.0));
        assert_eq!(Debris::rubble(at).count, 15);
        assert_eq!(Debris::deadwood(at).position, at);
    }

    #[test]
    fn events_serialize_with_a_type_tag() {
        let event = SimEvent::DisasterStarted {
            kind: DisasterKind::Flood,
            duration_secs: 6.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "disaster_started");
        assert_eq!(json["kind"], "flood");

        let debris = serde_json::to_value(SimEvent::DebrisSpawned(Debris::rubble(Vec2::ZERO))).unwrap();
        assert_eq!(debris["type"], "debris_spawned");
        assert_eq!(debris["count"], 15);
    }
}
