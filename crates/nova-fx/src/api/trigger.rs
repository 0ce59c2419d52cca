use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::types::EffectId;
use crate::systems::families::GrappleKind;
use crate::systems::particles::{BlastSize, BurstSpread, Faction, HitKind, SpawnConfig};

/// Which registry an id-addressed event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectFamily {
    Rift,
    GravityWell,
    Grapple,
    BossEmergence,
}

/// One event pushed by the server, as JSON tagged by `"type"`.
///
/// ```json
/// { "type": "rift", "id": 7, "position": [120.0, -40.0], "faction": "void" }
/// { "type": "rift_phase", "id": 7, "phase": "combat" }
/// { "type": "explosion", "position": [0.0, 0.0], "faction": "pirate", "size": "large" }
/// ```
///
/// Every field except `id` (and `phase` for phase changes) may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerEvent {
    Rift {
        id: EffectId,
        #[serde(default)]
        position: Vec2,
        #[serde(default)]
        faction: Faction,
        #[serde(default = "default_rift_radius")]
        radius: f32,
    },
    /// Phase change by name. With `delay_ms` the change waits that long.
    RiftPhase {
        id: EffectId,
        phase: String,
        #[serde(default)]
        delay_ms: Option<f32>,
    },
    GravityWell {
        id: EffectId,
        #[serde(default)]
        position: Vec2,
        #[serde(default = "default_well_radius")]
        radius: f32,
        #[serde(default = "default_strength")]
        strength: f32,
    },
    /// Phase change that may also resize the pull field (typically sent
    /// with the activation).
    GravityWellPhase {
        id: EffectId,
        phase: String,
        #[serde(default)]
        delay_ms: Option<f32>,
        #[serde(default)]
        radius: Option<f32>,
    },
    /// `anchor` is where the line starts (the attacker).
    Grapple {
        id: EffectId,
        #[serde(default)]
        anchor: Vec2,
        #[serde(default)]
        target: Vec2,
        #[serde(default)]
        kind: GrappleKind,
    },
    /// The grabbed ship moved.
    GrappleTarget {
        id: EffectId,
        #[serde(default)]
        anchor: Option<Vec2>,
        target: Vec2,
    },
    GrappleRelease { id: EffectId },
    BossEmergence {
        id: EffectId,
        #[serde(default)]
        position: Vec2,
        #[serde(default = "default_emergence_ms")]
        duration_ms: f32,
        #[serde(default = "default_emergence_radius")]
        radius: f32,
    },
    /// Send the instance to its family's closing phase. Without `family`,
    /// every registry holding `id` is cancelled.
    Cancel {
        id: EffectId,
        #[serde(default)]
        family: Option<EffectFamily>,
    },
    /// Drop the instance without its closing animation.
    Remove {
        id: EffectId,
        #[serde(default)]
        family: Option<EffectFamily>,
    },
    Explosion {
        #[serde(default)]
        position: Vec2,
        #[serde(default)]
        faction: Faction,
        #[serde(default)]
        size: BlastSize,
    },
    Impact {
        #[serde(default)]
        position: Vec2,
        #[serde(default)]
        normal: Vec2,
        #[serde(default)]
        kind: HitKind,
        #[serde(default)]
        shield: bool,
        #[serde(default = "default_tier")]
        tier: u8,
    },
    /// Raw burst; `count` is scaled by the particle multiplier.
    Burst {
        #[serde(default)]
        config: SpawnConfig,
        #[serde(default = "default_burst_count")]
        count: u32,
        #[serde(default)]
        spread: BurstSpread,
    },
    /// Drop every instance and particle.
    Clear,
}

fn default_rift_radius() -> f32 {
    60.0
}

fn default_well_radius() -> f32 {
    200.0
}

fn default_strength() -> f32 {
    1.0
}

fn default_emergence_ms() -> f32 {
    7000.0
}

fn default_emergence_radius() -> f32 {
    140.0
}

fn default_tier() -> u8 {
    1
}

fn default_burst_count() -> u32 {
    10
}

impl TriggerEvent {
    /// Parse one event from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Id the event addresses, if any.
    pub fn id(&self) -> Option<EffectId> {
        match self {
            TriggerEvent::Rift { id, .. }
            | TriggerEvent::RiftPhase { id, .. }
            | TriggerEvent::GravityWell { id, .. }
            | TriggerEvent::GravityWellPhase { id, .. }
            | TriggerEvent::Grapple { id, .. }
            | TriggerEvent::GrappleTarget { id, .. }
            | TriggerEvent::GrappleRelease { id }
            | TriggerEvent::BossEmergence { id, .. }
            | TriggerEvent::Cancel { id, .. }
            | TriggerEvent::Remove { id, .. } => Some(*id),
            TriggerEvent::Explosion { .. }
            | TriggerEvent::Impact { .. }
            | TriggerEvent::Burst { .. }
            | TriggerEvent::Clear => None,
        }
    }
}
