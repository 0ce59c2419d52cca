use serde::{Deserialize, Serialize};

use crate::systems::families::{BossEmergenceFamily, GrappleFamily, GravityWellFamily, RiftFamily};
use crate::systems::particles::QualityTier;

/// Which phased-effect families the orchestrator builds registries for.
/// Decided once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilySet {
    pub rifts: bool,
    pub gravity_wells: bool,
    pub grapples: bool,
    pub boss_emergence: bool,
}

impl Default for FamilySet {
    fn default() -> Self {
        Self {
            rifts: true,
            gravity_wells: true,
            grapples: true,
            boss_emergence: true,
        }
    }
}

impl FamilySet {
    pub fn none() -> Self {
        Self {
            rifts: false,
            gravity_wells: false,
            grapples: false,
            boss_emergence: false,
        }
    }
}

/// Engine configuration, provided by the host. Every field is optional in
/// JSON; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    /// Pool capacity tier (default: high, 500 particles).
    pub quality: QualityTier,
    /// Scales every burst and stream count; clamped to [0, 4].
    pub particle_multiplier: f32,
    /// Seed for burst jitter and per-instance shapes.
    pub seed: u64,
    /// World units added around the viewport before culling.
    pub cull_margin: f32,
    /// Seconds a finished instance stays before removal.
    pub linger: f32,
    /// Audio cues kept between drains; older cues are dropped first.
    pub max_sounds: usize,
    pub families: FamilySet,
    pub rift: RiftFamily,
    pub gravity_well: GravityWellFamily,
    pub grapple: GrappleFamily,
    pub boss_emergence: BossEmergenceFamily,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            quality: QualityTier::High,
            particle_multiplier: 1.0,
            seed: 0x5EED,
            cull_margin: 50.0,
            linger: 0.05,
            max_sounds: 32,
            families: FamilySet::default(),
            rift: RiftFamily::default(),
            gravity_well: GravityWellFamily::default(),
            grapple: GrappleFamily::default(),
            boss_emergence: BossEmergenceFamily::default(),
        }
    }
}

impl FxConfig {
    pub const MAX_PARTICLE_MULTIPLIER: f32 = 4.0;

    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_families(mut self, families: FamilySet) -> Self {
        self.families = families;
        self
    }

    pub fn with_particle_multiplier(mut self, multiplier: f32) -> Self {
        self.particle_multiplier = multiplier;
        self
    }
}

/// Clamp a particle multiplier to [0, 4]; non-finite values become 1.
pub fn clamp_multiplier(multiplier: f32) -> f32 {
    if multiplier.is_finite() {
        multiplier.clamp(0.0, FxConfig::MAX_PARTICLE_MULTIPLIER)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = FxConfig::from_json("{}").unwrap();
        assert_eq!(config, FxConfig::default());
        assert_eq!(config.quality.capacity(), 500);
    }

    #[test]
    fn partial_json_overrides() {
        let json = r#"{
            "quality": "low",
            "particle_multiplier": 0.5,
            "families": { "grapples": false },
            "rift": { "expand": 1.2 },
            "boss_emergence": { "shake_levels": [0.0, 0.2, 0.4, 0.8] }
        }"#;
        let config = FxConfig::from_json(json).unwrap();
        assert_eq!(config.quality, QualityTier::Low);
        assert_eq!(config.particle_multiplier, 0.5);
        assert!(!config.families.grapples);
        assert!(config.families.rifts);
        assert_eq!(config.rift.expand, 1.2);
        assert_eq!(config.rift.contract, 0.6);
        assert_eq!(config.boss_emergence.shake_levels[3], 0.8);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(FxConfig::from_json("{ quality: ").is_err());
        assert!(FxConfig::from_json(r#"{"quality":"ultra"}"#).is_err());
    }

    #[test]
    fn multiplier_clamp() {
        assert_eq!(clamp_multiplier(9.0), 4.0);
        assert_eq!(clamp_multiplier(-1.0), 0.0);
        assert_eq!(clamp_multiplier(f32::NAN), 1.0);
    }
}
