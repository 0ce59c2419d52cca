use serde::{Deserialize, Serialize};

use crate::systems::particles::PoolStats;

/// Server-assigned identifier of a phased effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(pub u32);

/// A fire-and-forget audio cue.
/// The numeric value maps to a sound in the host's audio manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SoundEvent(pub u32);

impl SoundEvent {
    pub const RIFT_OPEN: Self = Self(1);
    pub const RIFT_CLOSE: Self = Self(2);
    pub const WELL_WARNING: Self = Self(3);
    pub const WELL_ACTIVE: Self = Self(4);
    pub const WELL_COLLAPSE: Self = Self(5);
    pub const TENDRIL_LAUNCH: Self = Self(6);
    pub const TENDRIL_LATCH: Self = Self(7);
    pub const WEB_SNARE: Self = Self(8);
    pub const GRAPPLE_RELEASE: Self = Self(9);
    pub const BOSS_CRACK: Self = Self(10);
    pub const BOSS_POOL: Self = Self(11);
    pub const BOSS_CONVERGE: Self = Self(12);
    pub const BOSS_EMERGE: Self = Self(13);
    pub const EXPLOSION_SMALL: Self = Self(14);
    pub const EXPLOSION_MEDIUM: Self = Self(15);
    pub const EXPLOSION_LARGE: Self = Self(16);
    pub const SHIELD_HIT: Self = Self(17);
    pub const HULL_HIT: Self = Self(18);
}

/// Live-instance counts and pool state, for debug overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxStats {
    pub particles: PoolStats,
    pub rifts: usize,
    pub gravity_wells: usize,
    pub grapples: usize,
    pub emergences: usize,
    /// Audio cues waiting for `drain_sounds`.
    pub pending_sounds: usize,
}

impl FxStats {
    pub fn phased_effects(&self) -> usize {
        self.rifts + self.gravity_wells + self.grapples + self.emergences
    }
}

/// What one `draw` call painted, per layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    pub gravity_wells: usize,
    pub rifts: usize,
    pub particles: usize,
    pub grapples: usize,
    pub emergences: usize,
}

impl DrawStats {
    pub fn total(&self) -> usize {
        self.gravity_wells + self.rifts + self.particles + self.grapples + self.emergences
    }
}
