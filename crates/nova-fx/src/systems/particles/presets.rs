//! Canned bursts: faction death explosions and weapon impacts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::burst::BurstSpread;
use super::particle::{ParticleKind, SpawnConfig};
use super::pool::ParticlePool;
use crate::renderer::color::FxColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Pirate,
    Scavenger,
    Swarm,
    #[default]
    Void,
    RogueMiner,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlastSize {
    Small,
    #[default]
    Medium,
    Large,
}

struct Palette {
    hot: FxColor,
    cool: FxColor,
    spark: FxColor,
    smoke: FxColor,
    ring: Option<FxColor>,
    /// Relative amount of tumbling debris.
    debris: f32,
}

impl Faction {
    /// Blast scale per size class.
    pub fn scale(self, size: BlastSize) -> f32 {
        let (small, medium, large) = match self {
            Faction::Pirate => (0.7, 1.0, 1.5),
            Faction::Scavenger => (0.6, 1.0, 1.4),
            Faction::Swarm => (0.7, 1.0, 1.6),
            Faction::Void => (0.8, 1.0, 1.5),
            Faction::RogueMiner => (0.7, 1.0, 1.4),
            Faction::Player => (0.8, 1.0, 1.3),
        };
        match size {
            BlastSize::Small => small,
            BlastSize::Medium => medium,
            BlastSize::Large => large,
        }
    }

    /// Signature color used by phased effects tied to this faction.
    pub fn accent(self) -> FxColor {
        self.palette().cool
    }

    fn palette(self) -> Palette {
        match self {
            Faction::Pirate => Palette {
                hot: FxColor::FLAME_CORE,
                cool: FxColor::hex(0xD8381C),
                spark: FxColor::EMBER,
                smoke: FxColor::SMOKE,
                ring: None,
                debris: 1.0,
            },
            Faction::Scavenger => Palette {
                hot: FxColor::hex(0xFFD27A),
                cool: FxColor::RUST,
                spark: FxColor::hex(0xFFB347),
                smoke: FxColor::hex(0x4A3F36),
                ring: None,
                debris: 1.6,
            },
            Faction::Swarm => Palette {
                hot: FxColor::hex(0xD9FF8A),
                cool: FxColor::ACID_GREEN,
                spark: FxColor::hex(0xB4F04A),
                smoke: FxColor::hex(0x2F4A1E),
                ring: None,
                debris: 0.4,
            },
            Faction::Void => Palette {
                hot: FxColor::hex(0xE6C8FF),
                cool: FxColor::VOID_PURPLE,
                spark: FxColor::hex(0xB07CFF),
                smoke: FxColor::VOID_CORE,
                ring: Some(FxColor::VOID_PURPLE),
                debris: 0.0,
            },
            Faction::RogueMiner => Palette {
                hot: FxColor::hex(0xFFE08A),
                cool: FxColor::hex(0xE07A1F),
                spark: FxColor::hex(0xFFC04D),
                smoke: FxColor::hex(0x5A4A3A),
                ring: None,
                debris: 1.3,
            },
            Faction::Player => Palette {
                hot: FxColor::WHITE,
                cool: FxColor::PLASMA_BLUE,
                spark: FxColor::SHIELD_CYAN,
                smoke: FxColor::hex(0x2A3340),
                ring: Some(FxColor::PLASMA_BLUE),
                debris: 0.8,
            },
        }
    }
}

/// Scale a nominal particle count by the quality multiplier.
pub fn scaled_count(nominal: f32, multiplier: f32) -> usize {
    let n = nominal * multiplier;
    if n.is_finite() && n > 0.0 {
        n.round() as usize
    } else {
        0
    }
}

/// Death explosion for a ship of `faction`. Returns the particles spawned.
pub fn explosion(
    pool: &mut ParticlePool,
    position: Vec2,
    faction: Faction,
    size: BlastSize,
    multiplier: f32,
) -> usize {
    let scale = faction.scale(size);
    let palette = faction.palette();
    let base = SpawnConfig::at(position);
    let mut spawned = 0;

    // Flash
    spawned += pool.spawn_burst(
        &base
            .clone()
            .with_kind(ParticleKind::Glow)
            .with_color(palette.hot)
            .with_size(18.0 * scale)
            .with_life(0.18)
            .with_decay(1.4),
        scaled_count(1.0, multiplier.min(1.0)),
        &BurstSpread::none(),
    );

    // Fireball
    spawned += pool.spawn_burst(
        &base
            .clone()
            .with_kind(ParticleKind::Flame)
            .with_color(palette.hot)
            .with_secondary(palette.cool)
            .with_size(6.0 * scale)
            .with_life(0.6)
            .with_drag(0.06),
        scaled_count(12.0 * scale, multiplier),
        &BurstSpread::radial(20.0, 90.0 * scale)
            .with_position(Vec2::splat(6.0 * scale))
            .with_life(0.2)
            .with_size(2.0),
    );

    // Sparks
    spawned += pool.spawn_burst(
        &base
            .clone()
            .with_kind(ParticleKind::Spark)
            .with_color(palette.spark)
            .with_size(1.5)
            .with_life(0.5)
            .with_drag(0.03),
        scaled_count(16.0 * scale, multiplier),
        &BurstSpread::radial(120.0, 260.0 * scale).with_life(0.2),
    );

    // Smoke
    spawned += pool.spawn_burst(
        &base
            .clone()
            .with_kind(ParticleKind::Smoke)
            .with_color(palette.smoke)
            .with_size(8.0 * scale)
            .with_life(1.4)
            .with_decay(0.8)
            .with_drag(0.04),
        scaled_count(6.0 * scale, multiplier),
        &BurstSpread::radial(5.0, 30.0).with_position(Vec2::splat(10.0 * scale)).with_life(0.4),
    );

    if palette.debris > 0.0 {
        spawned += pool.spawn_burst(
            &base
                .clone()
                .with_kind(ParticleKind::Debris)
                .with_color(palette.cool.mix(FxColor::SMOKE, 0.5))
                .with_size(2.5 * scale)
                .with_life(1.2)
                .with_drag(0.01)
                .with_spin(4.0),
            scaled_count(4.0 * scale * palette.debris, multiplier),
            &BurstSpread::radial(40.0, 140.0).with_life(0.3).with_size(1.0),
        );
    }

    if let Some(ring) = palette.ring {
        spawned += pool.spawn_burst(
            &base
                .clone()
                .with_kind(ParticleKind::Ring)
                .with_color(ring)
                .with_size(12.0 * scale)
                .with_life(0.5),
            scaled_count(1.0, multiplier.min(1.0)),
            &BurstSpread::none(),
        );
    }

    spawned
}

/// Damage type of a weapon hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    #[default]
    Kinetic,
    Energy,
    Explosive,
    Void,
}

impl HitKind {
    fn color(self) -> FxColor {
        match self {
            HitKind::Kinetic => FxColor::hex(0xFFD9A0),
            HitKind::Energy => FxColor::PLASMA_BLUE,
            HitKind::Explosive => FxColor::EMBER,
            HitKind::Void => FxColor::VOID_PURPLE,
        }
    }
}

/// Highest damage tier.
pub const MAX_TIER: u8 = 5;

/// Weapon impact on a shield (ripple ring) or hull (spark spray). `tier`
/// is clamped to 1..=5 and scales size and count. `normal` points away from
/// the struck surface; sparks spray within a half-circle around it.
pub fn impact(
    pool: &mut ParticlePool,
    position: Vec2,
    normal: Vec2,
    kind: HitKind,
    shield: bool,
    tier: u8,
    multiplier: f32,
) -> usize {
    let tier = tier.clamp(1, MAX_TIER);
    let intensity = 1.0 + 0.35 * (tier - 1) as f32;
    let (direction, arc) = if normal.is_finite() && normal.length_squared() > 1e-6 {
        (normal.to_angle(), std::f32::consts::PI)
    } else {
        (0.0, std::f32::consts::TAU)
    };
    let base = SpawnConfig::at(position);
    let mut spawned = 0;

    if shield {
        spawned += pool.spawn_burst(
            &base
                .clone()
                .with_kind(ParticleKind::Ring)
                .with_color(FxColor::SHIELD_CYAN.mix(kind.color(), 0.25))
                .with_size(5.0 * intensity)
                .with_life(0.35),
            scaled_count(1.0, multiplier.min(1.0)),
            &BurstSpread::none(),
        );
        spawned += pool.spawn_burst(
            &base
                .clone()
                .with_kind(ParticleKind::Energy)
                .with_color(FxColor::SHIELD_CYAN)
                .with_size(1.5)
                .with_life(0.3)
                .with_drag(0.08),
            scaled_count(4.0 * intensity, multiplier),
            &BurstSpread::radial(30.0, 80.0).with_arc(direction, arc),
        );
    } else {
        spawned += pool.spawn_burst(
            &base
                .clone()
                .with_kind(ParticleKind::Spark)
                .with_color(kind.color())
                .with_secondary(FxColor::EMBER)
                .with_size(1.2)
                .with_life(0.25)
                .with_drag(0.05),
            scaled_count(5.0 * intensity, multiplier),
            &BurstSpread::radial(80.0, 200.0 * intensity).with_arc(direction, arc).with_life(0.1),
        );
        if matches!(kind, HitKind::Kinetic | HitKind::Explosive) {
            spawned += pool.spawn_burst(
                &base
                    .clone()
                    .with_kind(ParticleKind::Debris)
                    .with_color(FxColor::RUST)
                    .with_size(1.2)
                    .with_life(0.6)
                    .with_spin(6.0),
                scaled_count(tier as f32, multiplier),
                &BurstSpread::radial(30.0, 90.0).with_arc(direction, arc),
            );
        }
    }

    spawned += pool.spawn_burst(
        &base
            .with_kind(ParticleKind::Glow)
            .with_color(kind.color())
            .with_size(3.0 * intensity)
            .with_life(0.12),
        scaled_count(1.0, multiplier.min(1.0)),
        &BurstSpread::none(),
    );

    spawned
}
