//! Particle records and the descriptor used to populate them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::math::{finite_or, life_ratio, unit, wave01};
use crate::renderer::color::FxColor;

/// Render routine selected for a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    #[default]
    Default,
    Glow,
    Spark,
    Trail,
    Smoke,
    Energy,
    Debris,
    Ring,
    Flame,
}

/// Eviction class. Protected records are only stolen when every live
/// record is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPriority {
    #[default]
    Normal,
    Protected,
}

/// Descriptor for one spawn. Missing JSON fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub color: FxColor,
    pub secondary: Option<FxColor>,
    /// Lifetime in seconds.
    pub life: f32,
    /// Fade multiplier applied to the remaining-life ratio.
    pub decay: f32,
    /// Fraction of velocity lost per 60 Hz tick.
    pub drag: f32,
    pub gravity: Vec2,
    /// Pulse frequency in Hz.
    pub pulse: Option<f32>,
    pub rotation: f32,
    pub spin: f32,
    pub kind: ParticleKind,
    pub priority: SpawnPriority,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 3.0,
            color: FxColor::WHITE,
            secondary: None,
            life: 1.0,
            decay: 1.0,
            drag: 0.0,
            gravity: Vec2::ZERO,
            pulse: None,
            rotation: 0.0,
            spin: 0.0,
            kind: ParticleKind::Default,
            priority: SpawnPriority::Normal,
        }
    }
}

impl SpawnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a default descriptor at `position`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    // -- Builder pattern --

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn with_color(mut self, color: FxColor) -> Self {
        self.color = color;
        self
    }

    /// Color blended towards as the particle ages.
    pub fn with_secondary(mut self, color: FxColor) -> Self {
        self.secondary = Some(color);
        self
    }

    pub fn with_life(mut self, life: f32) -> Self {
        self.life = life;
        self
    }

    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_pulse(mut self, frequency: f32) -> Self {
        self.pulse = Some(frequency);
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_spin(mut self, spin: f32) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_kind(mut self, kind: ParticleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priority(mut self, priority: SpawnPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn protected(self) -> Self {
        self.with_priority(SpawnPriority::Protected)
    }
}

/// A pooled particle. Reset and reused in place, never reallocated.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub color: FxColor,
    pub secondary: Option<FxColor>,
    /// Remaining life in seconds, `0 <= life <= max_life`.
    pub life: f32,
    pub max_life: f32,
    pub decay: f32,
    pub drag: f32,
    pub gravity: Vec2,
    pub pulse: Option<f32>,
    pub rotation: f32,
    pub spin: f32,
    pub kind: ParticleKind,
    pub priority: SpawnPriority,
    /// Display alpha computed on the last tick, in [0, 1].
    pub alpha: f32,
    /// Seconds since spawn.
    pub age: f32,
    generation: u32,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: 0.0,
            color: FxColor::TRANSPARENT,
            secondary: None,
            life: 0.0,
            max_life: 0.0,
            decay: 1.0,
            drag: 0.0,
            gravity: Vec2::ZERO,
            pulse: None,
            rotation: 0.0,
            spin: 0.0,
            kind: ParticleKind::Default,
            priority: SpawnPriority::Normal,
            alpha: 0.0,
            age: 0.0,
            generation: 0,
        }
    }
}

fn finite_vec(v: Vec2) -> Vec2 {
    if v.is_finite() {
        v
    } else {
        Vec2::ZERO
    }
}

impl Particle {
    /// Generation counter, bumped on every reset.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Clear every field back to its neutral value and bump the generation.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Populate from a descriptor. Non-finite numbers are replaced so a bad
    /// descriptor yields an invisible, immediately expiring particle.
    pub fn apply(&mut self, config: &SpawnConfig) {
        let life = finite_or(config.life, 0.0).max(0.0);
        self.position = finite_vec(config.position);
        self.velocity = finite_vec(config.velocity);
        self.size = finite_or(config.size, 0.0).max(0.0);
        self.color = config.color;
        self.secondary = config.secondary;
        self.life = life;
        self.max_life = life;
        self.decay = finite_or(config.decay, 0.0).max(0.0);
        self.drag = unit(config.drag);
        self.gravity = finite_vec(config.gravity);
        self.pulse = config.pulse.filter(|f| f.is_finite() && *f > 0.0);
        self.rotation = finite_or(config.rotation, 0.0);
        self.spin = finite_or(config.spin, 0.0);
        self.kind = config.kind;
        self.priority = config.priority;
        self.age = 0.0;
        self.refresh_alpha();
    }

    /// Advance one step. Returns `false` once the particle has expired.
    pub fn integrate(&mut self, dt: f32) -> bool {
        self.velocity += self.gravity * dt;
        self.position += self.velocity * dt;
        if self.drag > 0.0 {
            self.velocity *= (1.0 - self.drag).powf(dt * 60.0);
        }
        self.rotation += self.spin * dt;
        self.age += dt;
        self.life -= dt;

        if !(self.life > 0.0) || !self.position.is_finite() {
            self.life = 0.0;
            self.alpha = 0.0;
            return false;
        }
        self.refresh_alpha();
        true
    }

    fn refresh_alpha(&mut self) {
        let mut alpha = unit(life_ratio(self.life, self.max_life) * self.decay);
        if let Some(frequency) = self.pulse {
            alpha *= wave01(self.age, frequency);
        }
        self.alpha = unit(alpha);
    }

    /// Remaining-life ratio in [0, 1].
    pub fn life_fraction(&self) -> f32 {
        life_ratio(self.life, self.max_life)
    }

    /// Color at the current age (primary blended towards secondary) with the
    /// display alpha applied.
    pub fn display_color(&self) -> FxColor {
        let base = match self.secondary {
            Some(secondary) => self.color.mix(secondary, 1.0 - self.life_fraction()),
            None => self.color,
        };
        base.fade(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_then_reset_bumps_generation() {
        let mut p = Particle::default();
        p.apply(&SpawnConfig::at(Vec2::new(5.0, 5.0)).with_life(2.0));
        assert_eq!(p.life, 2.0);
        assert_eq!(p.max_life, 2.0);
        assert_eq!(p.alpha, 1.0);

        let before = p.generation();
        p.reset();
        assert_eq!(p.generation(), before + 1);
        assert_eq!(p.life, 0.0);
        assert_eq!(p.position, Vec2::ZERO);
    }

    #[test]
    fn integrate_applies_gravity_then_velocity() {
        let mut p = Particle::default();
        p.apply(
            &SpawnConfig::new()
                .with_velocity(Vec2::new(10.0, 0.0))
                .with_gravity(Vec2::new(0.0, 100.0))
                .with_life(5.0),
        );
        assert!(p.integrate(0.1));
        assert!((p.velocity.y - 10.0).abs() < 1e-4);
        assert!((p.position.x - 1.0).abs() < 1e-4);
        assert!((p.position.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn drag_is_frame_rate_independent() {
        let config = SpawnConfig::new()
            .with_velocity(Vec2::new(100.0, 0.0))
            .with_drag(0.05)
            .with_life(5.0);
        let mut one = Particle::default();
        one.apply(&config);
        one.integrate(1.0 / 30.0);

        let mut two = Particle::default();
        two.apply(&config);
        two.integrate(1.0 / 60.0);
        two.integrate(1.0 / 60.0);

        assert!((one.velocity.x - two.velocity.x).abs() < 1e-3);
    }

    #[test]
    fn alpha_never_increases_without_pulse() {
        let mut p = Particle::default();
        p.apply(&SpawnConfig::new().with_life(1.0).with_decay(1.5));
        let mut last = p.alpha;
        while p.integrate(0.016) {
            assert!(p.alpha <= last + f32::EPSILON);
            assert!((0.0..=1.0).contains(&p.alpha));
            last = p.alpha;
        }
        assert_eq!(p.alpha, 0.0);
        assert_eq!(p.life, 0.0);
    }

    #[test]
    fn pulse_modulates_alpha() {
        let mut p = Particle::default();
        p.apply(&SpawnConfig::new().with_life(10.0).with_pulse(1.0));
        p.integrate(0.25);
        let peak = p.alpha;
        p.integrate(0.5);
        let trough = p.alpha;
        assert!(peak > 0.9);
        assert!(trough < 0.05);
    }

    #[test]
    fn corrupted_descriptor_expires_immediately() {
        let mut p = Particle::default();
        p.apply(
            &SpawnConfig::new()
                .with_life(f32::NAN)
                .with_size(f32::INFINITY)
                .with_velocity(Vec2::new(f32::NAN, 1.0)),
        );
        assert_eq!(p.alpha, 0.0);
        assert_eq!(p.size, 0.0);
        assert_eq!(p.velocity, Vec2::ZERO);
        assert!(!p.integrate(0.016));
    }

    #[test]
    fn secondary_color_blends_with_age() {
        let mut p = Particle::default();
        p.apply(
            &SpawnConfig::new()
                .with_color(FxColor::rgb(1.0, 0.0, 0.0))
                .with_secondary(FxColor::rgb(0.0, 0.0, 1.0))
                .with_life(1.0),
        );
        p.integrate(0.5);
        let c = p.display_color();
        assert!((c.r - 0.5).abs() < 1e-3);
        assert!((c.b - 0.5).abs() < 1e-3);
    }

    #[test]
    fn spawn_config_json_defaults() {
        let config: SpawnConfig =
            serde_json::from_str(r#"{"position":[10.0,20.0],"kind":"spark"}"#).unwrap();
        assert_eq!(config.position, Vec2::new(10.0, 20.0));
        assert_eq!(config.kind, ParticleKind::Spark);
        assert_eq!(config.life, 1.0);
        assert_eq!(config.priority, SpawnPriority::Normal);
    }
}
