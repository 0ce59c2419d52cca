//! Per-particle jitter applied by `ParticlePool::spawn_burst`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::particle::SpawnConfig;
use super::rng::Rng;

/// Velocity scattered by angle and speed around the burst origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialSpread {
    pub speed_min: f32,
    pub speed_max: f32,
    /// Center direction of the arc, radians.
    pub direction: f32,
    /// Arc width in radians. `TAU` scatters in every direction.
    pub arc: f32,
}

impl Default for RadialSpread {
    fn default() -> Self {
        Self {
            speed_min: 0.0,
            speed_max: 100.0,
            direction: 0.0,
            arc: std::f32::consts::TAU,
        }
    }
}

/// Independent uniform offsets for each burst member. Every field is a
/// half-range: a member receives `base + uniform(-range, range)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstSpread {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub size: f32,
    pub radial: Option<RadialSpread>,
}

impl BurstSpread {
    /// No jitter: every member is an exact copy of the descriptor.
    pub fn none() -> Self {
        Self::default()
    }

    /// Full-circle radial scatter with speeds in `[speed_min, speed_max)`.
    pub fn radial(speed_min: f32, speed_max: f32) -> Self {
        Self {
            radial: Some(RadialSpread {
                speed_min,
                speed_max,
                ..RadialSpread::default()
            }),
            ..Self::default()
        }
    }

    /// Restrict radial scatter to an arc centered on `direction`.
    pub fn with_arc(mut self, direction: f32, arc: f32) -> Self {
        let radial = self.radial.get_or_insert_with(RadialSpread::default);
        radial.direction = direction;
        radial.arc = arc;
        self
    }

    pub fn with_position(mut self, half_extent: Vec2) -> Self {
        self.position = half_extent;
        self
    }

    pub fn with_velocity(mut self, half_extent: Vec2) -> Self {
        self.velocity = half_extent;
        self
    }

    pub fn with_life(mut self, half_range: f32) -> Self {
        self.life = half_range;
        self
    }

    pub fn with_size(mut self, half_range: f32) -> Self {
        self.size = half_range;
        self
    }

    /// Produce one jittered member of the burst.
    pub fn sample(&self, base: &SpawnConfig, rng: &mut Rng) -> SpawnConfig {
        let mut config = base.clone();
        config.position += Vec2::new(rng.signed(self.position.x), rng.signed(self.position.y));
        config.velocity += Vec2::new(rng.signed(self.velocity.x), rng.signed(self.velocity.y));
        if let Some(radial) = &self.radial {
            let angle = radial.direction + rng.signed(radial.arc * 0.5);
            let speed = rng.range(radial.speed_min, radial.speed_max);
            config.velocity += Vec2::from_angle(angle) * speed;
        }
        if self.life != 0.0 {
            config.life = (config.life + rng.signed(self.life)).max(0.0);
        }
        if self.size != 0.0 {
            config.size = (config.size + rng.signed(self.size)).max(0.0);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_copies_descriptor() {
        let mut rng = Rng::new(3);
        let base = SpawnConfig::at(Vec2::new(4.0, 4.0)).with_life(0.5);
        assert_eq!(BurstSpread::none().sample(&base, &mut rng), base);
    }

    #[test]
    fn radial_speeds_in_range() {
        let mut rng = Rng::new(11);
        let spread = BurstSpread::radial(50.0, 80.0);
        let base = SpawnConfig::new();
        for _ in 0..200 {
            let speed = spread.sample(&base, &mut rng).velocity.length();
            assert!(speed >= 49.99 && speed <= 80.01, "speed {speed}");
        }
    }

    #[test]
    fn narrow_arc_points_one_way() {
        let mut rng = Rng::new(5);
        let spread = BurstSpread::radial(10.0, 20.0).with_arc(0.0, 0.2);
        for _ in 0..100 {
            let v = spread.sample(&SpawnConfig::new(), &mut rng).velocity;
            assert!(v.x > 0.0);
        }
    }

    #[test]
    fn life_jitter_never_negative() {
        let mut rng = Rng::new(8);
        let spread = BurstSpread::none().with_life(5.0).with_position(Vec2::splat(10.0));
        let base = SpawnConfig::new().with_life(0.1);
        for _ in 0..200 {
            let config = spread.sample(&base, &mut rng);
            assert!(config.life >= 0.0);
            assert!(config.position.x.abs() <= 10.0);
        }
    }
}
