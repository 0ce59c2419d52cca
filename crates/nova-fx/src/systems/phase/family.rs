//! The contract a choreographed effect family implements.

use std::fmt::Debug;

use glam::Vec2;

use super::instance::PhaseInstance;
use crate::api::types::SoundEvent;
use crate::core::math::{finite_or, unit};
use crate::renderer::painter::Painter;
use crate::systems::particles::{
    presets::scaled_count, BurstSpread, ParticlePool, Rng, SpawnConfig, StreamEmitter,
};

/// How a phase ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhaseRule<P> {
    /// Advance to `next` once `duration` seconds have elapsed.
    Timed { duration: f32, next: P },
    /// Stay until an external phase change.
    Held,
    /// Remove the instance once `duration` seconds (plus linger) have elapsed.
    Terminal { duration: f32 },
}

/// Derived draw parameters for an instance at one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseVisual {
    pub scale: f32,
    pub rotation: f32,
    pub intensity: f32,
    pub alpha: f32,
}

impl PhaseVisual {
    pub const HIDDEN: Self = Self {
        scale: 0.0,
        rotation: 0.0,
        intensity: 0.0,
        alpha: 0.0,
    };

    pub fn new(scale: f32, rotation: f32, intensity: f32, alpha: f32) -> Self {
        Self { scale, rotation, intensity, alpha }
    }

    /// Clamp into drawable ranges. Alpha and intensity land in [0, 1], scale
    /// in [0, max_scale]; anything non-finite becomes 0.
    pub fn sanitized(self, max_scale: f32) -> Self {
        let max_scale = finite_or(max_scale, 1.0).max(0.0);
        Self {
            scale: finite_or(self.scale, 0.0).clamp(0.0, max_scale),
            rotation: finite_or(self.rotation, 0.0),
            intensity: unit(self.intensity),
            alpha: unit(self.alpha),
        }
    }
}

/// Side-effect sink handed to families while the registry ticks.
///
/// Spawns go through the shared pool, scaled by the quality multiplier and
/// advanced by `lead_dt` so they get a full step before the next draw.
pub struct EmitContext<'a> {
    pub pool: &'a mut ParticlePool,
    pub multiplier: f32,
    pub lead_dt: f32,
    pub sounds: &'a mut Vec<SoundEvent>,
}

impl<'a> EmitContext<'a> {
    pub fn new(pool: &'a mut ParticlePool, sounds: &'a mut Vec<SoundEvent>) -> Self {
        Self {
            pool,
            multiplier: 1.0,
            lead_dt: 0.0,
            sounds,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_lead(mut self, lead_dt: f32) -> Self {
        self.lead_dt = lead_dt;
        self
    }

    /// Burst of `nominal` particles before the quality multiplier.
    pub fn burst(&mut self, config: &SpawnConfig, nominal: f32, spread: &BurstSpread) -> usize {
        let count = scaled_count(nominal, self.multiplier);
        self.pool.spawn_burst_advanced(config, count, spread, self.lead_dt)
    }

    /// Drive a rate-based stream for this tick.
    pub fn stream(
        &mut self,
        emitter: &mut StreamEmitter,
        dt: f32,
        config: &SpawnConfig,
        spread: &BurstSpread,
    ) -> usize {
        let count = emitter.tick(dt, self.multiplier);
        self.pool.spawn_burst_advanced(config, count, spread, self.lead_dt)
    }

    pub fn cue(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
    }

    pub fn rng(&mut self) -> &mut Rng {
        self.pool.rng_mut()
    }
}

/// Behavior of one effect family (rift, gravity well, ...).
///
/// Everything visual is a pure function of the instance (frozen shape,
/// parameters) and the seconds elapsed in the current phase.
pub trait PhaseFamily: Sized {
    type Phase: Copy + Eq + Debug;
    type Params: Clone + Debug;
    type Shape: Debug;

    /// Family name, used in logs.
    const NAME: &'static str;

    fn initial_phase(&self) -> Self::Phase;

    /// Timing of `phase`. Durations may depend on the instance parameters.
    fn rule(&self, phase: Self::Phase, params: &Self::Params) -> PhaseRule<Self::Phase>;

    /// Whether an external `set_phase` may move `from` to `to`.
    fn allows(&self, from: Self::Phase, to: Self::Phase) -> bool;

    /// Phase an instance is cancelled into.
    fn closing_phase(&self) -> Self::Phase;

    fn parse_phase(name: &str) -> Option<Self::Phase>;

    fn phase_name(phase: Self::Phase) -> &'static str;

    /// Build the per-instance shape once, at creation.
    fn freeze_shape(&self, params: &Self::Params, rng: &mut Rng) -> Self::Shape;

    fn visual(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> PhaseVisual;

    /// Upper bound applied to `PhaseVisual::scale`.
    fn max_scale(&self) -> f32 {
        2.0
    }

    /// Called once per tick after transitions.
    fn emit(&self, _instance: &mut PhaseInstance<Self>, _elapsed: f32, _dt: f32, _ctx: &mut EmitContext<'_>) {}

    /// Called once when an instance enters a phase (including its first).
    fn on_enter(&self, _instance: &mut PhaseInstance<Self>, _ctx: &mut EmitContext<'_>) {}

    /// Paint at `at` (camera-relative) using an already sanitized visual.
    fn draw(
        &self,
        instance: &PhaseInstance<Self>,
        elapsed: f32,
        visual: &PhaseVisual,
        at: Vec2,
        painter: &mut dyn Painter,
    );

    /// Radius the instance may paint to, used for culling.
    fn extent(&self, instance: &PhaseInstance<Self>) -> f32;

    /// Screen-shake contribution in world units.
    fn shake(&self, _instance: &PhaseInstance<Self>, _elapsed: f32) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_everything() {
        let v = PhaseVisual::new(f32::INFINITY, f32::NAN, 3.0, -1.0).sanitized(2.0);
        assert_eq!(v, PhaseVisual::new(0.0, 0.0, 1.0, 0.0));
        let v = PhaseVisual::new(5.0, 1.0, 0.5, 0.5).sanitized(2.0);
        assert_eq!(v.scale, 2.0);
    }

    #[test]
    fn context_scales_bursts() {
        let mut pool = ParticlePool::with_capacity(100, 1);
        let mut sounds = Vec::new();
        let mut ctx = EmitContext::new(&mut pool, &mut sounds).with_multiplier(0.5);
        assert_eq!(ctx.burst(&SpawnConfig::new(), 10.0, &BurstSpread::none()), 5);
        ctx.cue(SoundEvent::RIFT_OPEN);
        assert_eq!(sounds, vec![SoundEvent::RIFT_OPEN]);
        assert_eq!(pool.live_count(), 5);
    }
}
