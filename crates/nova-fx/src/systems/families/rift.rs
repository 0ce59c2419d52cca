//! Dimensional rift portal: opens, idles, reacts to combat or retreat,
//! then collapses.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::{frozen_offsets, spiral_arm, wobbly_ring};
use crate::api::types::SoundEvent;
use crate::core::easing::Easing;
use crate::core::math::{phase_progress, wave01};
use crate::renderer::color::FxColor;
use crate::renderer::painter::Painter;
use crate::systems::particles::{
    BurstSpread, Faction, ParticleKind, Rng, SpawnConfig, StreamEmitter,
};
use crate::systems::phase::{EmitContext, PhaseFamily, PhaseInstance, PhaseRule, PhaseVisual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiftPhase {
    Spawn,
    Idle,
    Combat,
    Retreat,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiftParams {
    pub faction: Faction,
    pub radius: f32,
}

impl Default for RiftParams {
    fn default() -> Self {
        Self {
            faction: Faction::Void,
            radius: 60.0,
        }
    }
}

const RIM_POINTS: usize = 24;
const ARMS: usize = 5;
const ARM_POINTS: usize = 10;

#[derive(Debug, Clone)]
pub struct RiftShape {
    rim: [f32; RIM_POINTS],
    arms: [f32; ARMS],
    /// +1 or -1.
    spin: f32,
}

/// Rift timings and motion constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiftFamily {
    /// Seconds to open.
    pub expand: f32,
    /// Seconds to collapse.
    pub contract: f32,
    /// Idle scale oscillation amplitude around 1.0.
    pub breathing: f32,
    /// Idle oscillation frequency in Hz.
    pub breathing_hz: f32,
    /// Swirl speed in radians per second.
    pub swirl: f32,
}

impl Default for RiftFamily {
    fn default() -> Self {
        Self {
            expand: 0.8,
            contract: 0.6,
            breathing: 0.03,
            breathing_hz: 0.5,
            swirl: 0.9,
        }
    }
}

impl RiftFamily {
    fn breathe(&self, elapsed: f32) -> f32 {
        (elapsed * self.breathing_hz * std::f32::consts::TAU).sin() * self.breathing
    }

    fn stream_rate(phase: RiftPhase) -> f32 {
        match phase {
            RiftPhase::Spawn => 40.0,
            RiftPhase::Idle => 12.0,
            RiftPhase::Combat => 30.0,
            RiftPhase::Retreat => 6.0,
            RiftPhase::Close => 0.0,
        }
    }
}

impl PhaseFamily for RiftFamily {
    type Phase = RiftPhase;
    type Params = RiftParams;
    type Shape = RiftShape;
    const NAME: &'static str = "rift";

    fn initial_phase(&self) -> RiftPhase {
        RiftPhase::Spawn
    }

    fn rule(&self, phase: RiftPhase, _params: &RiftParams) -> PhaseRule<RiftPhase> {
        match phase {
            RiftPhase::Spawn => PhaseRule::Timed { duration: self.expand, next: RiftPhase::Idle },
            RiftPhase::Idle | RiftPhase::Combat | RiftPhase::Retreat => PhaseRule::Held,
            RiftPhase::Close => PhaseRule::Terminal { duration: self.contract },
        }
    }

    fn allows(&self, from: RiftPhase, to: RiftPhase) -> bool {
        use RiftPhase::*;
        matches!(
            (from, to),
            (Idle, Combat) | (Idle, Retreat) | (Combat, Retreat) | (Spawn | Idle | Combat | Retreat, Close)
        )
    }

    fn closing_phase(&self) -> RiftPhase {
        RiftPhase::Close
    }

    fn parse_phase(name: &str) -> Option<RiftPhase> {
        match name {
            "spawn" => Some(RiftPhase::Spawn),
            "idle" => Some(RiftPhase::Idle),
            "combat" => Some(RiftPhase::Combat),
            "retreat" => Some(RiftPhase::Retreat),
            "close" => Some(RiftPhase::Close),
            _ => None,
        }
    }

    fn phase_name(phase: RiftPhase) -> &'static str {
        match phase {
            RiftPhase::Spawn => "spawn",
            RiftPhase::Idle => "idle",
            RiftPhase::Combat => "combat",
            RiftPhase::Retreat => "retreat",
            RiftPhase::Close => "close",
        }
    }

    fn freeze_shape(&self, _params: &RiftParams, rng: &mut Rng) -> RiftShape {
        let arms = std::array::from_fn(|i| {
            std::f32::consts::TAU * i as f32 / ARMS as f32 + rng.signed(0.3)
        });
        RiftShape {
            rim: frozen_offsets(rng, 0.12),
            arms,
            spin: if rng.next_int(2) == 0 { 1.0 } else { -1.0 },
        }
    }

    fn visual(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> PhaseVisual {
        let age = (instance.entered_at() - instance.created_at()) as f32 + elapsed;
        let rotation = age * self.swirl * instance.shape().spin;
        match instance.phase() {
            RiftPhase::Spawn => {
                let t = phase_progress(elapsed, self.expand);
                PhaseVisual::new(Easing::BackOut.apply(t), rotation, t, Easing::QuadOut.apply(t))
            }
            RiftPhase::Idle => PhaseVisual::new(1.0 + self.breathe(elapsed), rotation, 0.6, 1.0),
            RiftPhase::Combat => {
                let surge = Easing::QuadOut.apply(phase_progress(elapsed, 0.3));
                PhaseVisual::new(
                    1.0 + 0.12 * surge + self.breathe(elapsed) * 1.5,
                    rotation,
                    0.6 + 0.4 * surge * wave01(elapsed, 2.0),
                    1.0,
                )
            }
            RiftPhase::Retreat => {
                let dim = Easing::QuadOut.apply(phase_progress(elapsed, 0.5));
                PhaseVisual::new(
                    1.0 - 0.15 * dim + self.breathe(elapsed),
                    rotation,
                    0.6 - 0.3 * dim,
                    1.0 - 0.2 * dim,
                )
            }
            RiftPhase::Close => {
                let t = phase_progress(elapsed, self.contract);
                // Spins up as it collapses.
                let twist = 2.0 * t * t * instance.shape().spin;
                PhaseVisual::new(1.0 - Easing::CubicIn.apply(t), rotation + twist, 1.0 - t, 1.0 - t)
            }
        }
    }

    fn on_enter(&self, instance: &mut PhaseInstance<Self>, ctx: &mut EmitContext<'_>) {
        let color = instance.params.faction.accent();
        let radius = instance.params.radius;
        let origin = SpawnConfig::at(instance.position);
        instance.stream = StreamEmitter::new(Self::stream_rate(instance.phase()));

        match instance.phase() {
            RiftPhase::Spawn => {
                ctx.cue(SoundEvent::RIFT_OPEN);
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Energy)
                        .with_color(color)
                        .with_size(2.5)
                        .with_life(0.7)
                        .with_drag(0.04),
                    16.0,
                    &BurstSpread::radial(radius * 0.8, radius * 2.0),
                );
            }
            RiftPhase::Combat => {
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Spark)
                        .with_color(color.mix(FxColor::WHITE, 0.4))
                        .with_size(1.5)
                        .with_life(0.4),
                    12.0,
                    &BurstSpread::radial(radius * 1.5, radius * 3.0),
                );
            }
            RiftPhase::Close => {
                ctx.cue(SoundEvent::RIFT_CLOSE);
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Ring)
                        .with_color(color)
                        .with_size(radius * 0.5)
                        .with_life(self.contract.max(0.1)),
                    1.0,
                    &BurstSpread::none(),
                );
            }
            RiftPhase::Idle | RiftPhase::Retreat => {}
        }
    }

    fn emit(&self, instance: &mut PhaseInstance<Self>, elapsed: f32, dt: f32, ctx: &mut EmitContext<'_>) {
        let radius = instance.params.radius;
        let color = instance.params.faction.accent();
        let angle = ctx.rng().range(0.0, std::f32::consts::TAU);
        let rim = instance.position + Vec2::from_angle(angle) * radius * self.visual(instance, elapsed).scale;
        // Motes drift off the rim along the swirl.
        let tangent = Vec2::from_angle(angle).perp() * instance.shape().spin * radius * 0.6;
        let mote = SpawnConfig::at(rim)
            .with_velocity(tangent)
            .with_kind(ParticleKind::Glow)
            .with_color(color)
            .with_size(1.5)
            .with_life(0.9)
            .with_drag(0.03);
        ctx.stream(&mut instance.stream, dt, &mote, &BurstSpread::none().with_position(Vec2::splat(4.0)));
    }

    fn draw(
        &self,
        instance: &PhaseInstance<Self>,
        _elapsed: f32,
        visual: &PhaseVisual,
        at: Vec2,
        painter: &mut dyn Painter,
    ) {
        let radius = instance.params.radius * visual.scale;
        if radius <= 0.0 {
            return;
        }
        let shape = instance.shape();
        let accent = instance.params.faction.accent().fade(visual.alpha);

        painter.glow(at, radius * 1.6, accent.fade(0.5 * visual.intensity));
        let rim = wobbly_ring(at, radius, &shape.rim, visual.rotation * 0.25);
        painter.fill_polygon(&rim, FxColor::VOID_CORE.fade(visual.alpha));

        for start in shape.arms {
            let arm: [Vec2; ARM_POINTS] = spiral_arm(
                at,
                radius * 0.12,
                radius * 0.95,
                start + visual.rotation,
                2.4 * shape.spin,
            );
            painter.stroke_polyline(&arm, 1.0 + 1.5 * visual.intensity, accent.fade(0.4 + 0.6 * visual.intensity));
        }

        painter.stroke_polyline(&rim, 2.5, accent);
        painter.stroke_polyline(&[rim[RIM_POINTS - 1], rim[0]], 2.5, accent);
        painter.fill_circle(at, radius * 0.1, accent.mix(FxColor::WHITE.with_alpha(accent.a), 0.5));
    }

    fn extent(&self, instance: &PhaseInstance<Self>) -> f32 {
        instance.params.radius * self.max_scale() * 1.6
    }

    fn max_scale(&self) -> f32 {
        1.5
    }

    fn shake(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> f32 {
        match instance.phase() {
            RiftPhase::Spawn => 3.0 * (1.0 - phase_progress(elapsed, self.expand)),
            RiftPhase::Close => 2.0 * (1.0 - phase_progress(elapsed, self.contract)),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EffectId;
    use crate::renderer::camera::Camera;
    use crate::renderer::painter::DrawList;
    use crate::systems::particles::ParticlePool;
    use crate::systems::phase::PhaseRegistry;

    struct World {
        rifts: PhaseRegistry<RiftFamily>,
        pool: ParticlePool,
        sounds: Vec<SoundEvent>,
    }

    impl World {
        fn new() -> Self {
            Self {
                rifts: PhaseRegistry::new(RiftFamily::default(), 3),
                pool: ParticlePool::with_capacity(300, 3),
                sounds: Vec::new(),
            }
        }

        fn run(&mut self, seconds: f32) {
            let steps = (seconds * 60.0).round() as usize;
            for _ in 0..steps {
                self.pool.tick(1.0 / 60.0);
                let mut ctx = EmitContext::new(&mut self.pool, &mut self.sounds).with_lead(1.0 / 60.0);
                self.rifts.tick(1.0 / 60.0, &mut ctx);
            }
        }
    }

    const ID: EffectId = EffectId(17);

    #[test]
    fn spawn_settles_into_idle_at_unit_scale() {
        let mut w = World::new();
        w.rifts.create(ID, Vec2::new(50.0, 50.0), RiftParams::default());
        w.run(0.9);
        assert_eq!(w.rifts.phase_of(ID), Some(RiftPhase::Idle));
        let scale = w.rifts.visual(ID).map(|v| v.scale).unwrap_or(0.0);
        assert!((scale - 1.0).abs() <= 0.03 + 1e-4, "scale {scale}");

        w.run(5.0);
        assert_eq!(w.rifts.phase_of(ID), Some(RiftPhase::Idle));
        let scale = w.rifts.visual(ID).map(|v| v.scale).unwrap_or(0.0);
        assert!((scale - 1.0).abs() <= 0.03 + 1e-4, "scale {scale}");
        assert_eq!(w.sounds, vec![SoundEvent::RIFT_OPEN]);
    }

    #[test]
    fn spawn_overshoots_then_settles() {
        let mut w = World::new();
        w.rifts.create(ID, Vec2::ZERO, RiftParams::default());
        w.run(0.5);
        let scale = w.rifts.visual(ID).map(|v| v.scale).unwrap_or(0.0);
        assert!(scale > 1.0);
    }

    #[test]
    fn transition_graph() {
        let mut w = World::new();
        w.rifts.create(ID, Vec2::ZERO, RiftParams::default());
        assert!(!w.rifts.set_phase(ID, RiftPhase::Combat));
        w.run(1.0);
        assert!(w.rifts.set_phase(ID, RiftPhase::Combat));
        assert!(w.rifts.set_phase_named(ID, "retreat"));
        assert!(!w.rifts.set_phase(ID, RiftPhase::Combat));
        assert!(!w.rifts.set_phase(ID, RiftPhase::Idle));
        assert!(w.rifts.set_phase(ID, RiftPhase::Close));
        assert!(!w.rifts.set_phase(ID, RiftPhase::Spawn));
    }

    #[test]
    fn close_removes_after_contract() {
        let mut w = World::new();
        w.rifts.create(ID, Vec2::ZERO, RiftParams::default());
        w.run(1.0);
        assert!(w.rifts.cancel(ID));
        w.run(0.5);
        assert!(w.rifts.contains(ID));
        let v = w.rifts.visual(ID).unwrap_or(PhaseVisual::HIDDEN);
        assert!(v.scale < 0.6 && v.alpha < 0.3);
        w.run(0.2);
        assert!(!w.rifts.contains(ID));
        assert_eq!(w.sounds.last(), Some(&SoundEvent::RIFT_CLOSE));
    }

    #[test]
    fn idle_rift_streams_particles_and_draws() {
        let mut w = World::new();
        w.rifts.create(ID, Vec2::ZERO, RiftParams::default());
        w.run(2.0);
        assert!(w.pool.live_count() > 0);
        let mut list = DrawList::new();
        assert_eq!(w.rifts.draw(&Camera::new(800.0, 600.0), &mut list), 1);
        assert!(list.commands().iter().all(|c| c.alpha().is_finite()));
    }

    #[test]
    fn shapes_differ_between_instances() {
        let mut w = World::new();
        let a = w.rifts.create(EffectId(1), Vec2::ZERO, RiftParams::default()).shape().rim;
        let b = w.rifts.create(EffectId(2), Vec2::ZERO, RiftParams::default()).shape().rim;
        assert_ne!(a, b);
    }
}
