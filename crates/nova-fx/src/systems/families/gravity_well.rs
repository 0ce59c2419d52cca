//! Area-denial gravity well: a telegraphed warning ring, a held pull
//! field, and a short collapse.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::{frozen_offsets, wobbly_ring};
use crate::api::types::SoundEvent;
use crate::core::easing::Easing;
use crate::core::math::{phase_progress, wave01};
use crate::renderer::color::FxColor;
use crate::renderer::painter::Painter;
use crate::systems::particles::{BurstSpread, ParticleKind, Rng, SpawnConfig, StreamEmitter};
use crate::systems::phase::{EmitContext, PhaseFamily, PhaseInstance, PhaseRule, PhaseVisual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellPhase {
    Warning,
    Active,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellParams {
    /// Pull radius in world units.
    pub radius: f32,
    /// Visual strength in [0, 2]; scales particle speed and shake.
    pub strength: f32,
}

impl Default for WellParams {
    fn default() -> Self {
        Self {
            radius: 200.0,
            strength: 1.0,
        }
    }
}

const RIM_POINTS: usize = 32;
const RINGS: usize = 3;

#[derive(Debug, Clone)]
pub struct WellShape {
    rim: [f32; RIM_POINTS],
    /// Per-ring phase offsets of the contracting rings.
    rings: [f32; RINGS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityWellFamily {
    /// Seconds of warning before the field turns on.
    pub warning: f32,
    /// Seconds the collapse takes.
    pub collapse: f32,
    /// Field tremolo frequency in Hz.
    pub tremolo_hz: f32,
}

impl Default for GravityWellFamily {
    fn default() -> Self {
        Self {
            warning: 2.0,
            collapse: 0.8,
            tremolo_hz: 4.0,
        }
    }
}

const WARNING_COLOR: FxColor = FxColor::rgb(1.0, 0.35, 0.3);

impl PhaseFamily for GravityWellFamily {
    type Phase = WellPhase;
    type Params = WellParams;
    type Shape = WellShape;
    const NAME: &'static str = "gravity_well";

    fn initial_phase(&self) -> WellPhase {
        WellPhase::Warning
    }

    fn rule(&self, phase: WellPhase, _params: &WellParams) -> PhaseRule<WellPhase> {
        match phase {
            WellPhase::Warning => PhaseRule::Timed { duration: self.warning, next: WellPhase::Active },
            WellPhase::Active => PhaseRule::Held,
            WellPhase::End => PhaseRule::Terminal { duration: self.collapse },
        }
    }

    fn allows(&self, from: WellPhase, to: WellPhase) -> bool {
        matches!(
            (from, to),
            (WellPhase::Warning, WellPhase::Active) | (WellPhase::Warning | WellPhase::Active, WellPhase::End)
        )
    }

    fn closing_phase(&self) -> WellPhase {
        WellPhase::End
    }

    fn parse_phase(name: &str) -> Option<WellPhase> {
        match name {
            "warning" => Some(WellPhase::Warning),
            "active" => Some(WellPhase::Active),
            "end" => Some(WellPhase::End),
            _ => None,
        }
    }

    fn phase_name(phase: WellPhase) -> &'static str {
        match phase {
            WellPhase::Warning => "warning",
            WellPhase::Active => "active",
            WellPhase::End => "end",
        }
    }

    fn freeze_shape(&self, _params: &WellParams, rng: &mut Rng) -> WellShape {
        WellShape {
            rim: frozen_offsets(rng, 0.04),
            rings: std::array::from_fn(|i| (i as f32 + rng.range(0.0, 0.3)) / RINGS as f32),
        }
    }

    fn visual(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> PhaseVisual {
        match instance.phase() {
            WellPhase::Warning => {
                let t = phase_progress(elapsed, self.warning);
                // Blinks faster as activation nears.
                let blink = wave01(elapsed, 1.5 + 3.0 * t);
                PhaseVisual::new(Easing::CubicOut.apply(t), 0.0, 0.3 + 0.4 * blink, 0.4 + 0.6 * t)
            }
            WellPhase::Active => PhaseVisual::new(
                1.0,
                elapsed * 1.2,
                0.75 + 0.25 * wave01(elapsed, self.tremolo_hz),
                1.0,
            ),
            WellPhase::End => {
                let t = phase_progress(elapsed, self.collapse);
                PhaseVisual::new(1.0 - Easing::QuadIn.apply(t), elapsed * 3.0, 1.0 - t, 1.0 - t)
            }
        }
    }

    fn on_enter(&self, instance: &mut PhaseInstance<Self>, ctx: &mut EmitContext<'_>) {
        let radius = instance.params.radius;
        let origin = SpawnConfig::at(instance.position);
        match instance.phase() {
            WellPhase::Warning => {
                instance.stream = StreamEmitter::new(6.0);
                ctx.cue(SoundEvent::WELL_WARNING);
            }
            WellPhase::Active => {
                instance.stream = StreamEmitter::new(40.0);
                ctx.cue(SoundEvent::WELL_ACTIVE);
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Ring)
                        .with_color(FxColor::VOID_PURPLE)
                        .with_size(radius * 0.3)
                        .with_life(0.6),
                    1.0,
                    &BurstSpread::none(),
                );
            }
            WellPhase::End => {
                instance.stream = StreamEmitter::default();
                ctx.cue(SoundEvent::WELL_COLLAPSE);
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Energy)
                        .with_color(FxColor::VOID_PURPLE.mix(FxColor::WHITE, 0.3))
                        .with_size(2.0)
                        .with_life(0.5)
                        .with_drag(0.05),
                    24.0,
                    &BurstSpread::radial(radius * 0.5, radius * 1.2),
                );
            }
        }
    }

    fn emit(&self, instance: &mut PhaseInstance<Self>, _elapsed: f32, dt: f32, ctx: &mut EmitContext<'_>) {
        let radius = instance.params.radius;
        let strength = instance.params.strength.clamp(0.0, 2.0);
        let angle = ctx.rng().range(0.0, std::f32::consts::TAU);
        let dir = Vec2::from_angle(angle);
        let life = 1.2;
        // Fall inward along a spiral and reach the core as the mote dies.
        let inward = -dir * radius / life;
        let swirl = dir.perp() * radius * 0.35 * strength;
        let (color, kind) = match instance.phase() {
            WellPhase::Warning => (WARNING_COLOR, ParticleKind::Spark),
            _ => (FxColor::VOID_PURPLE, ParticleKind::Trail),
        };
        let mote = SpawnConfig::at(instance.position + dir * radius)
            .with_velocity(inward * (0.6 + 0.4 * strength) + swirl)
            .with_kind(kind)
            .with_color(color)
            .with_secondary(FxColor::VOID_CORE)
            .with_size(1.5)
            .with_life(life);
        ctx.stream(&mut instance.stream, dt, &mote, &BurstSpread::none());
    }

    fn draw(
        &self,
        instance: &PhaseInstance<Self>,
        elapsed: f32,
        visual: &PhaseVisual,
        at: Vec2,
        painter: &mut dyn Painter,
    ) {
        let radius = instance.params.radius * visual.scale;
        if radius <= 0.0 {
            return;
        }
        let shape = instance.shape();

        if instance.phase() == WellPhase::Warning {
            let color = WARNING_COLOR.fade(visual.alpha * visual.intensity);
            painter.stroke_circle(at, radius, 2.0, color);
            painter.fill_circle(at, radius, color.fade(0.08));
            return;
        }

        let field = FxColor::VOID_PURPLE.fade(visual.alpha);
        painter.glow(at, radius * 0.5, field.fade(visual.intensity));

        for offset in shape.rings {
            // Rings contract from the rim towards the core, looping.
            let t = (elapsed * 0.6 + offset).fract();
            let ring_radius = radius * (1.0 - t);
            painter.stroke_circle(at, ring_radius, 1.5, field.fade(0.6 * t * visual.intensity));
        }

        let rim = wobbly_ring(at, radius, &shape.rim, visual.rotation);
        painter.stroke_polyline(&rim, 2.0, field.fade(0.7));
        painter.stroke_polyline(&[rim[RIM_POINTS - 1], rim[0]], 2.0, field.fade(0.7));
        painter.fill_circle(at, radius * 0.12, FxColor::VOID_CORE.fade(visual.alpha));
    }

    fn extent(&self, instance: &PhaseInstance<Self>) -> f32 {
        instance.params.radius * 1.1
    }

    fn max_scale(&self) -> f32 {
        1.0
    }

    fn shake(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> f32 {
        let strength = instance.params.strength.clamp(0.0, 2.0);
        match instance.phase() {
            WellPhase::Warning => 0.0,
            WellPhase::Active => 1.5 * strength,
            WellPhase::End => 4.0 * strength * (1.0 - phase_progress(elapsed, self.collapse)),
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

    const ID: EffectId = EffectId(4);

    fn step(
        wells: &mut PhaseRegistry<GravityWellFamily>,
        pool: &mut ParticlePool,
        sounds: &mut Vec<SoundEvent>,
        seconds: f32,
    ) {
        for _ in 0..(seconds * 60.0).round() as usize {
            pool.tick(1.0 / 60.0);
            let mut ctx = EmitContext::new(pool, sounds);
            wells.tick(1.0 / 60.0, &mut ctx);
        }
    }

    #[test]
    fn warning_activates_on_its_own_then_holds() {
        let mut wells = PhaseRegistry::new(GravityWellFamily::default(), 1);
        let mut pool = ParticlePool::with_capacity(300, 1);
        let mut sounds = Vec::new();
        wells.create(ID, Vec2::ZERO, WellParams::default());
        step(&mut wells, &mut pool, &mut sounds, 1.0);
        assert_eq!(wells.phase_of(ID), Some(WellPhase::Warning));
        step(&mut wells, &mut pool, &mut sounds, 1.1);
        assert_eq!(wells.phase_of(ID), Some(WellPhase::Active));
        step(&mut wells, &mut pool, &mut sounds, 10.0);
        assert_eq!(wells.phase_of(ID), Some(WellPhase::Active));
        assert_eq!(sounds, vec![SoundEvent::WELL_WARNING, SoundEvent::WELL_ACTIVE]);
        assert!(wells.shake() > 0.0);
    }

    #[test]
    fn end_collapses_and_removes() {
        let mut wells = PhaseRegistry::new(GravityWellFamily::default(), 1);
        let mut pool = ParticlePool::with_capacity(300, 1);
        let mut sounds = Vec::new();
        wells.create(ID, Vec2::ZERO, WellParams::default());
        assert!(wells.set_phase_named(ID, "end"));
        step(&mut wells, &mut pool, &mut sounds, 0.5);
        assert!(wells.contains(ID));
        step(&mut wells, &mut pool, &mut sounds, 0.4);
        assert!(!wells.contains(ID));
        assert_eq!(sounds.last(), Some(&SoundEvent::WELL_COLLAPSE));
    }

    #[test]
    fn radius_update_changes_extent() {
        let mut wells = PhaseRegistry::new(GravityWellFamily::default(), 1);
        wells.create(ID, Vec2::new(600.0, 0.0), WellParams::default());
        let camera = Camera::new(800.0, 600.0);
        let mut list = DrawList::new();
        let before = wells.draw(&camera, &mut list);
        wells.update_params(ID, |p| p.radius = 20.0);
        let after = wells.draw(&camera, &mut list);
        assert_eq!((before, after), (1, 0));
    }

    #[test]
    fn end_is_final() {
        let wells = GravityWellFamily::default();
        assert!(!wells.allows(WellPhase::End, WellPhase::Active));
        assert!(!wells.allows(WellPhase::Active, WellPhase::Warning));
        assert!(wells.allows(WellPhase::Warning, WellPhase::Active));
    }
}
