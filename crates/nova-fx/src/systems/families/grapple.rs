//! Grapple and consume tendrils: a line shoots from an anchor to a target,
//! wraps it, drags it while held, and dissolves on release.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::{frozen_offsets, jagged_arc, ARC_SEGMENTS};
use crate::api::types::SoundEvent;
use crate::core::easing::Easing;
use crate::core::math::{phase_progress, wave01};
use crate::renderer::color::FxColor;
use crate::renderer::painter::Painter;
use crate::systems::particles::{BurstSpread, ParticleKind, Rng, SpawnConfig, StreamEmitter};
use crate::systems::phase::{EmitContext, PhaseFamily, PhaseInstance, PhaseRule, PhaseVisual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrapplePhase {
    Extend,
    Wrap,
    Drag,
    Dissolve,
}

/// Visual flavor of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrappleKind {
    /// Writhing void tendril (consume attack).
    #[default]
    Tendril,
    /// Crackling web strand (queen snare).
    WebSnare,
}

impl GrappleKind {
    fn color(self) -> FxColor {
        match self {
            GrappleKind::Tendril => FxColor::VOID_PURPLE,
            GrappleKind::WebSnare => FxColor::ACID_GREEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrappleParams {
    /// World position the line reaches for. The anchor is the instance
    /// position.
    pub target: Vec2,
    pub kind: GrappleKind,
    pub width: f32,
}

impl Default for GrappleParams {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            kind: GrappleKind::Tendril,
            width: 4.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GrappleShape {
    wobble: [f32; ARC_SEGMENTS + 1],
    arc_seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrappleFamily {
    pub extend: f32,
    pub wrap: f32,
    pub dissolve: f32,
}

impl Default for GrappleFamily {
    fn default() -> Self {
        Self {
            extend: 0.35,
            wrap: 0.25,
            dissolve: 0.4,
        }
    }
}

impl GrappleFamily {
    /// Points of the line from `anchor` reaching `reach` of the way to
    /// `target`, in whatever space the inputs are in.
    fn line(
        instance: &PhaseInstance<Self>,
        anchor: Vec2,
        target: Vec2,
        reach: f32,
        elapsed: f32,
    ) -> [Vec2; ARC_SEGMENTS + 1] {
        let tip = anchor + (target - anchor) * reach;
        let shape = instance.shape();
        match instance.params.kind {
            GrappleKind::Tendril => {
                let span = tip - anchor;
                let perp = span.perp().normalize_or_zero();
                let amplitude = (span.length() * 0.06).min(14.0);
                std::array::from_fn(|i| {
                    let t = i as f32 / ARC_SEGMENTS as f32;
                    // Pinned at both ends, writhing in between.
                    let envelope = (t * std::f32::consts::PI).sin();
                    let wave = (t * 9.0 - elapsed * 7.0).sin() * (1.0 + shape.wobble[i]);
                    anchor + span * t + perp * wave * amplitude * envelope
                })
            }
            GrappleKind::WebSnare => {
                // Re-jag ten times a second.
                let bucket = (elapsed * 10.0) as u64;
                jagged_arc(anchor, tip, 0.08, shape.arc_seed ^ bucket)
            }
        }
    }
}

impl PhaseFamily for GrappleFamily {
    type Phase = GrapplePhase;
    type Params = GrappleParams;
    type Shape = GrappleShape;
    const NAME: &'static str = "grapple";

    fn initial_phase(&self) -> GrapplePhase {
        GrapplePhase::Extend
    }

    fn rule(&self, phase: GrapplePhase, _params: &GrappleParams) -> PhaseRule<GrapplePhase> {
        match phase {
            GrapplePhase::Extend => PhaseRule::Timed { duration: self.extend, next: GrapplePhase::Wrap },
            GrapplePhase::Wrap => PhaseRule::Timed { duration: self.wrap, next: GrapplePhase::Drag },
            GrapplePhase::Drag => PhaseRule::Held,
            GrapplePhase::Dissolve => PhaseRule::Terminal { duration: self.dissolve },
        }
    }

    fn allows(&self, from: GrapplePhase, to: GrapplePhase) -> bool {
        to == GrapplePhase::Dissolve && from != GrapplePhase::Dissolve
    }

    fn closing_phase(&self) -> GrapplePhase {
        GrapplePhase::Dissolve
    }

    fn parse_phase(name: &str) -> Option<GrapplePhase> {
        match name {
            "extend" => Some(GrapplePhase::Extend),
            "wrap" => Some(GrapplePhase::Wrap),
            "drag" => Some(GrapplePhase::Drag),
            "dissolve" | "release" => Some(GrapplePhase::Dissolve),
            _ => None,
        }
    }

    fn phase_name(phase: GrapplePhase) -> &'static str {
        match phase {
            GrapplePhase::Extend => "extend",
            GrapplePhase::Wrap => "wrap",
            GrapplePhase::Drag => "drag",
            GrapplePhase::Dissolve => "dissolve",
        }
    }

    fn freeze_shape(&self, _params: &GrappleParams, rng: &mut Rng) -> GrappleShape {
        GrappleShape {
            wobble: frozen_offsets(rng, 0.35),
            arc_seed: rng.next_u64(),
        }
    }

    fn visual(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> PhaseVisual {
        match instance.phase() {
            GrapplePhase::Extend => {
                let t = phase_progress(elapsed, self.extend);
                PhaseVisual::new(Easing::CubicOut.apply(t), 0.0, 0.6, 1.0)
            }
            GrapplePhase::Wrap => {
                let t = phase_progress(elapsed, self.wrap);
                PhaseVisual::new(1.0, t * std::f32::consts::TAU, 1.0, 1.0)
            }
            GrapplePhase::Drag => PhaseVisual::new(
                1.0,
                std::f32::consts::TAU + elapsed * 2.0,
                0.7 + 0.3 * wave01(elapsed, 3.0),
                1.0,
            ),
            GrapplePhase::Dissolve => {
                let t = phase_progress(elapsed, self.dissolve);
                PhaseVisual::new(1.0, 0.0, 1.0 - t, 1.0 - Easing::QuadIn.apply(t))
            }
        }
    }

    fn on_enter(&self, instance: &mut PhaseInstance<Self>, ctx: &mut EmitContext<'_>) {
        let kind = instance.params.kind;
        let target = instance.params.target;
        let color = kind.color();
        match instance.phase() {
            GrapplePhase::Extend => {
                instance.stream = StreamEmitter::default();
                ctx.cue(match kind {
                    GrappleKind::Tendril => SoundEvent::TENDRIL_LAUNCH,
                    GrappleKind::WebSnare => SoundEvent::WEB_SNARE,
                });
            }
            GrapplePhase::Wrap => {
                ctx.cue(SoundEvent::TENDRIL_LATCH);
                ctx.burst(
                    &SpawnConfig::at(target)
                        .with_kind(ParticleKind::Spark)
                        .with_color(color.mix(FxColor::WHITE, 0.5))
                        .with_size(1.2)
                        .with_life(0.3),
                    10.0,
                    &BurstSpread::radial(60.0, 140.0),
                );
            }
            GrapplePhase::Drag => {
                instance.stream = StreamEmitter::new(20.0);
            }
            GrapplePhase::Dissolve => {
                instance.stream = StreamEmitter::default();
                ctx.cue(SoundEvent::GRAPPLE_RELEASE);
                let anchor = instance.position;
                let fragment = SpawnConfig::new()
                    .with_kind(ParticleKind::Smoke)
                    .with_color(color)
                    .with_size(3.0)
                    .with_life(0.6)
                    .with_decay(0.8);
                for i in 0..8 {
                    let along = anchor.lerp(target, (i as f32 + 0.5) / 8.0);
                    ctx.burst(
                        &fragment.clone().with_position(along),
                        1.0,
                        &BurstSpread::radial(5.0, 25.0),
                    );
                }
            }
        }
    }

    fn emit(&self, instance: &mut PhaseInstance<Self>, _elapsed: f32, dt: f32, ctx: &mut EmitContext<'_>) {
        if instance.phase() != GrapplePhase::Drag {
            return;
        }
        let t = ctx.rng().next_f32();
        let at = instance.position.lerp(instance.params.target, t);
        // Drips fall back towards the anchor.
        let pull = (instance.position - instance.params.target).normalize_or_zero() * 40.0;
        let drip = SpawnConfig::at(at)
            .with_velocity(pull)
            .with_kind(ParticleKind::Glow)
            .with_color(instance.params.kind.color())
            .with_size(1.5)
            .with_life(0.5);
        ctx.stream(&mut instance.stream, dt, &drip, &BurstSpread::none().with_position(Vec2::splat(3.0)));
    }

    fn draw(
        &self,
        instance: &PhaseInstance<Self>,
        elapsed: f32,
        visual: &PhaseVisual,
        at: Vec2,
        painter: &mut dyn Painter,
    ) {
        let target = at + (instance.params.target - instance.position);
        let color = instance.params.kind.color().fade(visual.alpha);
        let width = instance.params.width.max(0.5) * (0.6 + 0.4 * visual.intensity);

        let points = Self::line(instance, at, target, visual.scale, elapsed);
        painter.stroke_polyline(&points, width * 2.2, color.fade(0.25));
        painter.stroke_polyline(&points, width, color);

        let tip = points[ARC_SEGMENTS];
        match instance.phase() {
            GrapplePhase::Extend => painter.glow(tip, width * 3.0, color),
            GrapplePhase::Wrap | GrapplePhase::Drag => {
                // Coil closes around the target as `rotation` sweeps a turn.
                let closed = (visual.rotation / std::f32::consts::TAU).min(1.0);
                let radius = 10.0 + 6.0 * (1.0 - closed);
                painter.stroke_circle(tip, radius, width * 0.6, color.fade(0.5 + 0.5 * closed));
                if instance.params.kind == GrappleKind::WebSnare {
                    for k in 0..6 {
                        let dir = Vec2::from_angle(visual.rotation * 0.2 + k as f32 * std::f32::consts::FRAC_PI_3);
                        painter.stroke_polyline(&[tip, tip + dir * radius * 1.6], 1.0, color.fade(0.6));
                    }
                }
            }
            GrapplePhase::Dissolve => {}
        }
    }

    fn extent(&self, instance: &PhaseInstance<Self>) -> f32 {
        instance.position.distance(instance.params.target) + 30.0
    }

    fn max_scale(&self) -> f32 {
        1.0
    }

    fn shake(&self, instance: &PhaseInstance<Self>, _elapsed: f32) -> f32 {
        if instance.phase() == GrapplePhase::Wrap {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EffectId;
    use crate::renderer::camera::Camera;
    use crate::renderer::painter::{DrawCommand, DrawList};
    use crate::systems::particles::ParticlePool;
    use crate::systems::phase::PhaseRegistry;

    const ID: EffectId = EffectId(8);

    fn params(target: Vec2) -> GrappleParams {
        GrappleParams {
            target,
            ..GrappleParams::default()
        }
    }

    fn run(reg: &mut PhaseRegistry<GrappleFamily>, pool: &mut ParticlePool, sounds: &mut Vec<SoundEvent>, seconds: f32) {
        for _ in 0..(seconds * 60.0).round() as usize {
            pool.tick(1.0 / 60.0);
            let mut ctx = EmitContext::new(pool, sounds).with_lead(1.0 / 60.0);
            reg.tick(1.0 / 60.0, &mut ctx);
        }
    }

    #[test]
    fn extend_wrap_drag_sequence() {
        let mut reg = PhaseRegistry::new(GrappleFamily::default(), 2);
        let mut pool = ParticlePool::with_capacity(200, 2);
        let mut sounds = Vec::new();
        reg.create(ID, Vec2::ZERO, params(Vec2::new(200.0, 0.0)));
        run(&mut reg, &mut pool, &mut sounds, 0.2);
        assert_eq!(reg.phase_of(ID), Some(GrapplePhase::Extend));
        run(&mut reg, &mut pool, &mut sounds, 0.25);
        assert_eq!(reg.phase_of(ID), Some(GrapplePhase::Wrap));
        run(&mut reg, &mut pool, &mut sounds, 0.3);
        assert_eq!(reg.phase_of(ID), Some(GrapplePhase::Drag));
        run(&mut reg, &mut pool, &mut sounds, 3.0);
        assert_eq!(reg.phase_of(ID), Some(GrapplePhase::Drag));
        assert_eq!(sounds, vec![SoundEvent::TENDRIL_LAUNCH, SoundEvent::TENDRIL_LATCH]);
    }

    #[test]
    fn release_dissolves_and_removes() {
        let mut reg = PhaseRegistry::new(GrappleFamily::default(), 2);
        let mut pool = ParticlePool::with_capacity(200, 2);
        let mut sounds = Vec::new();
        reg.create(ID, Vec2::ZERO, params(Vec2::new(200.0, 0.0)));
        run(&mut reg, &mut pool, &mut sounds, 1.0);
        assert!(reg.set_phase_named(ID, "release"));
        run(&mut reg, &mut pool, &mut sounds, 0.5);
        assert!(!reg.contains(ID));
        assert_eq!(sounds.last(), Some(&SoundEvent::GRAPPLE_RELEASE));
    }

    #[test]
    fn tip_follows_moving_target() {
        let mut reg = PhaseRegistry::new(GrappleFamily::default(), 2);
        let mut pool = ParticlePool::with_capacity(200, 2);
        let mut sounds = Vec::new();
        reg.create(ID, Vec2::ZERO, params(Vec2::new(100.0, 0.0)));
        run(&mut reg, &mut pool, &mut sounds, 1.0);
        assert!(reg.update_params(ID, |p| p.target = Vec2::new(0.0, 150.0)));

        let mut list = DrawList::new();
        reg.draw(&Camera::new(800.0, 600.0), &mut list);
        let tip = list.commands().iter().find_map(|c| match c {
            DrawCommand::StrokePolyline { points, .. } if points.len() == ARC_SEGMENTS + 1 => {
                points.last().copied()
            }
            _ => None,
        });
        let tip = tip.unwrap_or(Vec2::ZERO);
        assert!((tip - Vec2::new(0.0, 150.0)).length() < 1e-3, "{tip:?}");
    }

    #[test]
    fn web_snare_line_is_deterministic_per_bucket() {
        let mut reg = PhaseRegistry::new(GrappleFamily::default(), 2);
        let instance = reg.create(
            ID,
            Vec2::ZERO,
            GrappleParams {
                target: Vec2::new(100.0, 0.0),
                kind: GrappleKind::WebSnare,
                width: 3.0,
            },
        );
        let a = GrappleFamily::line(instance, Vec2::ZERO, Vec2::new(100.0, 0.0), 1.0, 0.31);
        let b = GrappleFamily::line(instance, Vec2::ZERO, Vec2::new(100.0, 0.0), 1.0, 0.35);
        let c = GrappleFamily::line(instance, Vec2::ZERO, Vec2::new(100.0, 0.0), 1.0, 0.45);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
