//! Boss emergence cinematic: cracks tear open, an energy pool forms, light
//! converges, the boss bursts through, and the scene fades back.
//!
//! The four timed phases split the requested total duration 2 : 1.5 : 1.5 : 2.
//! Nothing but a cancel can interrupt the sequence.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::jagged_arc;
use crate::api::types::SoundEvent;
use crate::core::easing::Easing;
use crate::core::math::{finite_or, phase_progress, unit, wave01};
use crate::renderer::color::FxColor;
use crate::renderer::painter::Painter;
use crate::systems::particles::{BurstSpread, ParticleKind, Rng, SpawnConfig, StreamEmitter};
use crate::systems::phase::{EmitContext, PhaseFamily, PhaseInstance, PhaseRule, PhaseVisual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencePhase {
    CrackSpread,
    EnergyPool,
    Convergence,
    Emergence,
    Fade,
}

impl EmergencePhase {
    /// Share of the total duration for each timed phase.
    const WEIGHTS: [f32; 4] = [2.0, 1.5, 1.5, 2.0];
    const WEIGHT_SUM: f32 = 7.0;

    fn timed_index(self) -> Option<usize> {
        match self {
            EmergencePhase::CrackSpread => Some(0),
            EmergencePhase::EnergyPool => Some(1),
            EmergencePhase::Convergence => Some(2),
            EmergencePhase::Emergence => Some(3),
            EmergencePhase::Fade => None,
        }
    }

    fn next(self) -> Self {
        match self {
            EmergencePhase::CrackSpread => EmergencePhase::EnergyPool,
            EmergencePhase::EnergyPool => EmergencePhase::Convergence,
            EmergencePhase::Convergence => EmergencePhase::Emergence,
            EmergencePhase::Emergence | EmergencePhase::Fade => EmergencePhase::Fade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergenceParams {
    /// Total seconds from first crack to the boss breaking through.
    /// Zero, negative or non-finite falls back to the family default.
    pub duration: f32,
    pub radius: f32,
}

impl Default for EmergenceParams {
    fn default() -> Self {
        Self {
            duration: 7.0,
            radius: 140.0,
        }
    }
}

pub const CRACKS: usize = 7;

#[derive(Debug, Clone)]
pub struct Crack {
    angle: f32,
    /// Length as a fraction of the radius.
    length: f32,
    /// Fraction of the crack phase at which this crack starts.
    appears: f32,
    seed: u64,
}

#[derive(Debug, Clone)]
pub struct EmergenceShape {
    cracks: [Crack; CRACKS],
}

impl EmergenceShape {
    pub fn cracks(&self) -> &[Crack; CRACKS] {
        &self.cracks
    }
}

/// Crack start times within the crack phase (out of 2 seconds).
const CRACK_TIMES: [f32; CRACKS] = [0.0, 0.3, 0.5, 0.8, 1.2, 1.5, 1.8];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossEmergenceFamily {
    /// Total duration used when a trigger does not give one.
    pub default_duration: f32,
    /// Seconds of the closing fade.
    pub fade: f32,
    /// Shake at full strength, in world units.
    pub max_shake: f32,
    /// Per-phase shake as a fraction of `max_shake`, in phase order.
    pub shake_levels: [f32; 4],
}

impl Default for BossEmergenceFamily {
    fn default() -> Self {
        Self {
            default_duration: 7.0,
            fade: 1.0,
            max_shake: 12.0,
            shake_levels: [0.1, 0.25, 0.5, 1.0],
        }
    }
}

impl BossEmergenceFamily {
    fn total(&self, params: &EmergenceParams) -> f32 {
        let requested = finite_or(params.duration, 0.0);
        if requested > 0.0 {
            requested
        } else {
            finite_or(self.default_duration, 7.0).max(0.0)
        }
    }

    /// Seconds spent in `phase` for these parameters.
    pub fn duration_of(&self, phase: EmergencePhase, params: &EmergenceParams) -> f32 {
        match phase.timed_index() {
            Some(i) => self.total(params) * EmergencePhase::WEIGHTS[i] / EmergencePhase::WEIGHT_SUM,
            None => self.fade,
        }
    }

    fn progress(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> f32 {
        phase_progress(elapsed, self.duration_of(instance.phase(), &instance.params))
    }

    fn stream_rate(phase: EmergencePhase) -> f32 {
        match phase {
            EmergencePhase::CrackSpread => 20.0,
            EmergencePhase::EnergyPool => 40.0,
            EmergencePhase::Convergence => 60.0,
            EmergencePhase::Emergence => 25.0,
            EmergencePhase::Fade => 0.0,
        }
    }
}

impl PhaseFamily for BossEmergenceFamily {
    type Phase = EmergencePhase;
    type Params = EmergenceParams;
    type Shape = EmergenceShape;
    const NAME: &'static str = "boss_emergence";

    fn initial_phase(&self) -> EmergencePhase {
        EmergencePhase::CrackSpread
    }

    fn rule(&self, phase: EmergencePhase, params: &EmergenceParams) -> PhaseRule<EmergencePhase> {
        match phase {
            EmergencePhase::Fade => PhaseRule::Terminal { duration: self.fade },
            timed => PhaseRule::Timed {
                duration: self.duration_of(timed, params),
                next: timed.next(),
            },
        }
    }

    fn allows(&self, from: EmergencePhase, to: EmergencePhase) -> bool {
        to == EmergencePhase::Fade && from != EmergencePhase::Fade
    }

    fn closing_phase(&self) -> EmergencePhase {
        EmergencePhase::Fade
    }

    fn parse_phase(name: &str) -> Option<EmergencePhase> {
        match name {
            "crack_spread" => Some(EmergencePhase::CrackSpread),
            "energy_pool" => Some(EmergencePhase::EnergyPool),
            "convergence" => Some(EmergencePhase::Convergence),
            "emergence" => Some(EmergencePhase::Emergence),
            "fade" => Some(EmergencePhase::Fade),
            _ => None,
        }
    }

    fn phase_name(phase: EmergencePhase) -> &'static str {
        match phase {
            EmergencePhase::CrackSpread => "crack_spread",
            EmergencePhase::EnergyPool => "energy_pool",
            EmergencePhase::Convergence => "convergence",
            EmergencePhase::Emergence => "emergence",
            EmergencePhase::Fade => "fade",
        }
    }

    fn freeze_shape(&self, _params: &EmergenceParams, rng: &mut Rng) -> EmergenceShape {
        let cracks = std::array::from_fn(|i| Crack {
            angle: std::f32::consts::TAU * i as f32 / CRACKS as f32 + rng.signed(0.35),
            length: rng.range(0.6, 1.0),
            appears: CRACK_TIMES[i] / 2.0,
            seed: rng.next_u64(),
        });
        EmergenceShape { cracks }
    }

    fn visual(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> PhaseVisual {
        let t = self.progress(instance, elapsed);
        let age = (instance.entered_at() - instance.created_at()) as f32 + elapsed;
        match instance.phase() {
            EmergencePhase::CrackSpread => PhaseVisual::new(t, 0.0, 0.3 + 0.3 * t, 1.0),
            EmergencePhase::EnergyPool => {
                // 4 Hz tremolo over a rising swell.
                let swell = Easing::SineInOut.apply(t);
                PhaseVisual::new(1.0, age * 0.3, 0.5 + 0.2 * swell + 0.2 * wave01(elapsed, 4.0), 1.0)
            }
            EmergencePhase::Convergence => PhaseVisual::new(
                1.0 - 0.4 * Easing::QuadIn.apply(t),
                age * (0.3 + 1.5 * t),
                0.8 + 0.2 * t,
                1.0,
            ),
            EmergencePhase::Emergence => {
                PhaseVisual::new(0.6 + 0.9 * Easing::ExpoOut.apply(t), age * 0.3, 1.0, 1.0)
            }
            EmergencePhase::Fade => PhaseVisual::new(1.5, age * 0.3, 1.0 - t, 1.0 - Easing::QuadIn.apply(t)),
        }
    }

    fn max_scale(&self) -> f32 {
        1.5
    }

    fn on_enter(&self, instance: &mut PhaseInstance<Self>, ctx: &mut EmitContext<'_>) {
        let radius = instance.params.radius;
        let origin = SpawnConfig::at(instance.position).protected();
        instance.stream = StreamEmitter::new(Self::stream_rate(instance.phase()));

        match instance.phase() {
            EmergencePhase::CrackSpread => ctx.cue(SoundEvent::BOSS_CRACK),
            EmergencePhase::EnergyPool => {
                ctx.cue(SoundEvent::BOSS_POOL);
                ctx.burst(
                    &origin
                        .with_kind(ParticleKind::Ring)
                        .with_color(FxColor::VOID_PURPLE)
                        .with_size(radius * 0.25)
                        .with_life(0.8),
                    1.0,
                    &BurstSpread::none(),
                );
            }
            EmergencePhase::Convergence => ctx.cue(SoundEvent::BOSS_CONVERGE),
            EmergencePhase::Emergence => {
                ctx.cue(SoundEvent::BOSS_EMERGE);
                let burst = origin
                    .with_kind(ParticleKind::Energy)
                    .with_color(FxColor::VOID_PURPLE.mix(FxColor::WHITE, 0.5))
                    .with_secondary(FxColor::VOID_PURPLE)
                    .with_size(3.5)
                    .with_life(1.2)
                    .with_drag(0.03);
                ctx.burst(&burst, 60.0, &BurstSpread::radial(radius * 1.0, radius * 3.5).with_life(0.4));
                ctx.burst(
                    &burst.with_kind(ParticleKind::Ring).with_size(radius * 0.5).with_life(0.9),
                    2.0,
                    &BurstSpread::none().with_size(radius * 0.2),
                );
            }
            EmergencePhase::Fade => {}
        }
    }

    fn emit(&self, instance: &mut PhaseInstance<Self>, elapsed: f32, dt: f32, ctx: &mut EmitContext<'_>) {
        let radius = instance.params.radius;
        let phase = instance.phase();
        let angle = ctx.rng().range(0.0, std::f32::consts::TAU);
        let dir = Vec2::from_angle(angle);

        let mote = match phase {
            EmergencePhase::CrackSpread => {
                // Sparks fly off a random crack tip.
                let t = self.progress(instance, elapsed);
                let crack = &instance.shape().cracks[ctx.rng().next_int(CRACKS as u32) as usize];
                let reach = unit((t - crack.appears) / 0.3) * crack.length;
                if reach <= 0.0 {
                    return;
                }
                let tip = instance.position + Vec2::from_angle(crack.angle) * radius * reach;
                SpawnConfig::at(tip)
                    .with_velocity(dir * 60.0)
                    .with_kind(ParticleKind::Spark)
                    .with_color(FxColor::VOID_PURPLE.mix(FxColor::WHITE, 0.3))
                    .with_size(1.2)
                    .with_life(0.4)
            }
            EmergencePhase::EnergyPool => SpawnConfig::at(instance.position + dir * radius * 0.45)
                .with_velocity(dir.perp() * radius * 0.8)
                .with_kind(ParticleKind::Energy)
                .with_color(FxColor::VOID_PURPLE)
                .with_size(2.0)
                .with_life(0.8)
                .with_drag(0.05),
            EmergencePhase::Convergence => {
                let life = 0.7;
                SpawnConfig::at(instance.position + dir * radius * 2.0)
                    .with_velocity(-dir * radius * 2.0 / life)
                    .with_kind(ParticleKind::Trail)
                    .with_color(FxColor::WHITE)
                    .with_secondary(FxColor::VOID_PURPLE)
                    .with_size(1.5)
                    .with_life(life)
            }
            EmergencePhase::Emergence => SpawnConfig::at(instance.position + dir * radius * 0.5)
                .with_velocity(dir * radius)
                .with_kind(ParticleKind::Smoke)
                .with_color(FxColor::VOID_CORE)
                .with_size(10.0)
                .with_life(1.5)
                .with_drag(0.04),
            EmergencePhase::Fade => return,
        };
        ctx.stream(&mut instance.stream, dt, &mote.protected(), &BurstSpread::none());
    }

    fn draw(
        &self,
        instance: &PhaseInstance<Self>,
        elapsed: f32,
        visual: &PhaseVisual,
        at: Vec2,
        painter: &mut dyn Painter,
    ) {
        let radius = instance.params.radius;
        let phase = instance.phase();
        let purple = FxColor::VOID_PURPLE.fade(visual.alpha);

        // Cracks: growing during the first phase, then fully open, then
        // burned away by the emergence flash.
        let crack_progress = match phase {
            EmergencePhase::CrackSpread => visual.scale,
            _ => 1.0,
        };
        let crack_alpha = match phase {
            EmergencePhase::Emergence => 1.0 - self.progress(instance, elapsed),
            EmergencePhase::Fade => 0.0,
            _ => 1.0,
        };
        if crack_alpha > 0.0 {
            for crack in &instance.shape().cracks {
                let grow = unit((crack_progress - crack.appears) / 0.3);
                if grow <= 0.0 {
                    continue;
                }
                let dir = Vec2::from_angle(crack.angle);
                let start = at + dir * radius * 0.08;
                let end = at + dir * radius * crack.length * grow;
                let points = jagged_arc(start, end, 0.12, crack.seed);
                let color = purple.fade(crack_alpha * (0.5 + 0.5 * visual.intensity));
                painter.stroke_polyline(&points, 4.0, color.fade(0.3));
                painter.stroke_polyline(&points, 1.5, color.mix(FxColor::WHITE.with_alpha(color.a), 0.4));
            }
        }

        match phase {
            EmergencePhase::CrackSpread => {
                painter.glow(at, radius * 0.3 * visual.scale, purple.fade(visual.intensity));
            }
            EmergencePhase::EnergyPool => {
                let pool = radius * 0.45 * (0.6 + 0.4 * self.progress(instance, elapsed));
                painter.glow(at, pool * 1.8, purple.fade(visual.intensity));
                painter.fill_circle(at, pool, FxColor::VOID_CORE.fade(visual.alpha));
                painter.stroke_circle(at, pool, 2.0, purple.fade(visual.intensity));
            }
            EmergencePhase::Convergence => {
                let pool = radius * 0.45 * visual.scale;
                let t = self.progress(instance, elapsed);
                for k in 0..3 {
                    let ring = ((elapsed * 1.5 + k as f32 / 3.0).fract() - 1.0).abs();
                    painter.stroke_circle(at, radius * 1.6 * ring, 1.5, purple.fade(0.5 * (1.0 - ring)));
                }
                painter.glow(at, pool * 2.0, purple.fade(visual.intensity));
                painter.fill_circle(at, pool, FxColor::VOID_CORE.mix(FxColor::WHITE, t * 0.5).fade(visual.alpha));
            }
            EmergencePhase::Emergence | EmergencePhase::Fade => {
                let flash = radius * visual.scale;
                let white = FxColor::WHITE.fade(visual.alpha * visual.intensity);
                painter.glow(at, flash * 2.0, purple.fade(visual.intensity));
                painter.fill_circle(at, flash * 0.4, white.fade(0.8));
                painter.stroke_circle(at, flash, 3.0, purple.fade(0.6 * visual.intensity));
            }
        }
    }

    fn extent(&self, instance: &PhaseInstance<Self>) -> f32 {
        instance.params.radius * 3.0
    }

    fn shake(&self, instance: &PhaseInstance<Self>, elapsed: f32) -> f32 {
        let max = finite_or(self.max_shake, 0.0).max(0.0);
        match instance.phase().timed_index() {
            Some(i) => self.shake_levels[i] * max,
            None => {
                let last = self.shake_levels[3];
                last * max * (1.0 - self.progress(instance, elapsed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EffectId;
    use crate::renderer::camera::Camera;
    use crate::renderer::painter::DrawList;
    use crate::systems::particles::{ParticlePool, SpawnPriority};
    use crate::systems::phase::PhaseRegistry;

    const ID: EffectId = EffectId(66);

    struct World {
        bosses: PhaseRegistry<BossEmergenceFamily>,
        pool: ParticlePool,
        sounds: Vec<SoundEvent>,
    }

    impl World {
        fn new() -> Self {
            Self {
                bosses: PhaseRegistry::new(BossEmergenceFamily::default(), 5),
                pool: ParticlePool::with_capacity(500, 5),
                sounds: Vec::new(),
            }
        }

        fn run(&mut self, seconds: f32) {
            for _ in 0..(seconds * 60.0).round() as usize {
                self.pool.tick(1.0 / 60.0);
                let mut ctx = EmitContext::new(&mut self.pool, &mut self.sounds).with_lead(1.0 / 60.0);
                self.bosses.tick(1.0 / 60.0, &mut ctx);
            }
        }

        fn phase(&self) -> Option<EmergencePhase> {
            self.bosses.phase_of(ID)
        }
    }

    #[test]
    fn split_follows_weights() {
        let family = BossEmergenceFamily::default();
        let params = EmergenceParams::default();
        let split: Vec<f32> = [
            EmergencePhase::CrackSpread,
            EmergencePhase::EnergyPool,
            EmergencePhase::Convergence,
            EmergencePhase::Emergence,
        ]
        .iter()
        .map(|p| family.duration_of(*p, &params))
        .collect();
        assert_eq!(split, vec![2.0, 1.5, 1.5, 2.0]);

        let short = EmergenceParams { duration: 3.5, ..EmergenceParams::default() };
        assert_eq!(family.duration_of(EmergencePhase::CrackSpread, &short), 1.0);
        let bad = EmergenceParams { duration: -1.0, ..EmergenceParams::default() };
        assert_eq!(family.duration_of(EmergencePhase::EnergyPool, &bad), 1.5);
    }

    #[test]
    fn full_timeline_with_cues() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        w.run(1.9);
        assert_eq!(w.phase(), Some(EmergencePhase::CrackSpread));
        w.run(0.2);
        assert_eq!(w.phase(), Some(EmergencePhase::EnergyPool));
        w.run(1.5);
        assert_eq!(w.phase(), Some(EmergencePhase::Convergence));
        w.run(1.5);
        assert_eq!(w.phase(), Some(EmergencePhase::Emergence));
        w.run(2.0);
        assert_eq!(w.phase(), Some(EmergencePhase::Fade));
        w.run(1.2);
        assert_eq!(w.phase(), None);
        assert_eq!(
            w.sounds,
            vec![
                SoundEvent::BOSS_CRACK,
                SoundEvent::BOSS_POOL,
                SoundEvent::BOSS_CONVERGE,
                SoundEvent::BOSS_EMERGE
            ]
        );
    }

    #[test]
    fn shake_rises_monotonically_then_fades() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        let mut last = 0.0;
        let mut last_phase = w.phase();
        for _ in 0..(7.0 * 10.0) as usize {
            w.run(0.1);
            if w.phase() != last_phase && w.phase() != Some(EmergencePhase::Fade) {
                assert!(w.bosses.shake() > last);
                last_phase = w.phase();
            }
            if w.phase() != Some(EmergencePhase::Fade) {
                assert!(w.bosses.shake() >= last);
                last = w.bosses.shake();
            }
        }
        assert_eq!(last, 12.0);
        w.run(0.9);
        assert!(w.bosses.shake() < 2.0);
    }

    #[test]
    fn only_cancel_interrupts() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        assert!(!w.bosses.set_phase(ID, EmergencePhase::Emergence));
        assert!(!w.bosses.set_phase_named(ID, "convergence"));
        assert!(w.bosses.cancel(ID));
        w.run(0.1);
        assert_eq!(w.phase(), Some(EmergencePhase::Fade));
        assert!(!w.bosses.cancel(ID));
    }

    #[test]
    fn emergence_particles_are_protected() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        w.run(6.0);
        assert!(w.pool.live_count() > 0);
        assert!(w.pool.iter_live().all(|p| p.priority == SpawnPriority::Protected));
    }

    #[test]
    fn stalled_frame_jumps_phases_and_still_cues() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        let mut ctx = EmitContext::new(&mut w.pool, &mut w.sounds);
        w.bosses.tick(5.5, &mut ctx);
        assert_eq!(w.phase(), Some(EmergencePhase::Emergence));
        assert_eq!(w.sounds.len(), 4);
    }

    #[test]
    fn every_phase_draws_finite_geometry() {
        let mut w = World::new();
        w.bosses.create(ID, Vec2::ZERO, EmergenceParams::default());
        let camera = Camera::new(1280.0, 720.0);
        for _ in 0..8 {
            let mut list = DrawList::new();
            w.bosses.draw(&camera, &mut list);
            assert!(list.commands().iter().all(|c| c.alpha().is_finite()));
            w.run(1.0);
        }
    }
}
