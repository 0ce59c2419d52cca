//! Per-frame driver that owns the particle pool and every family registry.

use glam::Vec2;

use super::trigger::{EffectFamily, TriggerEvent};
use super::types::{DrawStats, EffectId, FxStats, SoundEvent};
use crate::core::config::{clamp_multiplier, FxConfig};
use crate::core::math::{finite_or, sanitize_dt};
use crate::renderer::camera::Camera;
use crate::renderer::painter::Painter;
use crate::systems::families::{
    BossEmergenceFamily, EmergenceParams, GrappleFamily, GrappleKind, GrappleParams,
    GravityWellFamily, RiftFamily, RiftParams, WellParams,
};
use crate::systems::particles::presets::{self, scaled_count};
use crate::systems::particles::{
    BlastSize, BurstSpread, Faction, HitKind, ParticleHandle, ParticlePool, QualityTier, Rng,
    SpawnConfig,
};
use crate::systems::phase::{EmitContext, PhaseFamily, PhaseRegistry};

/// Owns all ephemeral effect state for one client session.
///
/// The host feeds it trigger events as they arrive, calls [`update`] once per
/// frame, then [`draw`]. Families switched off in the config have no
/// registry at all; events addressed to them are ignored.
///
/// [`update`]: EffectOrchestrator::update
/// [`draw`]: EffectOrchestrator::draw
pub struct EffectOrchestrator {
    pool: ParticlePool,
    rifts: Option<PhaseRegistry<RiftFamily>>,
    gravity_wells: Option<PhaseRegistry<GravityWellFamily>>,
    grapples: Option<PhaseRegistry<GrappleFamily>>,
    emergences: Option<PhaseRegistry<BossEmergenceFamily>>,
    multiplier: f32,
    sounds: Vec<SoundEvent>,
    max_sounds: usize,
}

impl EffectOrchestrator {
    pub fn new(config: &FxConfig) -> Self {
        let mut seeds = Rng::new(config.seed);
        let pool = ParticlePool::new(config.quality, seeds.fork_seed())
            .with_cull_margin(config.cull_margin);
        let families = config.families;

        // Every registry gets a seed whether or not it is built, so toggling
        // one family does not reshuffle the others.
        let rift_seed = seeds.fork_seed();
        let well_seed = seeds.fork_seed();
        let grapple_seed = seeds.fork_seed();
        let emergence_seed = seeds.fork_seed();

        log::info!(
            "nova-fx: {} particles, rifts={} wells={} grapples={} boss={}",
            pool.capacity(),
            families.rifts,
            families.gravity_wells,
            families.grapples,
            families.boss_emergence
        );

        Self {
            pool,
            rifts: families
                .rifts
                .then(|| build_registry(config.rift.clone(), rift_seed, config)),
            gravity_wells: families
                .gravity_wells
                .then(|| build_registry(config.gravity_well.clone(), well_seed, config)),
            grapples: families
                .grapples
                .then(|| build_registry(config.grapple.clone(), grapple_seed, config)),
            emergences: families
                .boss_emergence
                .then(|| build_registry(config.boss_emergence.clone(), emergence_seed, config)),
            multiplier: clamp_multiplier(config.particle_multiplier),
            sounds: Vec::with_capacity(config.max_sounds),
            max_sounds: config.max_sounds,
        }
    }

    // -- Frame --

    /// Advance everything by `dt` seconds: particles first, then wells,
    /// rifts, grapples and emergences.
    pub fn update(&mut self, dt: f32) {
        let dt = sanitize_dt(dt);
        self.pool.tick(dt);

        let mut ctx = EmitContext::new(&mut self.pool, &mut self.sounds)
            .with_multiplier(self.multiplier)
            .with_lead(dt);
        if let Some(wells) = self.gravity_wells.as_mut() {
            wells.tick(dt, &mut ctx);
        }
        if let Some(rifts) = self.rifts.as_mut() {
            rifts.tick(dt, &mut ctx);
        }
        if let Some(grapples) = self.grapples.as_mut() {
            grapples.tick(dt, &mut ctx);
        }
        if let Some(emergences) = self.emergences.as_mut() {
            emergences.tick(dt, &mut ctx);
        }

        self.cap_sounds();
    }

    /// Paint visible effects back to front: wells, rifts, particles,
    /// grapples, boss emergence.
    pub fn draw(&self, camera: &Camera, painter: &mut dyn Painter) -> DrawStats {
        DrawStats {
            gravity_wells: self
                .gravity_wells
                .as_ref()
                .map_or(0, |r| r.draw(camera, painter)),
            rifts: self.rifts.as_ref().map_or(0, |r| r.draw(camera, painter)),
            particles: self.pool.draw(camera, painter),
            grapples: self.grapples.as_ref().map_or(0, |r| r.draw(camera, painter)),
            emergences: self.emergences.as_ref().map_or(0, |r| r.draw(camera, painter)),
        }
    }

    // -- Triggers --

    /// Route one server event. Returns `false` when nothing was affected
    /// (unknown id, disabled family, forbidden transition).
    pub fn apply(&mut self, event: TriggerEvent) -> bool {
        match event {
            TriggerEvent::Rift { id, position, faction, radius } => match self.rifts.as_mut() {
                Some(rifts) => {
                    rifts.create(id, position, RiftParams { faction, radius: finite_or(radius, 60.0) });
                    true
                }
                None => disabled(EffectFamily::Rift),
            },
            TriggerEvent::RiftPhase { id, phase, delay_ms } => {
                route_phase(self.rifts.as_mut(), id, &phase, delay_ms)
            }
            TriggerEvent::GravityWell { id, position, radius, strength } => {
                match self.gravity_wells.as_mut() {
                    Some(wells) => {
                        let params = WellParams {
                            radius: finite_or(radius, 200.0).max(0.0),
                            strength: finite_or(strength, 1.0).clamp(0.0, 2.0),
                        };
                        wells.create(id, position, params);
                        true
                    }
                    None => disabled(EffectFamily::GravityWell),
                }
            }
            TriggerEvent::GravityWellPhase { id, phase, delay_ms, radius } => {
                let mut resized = false;
                if let (Some(wells), Some(radius)) = (self.gravity_wells.as_mut(), radius) {
                    if radius.is_finite() {
                        resized = wells.update_params(id, |p| p.radius = radius.max(0.0));
                    }
                }
                let moved = route_phase(self.gravity_wells.as_mut(), id, &phase, delay_ms);
                moved || resized
            }
            TriggerEvent::Grapple { id, anchor, target, kind } => self.grapple(id, anchor, target, kind),
            TriggerEvent::GrappleTarget { id, anchor, target } => match self.grapples.as_mut() {
                Some(grapples) => {
                    if !target.is_finite() {
                        return false;
                    }
                    if let Some(anchor) = anchor {
                        grapples.set_position(id, anchor);
                    }
                    grapples.update_params(id, |p| p.target = target)
                }
                None => disabled(EffectFamily::Grapple),
            },
            TriggerEvent::GrappleRelease { id } => {
                self.grapples.as_mut().is_some_and(|g| g.cancel(id))
            }
            TriggerEvent::BossEmergence { id, position, duration_ms, radius } => {
                self.boss_emergence(id, position, duration_ms / 1000.0, radius)
            }
            TriggerEvent::Cancel { id, family } => self.cancel(id, family),
            TriggerEvent::Remove { id, family } => self.remove(id, family),
            TriggerEvent::Explosion { position, faction, size } => {
                self.explosion(position, faction, size) > 0
            }
            TriggerEvent::Impact { position, normal, kind, shield, tier } => {
                self.impact(position, normal, kind, shield, tier) > 0
            }
            TriggerEvent::Burst { config, count, spread } => {
                let count = scaled_count(count as f32, self.multiplier);
                self.spawn_burst(&config, count, &spread) > 0
            }
            TriggerEvent::Clear => {
                self.clear();
                true
            }
        }
    }

    /// Parse and apply one JSON event. Unparseable payloads are logged and
    /// dropped.
    pub fn apply_json(&mut self, json: &str) -> bool {
        match TriggerEvent::from_json(json) {
            Ok(event) => self.apply(event),
            Err(err) => {
                log::warn!("nova-fx: dropping trigger: {}", err);
                false
            }
        }
    }

    /// Start (or restart) a grapple line from `anchor` to `target`.
    pub fn grapple(&mut self, id: EffectId, anchor: Vec2, target: Vec2, kind: GrappleKind) -> bool {
        match self.grapples.as_mut() {
            Some(grapples) => {
                let target = if target.is_finite() { target } else { anchor };
                grapples.create(id, anchor, GrappleParams { target, kind, ..GrappleParams::default() });
                true
            }
            None => disabled(EffectFamily::Grapple),
        }
    }

    /// Start a boss emergence lasting `duration` seconds (non-positive uses
    /// the family default).
    pub fn boss_emergence(&mut self, id: EffectId, position: Vec2, duration: f32, radius: f32) -> bool {
        match self.emergences.as_mut() {
            Some(emergences) => {
                let params = EmergenceParams {
                    duration: finite_or(duration, 0.0),
                    radius: finite_or(radius, 140.0).max(0.0),
                };
                emergences.create(id, position, params);
                true
            }
            None => disabled(EffectFamily::BossEmergence),
        }
    }

    /// Send `id` to its closing phase in `family`, or in every registry that
    /// holds it.
    pub fn cancel(&mut self, id: EffectId, family: Option<EffectFamily>) -> bool {
        let wants = |f: EffectFamily| family.map_or(true, |only| only == f);
        let mut hit = false;
        if wants(EffectFamily::Rift) {
            hit |= self.rifts.as_mut().is_some_and(|r| r.cancel(id));
        }
        if wants(EffectFamily::GravityWell) {
            hit |= self.gravity_wells.as_mut().is_some_and(|r| r.cancel(id));
        }
        if wants(EffectFamily::Grapple) {
            hit |= self.grapples.as_mut().is_some_and(|r| r.cancel(id));
        }
        if wants(EffectFamily::BossEmergence) {
            hit |= self.emergences.as_mut().is_some_and(|r| r.cancel(id));
        }
        hit
    }

    /// Drop `id` immediately from `family`, or from every registry.
    pub fn remove(&mut self, id: EffectId, family: Option<EffectFamily>) -> bool {
        let wants = |f: EffectFamily| family.map_or(true, |only| only == f);
        let mut hit = false;
        if wants(EffectFamily::Rift) {
            hit |= self.rifts.as_mut().is_some_and(|r| r.remove(id));
        }
        if wants(EffectFamily::GravityWell) {
            hit |= self.gravity_wells.as_mut().is_some_and(|r| r.remove(id));
        }
        if wants(EffectFamily::Grapple) {
            hit |= self.grapples.as_mut().is_some_and(|r| r.remove(id));
        }
        if wants(EffectFamily::BossEmergence) {
            hit |= self.emergences.as_mut().is_some_and(|r| r.remove(id));
        }
        hit
    }

    // -- Particles --

    /// Spawn a single particle. Never fails; a full pool evicts.
    pub fn spawn(&mut self, config: &SpawnConfig) -> ParticleHandle {
        self.pool.spawn(config)
    }

    /// Spawn exactly `count` particles (no multiplier applied).
    pub fn spawn_burst(&mut self, config: &SpawnConfig, count: usize, spread: &BurstSpread) -> usize {
        self.pool.spawn_burst(config, count, spread)
    }

    /// Faction death explosion, with its audio cue.
    pub fn explosion(&mut self, position: Vec2, faction: Faction, size: BlastSize) -> usize {
        self.push_sound(match size {
            BlastSize::Small => SoundEvent::EXPLOSION_SMALL,
            BlastSize::Medium => SoundEvent::EXPLOSION_MEDIUM,
            BlastSize::Large => SoundEvent::EXPLOSION_LARGE,
        });
        presets::explosion(&mut self.pool, position, faction, size, self.multiplier)
    }

    /// Weapon impact on a shield or hull, with its audio cue.
    pub fn impact(&mut self, position: Vec2, normal: Vec2, kind: HitKind, shield: bool, tier: u8) -> usize {
        self.push_sound(if shield { SoundEvent::SHIELD_HIT } else { SoundEvent::HULL_HIT });
        presets::impact(&mut self.pool, position, normal, kind, shield, tier, self.multiplier)
    }

    // -- Settings --

    pub fn set_quality(&mut self, tier: QualityTier) {
        self.pool.set_capacity(tier);
    }

    pub fn set_particle_multiplier(&mut self, multiplier: f32) {
        self.multiplier = clamp_multiplier(multiplier);
    }

    pub fn particle_multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Drop every instance, particle and pending cue.
    pub fn clear(&mut self) {
        self.pool.clear();
        if let Some(r) = self.rifts.as_mut() {
            r.clear();
        }
        if let Some(r) = self.gravity_wells.as_mut() {
            r.clear();
        }
        if let Some(r) = self.grapples.as_mut() {
            r.clear();
        }
        if let Some(r) = self.emergences.as_mut() {
            r.clear();
        }
        self.sounds.clear();
    }

    // -- Outputs --

    pub fn stats(&self) -> FxStats {
        FxStats {
            particles: self.pool.stats(),
            rifts: self.rifts.as_ref().map_or(0, |r| r.len()),
            gravity_wells: self.gravity_wells.as_ref().map_or(0, |r| r.len()),
            grapples: self.grapples.as_ref().map_or(0, |r| r.len()),
            emergences: self.emergences.as_ref().map_or(0, |r| r.len()),
            pending_sounds: self.sounds.len(),
        }
    }

    /// Strongest shake requested by any live effect, in world units.
    pub fn screen_shake(&self) -> f32 {
        let wells = self.gravity_wells.as_ref().map_or(0.0, |r| r.shake());
        let rifts = self.rifts.as_ref().map_or(0.0, |r| r.shake());
        let grapples = self.grapples.as_ref().map_or(0.0, |r| r.shake());
        let emergences = self.emergences.as_ref().map_or(0.0, |r| r.shake());
        wells.max(rifts).max(grapples).max(emergences)
    }

    /// Audio cues raised since the last drain, oldest first.
    pub fn drain_sounds(&mut self) -> std::vec::Drain<'_, SoundEvent> {
        self.sounds.drain(..)
    }

    fn push_sound(&mut self, sound: SoundEvent) {
        self.sounds.push(sound);
        self.cap_sounds();
    }

    fn cap_sounds(&mut self) {
        if self.sounds.len() > self.max_sounds {
            let excess = self.sounds.len() - self.max_sounds;
            self.sounds.drain(..excess);
        }
    }

    // -- Access --

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn rifts(&self) -> Option<&PhaseRegistry<RiftFamily>> {
        self.rifts.as_ref()
    }

    pub fn rifts_mut(&mut self) -> Option<&mut PhaseRegistry<RiftFamily>> {
        self.rifts.as_mut()
    }

    pub fn gravity_wells(&self) -> Option<&PhaseRegistry<GravityWellFamily>> {
        self.gravity_wells.as_ref()
    }

    pub fn gravity_wells_mut(&mut self) -> Option<&mut PhaseRegistry<GravityWellFamily>> {
        self.gravity_wells.as_mut()
    }

    pub fn grapples(&self) -> Option<&PhaseRegistry<GrappleFamily>> {
        self.grapples.as_ref()
    }

    pub fn grapples_mut(&mut self) -> Option<&mut PhaseRegistry<GrappleFamily>> {
        self.grapples.as_mut()
    }

    pub fn emergences(&self) -> Option<&PhaseRegistry<BossEmergenceFamily>> {
        self.emergences.as_ref()
    }

    pub fn emergences_mut(&mut self) -> Option<&mut PhaseRegistry<BossEmergenceFamily>> {
        self.emergences.as_mut()
    }
}

impl Default for EffectOrchestrator {
    fn default() -> Self {
        Self::new(&FxConfig::default())
    }
}

fn build_registry<F: PhaseFamily>(family: F, seed: u64, config: &FxConfig) -> PhaseRegistry<F> {
    PhaseRegistry::new(family, seed)
        .with_linger(config.linger)
        .with_cull_margin(config.cull_margin)
}

fn disabled(family: EffectFamily) -> bool {
    log::debug!("nova-fx: {:?} disabled, event ignored", family);
    false
}

/// Named phase change, immediate or after `delay_ms`.
fn route_phase<F: PhaseFamily>(
    registry: Option<&mut PhaseRegistry<F>>,
    id: EffectId,
    name: &str,
    delay_ms: Option<f32>,
) -> bool {
    let Some(registry) = registry else {
        log::debug!("nova-fx: {} disabled, phase event ignored", F::NAME);
        return false;
    };
    match delay_ms {
        Some(ms) if ms > 0.0 => match F::parse_phase(name) {
            Some(phase) => registry.schedule_phase(id, phase, ms / 1000.0),
            None => {
                log::warn!("{}: unknown phase {:?}", F::NAME, name);
                false
            }
        },
        _ => registry.set_phase_named(id, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FamilySet;
    use crate::renderer::painter::DrawList;
    use crate::systems::families::{EmergencePhase, GrapplePhase, RiftPhase, WellPhase};

    const DT: f32 = 1.0 / 60.0;

    fn orchestrator() -> EffectOrchestrator {
        EffectOrchestrator::new(&FxConfig::default().with_seed(42))
    }

    fn run(fx: &mut EffectOrchestrator, seconds: f32) {
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            fx.update(DT);
        }
    }

    #[test]
    fn burst_fades_and_frees() {
        let mut fx = orchestrator();
        let config = SpawnConfig::new().with_life(0.5);
        assert_eq!(fx.spawn_burst(&config, 20, &BurstSpread::none()), 20);
        assert_eq!(fx.stats().particles.live, 20);

        for _ in 0..15 {
            fx.update(DT);
        }
        for p in fx.pool().iter_live() {
            assert!((p.alpha - 0.5).abs() < 0.02, "alpha {}", p.alpha);
        }

        for _ in 15..36 {
            fx.update(DT);
        }
        let stats = fx.stats().particles;
        assert_eq!(stats.live, 0);
        assert_eq!(stats.free, stats.capacity);
    }

    #[test]
    fn rift_lifecycle_through_json() {
        let mut fx = orchestrator();
        assert!(fx.apply_json(r#"{"type":"rift","id":1,"position":[10,20]}"#));
        run(&mut fx, 1.0);
        assert_eq!(fx.rifts().and_then(|r| r.phase_of(EffectId(1))), Some(RiftPhase::Idle));

        assert!(fx.apply_json(r#"{"type":"rift_phase","id":1,"phase":"combat"}"#));
        assert!(fx.apply_json(r#"{"type":"rift_phase","id":1,"phase":"close"}"#));
        run(&mut fx, 1.0);
        assert_eq!(fx.stats().rifts, 0);

        let cues: Vec<_> = fx.drain_sounds().collect();
        assert_eq!(cues.first(), Some(&SoundEvent::RIFT_OPEN));
        assert_eq!(cues.last(), Some(&SoundEvent::RIFT_CLOSE));
        assert_eq!(fx.stats().pending_sounds, 0);
    }

    #[test]
    fn unknown_ids_and_garbage_are_ignored() {
        let mut fx = orchestrator();
        assert!(!fx.apply_json(r#"{"type":"rift_phase","id":99,"phase":"combat"}"#));
        assert!(!fx.apply_json(r#"{"type":"grapple_release","id":99}"#));
        assert!(!fx.apply_json(r#"{"type":"cancel","id":99}"#));
        assert!(!fx.apply_json(r#"{"type":"remove","id":99}"#));
        assert!(!fx.apply_json("{oops"));
        assert!(!fx.apply_json(r#"{"type":"teleport","id":1}"#));
        fx.update(DT);
        assert_eq!(fx.stats().phased_effects(), 0);
    }

    #[test]
    fn delayed_phase_change_waits() {
        let mut fx = orchestrator();
        fx.apply(TriggerEvent::GravityWell {
            id: EffectId(4),
            position: Vec2::ZERO,
            radius: 150.0,
            strength: 1.0,
        });
        assert!(fx.apply_json(r#"{"type":"gravity_well_phase","id":4,"phase":"active","delay_ms":500}"#));
        run(&mut fx, 0.25);
        assert_eq!(fx.gravity_wells().and_then(|r| r.phase_of(EffectId(4))), Some(WellPhase::Warning));
        run(&mut fx, 0.5);
        assert_eq!(fx.gravity_wells().and_then(|r| r.phase_of(EffectId(4))), Some(WellPhase::Active));
    }

    #[test]
    fn well_activation_applies_radius() {
        let mut fx = orchestrator();
        assert!(fx.apply_json(r#"{"type":"gravity_well","id":1,"radius":150}"#));
        fx.update(DT);
        assert!(fx.apply_json(
            r#"{"type":"gravity_well_phase","id":1,"phase":"active","radius":320}"#
        ));
        let wells = fx.gravity_wells().unwrap();
        assert_eq!(wells.phase_of(EffectId(1)), Some(WellPhase::Active));
        assert_eq!(wells.get(EffectId(1)).map(|i| i.params.radius), Some(320.0));

        // Non-finite radius is ignored; the phase change still goes through.
        assert!(fx.apply(TriggerEvent::GravityWellPhase {
            id: EffectId(1),
            phase: "end".into(),
            delay_ms: None,
            radius: Some(f32::NAN),
        }));
        let wells = fx.gravity_wells().unwrap();
        assert_eq!(wells.phase_of(EffectId(1)), Some(WellPhase::End));
        assert_eq!(wells.get(EffectId(1)).map(|i| i.params.radius), Some(320.0));

        assert!(!fx.apply_json(r#"{"type":"gravity_well_phase","id":9,"phase":"active","radius":50}"#));
    }

    #[test]
    fn huge_burst_trigger_fills_pool_once() {
        let mut fx = orchestrator();
        fx.set_particle_multiplier(FxConfig::MAX_PARTICLE_MULTIPLIER);
        assert!(fx.apply_json(r#"{"type":"burst","count":4294967295}"#));
        let stats = fx.stats().particles;
        assert_eq!(stats.live, stats.capacity);
        assert_eq!(stats.spawned, stats.capacity as u64);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn disabled_family_has_no_registry() {
        let families = FamilySet { rifts: false, ..FamilySet::default() };
        let mut fx = EffectOrchestrator::new(&FxConfig::default().with_families(families));
        assert!(fx.rifts().is_none());
        assert!(!fx.apply_json(r#"{"type":"rift","id":1}"#));
        assert!(fx.apply_json(r#"{"type":"gravity_well","id":1}"#));
        fx.update(DT);
        assert_eq!(fx.stats().rifts, 0);
        assert_eq!(fx.stats().gravity_wells, 1);
    }

    #[test]
    fn cancel_scoped_to_family() {
        let mut fx = orchestrator();
        fx.apply_json(r#"{"type":"grapple","id":5,"anchor":[0,0],"target":[100,0]}"#);
        fx.apply_json(r#"{"type":"boss_emergence","id":5}"#);
        fx.update(DT);

        assert!(fx.apply_json(r#"{"type":"cancel","id":5,"family":"grapple"}"#));
        assert_eq!(fx.grapples().and_then(|r| r.phase_of(EffectId(5))), Some(GrapplePhase::Dissolve));
        assert_eq!(
            fx.emergences().and_then(|r| r.phase_of(EffectId(5))),
            Some(EmergencePhase::CrackSpread)
        );

        assert!(fx.apply_json(r#"{"type":"remove","id":5}"#));
        assert_eq!(fx.stats().phased_effects(), 0);
    }

    #[test]
    fn grapple_target_follows_ship() {
        let mut fx = orchestrator();
        fx.grapple(EffectId(2), Vec2::ZERO, Vec2::new(50.0, 0.0), GrappleKind::WebSnare);
        assert!(fx.apply_json(r#"{"type":"grapple_target","id":2,"target":[80,10]}"#));
        let target = fx.grapples().and_then(|r| r.get(EffectId(2))).map(|i| i.params.target);
        assert_eq!(target, Some(Vec2::new(80.0, 10.0)));
        assert!(fx.apply_json(r#"{"type":"grapple_release","id":2}"#));
    }

    #[test]
    fn boss_shake_peaks_at_emergence() {
        let mut fx = orchestrator();
        fx.boss_emergence(EffectId(1), Vec2::ZERO, 7.0, 140.0);
        fx.update(DT);
        let early = fx.screen_shake();
        run(&mut fx, 6.0);
        let late = fx.screen_shake();
        assert!(late > early, "{} <= {}", late, early);
        assert!(late <= fx.emergences().map_or(0.0, |r| r.family().max_shake) + 1e-3);
    }

    #[test]
    fn explosion_and_impact_cue_audio() {
        let mut fx = orchestrator();
        assert!(fx.explosion(Vec2::ZERO, Faction::Pirate, BlastSize::Large) > 0);
        assert!(fx.impact(Vec2::ZERO, Vec2::X, HitKind::Energy, true, 3) > 0);
        let cues: Vec<_> = fx.drain_sounds().collect();
        assert_eq!(cues, vec![SoundEvent::EXPLOSION_LARGE, SoundEvent::SHIELD_HIT]);
    }

    #[test]
    fn zero_multiplier_spawns_nothing_but_still_cues() {
        let mut fx = orchestrator();
        fx.set_particle_multiplier(0.0);
        assert_eq!(fx.explosion(Vec2::ZERO, Faction::Swarm, BlastSize::Medium), 0);
        assert_eq!(fx.stats().particles.live, 0);
        assert_eq!(fx.stats().pending_sounds, 1);

        fx.set_particle_multiplier(f32::NAN);
        assert_eq!(fx.particle_multiplier(), 1.0);
        fx.set_particle_multiplier(10.0);
        assert_eq!(fx.particle_multiplier(), FxConfig::MAX_PARTICLE_MULTIPLIER);
    }

    #[test]
    fn sound_queue_keeps_newest() {
        let mut config = FxConfig::default();
        config.max_sounds = 2;
        let mut fx = EffectOrchestrator::new(&config);
        fx.impact(Vec2::ZERO, Vec2::ZERO, HitKind::Kinetic, false, 1);
        fx.impact(Vec2::ZERO, Vec2::ZERO, HitKind::Kinetic, true, 1);
        fx.explosion(Vec2::ZERO, Faction::Void, BlastSize::Small);
        let cues: Vec<_> = fx.drain_sounds().collect();
        assert_eq!(cues, vec![SoundEvent::SHIELD_HIT, SoundEvent::EXPLOSION_SMALL]);
    }

    #[test]
    fn quality_change_shrinks_lazily() {
        let mut fx = orchestrator();
        let config = SpawnConfig::new().with_life(1.0);
        fx.spawn_burst(&config, 400, &BurstSpread::none());
        fx.set_quality(QualityTier::Low);
        assert_eq!(fx.stats().particles.live, 400);
        run(&mut fx, 1.1);
        assert_eq!(fx.stats().particles.capacity, QualityTier::Low.capacity());
    }

    #[test]
    fn draw_layers_everything_visible() {
        let mut fx = orchestrator();
        fx.apply_json(r#"{"type":"gravity_well","id":1}"#);
        fx.apply_json(r#"{"type":"rift","id":2,"position":[100,0]}"#);
        fx.apply_json(r#"{"type":"grapple","id":3,"target":[60,0]}"#);
        fx.apply_json(r#"{"type":"boss_emergence","id":4}"#);
        fx.apply_json(r#"{"type":"burst","count":5}"#);
        run(&mut fx, 0.5);

        let mut list = DrawList::new();
        let stats = fx.draw(&Camera::default(), &mut list);
        assert_eq!(stats.gravity_wells, 1);
        assert_eq!(stats.rifts, 1);
        assert_eq!(stats.grapples, 1);
        assert_eq!(stats.emergences, 1);
        assert!(stats.particles > 0);
        assert!(!list.is_empty());

        // Nothing on screen far away.
        let far = Camera::default().with_center(Vec2::splat(1.0e5));
        let mut list = DrawList::new();
        assert_eq!(fx.draw(&far, &mut list).total(), 0);
    }

    #[test]
    fn clear_drops_everything() {
        let mut fx = orchestrator();
        fx.apply_json(r#"{"type":"rift","id":1}"#);
        fx.explosion(Vec2::ZERO, Faction::Void, BlastSize::Medium);
        assert!(fx.apply_json(r#"{"type":"clear"}"#));
        let stats = fx.stats();
        assert_eq!(stats.phased_effects(), 0);
        assert_eq!(stats.particles.live, 0);
        assert_eq!(stats.pending_sounds, 0);
    }

    #[test]
    fn nan_dt_is_harmless() {
        let mut fx = orchestrator();
        fx.apply_json(r#"{"type":"rift","id":1}"#);
        fx.update(f32::NAN);
        fx.update(-1.0);
        fx.update(f32::INFINITY);
        assert_eq!(fx.rifts().and_then(|r| r.phase_of(EffectId(1))), Some(RiftPhase::Spawn));
    }
}
