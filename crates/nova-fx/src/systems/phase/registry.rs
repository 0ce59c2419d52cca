//! Keyed collection of phased instances of one family.

use glam::Vec2;

use super::family::{EmitContext, PhaseFamily, PhaseRule, PhaseVisual};
use super::instance::PhaseInstance;
use crate::api::types::EffectId;
use crate::core::math::{finite_or, sanitize_dt};
use crate::renderer::camera::Camera;
use crate::renderer::painter::Painter;
use crate::systems::particles::Rng;

/// Cap on timed transitions taken by one instance in one tick. A stall
/// longer than the whole timed chain still lands in the right phase.
const MAX_CHAIN: usize = 16;

/// Instances of one family, advanced by the frame tick.
///
/// Storage is a `Vec` in creation order, so drawing and ticking are stable
/// from frame to frame. Lookups are linear; a registry holds a handful to a
/// few dozen instances.
pub struct PhaseRegistry<F: PhaseFamily> {
    family: F,
    instances: Vec<PhaseInstance<F>>,
    clock: f64,
    linger: f32,
    cull_margin: f32,
    rng: Rng,
}

impl<F: PhaseFamily> PhaseRegistry<F> {
    pub const DEFAULT_LINGER: f32 = 0.05;
    pub const DEFAULT_CULL_MARGIN: f32 = 50.0;

    pub fn new(family: F, seed: u64) -> Self {
        Self {
            family,
            instances: Vec::new(),
            clock: 0.0,
            linger: Self::DEFAULT_LINGER,
            cull_margin: Self::DEFAULT_CULL_MARGIN,
            rng: Rng::new(seed),
        }
    }

    /// Extra seconds a finished terminal phase stays before removal.
    pub fn with_linger(mut self, linger: f32) -> Self {
        self.linger = finite_or(linger, 0.0).max(0.0);
        self
    }

    pub fn with_cull_margin(mut self, margin: f32) -> Self {
        self.cull_margin = finite_or(margin, 0.0).max(0.0);
        self
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    pub fn family_mut(&mut self) -> &mut F {
        &mut self.family
    }

    /// Registry time in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    // -- Lifecycle --

    /// Start an instance in the family's initial phase.
    pub fn create(&mut self, id: EffectId, position: Vec2, params: F::Params) -> &PhaseInstance<F> {
        let phase = self.family.initial_phase();
        self.create_in(id, position, params, phase)
    }

    /// Start an instance in `phase`. An existing instance with the same id
    /// is replaced.
    pub fn create_in(
        &mut self,
        id: EffectId,
        position: Vec2,
        params: F::Params,
        phase: F::Phase,
    ) -> &PhaseInstance<F> {
        let seed = self.rng.fork_seed();
        let shape = self.family.freeze_shape(&params, &mut Rng::new(seed));
        let position = if position.is_finite() { position } else { Vec2::ZERO };
        let instance = PhaseInstance::new(id, position, params, phase, self.clock, seed, shape);

        let slot = match self.index_of(id) {
            Some(index) => {
                log::debug!("{} {:?} recreated", F::NAME, id);
                self.instances[index] = instance;
                index
            }
            None => {
                log::debug!("{} {:?} created in {}", F::NAME, id, F::phase_name(phase));
                self.instances.push(instance);
                self.instances.len() - 1
            }
        };
        &self.instances[slot]
    }

    /// External phase override. Ignored (returns `false`) for unknown ids,
    /// the current phase, and edges the family forbids.
    pub fn set_phase(&mut self, id: EffectId, phase: F::Phase) -> bool {
        let clock = self.clock;
        let family = &self.family;
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        let current = instance.phase();
        if current == phase || !family.allows(current, phase) {
            log::trace!(
                "{} {:?}: ignoring {} -> {}",
                F::NAME,
                id,
                F::phase_name(current),
                F::phase_name(phase)
            );
            return false;
        }
        instance.enter(phase, clock);
        instance.set_pending(None);
        true
    }

    /// [`set_phase`](Self::set_phase) by wire name. Unknown names are ignored.
    pub fn set_phase_named(&mut self, id: EffectId, name: &str) -> bool {
        match F::parse_phase(name) {
            Some(phase) => self.set_phase(id, phase),
            None => {
                log::warn!("{}: unknown phase {:?}", F::NAME, name);
                false
            }
        }
    }

    /// Apply `phase` after `delay` seconds of registry time. Replaces any
    /// earlier schedule. The edge is checked when the delay runs out.
    pub fn schedule_phase(&mut self, id: EffectId, phase: F::Phase, delay: f32) -> bool {
        match self.get_mut(id) {
            Some(instance) => {
                instance.set_pending(Some((phase, finite_or(delay, 0.0).max(0.0))));
                true
            }
            None => false,
        }
    }

    /// Move an instance into the family's closing phase, bypassing the
    /// transition graph. No-op if it is already closing or finishing.
    pub fn cancel(&mut self, id: EffectId) -> bool {
        let clock = self.clock;
        let family = &self.family;
        let closing = family.closing_phase();
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        let finishing = matches!(
            family.rule(instance.phase(), &instance.params),
            PhaseRule::Terminal { .. }
        );
        if instance.phase() == closing || finishing {
            return false;
        }
        instance.enter(closing, clock);
        instance.set_pending(None);
        true
    }

    /// Remove immediately. Particles already spawned are left alone.
    pub fn remove(&mut self, id: EffectId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.instances.remove(index);
                log::debug!("{} {:?} removed", F::NAME, id);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn update_params(&mut self, id: EffectId, update: impl FnOnce(&mut F::Params)) -> bool {
        match self.get_mut(id) {
            Some(instance) => {
                update(&mut instance.params);
                true
            }
            None => false,
        }
    }

    /// Move an instance. Non-finite positions are rejected.
    pub fn set_position(&mut self, id: EffectId, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        match self.get_mut(id) {
            Some(instance) => {
                instance.position = position;
                true
            }
            None => false,
        }
    }

    // -- Frame --

    /// Advance the clock by `dt`, apply due phase changes, emit, and drop
    /// finished instances.
    pub fn tick(&mut self, dt: f32, ctx: &mut EmitContext<'_>) {
        let dt = sanitize_dt(dt);
        self.clock += dt as f64;
        let clock = self.clock;
        let family = &self.family;

        for instance in self.instances.iter_mut() {
            if let Some((phase, delay)) = instance.pending() {
                let left = delay - dt;
                if left > 0.0 {
                    instance.set_pending(Some((phase, left)));
                } else {
                    instance.set_pending(None);
                    let current = instance.phase();
                    let finishing = matches!(
                        family.rule(current, &instance.params),
                        PhaseRule::Terminal { .. }
                    );
                    let cancel = phase == family.closing_phase() && !finishing;
                    if current != phase && (cancel || family.allows(current, phase)) {
                        // Backdate by the overshoot so the phase clock stays exact.
                        instance.enter(phase, clock + left as f64);
                    }
                }
            }

            for _ in 0..MAX_CHAIN {
                if instance.take_announce() {
                    family.on_enter(instance, ctx);
                }
                let rule = family.rule(instance.phase(), &instance.params);
                let PhaseRule::Timed { duration, next } = rule else {
                    break;
                };
                let duration = sanitize_dt(duration) as f64;
                if clock - instance.entered_at() < duration {
                    break;
                }
                let at = instance.entered_at() + duration;
                instance.enter(next, at);
            }

            let elapsed = instance.elapsed(clock);
            family.emit(instance, elapsed, dt, ctx);
        }

        let linger = self.linger;
        self.instances.retain(|instance| {
            let rule = family.rule(instance.phase(), &instance.params);
            let PhaseRule::Terminal { duration } = rule else {
                return true;
            };
            let done = instance.elapsed(clock) >= sanitize_dt(duration) + linger;
            if done {
                log::debug!("{} {:?} finished", F::NAME, instance.id);
            }
            !done
        });
    }

    /// Derived draw parameters for `id` at the current clock.
    pub fn visual(&self, id: EffectId) -> Option<PhaseVisual> {
        self.get(id).map(|instance| self.visual_of(instance))
    }

    fn visual_of(&self, instance: &PhaseInstance<F>) -> PhaseVisual {
        self.family
            .visual(instance, instance.elapsed(self.clock))
            .sanitized(self.family.max_scale())
    }

    /// Paint every instance near the viewport. Returns the number painted.
    pub fn draw(&self, camera: &Camera, painter: &mut dyn Painter) -> usize {
        let mut drawn = 0;
        for instance in &self.instances {
            let extent = self.family.extent(instance);
            if !camera.is_within(instance.position, extent, self.cull_margin) {
                continue;
            }
            let visual = self.visual_of(instance);
            if visual.alpha <= 0.0 {
                continue;
            }
            let elapsed = instance.elapsed(self.clock);
            self.family
                .draw(instance, elapsed, &visual, camera.to_view(instance.position), painter);
            drawn += 1;
        }
        drawn
    }

    /// Strongest screen-shake contribution among live instances.
    pub fn shake(&self) -> f32 {
        self.instances
            .iter()
            .map(|i| finite_or(self.family.shake(i, i.elapsed(self.clock)), 0.0).max(0.0))
            .fold(0.0, f32::max)
    }

    // -- Lookup --

    fn index_of(&self, id: EffectId) -> Option<usize> {
        self.instances.iter().position(|i| i.id == id)
    }

    pub fn get(&self, id: EffectId) -> Option<&PhaseInstance<F>> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut PhaseInstance<F>> {
        self.instances.iter_mut().find(|i| i.id == id)
    }

    pub fn phase_of(&self, id: EffectId) -> Option<F::Phase> {
        self.get(id).map(|i| i.phase())
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseInstance<F>> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
