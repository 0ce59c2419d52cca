use glam::Vec2;

use super::family::PhaseFamily;
use crate::api::types::EffectId;
use crate::systems::particles::StreamEmitter;

/// One running occurrence of a phased effect.
///
/// Timestamps are on the owning registry's clock. The seed and the shape
/// derived from it are fixed at creation.
#[derive(Debug)]
pub struct PhaseInstance<F: PhaseFamily> {
    pub id: EffectId,
    pub position: Vec2,
    pub params: F::Params,
    /// Continuous emission state, owned by the family's `emit`.
    pub stream: StreamEmitter,
    phase: F::Phase,
    entered_at: f64,
    created_at: f64,
    seed: u64,
    shape: F::Shape,
    pending: Option<(F::Phase, f32)>,
    announce: bool,
}

impl<F: PhaseFamily> PhaseInstance<F> {
    pub(crate) fn new(
        id: EffectId,
        position: Vec2,
        params: F::Params,
        phase: F::Phase,
        now: f64,
        seed: u64,
        shape: F::Shape,
    ) -> Self {
        Self {
            id,
            position,
            params,
            stream: StreamEmitter::default(),
            phase,
            entered_at: now,
            created_at: now,
            seed,
            shape,
            pending: None,
            announce: true,
        }
    }

    pub fn phase(&self) -> F::Phase {
        self.phase
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn shape(&self) -> &F::Shape {
        &self.shape
    }

    /// Scheduled phase change and the seconds left before it applies.
    pub fn pending(&self) -> Option<(F::Phase, f32)> {
        self.pending
    }

    /// Seconds spent in the current phase at registry time `now`.
    pub fn elapsed(&self, now: f64) -> f32 {
        ((now - self.entered_at).max(0.0)) as f32
    }

    /// Seconds since creation at registry time `now`.
    pub fn age(&self, now: f64) -> f32 {
        ((now - self.created_at).max(0.0)) as f32
    }

    pub(crate) fn enter(&mut self, phase: F::Phase, at: f64) {
        self.phase = phase;
        self.entered_at = at;
        self.announce = true;
    }

    pub(crate) fn set_pending(&mut self, pending: Option<(F::Phase, f32)>) {
        self.pending = pending;
    }

    /// Consume the "just entered a phase" flag.
    pub(crate) fn take_announce(&mut self) -> bool {
        std::mem::take(&mut self.announce)
    }
}
