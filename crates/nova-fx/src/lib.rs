pub mod api;
pub mod core;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::orchestrator::EffectOrchestrator;
pub use api::trigger::{EffectFamily, TriggerEvent};
pub use api::types::{DrawStats, EffectId, FxStats, SoundEvent};
pub use core::config::{FamilySet, FxConfig};
pub use core::easing::Easing;
pub use core::time::FrameClock;
pub use renderer::camera::Camera;
pub use renderer::color::FxColor;
pub use renderer::painter::{DrawCommand, DrawList, Painter};
pub use systems::families::{
    BossEmergenceFamily, EmergenceParams, EmergencePhase, GrappleFamily, GrappleKind,
    GrappleParams, GrapplePhase, GravityWellFamily, RiftFamily, RiftParams, RiftPhase,
    WellParams, WellPhase,
};
pub use systems::particles::{
    BlastSize, BurstSpread, Faction, HitKind, Particle, ParticleHandle, ParticleKind,
    ParticlePool, PoolStats, QualityTier, RadialSpread, Rng, SpawnConfig, SpawnPriority,
    StreamEmitter,
};
pub use systems::phase::{EmitContext, PhaseFamily, PhaseInstance, PhaseRegistry, PhaseRule, PhaseVisual};

#[cfg(feature = "vectors")]
pub use renderer::vector::{VectorPainter, VectorVertex};
