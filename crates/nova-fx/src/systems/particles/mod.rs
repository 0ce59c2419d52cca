//! Bounded particle pool and the records, bursts and streams that feed it.

mod burst;
mod emitter;
mod particle;
mod pool;
pub mod presets;
mod render;
mod rng;

pub use burst::{BurstSpread, RadialSpread};
pub use emitter::{EmissionMode, StreamEmitter};
pub use particle::{Particle, ParticleKind, SpawnConfig, SpawnPriority};
pub use pool::{ParticleHandle, ParticlePool, PoolStats, QualityTier};
pub use presets::{BlastSize, Faction, HitKind};
pub use render::{draw_particle, visual_extent};
pub use rng::Rng;
