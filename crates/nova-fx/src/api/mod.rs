pub mod orchestrator;
pub mod trigger;
pub mod types;

pub use orchestrator::EffectOrchestrator;
pub use trigger::{EffectFamily, TriggerEvent};
pub use types::{DrawStats, EffectId, FxStats, SoundEvent};
