//! Generic phased-effect machinery: a family describes its state graph and
//! visuals, a registry runs any number of instances of it.

mod family;
mod instance;
mod registry;

pub use family::{EmitContext, PhaseFamily, PhaseRule, PhaseVisual};
pub use instance::PhaseInstance;
pub use registry::PhaseRegistry;
