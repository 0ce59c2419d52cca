pub mod config;
pub mod easing;
pub mod math;
pub mod time;

pub use config::{FamilySet, FxConfig};
pub use easing::Easing;
pub use time::FrameClock;
