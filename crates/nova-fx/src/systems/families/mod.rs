//! Concrete phased-effect families.

pub mod boss_emergence;
pub mod grapple;
pub mod gravity_well;
pub mod rift;
pub mod shapes;

pub use boss_emergence::{BossEmergenceFamily, EmergenceParams, EmergencePhase};
pub use grapple::{GrappleFamily, GrappleKind, GrappleParams, GrapplePhase};
pub use gravity_well::{GravityWellFamily, WellParams, WellPhase};
pub use rift::{RiftFamily, RiftParams, RiftPhase};
