pub mod families;
pub mod particles;
pub mod phase;
