pub mod camera;
pub mod color;
pub mod painter;
#[cfg(feature = "vectors")]
pub mod vector;

pub use camera::Camera;
pub use color::FxColor;
pub use painter::{DrawCommand, DrawList, Painter};
#[cfg(feature = "vectors")]
pub use vector::{VectorPainter, VectorVertex};
