//! Drawing seam between the effects core and the presentation layer.
//!
//! The core never talks to a GPU. Each draw routine emits a handful of
//! primitives through [`Painter`] in camera-relative coordinates; the host
//! decides how to rasterize them. [`DrawList`] records the primitives as
//! plain data, [`VectorPainter`](super::VectorPainter) tessellates them into
//! a triangle list (feature `vectors`).

use glam::Vec2;

use super::color::FxColor;

/// Primitive drawing interface implemented by presentation backends.
pub trait Painter {
    /// Filled disc.
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: FxColor);

    /// Circle outline of the given line width.
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: FxColor);

    /// Filled closed polygon (convex or concave).
    fn fill_polygon(&mut self, points: &[Vec2], color: FxColor);

    /// Open polyline of the given line width.
    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: FxColor);

    /// Soft radial glow. Backends with a real additive pass should override
    /// this; the default approximates it with stacked translucent discs.
    fn glow(&mut self, center: Vec2, radius: f32, color: FxColor) {
        if radius <= 0.0 || color.is_invisible() {
            return;
        }
        self.fill_circle(center, radius, color.fade(0.2));
        self.fill_circle(center, radius * 0.6, color.fade(0.35));
        self.fill_circle(center, radius * 0.3, color.fade(0.6));
    }
}

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillCircle { center: Vec2, radius: f32, color: FxColor },
    StrokeCircle { center: Vec2, radius: f32, width: f32, color: FxColor },
    FillPolygon { points: Vec<Vec2>, color: FxColor },
    StrokePolyline { points: Vec<Vec2>, width: f32, color: FxColor },
    Glow { center: Vec2, radius: f32, color: FxColor },
}

impl DrawCommand {
    /// Alpha of the primitive's color.
    pub fn alpha(&self) -> f32 {
        match self {
            DrawCommand::FillCircle { color, .. }
            | DrawCommand::StrokeCircle { color, .. }
            | DrawCommand::FillPolygon { color, .. }
            | DrawCommand::StrokePolyline { color, .. }
            | DrawCommand::Glow { color, .. } => color.a,
        }
    }
}

/// Painter that records primitives for a host that rasterizes them itself
/// (Canvas2D fallback, replay tooling).
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Clear recorded commands. Called at the start of each frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Painter for DrawList {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: FxColor) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: FxColor) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, width, color });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: FxColor) {
        self.commands.push(DrawCommand::FillPolygon {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: FxColor) {
        self.commands.push(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn glow(&mut self, center: Vec2, radius: f32, color: FxColor) {
        self.commands.push(DrawCommand::Glow { center, radius, color });
    }
}
