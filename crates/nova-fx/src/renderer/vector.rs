//! Lyon-backed [`Painter`] producing a flat triangle list.
//!
//! Output layout: 6 floats per vertex `[x, y, r, g, b, a]`, camera-relative
//! coordinates. Cleared by the host at the start of each frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillTessellator, FillVertex, FillVertexConstructor,
    StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor, VertexBuffers,
};

use super::color::FxColor;
use super::painter::Painter;

/// Per-vertex data for the effects pipeline.
/// 6 floats = 24 bytes per vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct VectorVertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl VectorVertex {
    /// Number of floats per vertex.
    pub const FLOATS: usize = 6;
    /// Stride in bytes.
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    fn at(p: Vec2, color: FxColor) -> Self {
        Self { x: p.x, y: p.y, r: color.r, g: color.g, b: color.b, a: color.a }
    }
}

struct FillCtor {
    color: FxColor,
}

impl FillVertexConstructor<VectorVertex> for FillCtor {
    fn new_vertex(&mut self, vertex: FillVertex) -> VectorVertex {
        let p = vertex.position();
        VectorVertex::at(Vec2::new(p.x, p.y), self.color)
    }
}

struct StrokeCtor {
    color: FxColor,
}

impl StrokeVertexConstructor<VectorVertex> for StrokeCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> VectorVertex {
        let p = vertex.position();
        VectorVertex::at(Vec2::new(p.x, p.y), self.color)
    }
}

/// Segments used for the radial glow fan.
const GLOW_SEGMENTS: usize = 16;

/// Tessellating painter. Holds the lyon tessellators and the output buffer;
/// reuses both across frames so steady-state drawing does not allocate.
pub struct VectorPainter {
    fill_tess: FillTessellator,
    stroke_tess: StrokeTessellator,
    geometry: VertexBuffers<VectorVertex, u32>,
    vertices: Vec<VectorVertex>,
    max_vertices: usize,
    tolerance: f32,
}

impl VectorPainter {
    pub fn new() -> Self {
        Self::with_capacity(32_768)
    }

    /// Create a painter that keeps at most `max_vertices` vertices per frame.
    /// Shapes that would overflow the budget are dropped whole.
    pub fn with_capacity(max_vertices: usize) -> Self {
        Self {
            fill_tess: FillTessellator::new(),
            stroke_tess: StrokeTessellator::new(),
            geometry: VertexBuffers::new(),
            vertices: Vec::with_capacity(max_vertices),
            max_vertices,
            tolerance: 0.5,
        }
    }

    /// Clear the vertex buffer. Called at the start of each frame.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn max_vertices(&self) -> usize {
        self.max_vertices
    }

    pub fn vertices(&self) -> &[VectorVertex] {
        &self.vertices
    }

    /// Flat float view of the vertex buffer.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw pointer to the flat float buffer (for the host to copy from).
    pub fn buffer_ptr(&self) -> *const f32 {
        self.vertices.as_ptr() as *const f32
    }

    /// Move indexed geometry into the flat buffer as a triangle list.
    fn flush_geometry(&mut self) {
        let needed = self.geometry.indices.len();
        if self.vertices.len() + needed <= self.max_vertices {
            for idx in &self.geometry.indices {
                self.vertices.push(self.geometry.vertices[*idx as usize]);
            }
        } else {
            log::trace!("vector budget exhausted, dropping {} vertices", needed);
        }
        self.geometry.vertices.clear();
        self.geometry.indices.clear();
    }

    fn polyline_path(points: &[Vec2], closed: bool) -> Path {
        let mut builder = Path::builder();
        builder.begin(point(points[0].x, points[0].y));
        for p in &points[1..] {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(closed);
        builder.build()
    }

    fn circle_path(center: Vec2, radius: f32) -> Path {
        let mut builder = Path::builder();
        builder.add_circle(point(center.x, center.y), radius, lyon::path::Winding::Positive);
        builder.build()
    }

    fn fill_path(&mut self, path: &Path, color: FxColor) {
        let result = self.fill_tess.tessellate_path(
            path,
            &FillOptions::tolerance(self.tolerance),
            &mut BuffersBuilder::new(&mut self.geometry, FillCtor { color }),
        );
        if result.is_ok() {
            self.flush_geometry();
        } else {
            self.geometry.vertices.clear();
            self.geometry.indices.clear();
        }
    }

    fn stroke_path(&mut self, path: &Path, width: f32, color: FxColor) {
        let result = self.stroke_tess.tessellate_path(
            path,
            &StrokeOptions::tolerance(self.tolerance).with_line_width(width),
            &mut BuffersBuilder::new(&mut self.geometry, StrokeCtor { color }),
        );
        if result.is_ok() {
            self.flush_geometry();
        } else {
            self.geometry.vertices.clear();
            self.geometry.indices.clear();
        }
    }
}

impl Default for VectorPainter {
    fn default() -> Self {
        Self::new()
    }
}

fn drawable(points: &[Vec2], color: FxColor) -> bool {
    !color.is_invisible() && points.iter().all(|p| p.is_finite())
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl Painter for VectorPainter {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: FxColor) {
        if !positive(radius) || !drawable(&[center], color) {
            return;
        }
        let path = Self::circle_path(center, radius);
        self.fill_path(&path, color);
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: FxColor) {
        if !positive(radius) || !positive(width) || !drawable(&[center], color) {
            return;
        }
        let path = Self::circle_path(center, radius);
        self.stroke_path(&path, width, color);
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: FxColor) {
        if points.len() < 3 || !drawable(points, color) {
            return;
        }
        let path = Self::polyline_path(points, true);
        self.fill_path(&path, color);
    }

    fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: FxColor) {
        if points.len() < 2 || !positive(width) || !drawable(points, color) {
            return;
        }
        let path = Self::polyline_path(points, false);
        self.stroke_path(&path, width, color);
    }

    /// Triangle fan with an opaque center fading to a transparent rim.
    fn glow(&mut self, center: Vec2, radius: f32, color: FxColor) {
        if !positive(radius) || !drawable(&[center], color) {
            return;
        }
        if self.vertices.len() + GLOW_SEGMENTS * 3 > self.max_vertices {
            return;
        }
        let rim = color.with_alpha(0.0);
        let step = std::f32::consts::TAU / GLOW_SEGMENTS as f32;
        for i in 0..GLOW_SEGMENTS {
            let a0 = i as f32 * step;
            let a1 = a0 + step;
            self.vertices.push(VectorVertex::at(center, color));
            self.vertices.push(VectorVertex::at(center + Vec2::from_angle(a0) * radius, rim));
            self.vertices.push(VectorVertex::at(center + Vec2::from_angle(a1) * radius, rim));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn vector_vertex_is_24_bytes() {
        assert_eq!(size_of::<VectorVertex>(), 24);
        assert_eq!(VectorVertex::STRIDE_BYTES, 24);
    }

    #[test]
    fn fill_triangle_is_three_vertices() {
        let mut painter = VectorPainter::new();
        painter.fill_polygon(
            &[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(5.0, 10.0)],
            FxColor::WHITE,
        );
        assert_eq!(painter.vertex_count(), 3);
        assert_eq!(painter.as_floats().len(), 3 * VectorVertex::FLOATS);
    }

    #[test]
    fn glow_fan_fades_to_rim() {
        let mut painter = VectorPainter::new();
        painter.glow(Vec2::ZERO, 10.0, FxColor::EMBER);
        assert_eq!(painter.vertex_count(), GLOW_SEGMENTS * 3);
        assert_eq!(painter.vertices()[0].a, 1.0);
        assert_eq!(painter.vertices()[1].a, 0.0);
    }

    #[test]
    fn invisible_or_nan_shapes_are_skipped() {
        let mut painter = VectorPainter::new();
        painter.fill_circle(Vec2::ZERO, 5.0, FxColor::TRANSPARENT);
        painter.fill_circle(Vec2::new(f32::NAN, 0.0), 5.0, FxColor::WHITE);
        painter.stroke_circle(Vec2::ZERO, f32::INFINITY, 1.0, FxColor::WHITE);
        painter.stroke_polyline(&[Vec2::ZERO], 2.0, FxColor::WHITE);
        assert_eq!(painter.vertex_count(), 0);
    }

    #[test]
    fn budget_drops_whole_shapes() {
        let mut painter = VectorPainter::with_capacity(4);
        painter.fill_polygon(
            &[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)],
            FxColor::WHITE,
        );
        assert_eq!(painter.vertex_count(), 0);
        painter.fill_polygon(
            &[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(5.0, 10.0)],
            FxColor::WHITE,
        );
        assert_eq!(painter.vertex_count(), 3);
    }

    #[test]
    fn clear_resets_buffer() {
        let mut painter = VectorPainter::new();
        painter.fill_circle(Vec2::ZERO, 5.0, FxColor::WHITE);
        assert!(painter.vertex_count() > 0);
        painter.clear();
        assert_eq!(painter.vertex_count(), 0);
    }
}
