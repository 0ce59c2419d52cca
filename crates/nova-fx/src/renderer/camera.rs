use glam::Vec2;

/// 2D camera describing the visible world rectangle.
///
/// Draw routines use it for two things: culling (with a margin so effects do
/// not pop in at the edges) and converting world positions into
/// camera-relative coordinates handed to the [`Painter`](super::Painter).
#[derive(Debug, Clone)]
pub struct Camera {
    /// Visible width in world units.
    pub width: f32,
    /// Visible height in world units.
    pub height: f32,
    /// Camera center position in world space.
    pub center: Vec2,
    /// Screen-shake offset applied on top of `center`.
    pub shake: Vec2,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            center: Vec2::ZERO,
            shake: Vec2::ZERO,
        }
    }

    pub fn with_center(mut self, center: Vec2) -> Self {
        self.center = center;
        self
    }

    /// Move the camera center.
    pub fn look_at(&mut self, target: Vec2) {
        self.center = target;
    }

    /// Resize the visible area. Non-finite or negative sizes collapse to zero
    /// (everything is culled) instead of propagating into the cull test.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        self.height = if height.is_finite() { height.max(0.0) } else { 0.0 };
    }

    /// Convert a world position to camera-relative coordinates
    /// (origin at the view center, shake applied).
    #[inline]
    pub fn to_view(&self, world: Vec2) -> Vec2 {
        world - self.center - self.shake
    }

    /// Check if a world-space point is inside the viewport.
    pub fn is_visible(&self, point: Vec2) -> bool {
        self.is_rect_visible(point, Vec2::ZERO)
    }

    /// Check if a world-space rectangle overlaps the viewport.
    pub fn is_rect_visible(&self, rect_center: Vec2, rect_half_size: Vec2) -> bool {
        let half = Vec2::new(self.width, self.height) * 0.5;
        let min = self.center - half;
        let max = self.center + half;

        let rect_min = rect_center - rect_half_size;
        let rect_max = rect_center + rect_half_size;

        rect_max.x >= min.x && rect_min.x <= max.x && rect_max.y >= min.y && rect_min.y <= max.y
    }

    /// Cull test for a round effect of `extent` radius, with the viewport
    /// grown by `margin` on every side. Non-finite input is never visible.
    pub fn is_within(&self, center: Vec2, extent: f32, margin: f32) -> bool {
        let reach = extent.max(0.0) + margin.max(0.0);
        if !center.is_finite() || !reach.is_finite() {
            return false;
        }
        self.is_rect_visible(center, Vec2::splat(reach))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
