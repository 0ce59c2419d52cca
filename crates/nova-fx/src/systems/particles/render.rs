//! Per-kind draw routines for live particles.

use glam::Vec2;

use super::particle::{Particle, ParticleKind};
use crate::renderer::color::FxColor;
use crate::renderer::painter::Painter;

/// Radius a particle may paint to, used for culling.
pub fn visual_extent(p: &Particle) -> f32 {
    let scale = match p.kind {
        ParticleKind::Glow | ParticleKind::Energy => 3.0,
        ParticleKind::Smoke => 1.0 + 1.5 * (1.0 - p.life_fraction()),
        ParticleKind::Ring => 1.0 + 2.0 * (1.0 - p.life_fraction()),
        ParticleKind::Spark | ParticleKind::Trail => 1.0 + p.velocity.length() * 0.05,
        _ => 1.5,
    };
    p.size * scale
}

/// Paint one particle at `at` (camera-relative).
pub fn draw_particle(p: &Particle, at: Vec2, painter: &mut dyn Painter) {
    let color = p.display_color();
    if color.is_invisible() || p.size <= 0.0 {
        return;
    }
    let aging = 1.0 - p.life_fraction();

    match p.kind {
        ParticleKind::Default => painter.fill_circle(at, p.size, color),
        ParticleKind::Glow => {
            painter.glow(at, p.size * 3.0, color);
            painter.fill_circle(at, p.size * 0.5, color);
        }
        ParticleKind::Spark | ParticleKind::Trail => {
            // Streak opposite to the direction of travel.
            let length = if p.kind == ParticleKind::Spark { 0.05 } else { 0.12 };
            let tail = at - p.velocity * length;
            painter.stroke_polyline(&[tail, at], p.size.max(0.5), color);
        }
        ParticleKind::Smoke => {
            painter.fill_circle(at, p.size * (1.0 + 1.5 * aging), color.fade(0.5));
        }
        ParticleKind::Energy => {
            painter.glow(at, p.size * 3.0, color);
            painter.fill_circle(at, p.size * 0.6, color.mix(FxColor::WHITE.with_alpha(color.a), 0.6));
        }
        ParticleKind::Debris => {
            let corners = [
                Vec2::new(-1.0, -0.6),
                Vec2::new(0.8, -0.9),
                Vec2::new(1.0, 0.7),
                Vec2::new(-0.5, 1.0),
            ];
            let (sin, cos) = p.rotation.sin_cos();
            let points = corners.map(|c| {
                at + Vec2::new(c.x * cos - c.y * sin, c.x * sin + c.y * cos) * p.size
            });
            painter.fill_polygon(&points, color);
        }
        ParticleKind::Ring => {
            let radius = p.size * (1.0 + 2.0 * aging);
            painter.stroke_circle(at, radius, (p.size * 0.3).max(1.0), color);
        }
        ParticleKind::Flame => {
            painter.glow(at, p.size * 1.8, color);
            painter.fill_circle(at, p.size * (1.0 - 0.5 * aging), color);
        }
    }
}
