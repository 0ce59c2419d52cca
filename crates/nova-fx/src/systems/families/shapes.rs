//! Seeded geometry helpers shared by the families. Everything here is a
//! pure function of its inputs and writes into fixed-size arrays.

use glam::Vec2;

use crate::systems::particles::Rng;

/// Segments in a jagged arc (2^4).
pub const ARC_SEGMENTS: usize = 16;

/// Lightning-style arc from `start` to `end` by midpoint displacement.
///
/// `roughness` is the largest sideways offset as a fraction of segment
/// length. The same seed always yields the same arc; callers animate it by
/// mixing a time bucket into the seed.
pub fn jagged_arc(start: Vec2, end: Vec2, roughness: f32, seed: u64) -> [Vec2; ARC_SEGMENTS + 1] {
    let mut points = [Vec2::ZERO; ARC_SEGMENTS + 1];
    points[0] = start;
    points[ARC_SEGMENTS] = end;
    let mut rng = Rng::new(seed);
    displace(&mut points, 0, ARC_SEGMENTS, roughness, &mut rng);
    points
}

fn displace(points: &mut [Vec2], lo: usize, hi: usize, roughness: f32, rng: &mut Rng) {
    if hi - lo <= 1 {
        return;
    }
    let mid = (lo + hi) / 2;
    let a = points[lo];
    let b = points[hi];
    let span = b - a;
    let perp = span.perp().normalize_or_zero();
    points[mid] = (a + b) * 0.5 + perp * rng.signed(roughness) * span.length();
    displace(points, lo, mid, roughness, rng);
    displace(points, mid, hi, roughness, rng);
}

/// Radial offsets in `[-amount, amount)` frozen at creation.
pub fn frozen_offsets<const N: usize>(rng: &mut Rng, amount: f32) -> [f32; N] {
    std::array::from_fn(|_| rng.signed(amount))
}

/// Closed ring of `N` points around `center`, each pushed out by its
/// frozen offset (relative to `radius`) and rotated by `rotation`.
pub fn wobbly_ring<const N: usize>(
    center: Vec2,
    radius: f32,
    offsets: &[f32; N],
    rotation: f32,
) -> [Vec2; N] {
    let step = std::f32::consts::TAU / N as f32;
    std::array::from_fn(|i| {
        let angle = rotation + step * i as f32;
        center + Vec2::from_angle(angle) * radius * (1.0 + offsets[i])
    })
}

/// Spiral arm as a polyline of `N` points, from `inner` to `outer` radius
/// sweeping `twist` radians.
pub fn spiral_arm<const N: usize>(
    center: Vec2,
    inner: f32,
    outer: f32,
    start_angle: f32,
    twist: f32,
) -> [Vec2; N] {
    let last = (N.max(2) - 1) as f32;
    std::array::from_fn(|i| {
        let t = i as f32 / last;
        let radius = inner + (outer - inner) * t;
        center + Vec2::from_angle(start_angle + twist * t) * radius
    })
}
