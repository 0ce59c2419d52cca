//! Numeric guards shared by the pool and the phase registries.
//!
//! Every ratio that divides by a duration or a lifetime goes through these
//! helpers, so a zero, negative or corrupted denominator yields a clamped
//! value instead of NaN/Infinity reaching the renderer.

/// Return `value` if it is finite, `fallback` otherwise.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Clamp to [0, 1]. Non-finite input maps to 0.
#[inline]
pub fn unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Normalized progress of `elapsed` through `duration`, in [0, 1].
///
/// A zero, negative or non-finite duration counts as already finished (1.0).
/// A non-finite elapsed time is also treated as finished.
#[inline]
pub fn phase_progress(elapsed: f32, duration: f32) -> f32 {
    if !(duration.is_finite() && duration > 0.0) || !elapsed.is_finite() {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Remaining-life ratio used for particle fades, in [0, 1].
///
/// Unlike [`phase_progress`], a corrupted denominator counts as fully
/// expired (0.0) because the result is used directly as alpha.
#[inline]
pub fn life_ratio(remaining: f32, max: f32) -> f32 {
    if !(max.is_finite() && max > 0.0) {
        return 0.0;
    }
    unit(remaining.max(0.0) / max)
}

/// Sanitize a frame delta: non-finite or negative deltas become zero.
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// Sinusoid remapped to [0, 1].
#[inline]
pub fn wave01(t: f32, frequency: f32) -> f32 {
    0.5 + 0.5 * (t * frequency * std::f32::consts::TAU).sin()
}
