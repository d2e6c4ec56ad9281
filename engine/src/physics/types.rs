//! Physics type re-exports from glam
//!
//! The 2D physics core works entirely in `Vec2`; angles are plain `f32`
//! radians.

pub use glam::Vec2;

/// Tolerance used to guard zero-length vectors and segments.
pub const EPSILON: f32 = 1e-6;

/// Normalizes `v`, or returns `fallback` when `v` is (nearly) zero-length.
#[inline]
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON * EPSILON {
        fallback
    } else {
        v / len_sq.sqrt()
    }
}

/// Closest point to `p` on the segment `a..b`.
///
/// Degenerate segments collapse to `a`.
#[inline]
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
