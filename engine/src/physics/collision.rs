//! Narrow-phase collision dispatch
//!
//! [`dispatch`] routes a pair of colliders to the routine for their shape
//! kinds and returns a [`Hit`] when they overlap.
//!
//! # Conventions
//!
//! - The hit normal is a unit vector pointing from `b` toward `a`, so moving
//!   `a` by `normal * penetration` separates the pair. Swapping the
//!   arguments negates the normal.
//! - Circle and capsule radii are taken from the world AABB
//!   (`0.5 * min(width, height)`), which keeps non-uniformly scaled shapes
//!   conservative.
//! - Zero-length directions resolve to a fixed fallback instead of NaN.
//!
//! # Triggers
//!
//! After a successful routine the hit is post-processed: a consumed
//! fire-once trigger on either side discards it, any trigger forces the
//! penetration to zero, and fire-once triggers are latched as fired.
//!
//! # Example
//!
//! ```ignore
//! use gl2d_engine::physics::{collision, Collider};
//! use glam::Vec2;
//!
//! let a = Collider::aabb(Vec2::ZERO, Vec2::ONE);
//! let b = Collider::aabb(Vec2::new(0.6, 0.0), Vec2::new(1.6, 1.0));
//! if let Some(hit) = collision::dispatch(&a, &b) {
//!     println!("push a by {:?}", hit.normal * hit.penetration);
//! }
//! ```

use glam::Vec2;
use static_assertions::assert_impl_all;

use super::aabb::Aabb;
use super::collider::{Collider, ColliderShape};
use super::types::{EPSILON, closest_point_on_segment};

/// Narrow-phase contact between two colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub collided: bool,
    /// Unit normal pointing from `b` toward `a`
    pub normal: Vec2,
    /// Depth along `normal`; zero for trigger contacts
    pub penetration: f32,
    pub contact_point: Vec2,
}

assert_impl_all!(Hit: Copy, Send, Sync);

impl Hit {
    fn new(normal: Vec2, penetration: f32, contact_point: Vec2) -> Self {
        Self {
            collided: true,
            normal,
            penetration,
            contact_point,
        }
    }

    /// Same contact seen from the other collider.
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Tests `a` against `b` and applies trigger post-processing.
///
/// Fire-once triggers involved in a hit are latched as fired, even though
/// both colliders are borrowed immutably.
pub fn dispatch(a: &Collider, b: &Collider) -> Option<Hit> {
    let hit = dispatch_shapes(a, b)?;
    apply_trigger_rules(hit, a, b)
}

/// Shape routing without any trigger handling.
pub fn dispatch_shapes(a: &Collider, b: &Collider) -> Option<Hit> {
    use ColliderShape as S;

    match (a.shape(), b.shape()) {
        (S::Aabb { .. }, S::Aabb { .. }) => aabb_vs_aabb(&a.world_aabb(), &b.world_aabb()),
        (S::Circle { .. }, S::Circle { .. }) => {
            circle_vs_circle(&a.world_aabb(), &b.world_aabb())
        }
        (S::Circle { .. }, S::Aabb { .. }) => circle_vs_aabb(&a.world_aabb(), &b.world_aabb()),
        (S::Aabb { .. }, S::Circle { .. }) => {
            circle_vs_aabb(&b.world_aabb(), &a.world_aabb()).map(Hit::flipped)
        }
        (S::Capsule { .. }, S::Circle { .. }) => capsule_vs_circle(a, &b.world_aabb()),
        (S::Circle { .. }, S::Capsule { .. }) => {
            capsule_vs_circle(b, &a.world_aabb()).map(Hit::flipped)
        }
        (S::Capsule { .. }, S::Aabb { .. }) => capsule_vs_aabb(a, &b.world_aabb()),
        (S::Aabb { .. }, S::Capsule { .. }) => {
            capsule_vs_aabb(b, &a.world_aabb()).map(Hit::flipped)
        }
        (S::Capsule { .. }, S::Capsule { .. }) => capsule_vs_capsule(a, b),
    }
}

fn apply_trigger_rules(mut hit: Hit, a: &Collider, b: &Collider) -> Option<Hit> {
    if a.is_consumed() || b.is_consumed() {
        return None;
    }
    if a.is_trigger() || b.is_trigger() {
        hit.penetration = 0.0;
    }
    for collider in [a, b] {
        if collider.is_trigger() && collider.fires_once() {
            collider.mark_triggered();
        }
    }
    Some(hit)
}

/// Radius of the largest circle centered in `bounds`.
#[inline]
pub(crate) fn inscribed_radius(bounds: &Aabb) -> f32 {
    0.5 * bounds.width().min(bounds.height())
}

/// Length of `v`, treating near-zero vectors as exactly zero.
#[inline]
fn length_safe(v: Vec2) -> f32 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON { 0.0 } else { len_sq.sqrt() }
}

/// Axis normal for a point embedded in `bounds`: the face with the
/// smallest push-out distance (left, right, down, up in that priority).
fn embedded_face_normal(point: Vec2, bounds: &Aabb) -> Vec2 {
    let left = point.x - bounds.min.x;
    let right = bounds.max.x - point.x;
    let down = point.y - bounds.min.y;
    let up = bounds.max.y - point.y;
    let min_pen = left.min(right).min(down).min(up);
    if min_pen == left {
        Vec2::NEG_X
    } else if min_pen == right {
        Vec2::X
    } else if min_pen == down {
        Vec2::NEG_Y
    } else {
        Vec2::Y
    }
}

// ============================================================================
// Shape routines
// ============================================================================

/// Box vs box on the axis of least overlap. Exact ties separate along Y.
pub fn aabb_vs_aabb(a: &Aabb, b: &Aabb) -> Option<Hit> {
    let overlap_x = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let overlap_y = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    let (ca, cb) = (a.center(), b.center());
    let hit = if overlap_x < overlap_y {
        let normal = if ca.x < cb.x { Vec2::NEG_X } else { Vec2::X };
        let contact = Vec2::new((ca.x + cb.x) * 0.5, ca.y.clamp(b.min.y, b.max.y));
        Hit::new(normal, overlap_x, contact)
    } else {
        let normal = if ca.y < cb.y { Vec2::NEG_Y } else { Vec2::Y };
        let contact = Vec2::new(ca.x.clamp(b.min.x, b.max.x), (ca.y + cb.y) * 0.5);
        Hit::new(normal, overlap_y, contact)
    };
    Some(hit)
}

/// Circle vs circle, both described by their world bounds.
pub fn circle_vs_circle(a: &Aabb, b: &Aabb) -> Option<Hit> {
    let (center_a, center_b) = (a.center(), b.center());
    let (radius_a, radius_b) = (inscribed_radius(a), inscribed_radius(b));

    let delta = center_a - center_b;
    let dist = length_safe(delta);
    let sum = radius_a + radius_b;
    if dist >= sum {
        return None;
    }

    let penetration = sum - dist;
    if dist > EPSILON {
        let normal = delta / dist;
        let contact = center_a - normal * (radius_a - penetration * 0.5);
        Some(Hit::new(normal, penetration, contact))
    } else {
        Some(Hit::new(Vec2::X, penetration, center_a))
    }
}

/// Circle (`a`) vs box (`b`).
pub fn circle_vs_aabb(circle: &Aabb, bounds: &Aabb) -> Option<Hit> {
    let center = circle.center();
    let radius = inscribed_radius(circle);

    let closest = bounds.closest_point(center);
    let diff = center - closest;
    let dist = length_safe(diff);
    if dist >= radius {
        return None;
    }

    let penetration = radius - dist;
    if dist > EPSILON {
        Some(Hit::new(diff / dist, penetration, closest))
    } else {
        Some(Hit::new(embedded_face_normal(center, bounds), penetration, center))
    }
}

/// Capsule (`a`) vs circle (`b`, given by its world bounds).
fn capsule_vs_circle(capsule: &Collider, circle: &Aabb) -> Option<Hit> {
    let (seg_a, seg_b) = capsule.world_segment()?;
    let center = circle.center();
    let radius_circle = inscribed_radius(circle);
    let radius_capsule = inscribed_radius(&capsule.world_aabb());

    let closest = closest_point_on_segment(seg_a, seg_b, center);
    let delta = closest - center;
    let dist = length_safe(delta);
    let sum = radius_capsule + radius_circle;
    if dist >= sum {
        return None;
    }

    let penetration = sum - dist;
    if dist > EPSILON {
        let normal = delta / dist;
        Some(Hit::new(normal, penetration, closest - normal * radius_capsule))
    } else {
        Some(Hit::new(Vec2::X, penetration, closest))
    }
}

/// Capsule (`a`) vs box (`b`).
fn capsule_vs_aabb(capsule: &Collider, bounds: &Aabb) -> Option<Hit> {
    let (seg_a, seg_b) = capsule.world_segment()?;
    let radius = inscribed_radius(&capsule.world_aabb());

    let on_segment = closest_point_on_segment(seg_a, seg_b, bounds.center());
    let on_box = bounds.closest_point(on_segment);
    let delta = on_segment - on_box;
    let dist = length_safe(delta);
    if dist >= radius {
        return None;
    }

    let penetration = radius - dist;
    if dist > EPSILON {
        Some(Hit::new(delta / dist, penetration, on_box))
    } else {
        Some(Hit::new(
            embedded_face_normal(on_segment, bounds),
            penetration,
            on_segment,
        ))
    }
}

/// Closest points between segments `p0..p1` and `q0..q1`.
///
/// Degenerate segments collapse to their first endpoint.
pub fn closest_points_on_segments(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> (Vec2, Vec2) {
    let d1 = p1 - p0;
    let d2 = q1 - q0;
    let r = p0 - q0;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if a <= EPSILON && e <= EPSILON {
        return (p0, q0);
    }
    let (s, t) = if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom.abs() > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (p0 + d1 * s, q0 + d2 * t)
}

/// Capsule vs capsule through the closest points of their segments.
fn capsule_vs_capsule(a: &Collider, b: &Collider) -> Option<Hit> {
    let (a0, a1) = a.world_segment()?;
    let (b0, b1) = b.world_segment()?;
    let (closest_a, closest_b) = closest_points_on_segments(a0, a1, b0, b1);

    let delta = closest_a - closest_b;
    let dist = length_safe(delta);
    let radius_a = inscribed_radius(&a.world_aabb());
    let radius_b = inscribed_radius(&b.world_aabb());
    let sum = radius_a + radius_b;
    if dist >= sum {
        return None;
    }

    let penetration = sum - dist;
    if dist > EPSILON {
        let normal = delta / dist;
        Some(Hit::new(normal, penetration, closest_a - normal * radius_a))
    } else {
        Some(Hit::new(Vec2::X, penetration, closest_a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::Pose;

    fn unit_box_at(x: f32, y: f32) -> Collider {
        Collider::aabb(Vec2::ZERO, Vec2::ONE).with_pose(Pose::at(Vec2::new(x, y)))
    }

    #[test]
    fn test_aabb_x_axis_separation() {
        let a = Collider::aabb(Vec2::ZERO, Vec2::ONE);
        let b = Collider::aabb(Vec2::new(0.6, 0.0), Vec2::new(1.6, 1.0));
        let hit = dispatch(&a, &b).expect("boxes overlap");
        assert!(hit.collided);
        assert!((hit.penetration - 0.4).abs() < 1e-5);
        assert_eq!(hit.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_aabb_tie_breaks_to_y() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(0.5, 0.5);
        let hit = dispatch(&a, &b).unwrap();
        assert_eq!(hit.normal, Vec2::NEG_Y);
        assert!((hit.penetration - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_touching_boxes_do_not_collide() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(1.0, 0.0);
        assert!(dispatch(&a, &b).is_none());
    }

    #[test]
    fn test_circle_circle_normal_points_to_a() {
        let a = Collider::circle(1.0, Vec2::new(1.5, 0.0));
        let b = Collider::circle(1.0, Vec2::ZERO);
        let hit = dispatch(&a, &b).unwrap();
        assert!((hit.normal - Vec2::X).length() < 1e-6);
        assert!((hit.penetration - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_coincident_circles_fallback_normal() {
        let a = Collider::circle(1.0, Vec2::ZERO);
        let b = Collider::circle(2.0, Vec2::ZERO);
        let hit = dispatch(&a, &b).unwrap();
        assert_eq!(hit.normal, Vec2::X);
        assert!(hit.normal.is_finite());
        assert!((hit.penetration - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_embedded_in_box_uses_nearest_face() {
        let circle = Collider::circle(0.25, Vec2::new(0.9, 0.5));
        let bounds = Collider::aabb(Vec2::ZERO, Vec2::ONE);
        let hit = dispatch(&circle, &bounds).unwrap();
        assert_eq!(hit.normal, Vec2::X);
        let swapped = dispatch(&bounds, &circle).unwrap();
        assert_eq!(swapped.normal, Vec2::NEG_X);
    }

    #[test]
    fn test_capsule_vs_box_from_above() {
        let capsule = Collider::capsule(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), 0.5, Vec2::ZERO)
            .with_pose(Pose::at(Vec2::new(0.0, 1.25)));
        let ground = Collider::aabb(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 1.0));
        let hit = dispatch(&capsule, &ground).unwrap();
        assert!((hit.normal - Vec2::Y).length() < 1e-5);
        assert!((hit.penetration - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_capsule_vs_capsule_parallel() {
        let a = Collider::capsule(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), 0.5, Vec2::ZERO);
        let b = Collider::capsule(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), 0.5, Vec2::ZERO)
            .with_pose(Pose::at(Vec2::new(0.8, 0.0)));
        let hit = dispatch(&a, &b).unwrap();
        assert!((hit.normal - Vec2::NEG_X).length() < 1e-5);
        assert!((hit.penetration - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_capsule_circle_swap_negates() {
        let capsule = Collider::capsule(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), 0.5, Vec2::ZERO);
        let circle = Collider::circle(0.5, Vec2::new(0.75, 0.0));
        let ab = dispatch(&capsule, &circle).unwrap();
        let ba = dispatch(&circle, &capsule).unwrap();
        assert_eq!(ab.normal, -ba.normal);
        assert!((ab.penetration - ba.penetration).abs() < 1e-6);
    }

    #[test]
    fn test_trigger_zeroes_penetration() {
        let trigger = unit_box_at(0.0, 0.0).with_trigger(true, false);
        let other = unit_box_at(0.5, 0.0);
        let hit = dispatch(&trigger, &other).unwrap();
        assert_eq!(hit.penetration, 0.0);
        assert!(!trigger.has_triggered());
    }

    #[test]
    fn test_fire_once_trigger_consumed_after_first_hit() {
        let trigger = unit_box_at(0.0, 0.0).with_trigger(true, true);
        let other = unit_box_at(0.5, 0.0);
        let first = dispatch(&trigger, &other).unwrap();
        assert_eq!(first.penetration, 0.0);
        assert!(trigger.has_triggered());
        assert!(dispatch(&trigger, &other).is_none());
        assert!(dispatch(&other, &trigger).is_none());
    }

    #[test]
    fn test_closest_points_crossing_segments() {
        let (p, q) = closest_points_on_segments(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(p.length() < 1e-6);
        assert!(q.length() < 1e-6);
    }
}
