//! Scene queries: ray casts, shape sweeps and circle overlaps
//!
//! Pure queries over a [`World`], independent of the per-step engine. They
//! read each collider's last synced pose and never change trigger state.
//!
//! # Sweeps
//!
//! [`box_cast`] and [`capsule_cast`] first intersect the sweep ray with each
//! target's bounds grown by the moving shape's half size. The narrow phase
//! then brackets the first contact by marching from that entry distance,
//! and a short bisection tightens the bracket. The returned distance is
//! always a touching position, so the reported normal and contact point
//! come from a real narrow-phase hit.
//!
//! # Example
//!
//! ```ignore
//! use gl2d_engine::physics::casts::{ray_cast, CastFilter};
//! use glam::Vec2;
//!
//! let ground = ray_cast(feet, Vec2::NEG_Y, 4.0, &world, &CastFilter::ignoring(player));
//! if let Some(hit) = ground {
//!     println!("ground {} units below", hit.distance);
//! }
//! ```

use glam::Vec2;

use super::aabb::Aabb;
use super::collider::{ALL_LAYERS, Collider, ColliderShape, Pose};
use super::collision::{self, Hit, closest_points_on_segments, inscribed_radius};
use super::types::{closest_point_on_segment, normalize_or};
use crate::world::{EntityId, World};

/// Tolerance for degenerate directions and parallel ray slabs.
const CAST_EPSILON: f32 = 1e-5;

/// Distance used when a cast is given a non-positive `max_distance`.
pub const DEFAULT_CAST_DISTANCE: f32 = 1e6;

/// Narrow-phase samples used to bracket the first contact of a sweep.
const SWEEP_SAMPLES: u32 = 8;

/// Bisection steps run inside the bracket.
const SWEEP_REFINE_ITERATIONS: u32 = 4;

/// Which colliders a cast may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastFilter {
    /// Entity whose colliders are skipped (usually the caster)
    pub ignore: Option<EntityId>,
    pub include_triggers: bool,
    /// Bit set of layers that may be hit
    pub layer_mask: u32,
}

impl Default for CastFilter {
    fn default() -> Self {
        Self {
            ignore: None,
            include_triggers: false,
            layer_mask: ALL_LAYERS,
        }
    }
}

impl CastFilter {
    /// Default filter that skips `entity`.
    pub fn ignoring(entity: EntityId) -> Self {
        Self {
            ignore: Some(entity),
            ..Self::default()
        }
    }

    pub fn with_triggers(mut self) -> Self {
        self.include_triggers = true;
        self
    }

    pub fn with_layer_mask(mut self, mask: u32) -> Self {
        self.layer_mask = mask;
        self
    }

    fn skips(&self, id: EntityId, collider: &Collider) -> bool {
        self.ignore == Some(id)
            || (!self.include_triggers && collider.is_trigger())
            || self.layer_mask & collider.layer_bit() == 0
    }
}

/// First obstruction found by a ray or sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    pub point: Vec2,
    /// Surface normal facing the caster
    pub normal: Vec2,
    /// Distance travelled along the normalized direction
    pub distance: f32,
    pub entity: EntityId,
}

/// A collider overlapping a query circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapHit {
    pub point: Vec2,
    /// Direction pushing the query circle out of the collider
    pub normal: Vec2,
    pub penetration: f32,
    pub entity: EntityId,
}

fn colliders<'w>(
    world: &'w World,
    filter: &'w CastFilter,
) -> impl Iterator<Item = (EntityId, &'w Collider)> + 'w {
    world.iter().filter_map(move |(id, entity)| {
        let collider = entity.collider()?;
        (!filter.skips(id, collider)).then_some((id, collider))
    })
}

/// Normalized direction and effective max distance, or `None` for a zero direction.
fn cast_setup(direction: Vec2, max_distance: f32) -> Option<(Vec2, f32)> {
    let len = direction.length();
    if len < CAST_EPSILON {
        return None;
    }
    let max = if max_distance > 0.0 {
        max_distance
    } else {
        DEFAULT_CAST_DISTANCE
    };
    Some((direction / len, max))
}

// ============================================================================
// Ray primitives
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct RayHit {
    t: f32,
    point: Vec2,
    normal: Vec2,
}

/// Entry and exit distances of a ray through a box.
#[derive(Debug, Clone, Copy)]
struct RaySpan {
    enter: f32,
    exit: f32,
    /// Face normal at entry; `-dir` when the ray starts inside
    normal: Vec2,
}

/// Slab test clipped to `[0, max_distance]`.
fn ray_vs_aabb_span(origin: Vec2, dir: Vec2, bounds: &Aabb, max_distance: f32) -> Option<RaySpan> {
    let mut t_min = 0.0f32;
    let mut t_max = max_distance;
    let mut normal = Vec2::ZERO;

    for axis in 0..2 {
        let (d, o, lo, hi) = (dir[axis], origin[axis], bounds.min[axis], bounds.max[axis]);
        if d.abs() < CAST_EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (mut t1, mut t2) = ((lo - o) * inv, (hi - o) * inv);
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_min {
            t_min = t1;
            normal = Vec2::ZERO;
            normal[axis] = if d > 0.0 { -1.0 } else { 1.0 };
        }
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    if t_min > max_distance {
        return None;
    }
    if normal == Vec2::ZERO {
        normal = -dir;
    }
    Some(RaySpan {
        enter: t_min,
        exit: t_max,
        normal,
    })
}

fn ray_vs_aabb(origin: Vec2, dir: Vec2, bounds: &Aabb, max_distance: f32) -> Option<RayHit> {
    let span = ray_vs_aabb_span(origin, dir, bounds, max_distance)?;
    Some(RayHit {
        t: span.enter,
        point: origin + dir * span.enter,
        normal: span.normal,
    })
}

fn ray_vs_circle(
    origin: Vec2,
    dir: Vec2,
    center: Vec2,
    radius: f32,
    max_distance: f32,
) -> Option<RayHit> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;

    if c <= 0.0 {
        return Some(RayHit {
            t: 0.0,
            point: origin,
            normal: normalize_or(m, -dir),
        });
    }
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 || t > max_distance {
        return None;
    }
    let point = origin + dir * t;
    Some(RayHit {
        t,
        point,
        normal: normalize_or(point - center, -dir),
    })
}

/// Ray vs capsule through the closest approach of the ray and the segment,
/// backed off to the capsule surface.
fn ray_vs_capsule(
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    seg_a: Vec2,
    seg_b: Vec2,
    radius: f32,
) -> Option<RayHit> {
    let ray_end = origin + dir * max_distance;
    let (on_segment, on_ray) = closest_points_on_segments(seg_a, seg_b, origin, ray_end);
    let dist_sq = (on_segment - on_ray).length_squared();
    if dist_sq > radius * radius {
        return None;
    }

    let closest_t = (on_ray - origin).dot(dir);
    let t = (closest_t - (radius * radius - dist_sq).max(0.0).sqrt()).max(0.0);
    if t > max_distance {
        return None;
    }
    let point = origin + dir * t;
    let surface = closest_point_on_segment(seg_a, seg_b, point);
    Some(RayHit {
        t,
        point,
        normal: normalize_or(point - surface, -dir),
    })
}

fn ray_vs_collider(origin: Vec2, dir: Vec2, collider: &Collider, max_distance: f32) -> Option<RayHit> {
    match collider.shape() {
        ColliderShape::Aabb { .. } => ray_vs_aabb(origin, dir, &collider.world_aabb(), max_distance),
        ColliderShape::Circle { .. } => {
            let bounds = collider.world_aabb();
            ray_vs_circle(origin, dir, bounds.center(), inscribed_radius(&bounds), max_distance)
        }
        ColliderShape::Capsule { .. } => {
            let (a, b) = collider.world_segment()?;
            let radius = inscribed_radius(&collider.world_aabb());
            ray_vs_capsule(origin, dir, max_distance, a, b, radius)
        }
    }
}

/// Closest collider hit by a ray.
///
/// A zero `direction` never hits; a non-positive `max_distance` means
/// [`DEFAULT_CAST_DISTANCE`].
pub fn ray_cast(
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    world: &World,
    filter: &CastFilter,
) -> Option<CastHit> {
    let (dir, max) = cast_setup(direction, max_distance)?;
    let mut closest = max;
    let mut best = None;

    for (id, collider) in colliders(world, filter) {
        if let Some(hit) = ray_vs_collider(origin, dir, collider, closest) {
            closest = hit.t;
            best = Some(CastHit {
                point: hit.point,
                normal: hit.normal,
                distance: hit.t,
                entity: id,
            });
        }
    }
    best
}

// ============================================================================
// Sweeps
// ============================================================================

/// Narrow-phase test of `moving` placed at `offset` against `target`,
/// leaving the target's fire-once latch as it was.
fn probe(moving: &mut Collider, offset: Vec2, target: &Collider) -> Option<Hit> {
    moving.set_pose(Pose::at(offset));
    let was_triggered = target.has_triggered();
    let hit = collision::dispatch(moving, target);
    target.set_triggered(was_triggered);
    hit.filter(|h| h.collided)
}

/// First touching distance of `moving` swept along `dir` against `target`.
fn sweep_against(
    moving: &mut Collider,
    start_center: Vec2,
    half_size: Vec2,
    dir: Vec2,
    max_distance: f32,
    target: &Collider,
) -> Option<(f32, Hit, RaySpan)> {
    let expanded = target.world_aabb().expanded_by(half_size);
    let span = ray_vs_aabb_span(start_center, dir, &expanded, max_distance)?;
    let end = span.exit.min(max_distance);

    // The narrow phase cannot touch before the expanded bounds are entered.
    let (mut lo, mut hi) = if probe(moving, dir * span.enter, target).is_some() {
        (span.enter, span.enter)
    } else {
        let step = (end - span.enter) / SWEEP_SAMPLES as f32;
        let mut previous = span.enter;
        let mut bracket = None;
        for i in 1..=SWEEP_SAMPLES {
            let d = span.enter + step * i as f32;
            if probe(moving, dir * d, target).is_some() {
                bracket = Some((previous, d));
                break;
            }
            previous = d;
        }
        bracket?
    };

    for _ in 0..SWEEP_REFINE_ITERATIONS {
        if hi - lo <= CAST_EPSILON {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if probe(moving, dir * mid, target).is_some() {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    let hit = probe(moving, dir * hi, target)?;
    Some((hi, hit, span))
}

/// Sweeps `moving` (positioned in world space at distance 0) and keeps the closest hit.
fn sweep(
    mut moving: Collider,
    direction: Vec2,
    max_distance: f32,
    world: &World,
    filter: &CastFilter,
) -> Option<CastHit> {
    let (dir, max) = cast_setup(direction, max_distance)?;
    let start = moving.world_aabb();
    let (start_center, half_size) = (start.center(), start.half_extents());

    let mut closest = max;
    let mut best = None;
    for (id, target) in colliders(world, filter) {
        let Some((distance, hit, span)) =
            sweep_against(&mut moving, start_center, half_size, dir, closest, target)
        else {
            continue;
        };
        if distance > closest {
            continue;
        }
        closest = distance;
        let point = if hit.contact_point.length_squared() > 0.0 {
            hit.contact_point
        } else {
            start_center + dir * distance
        };
        best = Some(CastHit {
            point,
            normal: normalize_or(hit.normal, span.normal),
            distance,
            entity: id,
        });
    }
    best
}

/// Sweeps the axis-aligned `bounds` along `direction`.
pub fn box_cast(
    bounds: Aabb,
    direction: Vec2,
    max_distance: f32,
    world: &World,
    filter: &CastFilter,
) -> Option<CastHit> {
    sweep(
        Collider::aabb(bounds.min, bounds.max),
        direction,
        max_distance,
        world,
        filter,
    )
}

/// Sweeps the capsule `a..b` with `radius` along `direction`.
pub fn capsule_cast(
    a: Vec2,
    b: Vec2,
    radius: f32,
    direction: Vec2,
    max_distance: f32,
    world: &World,
    filter: &CastFilter,
) -> Option<CastHit> {
    sweep(
        Collider::capsule(a, b, radius, Vec2::ZERO),
        direction,
        max_distance,
        world,
        filter,
    )
}

// ============================================================================
// Overlaps
// ============================================================================

/// Every collider overlapping the circle, touching included.
pub fn overlap_circle(
    center: Vec2,
    radius: f32,
    world: &World,
    filter: &CastFilter,
) -> Vec<OverlapHit> {
    if radius <= 0.0 {
        return Vec::new();
    }

    colliders(world, filter)
        .filter_map(|(id, collider)| {
            let (point, normal, penetration) = overlap_collider(center, radius, collider)?;
            Some(OverlapHit {
                point,
                normal,
                penetration,
                entity: id,
            })
        })
        .collect()
}

fn overlap_collider(center: Vec2, radius: f32, collider: &Collider) -> Option<(Vec2, Vec2, f32)> {
    let bounds = collider.world_aabb();
    match collider.shape() {
        ColliderShape::Aabb { .. } => {
            let closest = bounds.closest_point(center);
            let diff = center - closest;
            let dist_sq = diff.length_squared();
            if dist_sq > radius * radius {
                return None;
            }
            let normal = normalize_or(diff, Vec2::X);
            Some((closest, normal, radius - dist_sq.sqrt()))
        }
        ColliderShape::Circle { .. } => {
            let other_center = bounds.center();
            let other_radius = inscribed_radius(&bounds);
            let diff = center - other_center;
            let dist = diff.length();
            let sum = radius + other_radius;
            if dist > sum {
                return None;
            }
            let normal = normalize_or(diff, Vec2::X);
            Some((other_center + normal * other_radius, normal, sum - dist))
        }
        ColliderShape::Capsule { .. } => {
            let (a, b) = collider.world_segment()?;
            let capsule_radius = inscribed_radius(&bounds);
            let closest = closest_point_on_segment(a, b, center);
            let diff = center - closest;
            let dist = diff.length();
            let sum = radius + capsule_radius;
            if dist > sum {
                return None;
            }
            let normal = normalize_or(diff, Vec2::X);
            Some((closest + normal * capsule_radius, normal, sum - dist))
        }
    }
}
