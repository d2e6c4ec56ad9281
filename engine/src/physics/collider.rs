//! Collider shapes
//!
//! A [`Collider`] is one of three closed shape kinds (box, circle, capsule)
//! described in local space, plus trigger and layer state shared by all
//! kinds. The owning entity's transform is bound late as a [`Pose`] copy;
//! an unbound collider treats its local shape as world space.

use std::cell::Cell;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

use super::aabb::Aabb;
use super::collision::{self, Hit};

/// Highest valid collision layer; layers index bits of a `u32` mask.
pub const MAX_LAYER: u32 = 31;

/// Mask that collides with every layer.
pub const ALL_LAYERS: u32 = u32::MAX;

const_assert!(MAX_LAYER < u32::BITS);

/// Shape kind tag, used for routing and for lazily created colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColliderKind {
    #[default]
    Aabb,
    Circle,
    Capsule,
}

/// Local-space shape definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Box with local corners; world box = position + corner * scale.
    Aabb { min: Vec2, max: Vec2 },
    /// Circle around a local center offset.
    Circle { radius: f32, offset: Vec2 },
    /// Segment `a..b` (relative to `offset`) swept by `radius`.
    Capsule {
        a: Vec2,
        b: Vec2,
        radius: f32,
        offset: Vec2,
    },
}

impl ColliderShape {
    pub fn kind(&self) -> ColliderKind {
        match self {
            ColliderShape::Aabb { .. } => ColliderKind::Aabb,
            ColliderShape::Circle { .. } => ColliderKind::Circle,
            ColliderShape::Capsule { .. } => ColliderKind::Capsule,
        }
    }

    /// Zero-size shape of the given kind.
    pub fn empty(kind: ColliderKind) -> Self {
        match kind {
            ColliderKind::Aabb => ColliderShape::Aabb {
                min: Vec2::ZERO,
                max: Vec2::ZERO,
            },
            ColliderKind::Circle => ColliderShape::Circle {
                radius: 0.0,
                offset: Vec2::ZERO,
            },
            ColliderKind::Capsule => ColliderShape::Capsule {
                a: Vec2::ZERO,
                b: Vec2::ZERO,
                radius: 0.0,
                offset: Vec2::ZERO,
            },
        }
    }
}

/// Position and scale read from the owning transform.
///
/// Rotation is ignored by every shape; contacts treat shapes as non-rotating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub scale: Vec2,
}

impl Pose {
    pub fn new(position: Vec2, scale: Vec2) -> Self {
        Self { position, scale }
    }

    /// Unscaled pose at `position`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::ONE,
        }
    }

    /// Largest scale component, used to keep scaled radii conservative.
    fn radius_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

/// A collision shape with trigger and layer state.
#[derive(Debug, Clone)]
pub struct Collider {
    shape: ColliderShape,
    pose: Option<Pose>,
    is_trigger: bool,
    fire_once: bool,
    // Latched by dispatch through a shared reference.
    triggered: Cell<bool>,
    layer: u32,
    collision_mask: u32,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        let shape = match shape {
            ColliderShape::Aabb { min, max } => ColliderShape::Aabb {
                min: min.min(max),
                max: min.max(max),
            },
            other => other,
        };
        Self {
            shape,
            pose: None,
            is_trigger: false,
            fire_once: false,
            triggered: Cell::new(false),
            layer: 0,
            collision_mask: ALL_LAYERS,
        }
    }

    /// Box collider from two local corners (sorted per axis).
    pub fn aabb(min: Vec2, max: Vec2) -> Self {
        Self::new(ColliderShape::Aabb { min, max })
    }

    pub fn circle(radius: f32, offset: Vec2) -> Self {
        Self::new(ColliderShape::Circle { radius, offset })
    }

    pub fn capsule(a: Vec2, b: Vec2, radius: f32, offset: Vec2) -> Self {
        Self::new(ColliderShape::Capsule {
            a,
            b,
            radius,
            offset,
        })
    }

    /// Builder form of [`Collider::set_pose`].
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Builder form of [`Collider::set_trigger`].
    pub fn with_trigger(mut self, is_trigger: bool, fire_once: bool) -> Self {
        self.set_trigger(is_trigger, fire_once);
        self
    }

    /// Builder form of [`Collider::set_layer`].
    pub fn with_layer(mut self, layer: u32) -> Self {
        self.set_layer(layer);
        self
    }

    pub fn kind(&self) -> ColliderKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut ColliderShape {
        &mut self.shape
    }

    /// Replaces the local box corners, re-sorting them. No-op on other kinds.
    pub fn set_local_bounds(&mut self, a: Vec2, b: Vec2) {
        if let ColliderShape::Aabb { min, max } = &mut self.shape {
            *min = a.min(b);
            *max = a.max(b);
        }
    }

    /// Sets the radius of a circle or capsule. No-op on boxes.
    pub fn set_radius(&mut self, value: f32) {
        match &mut self.shape {
            ColliderShape::Circle { radius, .. } | ColliderShape::Capsule { radius, .. } => {
                *radius = value;
            }
            ColliderShape::Aabb { .. } => {}
        }
    }

    /// Sets the local center offset of a circle or capsule. No-op on boxes.
    pub fn set_offset(&mut self, value: Vec2) {
        match &mut self.shape {
            ColliderShape::Circle { offset, .. } | ColliderShape::Capsule { offset, .. } => {
                *offset = value;
            }
            ColliderShape::Aabb { .. } => {}
        }
    }

    // ========================================================================
    // Transform binding
    // ========================================================================

    /// Binds (or rebinds) the owner pose. Rebinding is cheap and idempotent.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
    }

    pub fn clear_pose(&mut self) {
        self.pose = None;
    }

    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }

    pub fn is_bound(&self) -> bool {
        self.pose.is_some()
    }

    // ========================================================================
    // World-space geometry
    // ========================================================================

    /// World-space bounding box of the shape under the bound pose.
    pub fn world_aabb(&self) -> Aabb {
        match self.shape {
            ColliderShape::Aabb { min, max } => match self.pose {
                Some(pose) => {
                    Aabb::from_corners(min * pose.scale, max * pose.scale).translated(pose.position)
                }
                None => Aabb::new(min, max),
            },
            ColliderShape::Circle { radius, offset } => {
                let (center, radius) = match self.pose {
                    Some(pose) => (
                        pose.position + offset * pose.scale,
                        radius * pose.radius_scale(),
                    ),
                    None => (offset, radius),
                };
                Aabb::from_center(center, Vec2::splat(radius))
            }
            ColliderShape::Capsule { radius, .. } => {
                let (a, b) = self.world_segment().unwrap_or_default();
                let radius = match self.pose {
                    Some(pose) => radius * pose.radius_scale(),
                    None => radius,
                };
                Aabb::from_corners(a, b).expanded(radius.abs())
            }
        }
    }

    /// World-space capsule segment endpoints, or `None` for other kinds.
    pub fn world_segment(&self) -> Option<(Vec2, Vec2)> {
        let ColliderShape::Capsule { a, b, offset, .. } = self.shape else {
            return None;
        };
        let pose = self.pose.unwrap_or_default();
        Some((
            pose.position + (offset + a) * pose.scale,
            pose.position + (offset + b) * pose.scale,
        ))
    }

    // ========================================================================
    // Trigger state
    // ========================================================================

    /// Sets trigger flags; disabling the trigger clears the fired latch.
    pub fn set_trigger(&mut self, is_trigger: bool, fire_once: bool) {
        self.is_trigger = is_trigger;
        self.fire_once = fire_once;
        if !is_trigger {
            self.triggered.set(false);
        }
    }

    pub fn is_trigger(&self) -> bool {
        self.is_trigger
    }

    pub fn fires_once(&self) -> bool {
        self.fire_once
    }

    pub fn has_triggered(&self) -> bool {
        self.triggered.get()
    }

    /// True for a fire-once trigger that has already fired.
    pub fn is_consumed(&self) -> bool {
        self.is_trigger && self.fire_once && self.triggered.get()
    }

    pub fn mark_triggered(&self) {
        self.triggered.set(true);
    }

    /// Re-arms a fire-once trigger.
    pub fn clear_trigger_state(&self) {
        self.triggered.set(false);
    }

    pub(crate) fn set_triggered(&self, value: bool) {
        self.triggered.set(value);
    }

    // ========================================================================
    // Layers
    // ========================================================================

    /// Sets the layer, clamped to `0..=31`.
    pub fn set_layer(&mut self, layer: u32) {
        self.layer = layer.min(MAX_LAYER);
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// Single-bit mask of this collider's layer.
    pub fn layer_bit(&self) -> u32 {
        1u32 << self.layer
    }

    pub fn set_collision_mask(&mut self, mask: u32) {
        self.collision_mask = mask;
    }

    pub fn collision_mask(&self) -> u32 {
        self.collision_mask
    }

    /// Whether this collider's mask includes `other`'s layer.
    pub fn allows_collision_with(&self, other: &Collider) -> bool {
        self.collision_mask & other.layer_bit() != 0
    }

    /// Narrow-phase test against `other`; see [`collision::dispatch`].
    pub fn hit(&self, other: &Collider) -> Option<Hit> {
        collision::dispatch(self, other)
    }
}
