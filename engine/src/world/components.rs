//! Physics-facing components
//!
//! [`Transform`] is the pose gameplay code owns. [`ColliderComponent`] and
//! [`RigidBodyComponent`] wrap the physics objects together with their
//! authoring state and late-binding flags.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::physics::collider::{ALL_LAYERS, Collider, ColliderKind, ColliderShape, MAX_LAYER, Pose};
use crate::physics::rigid_body::RigidBody;

/// World pose of an entity. Physics writes position and rotation, never scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec2,
    pub scale: Vec2,
    /// Radians
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Position and scale as seen by colliders.
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.scale)
    }
}

impl From<&Transform> for Pose {
    fn from(transform: &Transform) -> Self {
        transform.pose()
    }
}

// ============================================================================
// Collider component
// ============================================================================

/// Callback invoked with `(owner, other)` entity ids.
pub type TriggerCallback = Box<dyn FnMut(EntityId, EntityId)>;

/// Owns an optional [`Collider`] plus the data needed to (re)create it.
///
/// Trigger and layer settings made here are mirrored onto the collider
/// whenever it is replaced or lazily created.
pub struct ColliderComponent {
    collider: Option<Collider>,
    requested_kind: ColliderKind,
    padding: f32,
    fit_size: Option<Vec2>,
    is_trigger: bool,
    fire_once: bool,
    layer: u32,
    collision_mask: u32,
    on_trigger_enter: Option<TriggerCallback>,
    on_trigger_exit: Option<TriggerCallback>,
}

impl fmt::Debug for ColliderComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColliderComponent")
            .field("collider", &self.collider)
            .field("requested_kind", &self.requested_kind)
            .field("is_trigger", &self.is_trigger)
            .field("fire_once", &self.fire_once)
            .field("has_enter_callback", &self.on_trigger_enter.is_some())
            .field("has_exit_callback", &self.on_trigger_exit.is_some())
            .finish_non_exhaustive()
    }
}

impl ColliderComponent {
    /// Wraps an existing collider, adopting its trigger and layer settings.
    pub fn new(collider: Collider) -> Self {
        Self {
            requested_kind: collider.kind(),
            padding: 0.0,
            fit_size: None,
            is_trigger: collider.is_trigger(),
            fire_once: collider.fires_once(),
            layer: collider.layer(),
            collision_mask: collider.collision_mask(),
            collider: Some(collider),
            on_trigger_enter: None,
            on_trigger_exit: None,
        }
    }

    /// A component whose collider is created lazily by [`ColliderComponent::ensure_collider`].
    pub fn deferred(kind: ColliderKind, padding: f32) -> Self {
        Self {
            collider: None,
            requested_kind: kind,
            padding,
            fit_size: None,
            is_trigger: false,
            fire_once: false,
            layer: 0,
            collision_mask: ALL_LAYERS,
            on_trigger_enter: None,
            on_trigger_exit: None,
        }
    }

    /// Size the lazily created collider is fitted to.
    pub fn with_fit_size(mut self, size: Vec2) -> Self {
        self.fit_size = Some(size);
        self
    }

    pub fn with_trigger(mut self, is_trigger: bool, fire_once: bool) -> Self {
        self.set_trigger(is_trigger, fire_once);
        self
    }

    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref()
    }

    pub fn collider_mut(&mut self) -> Option<&mut Collider> {
        self.collider.as_mut()
    }

    /// Replaces the collider and mirrors the component's trigger and layer settings onto it.
    pub fn set_collider(&mut self, collider: Collider) {
        let mut collider = collider;
        self.apply_authoring(&mut collider);
        self.collider = Some(collider);
    }

    pub fn requested_kind(&self) -> ColliderKind {
        self.requested_kind
    }

    pub fn padding(&self) -> f32 {
        self.padding
    }

    fn apply_authoring(&self, collider: &mut Collider) {
        collider.set_trigger(self.is_trigger, self.fire_once);
        collider.set_layer(self.layer);
        collider.set_collision_mask(self.collision_mask);
    }

    /// Creates the collider if missing and binds it to `transform`.
    ///
    /// Safe to call every frame; rebinding only copies the pose.
    pub fn ensure_collider(&mut self, transform: Option<&Transform>) -> Option<&mut Collider> {
        if self.collider.is_none() {
            let mut collider = Collider::new(ColliderShape::empty(self.requested_kind));
            self.apply_authoring(&mut collider);
            self.collider = Some(collider);
            if let Some(size) = self.fit_size {
                self.fit_to_size(size, self.padding);
            }
        }
        let collider = self.collider.as_mut()?;
        if let Some(transform) = transform {
            collider.set_pose(transform.pose());
        }
        Some(collider)
    }

    /// Fits a box or circle collider to a `size` rectangle anchored at the local origin.
    ///
    /// Non-negative padding grows the box on every side. Negative padding
    /// insets it while keeping the bottom edge at `y = 0`, never below
    /// 1 unit per axis. Circles are centered on the rectangle with radius
    /// `max(0.5 * max(w, h) + padding, 1)`. Returns `false` for capsules or
    /// when there is no collider yet.
    pub fn fit_to_size(&mut self, size: Vec2, padding: f32) -> bool {
        let Some(collider) = self.collider.as_mut() else {
            return false;
        };
        match collider.kind() {
            ColliderKind::Aabb => {
                if padding >= 0.0 {
                    let pad = Vec2::splat(padding);
                    collider.set_local_bounds(-pad, size + pad);
                } else {
                    let inset = padding.abs();
                    let min = Vec2::new(inset, 0.0);
                    let mut max = size - Vec2::splat(inset);
                    max.x = max.x.max(min.x + 1.0);
                    max.y = max.y.max(min.y + 1.0);
                    collider.set_local_bounds(min, max);
                }
                true
            }
            ColliderKind::Circle => {
                let radius = 0.5 * size.x.max(size.y) + padding;
                collider.set_radius(radius.max(1.0));
                collider.set_offset(size * 0.5);
                true
            }
            ColliderKind::Capsule => false,
        }
    }

    // ========================================================================
    // Trigger and layer authoring
    // ========================================================================

    pub fn set_trigger(&mut self, is_trigger: bool, fire_once: bool) {
        self.is_trigger = is_trigger;
        self.fire_once = fire_once;
        if let Some(collider) = self.collider.as_mut() {
            collider.set_trigger(is_trigger, fire_once);
        }
    }

    pub fn is_trigger(&self) -> bool {
        self.collider
            .as_ref()
            .map_or(self.is_trigger, Collider::is_trigger)
    }

    /// Sets the layer, clamped to `0..=31`.
    pub fn set_layer(&mut self, layer: u32) {
        self.layer = layer.min(MAX_LAYER);
        if let Some(collider) = self.collider.as_mut() {
            collider.set_layer(layer);
        }
    }

    pub fn set_collision_mask(&mut self, mask: u32) {
        self.collision_mask = mask;
        if let Some(collider) = self.collider.as_mut() {
            collider.set_collision_mask(mask);
        }
    }

    // ========================================================================
    // Trigger callbacks
    // ========================================================================

    pub fn set_on_trigger_enter<F>(&mut self, callback: F)
    where
        F: FnMut(EntityId, EntityId) + 'static,
    {
        self.on_trigger_enter = Some(Box::new(callback));
    }

    pub fn set_on_trigger_exit<F>(&mut self, callback: F)
    where
        F: FnMut(EntityId, EntityId) + 'static,
    {
        self.on_trigger_exit = Some(Box::new(callback));
    }

    pub fn invoke_trigger_enter(&mut self, owner: EntityId, other: EntityId) {
        if let Some(callback) = self.on_trigger_enter.as_mut() {
            callback(owner, other);
        }
    }

    pub fn invoke_trigger_exit(&mut self, owner: EntityId, other: EntityId) {
        if let Some(callback) = self.on_trigger_exit.as_mut() {
            callback(owner, other);
        }
    }
}

impl From<Collider> for ColliderComponent {
    fn from(collider: Collider) -> Self {
        Self::new(collider)
    }
}

// ============================================================================
// Rigid body component
// ============================================================================

/// A [`RigidBody`] plus its binding state.
#[derive(Debug, Default)]
pub struct RigidBodyComponent {
    body: RigidBody,
    bound: bool,
}

impl RigidBodyComponent {
    pub fn new(body: RigidBody) -> Self {
        Self { body, bound: false }
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }

    /// Replaces the body; it is rebound on the next sync.
    pub fn set_body(&mut self, body: RigidBody) {
        self.body = body;
        self.bound = false;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Copies the transform pose into the body.
    ///
    /// Dynamic bodies copy once and own their pose afterwards; static and
    /// kinematic bodies follow the transform on every call.
    pub fn bind(&mut self, transform: Option<&Transform>) {
        if self.bound && self.body.is_dynamic() {
            return;
        }
        if let Some(transform) = transform {
            self.body.set_position(transform.position);
            self.body.set_rotation(transform.rotation);
        }
        self.bound = true;
    }
}

impl From<RigidBody> for RigidBodyComponent {
    fn from(body: RigidBody) -> Self {
        Self::new(body)
    }
}
