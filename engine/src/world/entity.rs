//! Entities and typed component slots
//!
//! An [`Entity`] holds at most one component of each physics-relevant type.
//! Systems look components up through [`Entity::get`] / [`Entity::get_mut`],
//! and a missing component just means the entity sits out that system.

use glam::Vec2;
use slotmap::new_key_type;

use super::components::{ColliderComponent, RigidBodyComponent, Transform};
use crate::physics::collider::Collider;
use crate::physics::hinge::Hinge;
use crate::physics::rigid_body::RigidBody;
use crate::physics::water::{WaterState, WaterVolume};

new_key_type! {
    /// Generational handle to an entity in a [`super::World`].
    pub struct EntityId;
}

/// A type that occupies one slot on an [`Entity`].
pub trait Component: Sized + 'static {
    fn slot(entity: &Entity) -> &Option<Self>;
    fn slot_mut(entity: &mut Entity) -> &mut Option<Self>;
}

macro_rules! component_slot {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn slot(entity: &Entity) -> &Option<Self> {
                &entity.$field
            }

            fn slot_mut(entity: &mut Entity) -> &mut Option<Self> {
                &mut entity.$field
            }
        }
    };
}

/// A bag of optional physics components.
#[derive(Debug, Default)]
pub struct Entity {
    name: String,
    transform: Option<Transform>,
    collider: Option<ColliderComponent>,
    rigid_body: Option<RigidBodyComponent>,
    water_volume: Option<WaterVolume>,
    water_state: Option<WaterState>,
    hinge: Option<Hinge>,
}

component_slot!(Transform, transform);
component_slot!(ColliderComponent, collider);
component_slot!(RigidBodyComponent, rigid_body);
component_slot!(WaterVolume, water_volume);
component_slot!(WaterState, water_state);
component_slot!(Hinge, hinge);

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Component access
    // ========================================================================

    pub fn get<T: Component>(&self) -> Option<&T> {
        T::slot(self).as_ref()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        T::slot_mut(self).as_mut()
    }

    pub fn has<T: Component>(&self) -> bool {
        T::slot(self).is_some()
    }

    /// Stores `component`, returning the one it replaced.
    pub fn insert<T: Component>(&mut self, component: T) -> Option<T> {
        let previous = T::slot_mut(self).replace(component);
        self.sync_physics();
        previous
    }

    /// The component of type `T`, inserted from `make` when missing.
    pub fn get_or_insert_with<T: Component>(&mut self, make: impl FnOnce() -> T) -> &mut T {
        T::slot_mut(self).get_or_insert_with(make)
    }

    pub fn remove<T: Component>(&mut self) -> Option<T> {
        T::slot_mut(self).take()
    }

    /// Builder form of [`Entity::insert`].
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.insert(component);
        self
    }

    /// Shorthand for a [`Transform`] at `position`.
    pub fn at(self, position: Vec2) -> Self {
        self.with(Transform::from_position(position))
    }

    /// Shorthand for a [`ColliderComponent`] wrapping `collider`.
    pub fn with_collider(self, collider: Collider) -> Self {
        self.with(ColliderComponent::new(collider))
    }

    /// Shorthand for a [`RigidBodyComponent`] wrapping `body`.
    pub fn with_body(self, body: RigidBody) -> Self {
        self.with(RigidBodyComponent::new(body))
    }

    /// The live collider, if the entity has a collider component that created one.
    pub fn collider(&self) -> Option<&Collider> {
        self.collider.as_ref().and_then(ColliderComponent::collider)
    }

    pub fn body(&self) -> Option<&RigidBody> {
        self.rigid_body.as_ref().map(RigidBodyComponent::body)
    }

    pub fn body_mut(&mut self) -> Option<&mut RigidBody> {
        self.rigid_body.as_mut().map(RigidBodyComponent::body_mut)
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Creates missing colliders and binds collider and body to the transform.
    ///
    /// Idempotent; the engine and systems call it on every pass.
    pub fn sync_physics(&mut self) {
        let transform = self.transform.as_ref();
        if let Some(collider) = self.collider.as_mut() {
            collider.ensure_collider(transform);
        }
        if let Some(body) = self.rigid_body.as_mut() {
            body.bind(transform);
        }
    }

    /// Integrates the rigid body (if any) and pushes its pose outward.
    pub fn integrate_body(&mut self, dt: f32) {
        let Some(body) = self.rigid_body.as_mut() else {
            return;
        };
        body.body_mut().integrate(dt);
        self.push_body_pose();
    }

    /// Writes the body position/rotation into the transform and rebinds the collider.
    ///
    /// Entities without a transform keep their collider where it is.
    pub fn push_body_pose(&mut self) {
        let Some(body) = self.rigid_body.as_ref().map(RigidBodyComponent::body) else {
            return;
        };
        let Some(transform) = self.transform.as_mut() else {
            return;
        };
        transform.position = body.position();
        transform.rotation = body.rotation();
        if let Some(collider) = self.collider.as_mut() {
            collider.ensure_collider(Some(&*transform));
        }
    }

    /// Moves the entity, keeping transform, body and collider in agreement.
    pub fn teleport(&mut self, position: Vec2) {
        if let Some(transform) = self.transform.as_mut() {
            transform.position = position;
        }
        if let Some(body) = self.body_mut() {
            body.set_position(position);
        }
        let transform = self.transform.as_ref();
        if let Some(collider) = self.collider.as_mut() {
            collider.ensure_collider(transform);
        }
    }
}
