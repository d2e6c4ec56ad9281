//! World Module
//!
//! The entity store the physics systems run against. Entities live in a
//! generational [`SlotMap`], so ids stay valid handles across despawns and
//! iteration order is stable while membership is unchanged.

pub mod components;
pub mod entity;

pub use components::{ColliderComponent, RigidBodyComponent, Transform, TriggerCallback};
pub use entity::{Component, Entity, EntityId};

use slotmap::SlotMap;

/// Owns every entity in a scene.
#[derive(Debug, Default)]
pub struct World {
    entities: SlotMap<EntityId, Entity>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
        }
    }

    /// Adds an entity, binding its colliders and body first.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        entity.sync_physics();
        self.entities.insert(entity)
    }

    /// Removes an entity. Callers running a [`crate::physics::TriggerSystem`]
    /// should also unregister the id there.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Two distinct entities borrowed mutably at once.
    ///
    /// Returns `None` if either id is stale or both ids are the same.
    pub fn pair_mut(&mut self, a: EntityId, b: EntityId) -> Option<(&mut Entity, &mut Entity)> {
        self.entities
            .get_disjoint_mut([a, b])
            .map(|[first, second]| (first, second))
    }

    /// Snapshot of all ids in iteration order.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut Entity)> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Re-runs [`Entity::sync_physics`] on every entity.
    pub fn sync_physics(&mut self) {
        for (_, entity) in self.entities.iter_mut() {
            entity.sync_physics();
        }
    }
}
