//! Trigger enter/exit tracking
//!
//! [`TriggerSystem::update`] tests every pair of colliders where at least one
//! side is a trigger and keeps the set of pairs currently overlapping. Enter
//! callbacks fire when a pair joins the set, exit callbacks when it leaves.
//!
//! # Example
//!
//! ```ignore
//! let mut triggers = TriggerSystem::new();
//! loop {
//!     engine.advance(frame_dt, &mut world);
//!     triggers.update(&mut world);
//! }
//! ```

use std::collections::HashSet;

use tracing::trace;

use super::collision;
use crate::world::{ColliderComponent, EntityId, World};

/// Unordered entity pair, stored smallest id first.
type PairKey = (EntityId, EntityId);

fn pair_key(a: EntityId, b: EntityId) -> PairKey {
    if a < b { (a, b) } else { (b, a) }
}

/// Tracks overlapping trigger pairs across frames.
#[derive(Debug, Default)]
pub struct TriggerSystem {
    active: HashSet<PairKey>,
}

impl TriggerSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every active pair without firing callbacks.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Drops every pair involving `id`. No exit callbacks fire.
    pub fn unregister_entity(&mut self, id: EntityId) {
        self.active.retain(|&(a, b)| a != id && b != id);
    }

    pub fn is_active(&self, a: EntityId, b: EntityId) -> bool {
        self.active.contains(&pair_key(a, b))
    }

    pub fn active_pairs(&self) -> impl Iterator<Item = PairKey> + '_ {
        self.active.iter().copied()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Runs one overlap pass over every entity with a collider.
    pub fn update(&mut self, world: &mut World) {
        world.sync_physics();
        let ids: Vec<EntityId> = world
            .iter()
            .filter(|(_, entity)| entity.collider().is_some())
            .map(|(id, _)| id)
            .collect();

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                self.update_pair(world, a, b);
            }
        }
    }

    fn update_pair(&mut self, world: &mut World, id_a: EntityId, id_b: EntityId) {
        let key = pair_key(id_a, id_b);
        let was_active = self.active.contains(&key);

        let (Some(a), Some(b)) = (
            world.get(id_a).and_then(|e| e.collider()),
            world.get(id_b).and_then(|e| e.collider()),
        ) else {
            return;
        };

        // A collider can stop being a trigger mid-overlap.
        if !a.is_trigger() && !b.is_trigger() {
            self.active.remove(&key);
            return;
        }

        let a_fired_before = a.is_consumed();
        let b_fired_before = b.is_consumed();
        let mut overlapping = collision::dispatch(a, b).is_some_and(|hit| hit.collided);
        // Consumed fire-once triggers stop reporting hits; keep the pair
        // alive on bounds alone so no false exit fires.
        if !overlapping && was_active {
            overlapping = a.world_aabb().overlaps(&b.world_aabb());
        }

        if overlapping {
            if self.active.insert(key) {
                trace!(?id_a, ?id_b, "trigger enter");
                if !a_fired_before {
                    invoke(world, id_a, id_b, ColliderComponent::invoke_trigger_enter);
                }
                if !b_fired_before {
                    invoke(world, id_b, id_a, ColliderComponent::invoke_trigger_enter);
                }
            }
        } else if was_active {
            self.active.remove(&key);
            trace!(?id_a, ?id_b, "trigger exit");
            invoke(world, id_a, id_b, ColliderComponent::invoke_trigger_exit);
            invoke(world, id_b, id_a, ColliderComponent::invoke_trigger_exit);
        }
    }
}

fn invoke(
    world: &mut World,
    owner: EntityId,
    other: EntityId,
    callback: fn(&mut ColliderComponent, EntityId, EntityId),
) {
    if let Some(component) = world
        .get_mut(owner)
        .and_then(|e| e.get_mut::<ColliderComponent>())
    {
        callback(component, owner, other);
    }
}
