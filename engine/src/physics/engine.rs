//! Per-step physics orchestration
//!
//! [`PhysicsEngine::step`] runs one frame against a [`World`]:
//! 1. gather every entity carrying a rigid body (binding it on the way)
//! 2. integrate dynamic bodies under gravity and their force generators
//! 3. resolve hinge constraints
//! 4. build a quadtree over collider bounds and push penetrating pairs apart
//!
//! Collision response is positional correction plus removal of the inward
//! normal velocity on each side. It is not momentum conserving, which suits
//! arcade platformer movement.

use glam::Vec2;
use tracing::{debug, trace};

use super::aabb::Aabb;
use super::collision;
use super::hinge::{self, Hinge};
use super::quadtree::{Quadtree, QuadtreeConfig};
use super::units;
use crate::config::PhysicsConfig;
use crate::world::{EntityId, RigidBodyComponent, World};

/// Bounds padding applied to any axis narrower than this.
const MIN_WORLD_EXTENT: f32 = 1.0;

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    id: EntityId,
    has_collider: bool,
}

/// Counters from the last [`PhysicsEngine::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub bodies: usize,
    pub hinges: usize,
    pub candidate_pairs: usize,
    pub resolved_pairs: usize,
}

/// Rigid-body simulation driver.
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    gravity: Vec2,
    quadtree: QuadtreeConfig,
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
    entries: Vec<BodyEntry>,
    last_stats: StepStats,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new(units::default_gravity())
    }
}

impl PhysicsEngine {
    /// Creates an engine with `gravity` in world units per second squared.
    pub fn new(gravity: Vec2) -> Self {
        let defaults = PhysicsConfig::default();
        Self {
            gravity,
            quadtree: defaults.quadtree,
            fixed_dt: defaults.fixed_dt,
            max_substeps: defaults.max_substeps,
            accumulator: 0.0,
            entries: Vec::new(),
            last_stats: StepStats::default(),
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            gravity: config.gravity_units(),
            quadtree: config.quadtree,
            fixed_dt: config.fixed_dt,
            max_substeps: config.max_substeps,
            ..Self::new(config.gravity_units())
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    /// Runs as many fixed steps as `elapsed` (plus carried time) covers.
    ///
    /// At most `max_substeps` steps run per call; time beyond that is
    /// dropped. Returns the number of steps taken.
    pub fn advance(&mut self, elapsed: f32, world: &mut World) -> u32 {
        if self.fixed_dt <= 0.0 {
            return 0;
        }
        self.accumulator += elapsed.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.fixed_dt && steps < self.max_substeps {
            self.step(self.fixed_dt, world);
            self.accumulator -= self.fixed_dt;
            steps += 1;
        }
        if self.accumulator >= self.fixed_dt {
            debug!(
                dropped = self.accumulator,
                steps, "physics fell behind, dropping accumulated time"
            );
            self.accumulator = 0.0;
        }
        steps
    }

    /// Advances the simulation by exactly `dt` seconds.
    pub fn step(&mut self, dt: f32, world: &mut World) {
        self.last_stats = StepStats::default();
        self.gather(world);
        self.integrate_bodies(dt, world);
        self.resolve_hinges(world);
        self.resolve_collisions(world);
        debug!(
            bodies = self.last_stats.bodies,
            hinges = self.last_stats.hinges,
            candidates = self.last_stats.candidate_pairs,
            resolved = self.last_stats.resolved_pairs,
            "physics step"
        );
    }

    fn gather(&mut self, world: &mut World) {
        self.entries.clear();
        for (id, entity) in world.iter_mut() {
            if entity.body().is_none() {
                continue;
            }
            entity.sync_physics();
            self.entries.push(BodyEntry {
                id,
                has_collider: entity.collider().is_some(),
            });
        }
        self.last_stats.bodies = self.entries.len();
    }

    fn integrate_bodies(&self, dt: f32, world: &mut World) {
        for entry in &self.entries {
            let Some(entity) = world.get_mut(entry.id) else {
                continue;
            };
            if let Some(body) = entity.body_mut() {
                if body.is_dynamic() && body.mass() > 0.0 {
                    body.apply_force(self.gravity * body.mass());
                }
            }
            entity.integrate_body(dt);
        }
    }

    fn resolve_hinges(&mut self, world: &mut World) {
        let hinges: Vec<(EntityId, EntityId, Hinge)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let hinge = world.get(entry.id)?.get::<Hinge>()?;
                let target = hinge.target?;
                hinge.enabled.then(|| (entry.id, target, hinge.clone()))
            })
            .collect();

        for (owner, target, hinge) in hinges {
            let Some((a, b)) = world.pair_mut(owner, target) else {
                continue;
            };
            let (Some(body_a), Some(body_b)) = (
                a.get_mut::<RigidBodyComponent>(),
                b.get_mut::<RigidBodyComponent>(),
            ) else {
                continue;
            };
            hinge::resolve(&hinge, body_a.body_mut(), body_b.body_mut());
            a.push_body_pose();
            b.push_body_pose();
            self.last_stats.hinges += 1;
        }
    }

    /// Union of every gathered collider's bounds, padded on degenerate axes.
    fn collider_bounds(&self, world: &World) -> Option<Aabb> {
        let bounds = self
            .entries
            .iter()
            .filter_map(|entry| Some(world.get(entry.id)?.collider()?.world_aabb()))
            .reduce(|acc, b| acc.union(&b))?;

        let extent = bounds.size();
        let pad = Vec2::new(
            if extent.x < MIN_WORLD_EXTENT { 0.5 } else { 0.0 },
            if extent.y < MIN_WORLD_EXTENT { 0.5 } else { 0.0 },
        );
        Some(bounds.expanded_by(pad))
    }

    fn resolve_collisions(&mut self, world: &mut World) {
        let Some(bounds) = self.collider_bounds(world) else {
            return;
        };

        let mut tree = Quadtree::new(bounds, self.quadtree);
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.has_collider {
                continue;
            }
            if let Some(collider) = world.get(entry.id).and_then(|e| e.collider()) {
                tree.insert(collider.world_aabb(), index);
            }
        }

        let mut candidates = Vec::with_capacity(16);
        for (index_a, entry_a) in self.entries.iter().enumerate() {
            if !entry_a.has_collider {
                continue;
            }
            let Some(query) = world
                .get(entry_a.id)
                .and_then(|e| e.collider())
                .map(|c| c.world_aabb())
            else {
                continue;
            };

            candidates.clear();
            tree.query(&query, &mut candidates);
            for &index_b in &candidates {
                if index_b <= index_a {
                    continue;
                }
                self.last_stats.candidate_pairs += 1;
                if resolve_pair(world, entry_a.id, self.entries[index_b].id) {
                    self.last_stats.resolved_pairs += 1;
                }
            }
        }
    }
}

/// Separates one candidate pair. Returns whether any correction was applied.
fn resolve_pair(world: &mut World, id_a: EntityId, id_b: EntityId) -> bool {
    let Some((a, b)) = world.pair_mut(id_a, id_b) else {
        return false;
    };
    let (Some(collider_a), Some(collider_b)) = (a.collider(), b.collider()) else {
        return false;
    };
    if !collider_a.allows_collision_with(collider_b) || !collider_b.allows_collision_with(collider_a)
    {
        return false;
    }
    // Triggers are left to the trigger system, including their fire-once latch.
    if collider_a.is_trigger() || collider_b.is_trigger() {
        return false;
    }
    let Some(hit) = collision::dispatch(collider_a, collider_b) else {
        return false;
    };
    if !hit.collided || hit.penetration <= 0.0 {
        return false;
    }

    let inv_a = a.body().map_or(0.0, |body| body.inv_mass());
    let inv_b = b.body().map_or(0.0, |body| body.inv_mass());
    let total = inv_a + inv_b;
    if total <= 0.0 {
        return false;
    }

    trace!(?id_a, ?id_b, penetration = hit.penetration, normal = ?hit.normal, "resolving contact");

    let separation = hit.normal * hit.penetration;
    if let Some(body) = a.body_mut() {
        body.translate(separation * (inv_a / total));
        let vn = body.velocity().dot(hit.normal);
        if vn < 0.0 {
            body.set_velocity(body.velocity() - hit.normal * vn);
        }
    }
    if let Some(body) = b.body_mut() {
        body.translate(-separation * (inv_b / total));
        let vn = body.velocity().dot(hit.normal);
        if vn > 0.0 {
            body.set_velocity(body.velocity() - hit.normal * vn);
        }
    }
    a.push_body_pose();
    b.push_body_pose();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::Collider;
    use crate::physics::rigid_body::{BodyType, RigidBody};
    use crate::world::{Entity, Transform};

    #[test]
    fn test_default_gravity_is_earth_in_units() {
        let engine = PhysicsEngine::default();
        assert!((engine.gravity().y + 981.0).abs() < 1e-3);
    }

    #[test]
    fn test_body_without_collider_still_falls() {
        let mut world = World::new();
        let id = world.spawn(
            Entity::new()
                .at(Vec2::new(0.0, 100.0))
                .with_body(RigidBody::new(1.0, BodyType::Dynamic)),
        );
        let mut engine = PhysicsEngine::new(Vec2::new(0.0, -10.0));
        engine.step(0.1, &mut world);

        let y = world.get(id).unwrap().get::<Transform>().unwrap().position.y;
        assert!((y - 99.9).abs() < 1e-4, "expected 99.9, got {y}");
    }

    #[test]
    fn test_static_body_stays_put() {
        let mut world = World::new();
        let id = world.spawn(
            Entity::new()
                .at(Vec2::ZERO)
                .with_collider(Collider::aabb(Vec2::ZERO, Vec2::ONE))
                .with_body(RigidBody::new(5.0, BodyType::Static)),
        );
        let mut engine = PhysicsEngine::default();
        for _ in 0..10 {
            engine.step(1.0 / 60.0, &mut world);
        }
        let entity = world.get(id).unwrap();
        assert_eq!(entity.body().unwrap().velocity(), Vec2::ZERO);
        assert_eq!(entity.get::<Transform>().unwrap().position, Vec2::ZERO);
    }

    #[test]
    fn test_advance_caps_substeps() {
        let mut world = World::new();
        let mut engine = PhysicsEngine::default();
        assert_eq!(engine.advance(1.0, &mut world), 4);
        assert!(engine.accumulator < engine.fixed_dt());
        assert_eq!(engine.advance(0.5 / 60.0, &mut world), 0);
        assert_eq!(engine.advance(0.5 / 60.0, &mut world), 1);
    }
}
