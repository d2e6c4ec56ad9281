//! GL2D Engine Library
//!
//! The 2D physics core of a side-on game engine: colliders and narrow-phase
//! dispatch, a quadtree broad phase, rigid bodies with hinges, scene casts,
//! and trigger and water passes over a small entity store.
//!
//! # Modules
//!
//! - [`physics`] - Collision, simulation and query systems
//! - [`world`] - Entity store and the components physics reads and writes
//! - [`config`] - Engine configuration loaded from JSON
//!
//! # Example
//!
//! ```ignore
//! use gl2d_engine::physics::{Collider, PhysicsEngine, RigidBody, BodyType, TriggerSystem};
//! use gl2d_engine::world::{Entity, World};
//! use glam::Vec2;
//!
//! let mut world = World::new();
//! world.spawn(
//!     Entity::named("crate")
//!         .at(Vec2::new(0.0, 200.0))
//!         .with_collider(Collider::aabb(Vec2::ZERO, Vec2::splat(32.0)))
//!         .with_body(RigidBody::new(1.0, BodyType::Dynamic)),
//! );
//!
//! let mut engine = PhysicsEngine::default();
//! let mut triggers = TriggerSystem::new();
//! engine.advance(1.0 / 60.0, &mut world);
//! triggers.update(&mut world);
//! ```

pub mod config;
pub mod physics;
pub mod world;

// Re-export the types most callers need at crate level
pub use config::{ConfigError, PhysicsConfig};
pub use physics::{PhysicsEngine, TriggerSystem, WaterSystem};
pub use world::{Entity, EntityId, World};
