//! Physics module
//!
//! 2D rigid-body simulation and collision queries for side-on games.
//!
//! # Unit System
//!
//! **100 units = 1 meter** (world units are pixels)
//!
//! - Distances and positions in units
//! - Velocities in units/s
//! - Gravity defaults to 9.81 m/s² down, converted to 981 units/s²
//! - Angles in radians
//!
//! # Submodules
//!
//! - [`aabb`] - Axis-aligned bounding boxes
//! - [`collider`] - AABB, circle and capsule collider shapes
//! - [`collision`] - Narrow-phase dispatch and hit results
//! - [`quadtree`] - Broad-phase spatial index
//! - [`rigid_body`] - Bodies, forces and integration
//! - [`hinge`] - Hinge constraints between bodies
//! - [`engine`] - Per-step orchestration
//! - [`casts`] - Ray, sweep and overlap queries
//! - [`trigger`] - Trigger enter/exit events
//! - [`water`] - Buoyancy, drag and flow

pub mod aabb;
pub mod casts;
pub mod collider;
pub mod collision;
pub mod engine;
pub mod hinge;
pub mod quadtree;
pub mod rigid_body;
pub mod trigger;
pub mod types;
pub mod units;
pub mod water;

// Re-export commonly used types at the physics module level
pub use aabb::Aabb;
pub use casts::{CastFilter, CastHit, OverlapHit, box_cast, capsule_cast, overlap_circle, ray_cast};
pub use collider::{Collider, ColliderKind, ColliderShape, Pose};
pub use collision::{Hit, dispatch};
pub use engine::{PhysicsEngine, StepStats};
pub use hinge::{Hinge, HingeLimits, HingeMotor};
pub use quadtree::{Quadtree, QuadtreeConfig};
pub use rigid_body::{BodyType, CollisionDetection, ForceGenerator, RigidBody};
pub use trigger::TriggerSystem;
pub use types::Vec2;
pub use water::{WaterDefaults, WaterState, WaterSystem, WaterVolume};
