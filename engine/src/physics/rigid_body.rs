//! Rigid body dynamics
//!
//! Linear and angular state integrated with semi-implicit Euler:
//! - velocity += force * inv_mass * dt
//! - velocity *= max(0, 1 - damping * dt)
//! - position += velocity * dt
//!
//! Only [`BodyType::Dynamic`] bodies with positive mass respond to forces and
//! impulses; static and kinematic bodies always carry `inv_mass == 0`.
//!
//! # Example
//!
//! ```ignore
//! use gl2d_engine::physics::{BodyType, RigidBody};
//! use glam::Vec2;
//!
//! let mut body = RigidBody::new(2.0, BodyType::Dynamic);
//! let mut frames = 0;
//! body.add_force_generator(move |body, _dt| {
//!     body.apply_force(Vec2::new(0.0, 500.0));
//!     frames += 1;
//!     frames < 10 // push for ten frames, then unregister
//! });
//! body.integrate(1.0 / 60.0);
//! ```

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moves; an immovable obstacle
    Static,
    /// Moved by gameplay code, not by forces
    Kinematic,
    /// Fully simulated
    #[default]
    Dynamic,
}

/// Collision detection mode requested for a body.
///
/// Stored for gameplay code; engine resolution is discrete for both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CollisionDetection {
    #[default]
    Continuous,
    Discrete,
}

/// Closure run on every integrate call. Returns `false` to unregister itself.
pub type ForceGenerator = Box<dyn FnMut(&mut RigidBody, f32) -> bool>;

/// A 2D rigid body.
pub struct RigidBody {
    position: Vec2,
    velocity: Vec2,
    forces: Vec2,
    mass: f32,
    inv_mass: f32,
    linear_damping: f32,

    rotation: f32,
    angular_velocity: f32,
    torque: f32,
    inertia: f32,
    inv_inertia: f32,
    angular_damping: f32,

    body_type: BodyType,
    detection: CollisionDetection,
    force_generators: Vec<ForceGenerator>,
}

impl fmt::Debug for RigidBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigidBody")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("mass", &self.mass)
            .field("inv_mass", &self.inv_mass)
            .field("rotation", &self.rotation)
            .field("angular_velocity", &self.angular_velocity)
            .field("body_type", &self.body_type)
            .field("force_generators", &self.force_generators.len())
            .finish_non_exhaustive()
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(1.0, BodyType::Dynamic)
    }
}

/// Inverse of `value` for dynamic bodies with positive `value`, else zero.
fn inverse_for(body_type: BodyType, value: f32) -> f32 {
    if body_type == BodyType::Dynamic && value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}

impl RigidBody {
    pub fn new(mass: f32, body_type: BodyType) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            forces: Vec2::ZERO,
            mass,
            inv_mass: inverse_for(body_type, mass),
            linear_damping: 0.0,
            rotation: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            inertia: 1.0,
            inv_inertia: inverse_for(body_type, 1.0),
            angular_damping: 0.0,
            body_type,
            detection: CollisionDetection::default(),
            force_generators: Vec::new(),
        }
    }

    // ========================================================================
    // Mass and type
    // ========================================================================

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Sets the mass; `inv_mass` is only non-zero for dynamic bodies with `mass > 0`.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inv_mass = inverse_for(self.body_type, mass);
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn set_inertia(&mut self, inertia: f32) {
        self.inertia = inertia;
        self.inv_inertia = inverse_for(self.body_type, inertia);
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// Changes the body type and recomputes both inverses.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        self.inv_mass = inverse_for(body_type, self.mass);
        self.inv_inertia = inverse_for(body_type, self.inertia);
    }

    pub fn collision_detection(&self) -> CollisionDetection {
        self.detection
    }

    pub fn set_collision_detection(&mut self, detection: CollisionDetection) {
        self.detection = detection;
    }

    // ========================================================================
    // Linear state
    // ========================================================================

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Shifts the position without touching velocity.
    pub fn translate(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Force accumulated since the last integrate call.
    pub fn accumulated_force(&self) -> Vec2 {
        self.forces
    }

    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping;
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.forces += force;
    }

    /// Instant velocity change scaled by `inv_mass`.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inv_mass;
    }

    // ========================================================================
    // Angular state
    // ========================================================================

    /// Rotation in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.angular_velocity = angular_velocity;
    }

    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.angular_velocity += impulse * self.inv_inertia;
    }

    // ========================================================================
    // Force generators
    // ========================================================================

    /// Registers a closure run at the start of every dynamic integrate call.
    pub fn add_force_generator<F>(&mut self, generator: F)
    where
        F: FnMut(&mut RigidBody, f32) -> bool + 'static,
    {
        self.force_generators.push(Box::new(generator));
    }

    pub fn clear_force_generators(&mut self) {
        self.force_generators.clear();
    }

    pub fn force_generator_count(&self) -> usize {
        self.force_generators.len()
    }

    /// Runs every generator once and drops the ones that returned `false`.
    ///
    /// Generators registered from inside a generator start on the next call.
    fn run_force_generators(&mut self, dt: f32) {
        let mut generators = std::mem::take(&mut self.force_generators);
        generators.retain_mut(|generator| generator(self, dt));
        generators.append(&mut self.force_generators);
        self.force_generators = generators;
    }

    // ========================================================================
    // Integration
    // ========================================================================

    /// Advances the body by `dt` seconds.
    ///
    /// Non-dynamic bodies only drop their accumulated force and torque.
    pub fn integrate(&mut self, dt: f32) {
        if self.body_type != BodyType::Dynamic {
            self.forces = Vec2::ZERO;
            self.torque = 0.0;
            return;
        }

        self.run_force_generators(dt);

        self.velocity += self.forces * self.inv_mass * dt;
        self.velocity *= (1.0 - self.linear_damping * dt).max(0.0);
        self.position += self.velocity * dt;
        self.forces = Vec2::ZERO;

        self.angular_velocity += self.torque * self.inv_inertia * dt;
        self.angular_velocity *= (1.0 - self.angular_damping * dt).max(0.0);
        self.rotation += self.angular_velocity * dt;
        self.torque = 0.0;
    }
}
