//! Hinge constraints
//!
//! A [`Hinge`] pins an anchor on its owner to an anchor on a target body and
//! can limit or drive the relative angle between them. Resolution is a
//! single positional pass plus clamped angular impulses per step.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::rigid_body::RigidBody;
use crate::world::EntityId;

/// Anchor distance below which no positional correction is applied.
const MIN_ANCHOR_DISTANCE: f32 = 1e-4;

/// Spring-damper keeping the relative angle inside `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeLimits {
    pub lower: f32,
    pub upper: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub max_torque: f32,
}

impl Default for HingeLimits {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 0.0,
            stiffness: 10.0,
            damping: 1.0,
            max_torque: 10.0,
        }
    }
}

/// Velocity motor driving the relative angular velocity toward `speed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HingeMotor {
    pub speed: f32,
    pub stiffness: f32,
    pub max_torque: f32,
}

impl Default for HingeMotor {
    fn default() -> Self {
        Self {
            speed: 0.0,
            stiffness: 5.0,
            max_torque: 10.0,
        }
    }
}

/// Hinge between the owning entity and `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hinge {
    pub target: Option<EntityId>,
    /// Owner-local anchor, rotated by the owner's rotation
    pub anchor_self: Vec2,
    /// Target-local anchor, rotated by the target's rotation
    pub anchor_target: Vec2,
    pub enabled: bool,
    pub reference_angle: f32,
    pub limits: Option<HingeLimits>,
    pub motor: Option<HingeMotor>,
}

impl Default for Hinge {
    fn default() -> Self {
        Self {
            target: None,
            anchor_self: Vec2::ZERO,
            anchor_target: Vec2::ZERO,
            enabled: true,
            reference_angle: 0.0,
            limits: None,
            motor: None,
        }
    }
}

impl Hinge {
    pub fn new(target: EntityId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn with_anchors(mut self, anchor_self: Vec2, anchor_target: Vec2) -> Self {
        self.anchor_self = anchor_self;
        self.anchor_target = anchor_target;
        self
    }

    /// Enables limits with default stiffness, damping and max torque.
    pub fn with_limits(mut self, lower: f32, upper: f32) -> Self {
        self.limits = Some(HingeLimits {
            lower,
            upper,
            ..HingeLimits::default()
        });
        self
    }

    /// Enables the motor with default stiffness and max torque.
    pub fn with_motor(mut self, speed: f32) -> Self {
        self.motor = Some(HingeMotor {
            speed,
            ..HingeMotor::default()
        });
        self
    }
}

/// Wraps `angle` into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let mut angle = angle % TAU;
    if angle <= -PI {
        angle += TAU;
    } else if angle > PI {
        angle -= TAU;
    }
    angle
}

/// Resolves one hinge between the owner body `a` and target body `b`.
pub fn resolve(hinge: &Hinge, a: &mut RigidBody, b: &mut RigidBody) {
    resolve_anchor(hinge, a, b);
    resolve_angular(hinge, a, b);
}

fn resolve_anchor(hinge: &Hinge, a: &mut RigidBody, b: &mut RigidBody) {
    let anchor_a = a.position() + Vec2::from_angle(a.rotation()).rotate(hinge.anchor_self);
    let anchor_b = b.position() + Vec2::from_angle(b.rotation()).rotate(hinge.anchor_target);
    let delta = anchor_b - anchor_a;
    let dist = delta.length();

    let (inv_a, inv_b) = (a.inv_mass(), b.inv_mass());
    let total = inv_a + inv_b;
    if total <= 0.0 || dist <= MIN_ANCHOR_DISTANCE {
        return;
    }

    let dir = delta / dist;
    a.translate(dir * dist * (inv_a / total));
    b.translate(-dir * dist * (inv_b / total));

    let along = (a.velocity() - b.velocity()).dot(dir);
    if along != 0.0 {
        let impulse = along / total;
        a.set_velocity(a.velocity() - dir * (impulse * inv_a));
        b.set_velocity(b.velocity() + dir * (impulse * inv_b));
    }
}

fn resolve_angular(hinge: &Hinge, a: &mut RigidBody, b: &mut RigidBody) {
    let (inv_a, inv_b) = (a.inv_inertia(), b.inv_inertia());
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let rel_angle = normalize_angle(b.rotation() - a.rotation() - hinge.reference_angle);
    let rel_ang_vel = b.angular_velocity() - a.angular_velocity();

    let mut apply = |torque: f32| {
        let impulse = torque / inv_sum;
        a.set_angular_velocity(a.angular_velocity() - impulse * inv_a);
        b.set_angular_velocity(b.angular_velocity() + impulse * inv_b);
    };

    if let Some(limits) = hinge.limits {
        let error = if rel_angle < limits.lower {
            limits.lower - rel_angle
        } else if rel_angle > limits.upper {
            limits.upper - rel_angle
        } else {
            0.0
        };
        if error != 0.0 {
            let torque = (limits.stiffness * error - limits.damping * rel_ang_vel)
                .clamp(-limits.max_torque, limits.max_torque);
            apply(torque);
        }
    }

    if let Some(motor) = hinge.motor {
        let torque = (motor.stiffness * (motor.speed - rel_ang_vel))
            .clamp(-motor.max_torque, motor.max_torque);
        apply(torque);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::rigid_body::BodyType;

    #[test]
    fn test_normalize_angle_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((normalize_angle(-TAU - 0.5) + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_anchor_pulls_dynamic_toward_static() {
        let mut pivot = RigidBody::new(1.0, BodyType::Static);
        let mut bob = RigidBody::new(1.0, BodyType::Dynamic);
        bob.set_position(Vec2::new(3.0, 0.0));
        bob.set_velocity(Vec2::new(5.0, 1.0));

        let hinge = Hinge::default();
        resolve(&hinge, &mut bob, &mut pivot);

        assert!(bob.position().length() < 1e-5);
        assert_eq!(pivot.position(), Vec2::ZERO);
        // Only the velocity along the anchor axis is removed.
        assert!(bob.velocity().x.abs() < 1e-5);
        assert!((bob.velocity().y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_anchor_split_by_inverse_mass() {
        let mut a = RigidBody::new(1.0, BodyType::Dynamic);
        let mut b = RigidBody::new(1.0, BodyType::Dynamic);
        b.set_position(Vec2::new(2.0, 0.0));
        resolve(&Hinge::default(), &mut a, &mut b);
        assert!((a.position().x - 1.0).abs() < 1e-5);
        assert!((b.position().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_motor_torque_is_clamped() {
        let mut a = RigidBody::new(1.0, BodyType::Static);
        let mut b = RigidBody::new(1.0, BodyType::Dynamic);
        let hinge = Hinge::default().with_motor(100.0);
        resolve(&hinge, &mut a, &mut b);
        // stiffness * speed = 500, clamped to max_torque 10
        assert!((b.angular_velocity() - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_limit_pushes_back_inside_range() {
        let mut a = RigidBody::new(1.0, BodyType::Static);
        let mut b = RigidBody::new(1.0, BodyType::Dynamic);
        b.set_rotation(1.0);
        let hinge = Hinge::default().with_limits(-0.5, 0.5);
        resolve(&hinge, &mut a, &mut b);
        // error = -0.5, torque = 10 * -0.5 = -5
        assert!((b.angular_velocity() + 5.0).abs() < 1e-5);
    }
}
