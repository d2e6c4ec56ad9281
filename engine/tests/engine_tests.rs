//! Engine Tests - Integration, Contact Response and Hinges

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;
use gl2d_engine::config::PhysicsConfig;
use gl2d_engine::physics::{BodyType, Collider, Hinge, PhysicsEngine, RigidBody};
use gl2d_engine::world::{Entity, EntityId, Transform, World};

const DT: f32 = 1.0 / 60.0;

fn position(world: &World, id: EntityId) -> Vec2 {
    world.get(id).unwrap().get::<Transform>().unwrap().position
}

fn unit_box(world: &mut World, at: Vec2, collider: Collider, body_type: BodyType) -> EntityId {
    world.spawn(
        Entity::new()
            .at(at)
            .with_collider(collider)
            .with_body(RigidBody::new(1.0, body_type)),
    )
}

// ============================================================================
// RigidBody
// ============================================================================

#[test]
fn test_static_body_ignores_forces() {
    for (force, dt) in [(Vec2::new(1e6, -1e6), 1.0), (Vec2::new(-3.0, 7.0), 0.001)] {
        let mut body = RigidBody::new(4.0, BodyType::Static);
        body.apply_force(force);
        body.integrate(dt);
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.position(), Vec2::ZERO);
    }
}

#[test]
fn test_force_generator_self_removal() {
    let once = Rc::new(Cell::new(0));
    let always = Rc::new(Cell::new(0));
    let mut body = RigidBody::new(1.0, BodyType::Dynamic);
    {
        let once = once.clone();
        body.add_force_generator(move |_, _| {
            once.set(once.get() + 1);
            false
        });
    }
    {
        let always = always.clone();
        body.add_force_generator(move |body, _| {
            always.set(always.get() + 1);
            body.apply_force(Vec2::X);
            true
        });
    }

    for _ in 0..5 {
        body.integrate(DT);
    }
    assert_eq!(once.get(), 1);
    assert_eq!(always.get(), 5);
    assert_eq!(body.force_generator_count(), 1);
}

// ============================================================================
// Contact response
// ============================================================================

#[test]
fn test_box_comes_to_rest_on_ground() {
    let mut world = World::new();
    unit_box(
        &mut world,
        Vec2::ZERO,
        Collider::aabb(Vec2::new(-10.0, -1.0), Vec2::new(10.0, 0.0)),
        BodyType::Static,
    );
    let crate_id = unit_box(
        &mut world,
        Vec2::new(0.0, 5.0),
        Collider::aabb(Vec2::ZERO, Vec2::ONE),
        BodyType::Dynamic,
    );

    let mut engine = PhysicsEngine::new(Vec2::new(0.0, -10.0));
    for _ in 0..300 {
        engine.step(DT, &mut world);
    }

    let y = position(&world, crate_id).y;
    assert!(y.abs() < 0.01, "expected resting at 0, got {y}");
    let vy = world.get(crate_id).unwrap().body().unwrap().velocity().y;
    assert!(vy.abs() < 1e-3);
    assert!(engine.last_stats().resolved_pairs >= 1);
}

#[test]
fn test_equal_masses_split_separation() {
    let mut world = World::new();
    let a = unit_box(&mut world, Vec2::ZERO, Collider::aabb(Vec2::ZERO, Vec2::ONE), BodyType::Dynamic);
    let b = unit_box(
        &mut world,
        Vec2::new(0.6, 0.0),
        Collider::aabb(Vec2::ZERO, Vec2::ONE),
        BodyType::Dynamic,
    );

    let mut engine = PhysicsEngine::new(Vec2::ZERO);
    engine.step(DT, &mut world);

    assert!((position(&world, a).x + 0.2).abs() < 1e-4);
    assert!((position(&world, b).x - 0.8).abs() < 1e-4);
    // Collider follows the corrected pose in the same step
    let bounds = world.get(b).unwrap().collider().unwrap().world_aabb();
    assert!((bounds.min.x - 0.8).abs() < 1e-4);
}

#[test]
fn test_collision_mask_filters_pairs() {
    let mut world = World::new();
    let mut picky = Collider::aabb(Vec2::ZERO, Vec2::ONE).with_layer(1);
    picky.set_collision_mask(!(1 << 2));
    let a = unit_box(&mut world, Vec2::ZERO, picky, BodyType::Dynamic);
    let b = unit_box(
        &mut world,
        Vec2::new(0.6, 0.0),
        Collider::aabb(Vec2::ZERO, Vec2::ONE).with_layer(2),
        BodyType::Dynamic,
    );

    let mut engine = PhysicsEngine::new(Vec2::ZERO);
    engine.step(DT, &mut world);
    assert_eq!(position(&world, a), Vec2::ZERO);
    assert_eq!(position(&world, b), Vec2::new(0.6, 0.0));
}

#[test]
fn test_triggers_are_not_pushed_or_consumed() {
    let mut world = World::new();
    let zone = unit_box(
        &mut world,
        Vec2::ZERO,
        Collider::aabb(Vec2::ZERO, Vec2::splat(2.0)).with_trigger(true, true),
        BodyType::Dynamic,
    );
    let other = unit_box(&mut world, Vec2::ONE, Collider::aabb(Vec2::ZERO, Vec2::ONE), BodyType::Dynamic);

    let mut engine = PhysicsEngine::new(Vec2::ZERO);
    engine.step(DT, &mut world);

    assert_eq!(position(&world, zone), Vec2::ZERO);
    assert_eq!(position(&world, other), Vec2::ONE);
    assert!(!world.get(zone).unwrap().collider().unwrap().has_triggered());
}

// ============================================================================
// Hinges and stepping
// ============================================================================

#[test]
fn test_hinge_pins_bob_to_pivot() {
    let mut world = World::new();
    let pivot = world.spawn(
        Entity::named("pivot")
            .at(Vec2::new(0.0, 10.0))
            .with_body(RigidBody::new(1.0, BodyType::Static)),
    );
    let bob = world.spawn(
        Entity::named("bob")
            .at(Vec2::new(3.0, 10.0))
            .with_body(RigidBody::new(1.0, BodyType::Dynamic))
            .with(Hinge::new(pivot).with_anchors(Vec2::new(-2.0, 0.0), Vec2::ZERO)),
    );

    let mut engine = PhysicsEngine::new(Vec2::new(0.0, -10.0));
    for _ in 0..10 {
        engine.step(DT, &mut world);
    }

    // Owner anchor sits 2 units left of the bob's origin
    let anchor = position(&world, bob) + Vec2::new(-2.0, 0.0);
    let bob_rotation = world.get(bob).unwrap().body().unwrap().rotation();
    assert_eq!(bob_rotation, 0.0);
    assert!((anchor - Vec2::new(0.0, 10.0)).length() < 1e-3);
    assert_eq!(position(&world, pivot), Vec2::new(0.0, 10.0));
    assert_eq!(engine.last_stats().hinges, 1);
}

#[test]
fn test_disabled_hinge_is_ignored() {
    let mut world = World::new();
    let pivot = world.spawn(Entity::new().at(Vec2::ZERO).with_body(RigidBody::new(1.0, BodyType::Static)));
    let mut hinge = Hinge::new(pivot);
    hinge.enabled = false;
    world.spawn(
        Entity::new()
            .at(Vec2::new(5.0, 0.0))
            .with_body(RigidBody::new(1.0, BodyType::Dynamic))
            .with(hinge),
    );

    let mut engine = PhysicsEngine::new(Vec2::ZERO);
    engine.step(DT, &mut world);
    assert_eq!(engine.last_stats().hinges, 0);
}

#[test]
fn test_engine_from_config() {
    let config = PhysicsConfig {
        max_substeps: 2,
        gravity_meters: Vec2::new(0.0, -1.0),
        ..PhysicsConfig::default()
    };
    let mut engine = PhysicsEngine::from_config(&config);
    assert!((engine.gravity().y + 100.0).abs() < 1e-3);

    let mut world = World::new();
    assert_eq!(engine.advance(1.0, &mut world), 2);
}
