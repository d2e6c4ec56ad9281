//! Physics Sandbox
//!
//! Run with: `cargo run --bin physics_sandbox [config.json]`
//!
//! A headless scene exercising the physics core: a ground slab, falling
//! boxes, a circle and a capsule, a water pool and a trigger zone. Runs a
//! fixed number of frames and logs positions plus trigger and water events.
//!
//! Set `RUST_LOG=gl2d_engine=trace` to see per-contact detail.

use std::env;

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gl2d_engine::config::PhysicsConfig;
use gl2d_engine::physics::casts::{CastFilter, ray_cast};
use gl2d_engine::physics::{
    BodyType, Collider, PhysicsEngine, RigidBody, TriggerSystem, WaterState, WaterSystem,
    WaterVolume,
};
use gl2d_engine::world::{ColliderComponent, Entity, EntityId, Transform, World};

const FRAMES: u32 = 360;
const FRAME_DT: f32 = 1.0 / 60.0;
const REPORT_EVERY: u32 = 60;

// ============================================================================
// SCENE
// ============================================================================

struct Scene {
    world: World,
    tracked: Vec<EntityId>,
}

fn build_scene(config: &PhysicsConfig) -> Scene {
    let mut world = World::new();
    let mut tracked = Vec::new();

    world.spawn(
        Entity::named("ground")
            .at(Vec2::ZERO)
            .with_collider(Collider::aabb(Vec2::new(-1000.0, -50.0), Vec2::new(1000.0, 0.0)))
            .with_body(RigidBody::new(0.0, BodyType::Static)),
    );

    for (i, x) in [-40.0, 0.0, 40.0].into_iter().enumerate() {
        tracked.push(world.spawn(
            Entity::named(format!("box_{i}"))
                .at(Vec2::new(x, 300.0 + 60.0 * i as f32))
                .with_collider(Collider::aabb(Vec2::ZERO, Vec2::splat(32.0)))
                .with_body(RigidBody::new(1.0, BodyType::Dynamic)),
        ));
    }

    tracked.push(world.spawn(
        Entity::named("ball")
            .at(Vec2::new(150.0, 500.0))
            .with_collider(Collider::circle(20.0, Vec2::ZERO))
            .with_body(RigidBody::new(0.5, BodyType::Dynamic)),
    ));

    // Falls through the trigger zone on its way to the ground.
    tracked.push(world.spawn(
        Entity::named("capsule")
            .at(Vec2::new(-200.0, 450.0))
            .with_collider(Collider::capsule(
                Vec2::new(0.0, -20.0),
                Vec2::new(0.0, 20.0),
                12.0,
                Vec2::ZERO,
            ))
            .with_body(RigidBody::new(2.0, BodyType::Dynamic)),
    ));

    let mut zone = ColliderComponent::new(
        Collider::aabb(Vec2::new(-260.0, 100.0), Vec2::new(-140.0, 220.0)).with_trigger(true, false),
    );
    zone.set_on_trigger_enter(|owner, other| info!(?owner, ?other, "entered trigger zone"));
    zone.set_on_trigger_exit(|owner, other| info!(?owner, ?other, "left trigger zone"));
    world.spawn(Entity::named("zone").with(zone));

    world.spawn(
        Entity::named("pool")
            .with_collider(Collider::aabb(Vec2::new(300.0, 0.0), Vec2::new(600.0, 150.0)))
            .with(WaterVolume::from_defaults(&config.water).with_flow(Vec2::new(40.0, 0.0))),
    );

    tracked.push(world.spawn(
        Entity::named("buoy")
            .at(Vec2::new(420.0, 400.0))
            .with_collider(Collider::aabb(Vec2::ZERO, Vec2::splat(40.0)))
            .with_body(RigidBody::new(1.0, BodyType::Dynamic))
            .with(WaterState::new()),
    ));

    Scene { world, tracked }
}

// ============================================================================
// REPORTING
// ============================================================================

fn report(frame: u32, scene: &Scene) {
    for &id in &scene.tracked {
        let Some(entity) = scene.world.get(id) else {
            continue;
        };
        let Some(transform) = entity.get::<Transform>() else {
            continue;
        };
        let velocity = entity.body().map_or(Vec2::ZERO, |b| b.velocity());
        info!(
            frame,
            name = entity.name(),
            x = transform.position.x,
            y = transform.position.y,
            vx = velocity.x,
            vy = velocity.y,
            "body"
        );
    }
}

fn report_water(world: &mut World) {
    for (_, entity) in world.iter_mut() {
        let name = entity.name().to_string();
        let Some(state) = entity.get_mut::<WaterState>() else {
            continue;
        };
        if state.just_entered() {
            info!(name = %name, submersion = state.submersion(), "splash");
        } else if state.just_exited() {
            info!(name = %name, "left the water");
        }
        state.clear_transient_flags();
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gl2d_engine=info,physics_sandbox=info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => PhysicsConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => PhysicsConfig::default(),
    };
    info!(gravity = ?config.gravity_units(), fixed_dt = config.fixed_dt, "starting sandbox");

    let mut scene = build_scene(&config);
    let mut engine = PhysicsEngine::from_config(&config);
    let mut triggers = TriggerSystem::new();
    let mut water = WaterSystem::new();

    for frame in 1..=FRAMES {
        water.update(FRAME_DT, &mut scene.world, engine.gravity());
        engine.advance(FRAME_DT, &mut scene.world);
        triggers.update(&mut scene.world);
        report_water(&mut scene.world);

        if frame % REPORT_EVERY == 0 {
            report(frame, &scene);
        }
    }

    let probe = ray_cast(
        Vec2::new(0.0, 1000.0),
        Vec2::NEG_Y,
        0.0,
        &scene.world,
        &CastFilter::default(),
    );
    match probe {
        Some(hit) => info!(distance = hit.distance, entity = ?hit.entity, "ray from the sky"),
        None => info!("ray from the sky hit nothing"),
    }

    let stats = engine.last_stats();
    info!(
        bodies = stats.bodies,
        resolved = stats.resolved_pairs,
        active_triggers = triggers.active_count(),
        "sandbox finished"
    );
    Ok(())
}
