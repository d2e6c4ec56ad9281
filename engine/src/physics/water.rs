//! Water volumes: buoyancy, drag and flow
//!
//! A water volume is an entity carrying a [`WaterVolume`] and a collider.
//! Each [`WaterSystem::update`] pushes forces onto the dynamic bodies whose
//! bounds overlap a volume and records the result in the body's
//! [`WaterState`].
//!
//! Submersion is the fraction of the body's bounds height covered by the
//! volume's bounds. It ignores the actual shapes.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::aabb::Aabb;
use crate::world::{ColliderComponent, EntityId, World};

/// Gravity magnitude below which straight down is assumed.
const GRAVITY_EPSILON: f32 = 1e-4;

/// Defaults for newly authored volumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterDefaults {
    pub density: f32,
    pub linear_drag: f32,
    pub flow_follow_strength: f32,
    pub min_submersion_for_drag: f32,
}

impl Default for WaterDefaults {
    fn default() -> Self {
        Self {
            density: 1.05,
            linear_drag: 6.0,
            flow_follow_strength: 1.5,
            min_submersion_for_drag: 0.05,
        }
    }
}

/// Physical parameters of a body of water.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterVolume {
    /// Buoyancy scale relative to gravity; 1.0 floats a body at full submersion
    pub density: f32,
    pub linear_drag: f32,
    /// Current velocity in world units per second
    pub flow_velocity: Vec2,
    /// How strongly bodies are steered toward `flow_velocity`
    pub flow_follow_strength: f32,
    /// Drag only applies at or above this submersion
    pub min_submersion_for_drag: f32,
}

impl Default for WaterVolume {
    fn default() -> Self {
        Self::from_defaults(&WaterDefaults::default())
    }
}

impl WaterVolume {
    pub fn from_defaults(defaults: &WaterDefaults) -> Self {
        Self {
            density: defaults.density,
            linear_drag: defaults.linear_drag,
            flow_velocity: Vec2::ZERO,
            flow_follow_strength: defaults.flow_follow_strength,
            min_submersion_for_drag: defaults.min_submersion_for_drag,
        }
    }

    pub fn with_flow(mut self, flow_velocity: Vec2) -> Self {
        self.flow_velocity = flow_velocity;
        self
    }
}

/// Per-body submersion record, written by [`WaterSystem`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaterState {
    submerged: bool,
    just_entered: bool,
    just_exited: bool,
    submersion: f32,
    flow_velocity: Vec2,
    surface_y: f32,
    time_in_water: f32,
    time_since_exit: f32,
}

impl WaterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records this frame's result and derives the enter/exit edges.
    pub fn set_state(
        &mut self,
        submerged: bool,
        submersion: f32,
        flow_velocity: Vec2,
        surface_y: f32,
        dt: f32,
    ) {
        self.just_entered = !self.submerged && submerged;
        self.just_exited = self.submerged && !submerged;
        self.submerged = submerged;
        self.surface_y = surface_y;

        if submerged {
            self.submersion = submersion.clamp(0.0, 1.0);
            self.flow_velocity = flow_velocity;
            self.time_in_water += dt;
            self.time_since_exit = 0.0;
        } else {
            self.submersion = 0.0;
            self.flow_velocity = Vec2::ZERO;
            self.time_since_exit += dt;
            self.time_in_water = 0.0;
        }
    }

    /// Consumers call this after reading the edge flags.
    pub fn clear_transient_flags(&mut self) {
        self.just_entered = false;
        self.just_exited = false;
    }

    pub fn is_submerged(&self) -> bool {
        self.submerged
    }

    pub fn submersion(&self) -> f32 {
        self.submersion
    }

    pub fn flow_velocity(&self) -> Vec2 {
        self.flow_velocity
    }

    pub fn surface_y(&self) -> f32 {
        self.surface_y
    }

    pub fn time_in_water(&self) -> f32 {
        self.time_in_water
    }

    pub fn time_since_exit(&self) -> f32 {
        self.time_since_exit
    }

    pub fn just_entered(&self) -> bool {
        self.just_entered
    }

    pub fn just_exited(&self) -> bool {
        self.just_exited
    }
}

/// Fraction of `body`'s height inside `volume`, in `[0, 1]`.
pub fn submersion(volume: &Aabb, body: &Aabb) -> f32 {
    if !volume.overlaps(body) {
        return 0.0;
    }
    let height = body.height();
    if height <= GRAVITY_EPSILON {
        return 0.0;
    }
    let top = volume.max.y.min(body.max.y);
    let bottom = volume.min.y.max(body.min.y);
    ((top - bottom).max(0.0) / height).clamp(0.0, 1.0)
}

fn gravity_direction(gravity: Vec2) -> Vec2 {
    let len = gravity.length();
    if len <= GRAVITY_EPSILON {
        Vec2::NEG_Y
    } else {
        gravity / len
    }
}

#[derive(Debug, Clone, Copy)]
struct VolumeEntry {
    volume: WaterVolume,
    bounds: Aabb,
}

/// Applies water forces once per frame.
#[derive(Debug, Default)]
pub struct WaterSystem {
    volumes: Vec<VolumeEntry>,
}

impl WaterSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// `gravity` is in world units per second squared, as passed to the engine.
    pub fn update(&mut self, dt: f32, world: &mut World, gravity: Vec2) {
        self.gather_volumes(world);

        let direction = gravity_direction(gravity);
        let magnitude = gravity.length();

        for (id, entity) in world.iter_mut() {
            if entity.get::<WaterVolume>().is_some() {
                continue;
            }
            entity.sync_physics();
            let Some(bounds) = entity.collider().map(|c| c.world_aabb()) else {
                continue;
            };
            let Some(body) = entity.body_mut() else {
                continue;
            };
            if !body.is_dynamic() || body.mass() <= 0.0 {
                continue;
            }

            let mut max_submersion = 0.0f32;
            let mut flow_sum = Vec2::ZERO;
            let mut flow_weight = 0.0f32;
            let mut surface_y = bounds.max.y;

            for entry in &self.volumes {
                let amount = submersion(&entry.bounds, &bounds);
                if amount <= 0.0 {
                    continue;
                }
                max_submersion = max_submersion.max(amount);
                flow_sum += entry.volume.flow_velocity * amount;
                flow_weight += amount;
                surface_y = surface_y.max(entry.bounds.max.y);

                let mass = body.mass();
                let volume = &entry.volume;
                body.apply_force(-direction * magnitude * mass * volume.density.max(0.0) * amount);

                let velocity = body.velocity();
                if volume.linear_drag > 0.0 && amount >= volume.min_submersion_for_drag {
                    body.apply_force(-(velocity - volume.flow_velocity) * volume.linear_drag * mass);
                }
                if volume.flow_follow_strength > 0.0 {
                    body.apply_force(
                        (volume.flow_velocity - velocity) * volume.flow_follow_strength * mass,
                    );
                }
            }

            let flow = if flow_weight > GRAVITY_EPSILON {
                flow_sum / flow_weight
            } else {
                Vec2::ZERO
            };
            let state = entity.get_or_insert_with(WaterState::new);
            record_state(id, state, max_submersion, flow, surface_y, dt);
        }
    }

    fn gather_volumes(&mut self, world: &mut World) {
        self.volumes.clear();
        for (_, entity) in world.iter_mut() {
            let Some(volume) = entity.get::<WaterVolume>().copied() else {
                continue;
            };
            let Some(component) = entity.get_mut::<ColliderComponent>() else {
                continue;
            };
            let fire_once = component.collider().is_some_and(|c| c.fires_once());
            component.set_trigger(true, fire_once);
            entity.sync_physics();
            if let Some(collider) = entity.collider() {
                self.volumes.push(VolumeEntry {
                    volume,
                    bounds: collider.world_aabb(),
                });
            }
        }
    }
}

fn record_state(
    id: EntityId,
    state: &mut WaterState,
    submersion: f32,
    flow: Vec2,
    surface_y: f32,
    dt: f32,
) {
    state.set_state(submersion > 0.0, submersion, flow, surface_y, dt);
    if state.just_entered() {
        trace!(?id, submersion, "water enter");
    } else if state.just_exited() {
        trace!(?id, "water exit");
    }
}
