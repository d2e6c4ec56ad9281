//! World unit conversion
//!
//! **100 units = 1 meter.** Author physics constants (gravity, speeds,
//! impulses) in meters and convert once with [`to_units`].

use glam::Vec2;

/// Number of in-world units that represent one meter.
pub const UNITS_PER_METER: f32 = 100.0;
/// Inverse of [`UNITS_PER_METER`].
pub const METERS_PER_UNIT: f32 = 1.0 / UNITS_PER_METER;

/// Earth gravity in meters per second squared.
pub const EARTH_GRAVITY_METERS: Vec2 = Vec2::new(0.0, -9.81);

pub fn to_units(meters: f32) -> f32 {
    meters * UNITS_PER_METER
}

pub fn to_units_vec(meters: Vec2) -> Vec2 {
    meters * UNITS_PER_METER
}

pub fn to_meters(units: f32) -> f32 {
    units * METERS_PER_UNIT
}

pub fn to_meters_vec(units: Vec2) -> Vec2 {
    units * METERS_PER_UNIT
}

/// Default engine gravity expressed in world units.
pub fn default_gravity() -> Vec2 {
    to_units_vec(EARTH_GRAVITY_METERS)
}
