//! Configuration Module
//!
//! Engine tuning loaded from JSON. Every field has a default, so a config
//! file only needs the values it changes.

pub mod physics_config;

pub use physics_config::{ConfigError, PhysicsConfig};
