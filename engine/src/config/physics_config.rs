//! Physics configuration
//!
//! # Example
//!
//! ```ignore
//! let config = PhysicsConfig::load("physics.json")?;
//! let engine = PhysicsEngine::from_config(&config);
//! ```

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::physics::quadtree::QuadtreeConfig;
use crate::physics::units;
use crate::physics::water::WaterDefaults;

/// Errors from loading or validating a [`PhysicsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine-wide physics settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity in m/s², converted to world units by [`PhysicsConfig::gravity_units`]
    pub gravity_meters: Vec2,
    pub quadtree: QuadtreeConfig,
    pub water: WaterDefaults,
    /// Fixed step length in seconds
    pub fixed_dt: f32,
    /// Steps allowed per `advance` call before time is dropped
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_meters: units::EARTH_GRAVITY_METERS,
            quadtree: QuadtreeConfig::default(),
            water: WaterDefaults::default(),
            fixed_dt: 1.0 / 60.0,
            max_substeps: 4,
        }
    }
}

impl PhysicsConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Like [`PhysicsConfig::load`], but logs the failure and returns defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "using default physics config");
            Self::default()
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity_meters.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite".into()));
        }
        if self.quadtree.max_depth == 0 {
            return Err(ConfigError::Invalid("quadtree.max_depth must be at least 1".into()));
        }
        if self.quadtree.max_objects_per_node == 0 {
            return Err(ConfigError::Invalid(
                "quadtree.max_objects_per_node must be at least 1".into(),
            ));
        }
        if !(self.quadtree.min_size > 0.0) {
            return Err(ConfigError::Invalid("quadtree.min_size must be positive".into()));
        }
        if !(self.fixed_dt > 0.0) {
            return Err(ConfigError::Invalid("fixed_dt must be positive".into()));
        }
        Ok(())
    }

    /// Gravity in world units per second squared.
    pub fn gravity_units(&self) -> Vec2 {
        units::to_units_vec(self.gravity_meters)
    }
}
