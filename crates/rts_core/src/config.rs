//! Simulation tuning shared by the server and every client.
//!
//! Loaded from RON. Values are stored as plain numbers for hand editing
//! and converted to [`Fixed`] at the point of use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::UnitSize;
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::visibility::MAX_SIGHT_RADIUS;

/// Tunable constants for movement, visibility and streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Distance a unit travels per tick, in world units.
    pub unit_speed: f64,
    /// A unit closer than this to its waypoint snaps onto it.
    pub arrival_epsilon: f64,
    /// Radius of the default sight-set, in tiles.
    pub sight_radius: u32,
    /// Upper bound on generated path length.
    pub max_path_len: usize,
    /// Largest region a single map-load request may cover, in tiles.
    pub max_load_area: u64,
    /// Edge length of one tile in screen pixels.
    pub tile_size: u32,
    /// Footprint of freshly spawned units.
    pub unit_size: UnitSize,
    /// Camera pan distance per input tick, in pixels.
    pub camera_speed: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            unit_speed: 0.1,
            arrival_epsilon: 0.1,
            sight_radius: 5,
            max_path_len: 4096,
            max_load_area: 65_536,
            tile_size: 16,
            unit_size: UnitSize::new(32, 32),
            camera_speed: 2,
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text)
            .map_err(|e| GameError::Config(format!("failed to parse simulation config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GameError::Config(format!(
                "failed to read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_ron_str(&text)
    }

    /// Reject values that would stall or break the simulation.
    pub fn validate(&self) -> Result<()> {
        if !(self.unit_speed.is_finite() && self.unit_speed > 0.0) {
            return Err(GameError::Config(format!(
                "unit_speed must be positive, got {}",
                self.unit_speed
            )));
        }
        if !(self.arrival_epsilon.is_finite() && self.arrival_epsilon > 0.0) {
            return Err(GameError::Config(format!(
                "arrival_epsilon must be positive, got {}",
                self.arrival_epsilon
            )));
        }
        if self.sight_radius == 0 || self.sight_radius > MAX_SIGHT_RADIUS {
            return Err(GameError::Config(format!(
                "sight_radius must be within 1..={MAX_SIGHT_RADIUS}, got {}",
                self.sight_radius
            )));
        }
        if self.max_path_len == 0 {
            return Err(GameError::Config("max_path_len must be positive".into()));
        }
        if self.max_load_area == 0 {
            return Err(GameError::Config("max_load_area must be positive".into()));
        }
        if self.tile_size == 0 {
            return Err(GameError::Config("tile_size must be positive".into()));
        }
        Ok(())
    }

    /// Per-tick speed as a fixed-point number.
    #[must_use]
    pub fn speed(&self) -> Fixed {
        Fixed::from_num(self.unit_speed)
    }

    /// Arrival epsilon as a fixed-point number.
    #[must_use]
    pub fn epsilon(&self) -> Fixed {
        Fixed::from_num(self.arrival_epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sight_radius, 5);
        assert_eq!(config.speed(), Fixed::from_num(0.1));
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = SimulationConfig::from_ron_str("(sight_radius: 7, unit_speed: 0.25)").unwrap();
        assert_eq!(config.sight_radius, 7);
        assert_eq!(config.unit_speed, 0.25);
        assert_eq!(config.tile_size, 16);
    }

    #[test]
    fn test_rejects_zero_speed() {
        let err = SimulationConfig::from_ron_str("(unit_speed: 0.0)").unwrap_err();
        assert!(matches!(err, GameError::Config(_)));
    }

    #[test]
    fn test_rejects_oversized_sight_radius() {
        let err = SimulationConfig::from_ron_str("(sight_radius: 100000)").unwrap_err();
        assert!(matches!(err, GameError::Config(msg) if msg.contains("sight_radius")));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(SimulationConfig::from_ron_str("not ron at all").is_err());
    }
}
