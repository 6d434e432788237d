//! # RTS Dedicated Server
//!
//! Authoritative server for multiplayer games.
//!
//! Runs the simulation without rendering: accepts joins, spawns units,
//! loads world regions on request, advances movement every tick and
//! routes the resulting actions to connected peers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use std::path::Path;

use rts_core::config::SimulationConfig;
use rts_core::error::GameError;
use rts_core::grid::GridPoint;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod game;
pub mod hub;
pub mod router;
pub mod shared;

pub use error::{Result, ServerError};
pub use game::ServerGame;
pub use hub::{Hub, PeerHandle, PeerId};
pub use router::{route, Outgoing, Recipient};
pub use shared::SharedServer;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 20;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Maximum players per game.
    pub max_players: u8,
    /// Tick rate (should match client).
    pub tick_rate: u32,
    /// Seed for procedural terrain.
    pub world_seed: u64,
    /// Preferred spawn tiles, tried in order.
    pub spawn_points: Vec<GridPoint>,
    /// Shared simulation tuning.
    pub simulation: SimulationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players: 8,
            tick_rate: TICK_RATE,
            world_seed: 42,
            spawn_points: vec![
                GridPoint::new(0, 0),
                GridPoint::new(10, 0),
                GridPoint::new(0, 10),
                GridPoint::new(10, 10),
            ],
            simulation: SimulationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| {
            GameError::Config(format!("failed to parse server config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron_str(&text)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(GameError::Config("tick_rate must be positive".into()).into());
        }
        if self.max_players == 0 {
            return Err(GameError::Config("max_players must be positive".into()).into());
        }
        self.simulation.validate()?;
        Ok(())
    }
}
