//! Test fixtures and helpers.
//!
//! Pre-built players, units and world collaborators
//! for consistent testing.

use fixed::types::I32F32;
use rts_core::components::{Color, Player, PlayerId, Tile, Unit, UnitSize};
use rts_core::config::SimulationConfig;
use rts_core::error::{GameError, Result};
use rts_core::math::Vec2Fixed;
use rts_core::world::{WorldGenerator, WorldRequest, WorldResponse};

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Default simulation settings.
#[must_use]
pub fn test_config() -> SimulationConfig {
    SimulationConfig::default()
}

/// A player whose id derives from `name`.
#[must_use]
pub fn test_player(name: &str) -> Player {
    Player::new(name, Color::rgb(200, 40, 40))
}

/// A default-sized unit for `owner` standing on tile (`x`, `y`).
#[must_use]
pub fn test_unit(owner: PlayerId, x: i32, y: i32) -> Unit {
    let config = SimulationConfig::default();
    Unit::new(
        owner,
        Color::rgb(40, 200, 40),
        Vec2Fixed::from_ints(x, y),
        UnitSize::new(config.unit_size.width, config.unit_size.height),
        config.sight_radius,
    )
}

/// World that answers every request with the same terrain.
#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    /// Number of requests served.
    pub requests: usize,
}

impl WorldGenerator for StaticWorld {
    fn load(&mut self, request: &WorldRequest) -> Result<WorldResponse> {
        self.requests += 1;
        let tiles = request
            .rect
            .points()
            .map(|p| Tile::with_terrain(p, "grass", "plain1"))
            .collect();
        Ok(WorldResponse {
            rect: request.rect,
            tiles,
        })
    }
}

/// World whose generator always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingWorld;

impl WorldGenerator for FailingWorld {
    fn load(&mut self, request: &WorldRequest) -> Result<WorldResponse> {
        Err(GameError::WorldLoad {
            rect: request.rect,
            message: "generator offline".into(),
        })
    }
}
