//! World-generation collaborator.
//!
//! The core treats a [`WorldGenerator`] as the sole source of terrain
//! truth: given a rectangle it returns the tiles covering it, generating
//! any it has never produced before. [`ProceduralWorld`] is a
//! deterministic, seed-driven implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::Tile;
use crate::error::{GameError, Result};
use crate::grid::{GridPoint, GridRect};

/// A region the server wants terrain for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldRequest {
    /// Region to load.
    pub rect: GridRect,
}

/// Terrain covering a requested region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldResponse {
    /// Region that was loaded.
    pub rect: GridRect,
    /// One tile per point of `rect`, in row-major order.
    pub tiles: Vec<Tile>,
}

/// Source of terrain for the authoritative server.
pub trait WorldGenerator: Send {
    /// Produce the tiles covering `request.rect`.
    ///
    /// # Errors
    ///
    /// [`GameError::WorldLoad`] when the region cannot be produced.
    fn load(&mut self, request: &WorldRequest) -> Result<WorldResponse>;
}

/// Background classes by biome.
const BACKGROUNDS: [&str; 3] = ["grass", "sand", "water"];

/// Foreground classes drawn on grass.
const GRASS_FEATURES: [&str; 12] = [
    "plain1", "plain2", "plain3", "plain1", "plain2", "plain3", "forest1", "forest2", "forest3",
    "hill1", "hill2", "hill3",
];

/// Foreground classes drawn on sand.
const SAND_FEATURES: [&str; 6] = [
    "sand1", "sand2", "sand3", "mountain1", "mountain2", "mountain3",
];

/// Foreground classes drawn on water.
const WATER_FEATURES: [&str; 6] = ["sea1", "sea2", "sea3", "lake1", "lake2", "lake3"];

/// Side length of a biome patch, in tiles.
const BIOME_SIZE: i32 = 8;

/// Deterministic terrain from a seed.
///
/// Terrain depends only on the seed and the coordinate, so load order
/// never changes the result. Generated tiles are cached.
#[derive(Debug, Clone)]
pub struct ProceduralWorld {
    seed: u64,
    known: HashMap<GridPoint, Tile>,
}

impl ProceduralWorld {
    /// Create a generator for `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            known: HashMap::new(),
        }
    }

    /// Seed this world was built from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of tiles generated so far.
    #[must_use]
    pub fn generated_count(&self) -> usize {
        self.known.len()
    }

    /// Terrain at one point, generating it on first use.
    pub fn tile_at(&mut self, point: GridPoint) -> Tile {
        let seed = self.seed;
        self.known
            .entry(point)
            .or_insert_with(|| generate_tile(seed, point))
            .clone()
    }
}

impl WorldGenerator for ProceduralWorld {
    fn load(&mut self, request: &WorldRequest) -> Result<WorldResponse> {
        if request.rect.is_empty() {
            return Err(GameError::WorldLoad {
                rect: request.rect,
                message: "empty region".into(),
            });
        }
        let tiles = request.rect.points().map(|p| self.tile_at(p)).collect();
        Ok(WorldResponse {
            rect: request.rect,
            tiles,
        })
    }
}

fn generate_tile(seed: u64, point: GridPoint) -> Tile {
    let biome_x = point.x.div_euclid(BIOME_SIZE);
    let biome_y = point.y.div_euclid(BIOME_SIZE);
    // Grass dominates; sand and water patches are rarer.
    let back = match coord_hash(seed, biome_x, biome_y) % 10 {
        0..=5 => BACKGROUNDS[0],
        6..=7 => BACKGROUNDS[1],
        _ => BACKGROUNDS[2],
    };

    let detail = coord_hash(seed ^ 0xA5A5_A5A5_A5A5_A5A5, point.x, point.y);
    let front = match back {
        "sand" => SAND_FEATURES[(detail % SAND_FEATURES.len() as u64) as usize],
        "water" => WATER_FEATURES[(detail % WATER_FEATURES.len() as u64) as usize],
        _ => GRASS_FEATURES[(detail % GRASS_FEATURES.len() as u64) as usize],
    };

    Tile::with_terrain(point, back, front)
}

/// SplitMix64-style mix of a seed and a coordinate.
fn coord_hash(seed: u64, x: i32, y: i32) -> u64 {
    let mut z = seed
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((x as u32 as u64) << 32 | y as u32 as u64);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_covers_rect_in_row_major_order() {
        let mut world = ProceduralWorld::new(7);
        let rect = GridRect::new(-2, -2, 3, 1);
        let resp = world.load(&WorldRequest { rect }).unwrap();

        assert_eq!(resp.rect, rect);
        assert_eq!(resp.tiles.len(), 15);
        let points: Vec<_> = resp.tiles.iter().map(|t| t.point).collect();
        assert_eq!(points, rect.points().collect::<Vec<_>>());
        assert!(resp.tiles.iter().all(|t| !t.is_occupied() && !t.visible));
        assert!(resp.tiles.iter().all(|t| !t.back_style_class.is_empty()));
    }

    #[test]
    fn test_terrain_is_deterministic_and_order_independent() {
        let mut a = ProceduralWorld::new(12345);
        let mut b = ProceduralWorld::new(12345);

        let first = a.load(&WorldRequest { rect: GridRect::new(0, 0, 20, 20) }).unwrap();
        b.load(&WorldRequest { rect: GridRect::new(10, 10, 30, 30) }).unwrap();
        let second = b.load(&WorldRequest { rect: GridRect::new(0, 0, 20, 20) }).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let rect = GridRect::new(0, 0, 32, 32);
        let a = ProceduralWorld::new(1).load(&WorldRequest { rect }).unwrap();
        let b = ProceduralWorld::new(2).load(&WorldRequest { rect }).unwrap();
        assert_ne!(a.tiles, b.tiles);
    }

    #[test]
    fn test_cache_grows_once() {
        let mut world = ProceduralWorld::new(3);
        let rect = GridRect::new(0, 0, 4, 4);
        world.load(&WorldRequest { rect }).unwrap();
        world.load(&WorldRequest { rect }).unwrap();
        assert_eq!(world.generated_count(), 16);
    }

    #[test]
    fn test_empty_region_fails() {
        let mut world = ProceduralWorld::new(3);
        let err = world
            .load(&WorldRequest { rect: GridRect::EMPTY })
            .unwrap_err();
        assert!(matches!(err, GameError::WorldLoad { .. }));
    }
}
