//! Entity definitions.
//!
//! Players, units and tiles are pure data with no behavior; the
//! movement planner, visibility engine and state store operate on them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::{GridPoint, GridRect};
use crate::math::{Fixed, Vec2Fixed};

/// Stable identity of a player.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Derive the identity of a player from their name.
    ///
    /// The MD5 digest of the name bytes becomes the 16 UUID bytes, so the
    /// same name always maps to the same identity across sessions.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let digest = md5::compute(name.as_bytes());
        Self(Uuid::from_bytes(digest.0))
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a unit, stable for the unit's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub Uuid);

impl UnitId {
    /// Sentinel meaning "no unit".
    pub const ZERO: Self = Self(Uuid::nil());

    /// Generate a fresh random unit identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// True for the "no unit" sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    #[serde(rename = "R")]
    pub r: u8,
    /// Green channel.
    #[serde(rename = "G")]
    pub g: u8,
    /// Blue channel.
    #[serde(rename = "B")]
    pub b: u8,
    /// Alpha channel.
    #[serde(rename = "A")]
    pub a: u8,
}

impl Color {
    /// Opaque color from RGB channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// A participant in the game. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Player {
    /// Identity derived from the name.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Color used for this player's units.
    pub color: Color,
}

impl Player {
    /// Create a player whose identity is derived from `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        let name = name.into();
        Self {
            id: PlayerId::from_name(&name),
            name,
            color,
        }
    }
}

/// Pixel footprint of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UnitSize {
    /// Width in pixels.
    #[serde(rename = "W")]
    pub width: u32,
    /// Height in pixels.
    #[serde(rename = "H")]
    pub height: u32,
}

impl UnitSize {
    /// Create a new unit size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A movable unit owned by a player.
///
/// `path[step]` is the next unvisited waypoint; `step == path.len()` means
/// the unit has arrived and is idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Owning player.
    pub owner: PlayerId,
    /// Display color.
    pub color: Color,
    /// Current world position.
    pub position: Vec2Fixed,
    /// Pixel footprint.
    pub size: UnitSize,
    /// Client-local selection flag. Never replicated.
    #[serde(skip)]
    pub selected: bool,
    /// Planned waypoints.
    #[serde(default)]
    pub path: Vec<Vec2Fixed>,
    /// Index of the next waypoint in `path`.
    #[serde(default)]
    pub step: usize,
    /// Radius of the shared sight-set this unit sees with.
    pub sight_radius: u32,
}

impl Unit {
    /// Create an idle unit with a fresh identifier.
    #[must_use]
    pub fn new(
        owner: PlayerId,
        color: Color,
        position: Vec2Fixed,
        size: UnitSize,
        sight_radius: u32,
    ) -> Self {
        Self {
            id: UnitId::new(),
            owner,
            color,
            position,
            size,
            selected: false,
            path: Vec::new(),
            step: 0,
            sight_radius,
        }
    }

    /// True once every waypoint has been visited (or there is no path).
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.step >= self.path.len()
    }

    /// The next unvisited waypoint, if any.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec2Fixed> {
        self.path.get(self.step).copied()
    }

    /// Tile the unit currently stands on.
    #[must_use]
    pub fn tile(&self) -> GridPoint {
        self.position.round_to_grid()
    }

    /// Screen-space footprint in world pixels for a given tile pixel size.
    #[must_use]
    pub fn pixel_rect(&self, tile_size: u32) -> GridRect {
        let scaled = self.position.scale(Fixed::from_num(tile_size));
        let x: i32 = scaled.x.round().to_num();
        let y: i32 = scaled.y.round().to_num();
        GridRect::new(
            x,
            y,
            x + self.size.width as i32,
            y + self.size.height as i32,
        )
    }
}

/// One cell of the sparse, append-only world grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tile {
    /// Tile coordinate (the store key).
    pub point: GridPoint,
    /// Background terrain style.
    #[serde(default)]
    pub back_style_class: String,
    /// Foreground terrain style.
    #[serde(default)]
    pub front_style_class: String,
    /// Occupying unit or [`UnitId::ZERO`].
    #[serde(default)]
    pub unit_id: UnitId,
    /// Whether the observing player currently sees this tile.
    #[serde(default)]
    pub visible: bool,
}

impl Tile {
    /// An unloaded tile with no terrain and no occupant.
    #[must_use]
    pub fn empty(point: GridPoint) -> Self {
        Self {
            point,
            back_style_class: String::new(),
            front_style_class: String::new(),
            unit_id: UnitId::ZERO,
            visible: false,
        }
    }

    /// A tile with terrain classes and no occupant.
    #[must_use]
    pub fn with_terrain(
        point: GridPoint,
        back_style_class: impl Into<String>,
        front_style_class: impl Into<String>,
    ) -> Self {
        Self {
            back_style_class: back_style_class.into(),
            front_style_class: front_style_class.into(),
            ..Self::empty(point)
        }
    }

    /// True if some unit occupies the tile.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        !self.unit_id.is_zero()
    }
}
