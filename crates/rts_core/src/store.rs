//! Per-process state store.
//!
//! Holds players, units and a sparse, append-only tile grid. The store has
//! no internal locking: callers serialize access (see the server's and
//! client's shared wrappers, which are the only legal mutation paths).
//!
//! # Occupancy
//!
//! [`StateStore::place_unit`] is the sole consistency gate that keeps two
//! units off one tile. A reverse index from unit to occupied points is
//! kept in step with every tile write so that stale occupancy can be
//! cleared before a move.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use crate::components::{Player, PlayerId, Tile, Unit, UnitId};
use crate::error::{GameError, Result};
use crate::grid::{GridPoint, GridRect};

/// Storage for every entity known to one process.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    players: HashMap<PlayerId, Player>,
    units: HashMap<UnitId, Unit>,
    tiles: HashMap<GridPoint, Tile>,
    /// Reverse index: points whose tile names the unit as occupant.
    occupancy: HashMap<UnitId, BTreeSet<GridPoint>>,
}

impl StateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert or replace a player.
    pub fn store_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Look up a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// All players, ordered by id.
    #[must_use]
    pub fn all_players(&self) -> Vec<Player> {
        let mut players: Vec<_> = self.players.values().cloned().collect();
        players.sort_unstable_by_key(|p| p.id);
        players
    }

    /// Number of known players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Insert or replace a unit. Occupancy is not touched.
    pub fn store_unit(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a unit for mutation.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Look up a unit, failing with [`GameError::UnitNotFound`].
    pub fn unit_by_id(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(GameError::UnitNotFound(id))
    }

    /// Look up a unit for mutation, failing with [`GameError::UnitNotFound`].
    pub fn unit_by_id_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(GameError::UnitNotFound(id))
    }

    /// All units, ordered by id.
    #[must_use]
    pub fn all_units(&self) -> Vec<Unit> {
        let mut units: Vec<_> = self.units.values().cloned().collect();
        units.sort_unstable_by_key(|u| u.id);
        units
    }

    /// Unit ids in sorted order for deterministic iteration.
    #[must_use]
    pub fn sorted_unit_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Units owned by one player, ordered by id.
    pub fn units_owned_by(&self, owner: PlayerId) -> impl Iterator<Item = &Unit> {
        let mut units: Vec<_> = self.units.values().filter(|u| u.owner == owner).collect();
        units.sort_unstable_by_key(|u| u.id);
        units.into_iter()
    }

    /// Iterate mutably over all units (not in deterministic order).
    pub fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Number of known units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    // ------------------------------------------------------------------
    // Tiles
    // ------------------------------------------------------------------

    /// Fetch a tile, creating an empty one on first access.
    pub fn get_tile(&mut self, point: GridPoint) -> &Tile {
        self.tiles.entry(point).or_insert_with(|| Tile::empty(point))
    }

    /// Fetch a tile without creating it.
    #[must_use]
    pub fn tile(&self, point: GridPoint) -> Option<&Tile> {
        self.tiles.get(&point)
    }

    /// Insert or replace a tile wholesale, including its occupant.
    pub fn store_tile(&mut self, tile: Tile) {
        let point = tile.point;
        let new_occupant = tile.unit_id;
        if let Some(old) = self.tiles.insert(point, tile) {
            if old.unit_id != new_occupant {
                self.unindex(old.unit_id, point);
            }
        }
        if !new_occupant.is_zero() {
            self.occupancy.entry(new_occupant).or_default().insert(point);
        }
    }

    /// Store the terrain of a loaded tile, keeping any occupant and
    /// visibility already recorded at that point.
    pub fn merge_terrain(&mut self, tile: Tile) {
        match self.tiles.get_mut(&tile.point) {
            Some(existing) => {
                existing.back_style_class = tile.back_style_class;
                existing.front_style_class = tile.front_style_class;
            }
            None => {
                self.store_tile(tile);
            }
        }
    }

    /// Set the visibility flag of a tile, creating it if needed.
    pub fn set_tile_visible(&mut self, point: GridPoint, visible: bool) {
        self.tiles
            .entry(point)
            .or_insert_with(|| Tile::empty(point))
            .visible = visible;
    }

    /// Tiles inside `rect`, creating empty ones where none exist yet.
    pub fn tiles_in(&mut self, rect: GridRect) -> Vec<Tile> {
        rect.points().map(|p| self.get_tile(p).clone()).collect()
    }

    /// Number of materialized tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles currently recording `unit` as occupant, ordered by point.
    #[must_use]
    pub fn tiles_by_unit_id(&self, unit: UnitId) -> Vec<&Tile> {
        self.occupancy
            .get(&unit)
            .into_iter()
            .flatten()
            .filter_map(|p| self.tiles.get(p))
            .collect()
    }

    // ------------------------------------------------------------------
    // Occupancy
    // ------------------------------------------------------------------

    /// Occupy `points` with `unit`, or its rounded position when empty.
    ///
    /// Every point is checked before any tile is written, so a conflict
    /// leaves the grid unchanged.
    ///
    /// # Errors
    ///
    /// [`GameError::PlacementConflict`] if any target tile is held by a
    /// different unit.
    pub fn place_unit(&mut self, unit: &Unit, points: &[GridPoint]) -> Result<()> {
        let own_tile = [unit.tile()];
        let points = if points.is_empty() { &own_tile[..] } else { points };

        for &point in points {
            let occupant = self.get_tile(point).unit_id;
            if !occupant.is_zero() && occupant != unit.id {
                return Err(GameError::PlacementConflict {
                    point,
                    unit: unit.id,
                    occupant,
                });
            }
        }

        for &point in points {
            if let Some(tile) = self.tiles.get_mut(&point) {
                tile.unit_id = unit.id;
            }
            self.occupancy.entry(unit.id).or_default().insert(point);
        }
        Ok(())
    }

    /// Clear every tile occupied by `unit`. Returns the vacated points.
    pub fn vacate_unit(&mut self, unit: UnitId) -> Vec<GridPoint> {
        let points: Vec<_> = self
            .occupancy
            .remove(&unit)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for point in &points {
            if let Some(tile) = self.tiles.get_mut(point) {
                if tile.unit_id == unit {
                    tile.unit_id = UnitId::ZERO;
                }
            }
        }
        points
    }

    fn unindex(&mut self, unit: UnitId, point: GridPoint) {
        if unit.is_zero() {
            return;
        }
        if let Some(set) = self.occupancy.get_mut(&unit) {
            set.remove(&point);
            if set.is_empty() {
                self.occupancy.remove(&unit);
            }
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Hash of players, units and occupied tiles in sorted order.
    ///
    /// Identical on every process that applied the same actions.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        let players = self.all_players();
        players.len().hash(&mut hasher);
        for player in &players {
            player.id.hash(&mut hasher);
            player.name.hash(&mut hasher);
        }

        let units = self.all_units();
        units.len().hash(&mut hasher);
        for unit in &units {
            unit.id.hash(&mut hasher);
            unit.owner.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.path.hash(&mut hasher);
            unit.step.hash(&mut hasher);
        }

        let mut occupied: Vec<_> = self
            .tiles
            .values()
            .filter(|t| t.is_occupied())
            .map(|t| (t.point, t.unit_id))
            .collect();
        occupied.sort_unstable();
        occupied.hash(&mut hasher);

        hasher.finish()
    }
}
