//! Shared action handling.
//!
//! [`Game`] applies actions to one process's [`StateStore`] through a
//! single exhaustive match. The server and client wrap it and add their
//! side-specific handlers. Handlers never call back into a transport:
//! follow-up actions are returned to the caller for routing.
//!
//! Only the authoritative side turns an occupancy conflict into a
//! compensating `MoveStop`; replicas log it and wait for the server.

use tracing::{debug, warn};

use crate::components::{Player, Unit, UnitId};
use crate::config::SimulationConfig;
use crate::error::{GameError, Result};
use crate::movement;
use crate::protocol::{
    Action, MapLoadSuccessPayload, MoveStartPayload, MoveStepPayload, PlayerInitSuccessPayload,
};
use crate::store::StateStore;

/// Which side of the protocol a [`Game`] runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The server: ground truth, resolves conflicts.
    Server,
    /// A client: eventually consistent mirror.
    Replica,
}

/// State store plus the handlers every side shares.
#[derive(Debug, Clone)]
pub struct Game {
    store: StateStore,
    config: SimulationConfig,
    authority: Authority,
    tick: u64,
}

impl Game {
    /// Create an empty game.
    #[must_use]
    pub fn new(config: SimulationConfig, authority: Authority) -> Self {
        Self {
            store: StateStore::new(),
            config,
            authority,
            tick: 0,
        }
    }

    /// Read access to the store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Write access to the store, for side-specific handlers.
    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// True on the server.
    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        self.authority == Authority::Server
    }

    /// Number of ticks advanced so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Apply one action. Returns follow-up actions to route.
    pub fn handle_action(&mut self, action: &Action) -> Vec<Action> {
        debug!(kind = %action.kind(), authority = ?self.authority, "handle action");

        match action {
            Action::PlayerInit(player) => {
                self.handle_player_init(player);
                Vec::new()
            }
            Action::PlayerInitSuccess(payload) => {
                self.handle_player_init_success(payload);
                Vec::new()
            }
            Action::AddUnit(unit) => {
                if let Err(err) = self.add_unit(unit.clone()) {
                    warn!(unit = %unit.id, %err, "spawned unit could not be placed");
                }
                Vec::new()
            }
            Action::MoveStart(payload) => {
                if let Err(err) = self.handle_move_start(payload) {
                    warn!(unit = %payload.unit_id, %err, "move order ignored");
                }
                Vec::new()
            }
            Action::MoveStep(payload) => match self.handle_move_step(payload) {
                Ok(follow_up) => follow_up,
                Err(err) => {
                    warn!(unit = %payload.unit_id, %err, "move step ignored");
                    Vec::new()
                }
            },
            Action::MoveStop(unit_id) => {
                self.handle_move_stop(*unit_id);
                Vec::new()
            }
            Action::MapLoadSuccess(payload) => {
                self.handle_map_load_success(payload);
                Vec::new()
            }
            // Requests and failures are side-specific.
            Action::MapLoad(_) | Action::MapLoadFailure(_) => Vec::new(),
        }
    }

    /// Store a unit and occupy its tile.
    pub fn add_unit(&mut self, unit: Unit) -> Result<()> {
        self.store.store_unit(unit.clone());
        self.store.place_unit(&unit, &[])
    }

    /// Advance every unit one tick, in sorted id order.
    ///
    /// On the server each waypoint arrival is settled against the occupancy
    /// grid and announced with `MoveStep` (plus `MoveStop` when the next
    /// waypoint is taken). Replicas only interpolate and return nothing.
    pub fn tick(&mut self) -> Vec<Action> {
        self.tick += 1;
        let mut outgoing = Vec::new();

        for id in self.store.sorted_unit_ids() {
            let Some(unit) = self.store.unit_mut(id) else {
                continue;
            };
            let Some(step) = movement::advance(unit, &self.config) else {
                continue;
            };
            if self.is_authoritative() {
                outgoing.push(Action::MoveStep(step));
                outgoing.extend(self.settle_step(id));
            }
        }

        outgoing
    }

    fn handle_player_init(&mut self, player: &Player) {
        self.store.store_player(player.clone());
    }

    fn handle_player_init_success(&mut self, payload: &PlayerInitSuccessPayload) {
        for unit in &payload.units {
            if let Err(err) = self.add_unit(unit.clone()) {
                warn!(unit = %unit.id, %err, "snapshot unit could not be placed");
            }
        }
        for player in &payload.players {
            self.store.store_player(player.clone());
        }
    }

    fn handle_move_start(&mut self, payload: &MoveStartPayload) -> Result<()> {
        let authoritative = self.is_authoritative();
        let unit = self.store.unit_by_id_mut(payload.unit_id)?;
        let replanned = movement::move_to(unit, payload.point, &self.config)?;
        if replanned && authoritative {
            // Release any reservation made for the abandoned path.
            let unit = unit.clone();
            self.store.vacate_unit(unit.id);
            self.store.place_unit(&unit, &[])?;
        }
        Ok(())
    }

    fn handle_move_step(&mut self, payload: &MoveStepPayload) -> Result<Vec<Action>> {
        let unit = self.store.unit_by_id_mut(payload.unit_id)?;
        movement::apply_step(unit, payload);
        Ok(self.settle_step(payload.unit_id))
    }

    /// Clear stale occupancy, occupy the current tile and reserve the next
    /// waypoint. Returns `MoveStop` on the server when the reservation fails.
    fn settle_step(&mut self, unit_id: UnitId) -> Vec<Action> {
        let Some(unit) = self.store.unit(unit_id).cloned() else {
            return Vec::new();
        };

        self.store.vacate_unit(unit_id);
        if let Err(err) = self.store.place_unit(&unit, &[]) {
            warn!(unit = %unit_id, %err, "unit stands on an occupied tile");
        }

        let Some(next) = movement::next_tile(&unit) else {
            return Vec::new();
        };
        match self.store.place_unit(&unit, &[next]) {
            Ok(()) => Vec::new(),
            Err(err @ GameError::PlacementConflict { .. }) => {
                if self.is_authoritative() {
                    debug!(unit = %unit_id, %err, "next waypoint taken, stopping");
                    self.handle_move_stop(unit_id);
                    vec![Action::MoveStop(unit_id)]
                } else {
                    warn!(unit = %unit_id, %err, "replica saw a reservation conflict");
                    Vec::new()
                }
            }
            Err(err) => {
                warn!(unit = %unit_id, %err, "reservation failed");
                Vec::new()
            }
        }
    }

    fn handle_move_stop(&mut self, unit_id: UnitId) {
        let Some(unit) = self.store.unit_mut(unit_id) else {
            warn!(unit = %unit_id, "stop for unknown unit");
            return;
        };
        movement::stop(unit);
        let unit = unit.clone();

        self.store.vacate_unit(unit_id);
        if let Err(err) = self.store.place_unit(&unit, &[]) {
            warn!(unit = %unit_id, %err, "stopped unit stands on an occupied tile");
        }
    }

    fn handle_map_load_success(&mut self, payload: &MapLoadSuccessPayload) {
        for tile in &payload.tiles {
            self.store.merge_terrain(tile.clone());
        }
    }
}
