//! Client replica.
//!
//! [`ClientGame`] applies server actions to a replica [`Game`], keeps the
//! materialized view of its viewport, and recomputes visibility whenever
//! what the local player can see may have changed.

use rts_core::components::{Player, PlayerId, Tile, UnitId};
use rts_core::config::SimulationConfig;
use rts_core::game::{Authority, Game};
use rts_core::grid::{GridPoint, GridRect};
use rts_core::math::Vec2Fixed;
use rts_core::protocol::{Action, MapLoadFailurePayload, MapLoadSuccessPayload};
use rts_core::store::StateStore;
use rts_core::streaming::{Camera, Viewport};
use rts_core::visibility::VisibilityEngine;
use tracing::{debug, warn};

/// One player's view of the game.
#[derive(Debug, Clone)]
pub struct ClientGame {
    game: Game,
    player: Player,
    camera: Camera,
    screen: Option<(u32, u32)>,
    viewport: Viewport,
    visibility: VisibilityEngine,
    view: Vec<Tile>,
    failed_loads: Vec<GridRect>,
}

impl ClientGame {
    /// Create a replica for `player`.
    #[must_use]
    pub fn new(player: Player, config: SimulationConfig) -> Self {
        let camera = Camera::new(config.tile_size);
        Self {
            game: Game::new(config, Authority::Replica),
            player,
            camera,
            screen: None,
            viewport: Viewport::new(),
            visibility: VisibilityEngine::new(),
            view: Vec::new(),
            failed_loads: Vec::new(),
        }
    }

    /// The local player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The local player's id.
    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        self.player.id
    }

    /// Replica store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        self.game.store()
    }

    /// Shared game state.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Camera used for screen mapping.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Current viewport rectangle.
    #[must_use]
    pub fn viewport(&self) -> GridRect {
        self.viewport.rect()
    }

    /// Materialized tiles of the viewport, row-major.
    #[must_use]
    pub fn view(&self) -> &[Tile] {
        &self.view
    }

    /// Regions whose last load failed and will be re-requested.
    #[must_use]
    pub fn failed_loads(&self) -> &[GridRect] {
        &self.failed_loads
    }

    /// True if the tile was visible after the last fog pass.
    #[must_use]
    pub fn is_visible(&self, point: GridPoint) -> bool {
        self.visibility.is_visible(point)
    }

    /// The join request to send first.
    #[must_use]
    pub fn join(&self) -> Action {
        Action::PlayerInit(self.player.clone())
    }

    /// Apply one action received from the server.
    pub fn handle_action(&mut self, action: &Action) {
        debug!(kind = %action.kind(), player = %self.player.name, "client handle");

        match action {
            Action::PlayerInitSuccess(payload) => {
                if payload.player_id != self.player.id {
                    debug!(target_player = %payload.player_id, "snapshot for another player");
                    return;
                }
                self.game.handle_action(action);
                self.refresh_visibility();
            }
            Action::MapLoadSuccess(payload) => self.handle_map_load_success(action, payload),
            Action::MapLoadFailure(payload) => self.handle_map_load_failure(payload),
            Action::AddUnit(_) | Action::MoveStep(_) => {
                self.game.handle_action(action);
                self.refresh_visibility();
            }
            Action::PlayerInit(_) | Action::MoveStart(_) | Action::MoveStop(_) => {
                self.game.handle_action(action);
            }
            Action::MapLoad(_) => {
                debug!("ignoring map load request echoed to a client");
            }
        }
    }

    /// Advance local units for display. Arrivals are not reported; the
    /// server's `MoveStep` resynchronizes every replica.
    pub fn tick(&mut self) {
        // Replica ticks never produce actions.
        let _ = self.game.tick();
    }

    /// Move the viewport.
    ///
    /// Returns `None` when unchanged. Otherwise returns the `MapLoad`
    /// requests for newly exposed strips plus retries for earlier failures
    /// still in view.
    pub fn set_viewport(&mut self, rect: GridRect) -> Option<Vec<Action>> {
        let strips = self.viewport.set(rect)?;
        let mut requests: Vec<Action> = strips
            .into_iter()
            .map(|strip| Action::map_load(strip, self.player.id))
            .collect();

        let (retry, keep): (Vec<_>, Vec<_>) = self
            .failed_loads
            .drain(..)
            .partition(|failed| failed.overlaps(&rect));
        self.failed_loads = keep;
        for failed in retry {
            let region = failed.intersect(&rect);
            debug!(%region, "retrying failed map load");
            requests.push(Action::map_load(region, self.player.id));
        }

        self.refresh_visibility();
        Some(requests)
    }

    /// Resize the rendering surface, updating the viewport.
    pub fn resize(&mut self, width: u32, height: u32) -> Option<Vec<Action>> {
        self.screen = Some((width, height));
        self.set_viewport(self.camera.viewport_for_screen(width, height))
    }

    /// Pan the camera by a pixel delta, updating the viewport once the
    /// surface size is known.
    pub fn pan(&mut self, dx: i32, dy: i32) -> Option<Vec<Action>> {
        self.camera.pan(dx, dy);
        let (width, height) = self.screen?;
        self.set_viewport(self.camera.viewport_for_screen(width, height))
    }

    /// Pan one input tick in a direction. Each axis is reduced to -1, 0 or
    /// +1 and scaled by the configured camera speed.
    pub fn pan_step(&mut self, dx: i32, dy: i32) -> Option<Vec<Action>> {
        let speed = self.game.config().camera_speed;
        self.pan(dx.signum() * speed, dy.signum() * speed)
    }

    /// Select units whose pixel footprint overlaps `world_rect` (world
    /// pixels). Without `additive`, units outside the box are deselected.
    /// Returns the number of selected units.
    pub fn select_in_rect(&mut self, world_rect: GridRect, additive: bool) -> usize {
        let tile_size = self.camera.tile_size as u32;
        let mut selected = 0;
        for unit in self.game.store_mut().units_mut() {
            if world_rect.overlaps(&unit.pixel_rect(tile_size)) {
                unit.selected = true;
            } else if !additive {
                unit.selected = false;
            }
            if unit.selected {
                selected += 1;
            }
        }
        selected
    }

    /// Selected units, ordered by id.
    #[must_use]
    pub fn selected_units(&self) -> Vec<UnitId> {
        self.store()
            .all_units()
            .into_iter()
            .filter(|u| u.selected)
            .map(|u| u.id)
            .collect()
    }

    /// `MoveStart` orders sending every selected own unit to `tile`.
    #[must_use]
    pub fn order_move(&self, tile: GridPoint) -> Vec<Action> {
        let target = Vec2Fixed::from_grid(tile);
        self.store()
            .units_owned_by(self.player.id)
            .filter(|u| u.selected)
            .map(|u| Action::move_start(u.id, target))
            .collect()
    }

    /// Move orders for a pointer at screen pixel (`x`, `y`).
    #[must_use]
    pub fn order_move_at_screen(&self, x: i32, y: i32) -> Vec<Action> {
        self.order_move(self.camera.screen_to_world_tiles(x, y))
    }

    fn handle_map_load_success(&mut self, action: &Action, payload: &MapLoadSuccessPayload) {
        if payload.player_id != self.player.id {
            debug!(target_player = %payload.player_id, "map load for another player");
            return;
        }
        self.game.handle_action(action);
        self.failed_loads.retain(|failed| *failed != payload.rect);
        self.refresh_visibility();
    }

    fn handle_map_load_failure(&mut self, payload: &MapLoadFailurePayload) {
        if payload.player_id != self.player.id {
            return;
        }
        warn!(rect = %payload.rect, message = %payload.message, "map load failed");
        if !self.failed_loads.contains(&payload.rect) {
            self.failed_loads.push(payload.rect);
        }
    }

    /// Recompute fog over the viewport, then rebuild the materialized view.
    fn refresh_visibility(&mut self) {
        let rect = self.viewport.rect();
        self.visibility
            .recompute(self.game.store_mut(), self.player.id, rect);
        self.view = self.game.store_mut().tiles_in(rect);
    }
}
