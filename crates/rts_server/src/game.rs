//! Authoritative game.
//!
//! Wraps the shared [`Game`] with the handlers only the server runs:
//! accepting joins, spawning units and answering region loads. Every
//! handler returns routed [`Outgoing`] actions instead of sending them.

use rts_core::components::{Player, Unit};
use rts_core::game::{Authority, Game};
use rts_core::grid::GridPoint;
use rts_core::math::Vec2Fixed;
use rts_core::protocol::{
    Action, MapLoadFailurePayload, MapLoadPayload, MapLoadSuccessPayload, PlayerInitSuccessPayload,
};
use rts_core::store::StateStore;
use rts_core::world::{ProceduralWorld, WorldGenerator, WorldRequest};
use tracing::{debug, info, warn};

use crate::router::{route, Outgoing};
use crate::ServerConfig;

/// How far the fallback spawn search looks around the first spawn point.
const SPAWN_SEARCH_RADIUS: i32 = 64;

/// The authoritative simulation.
pub struct ServerGame {
    game: Game,
    config: ServerConfig,
    world: Box<dyn WorldGenerator>,
}

impl std::fmt::Debug for ServerGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerGame")
            .field("game", &self.game)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServerGame {
    /// Create a server backed by `world`.
    #[must_use]
    pub fn new(config: ServerConfig, world: Box<dyn WorldGenerator>) -> Self {
        Self {
            game: Game::new(config.simulation.clone(), Authority::Server),
            config,
            world,
        }
    }

    /// Create a server with seeded procedural terrain.
    #[must_use]
    pub fn with_procedural_world(config: ServerConfig) -> Self {
        let world = ProceduralWorld::new(config.world_seed);
        Self::new(config, Box::new(world))
    }

    /// Shared game state.
    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Authoritative store.
    #[must_use]
    pub fn store(&self) -> &StateStore {
        self.game.store()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Apply one action received from a peer.
    ///
    /// Peers may only join, order moves and request regions; every other
    /// kind is produced by the server itself and is dropped.
    pub fn apply(&mut self, action: Action) -> Vec<Outgoing> {
        debug!(kind = %action.kind(), "server handle");

        match action {
            Action::PlayerInit(player) => self.handle_player_init(player),
            Action::MapLoad(payload) => self.handle_map_load(&payload),
            Action::MoveStart(_) => {
                let follow_up = self.game.handle_action(&action);
                std::iter::once(action)
                    .chain(follow_up)
                    .map(route)
                    .collect()
            }
            Action::PlayerInitSuccess(_)
            | Action::AddUnit(_)
            | Action::MoveStep(_)
            | Action::MoveStop(_)
            | Action::MapLoadSuccess(_)
            | Action::MapLoadFailure(_) => {
                warn!(kind = %action.kind(), "peer sent a server-only action, dropping");
                Vec::new()
            }
        }
    }

    /// Advance the simulation one tick.
    pub fn tick(&mut self) -> Vec<Outgoing> {
        let outgoing: Vec<Outgoing> = self.game.tick().into_iter().map(route).collect();
        if !outgoing.is_empty() {
            debug!(tick = self.game.current_tick(), actions = outgoing.len(), "tick output");
        }
        outgoing
    }

    fn handle_player_init(&mut self, player: Player) -> Vec<Outgoing> {
        let known = self.store().player(player.id).is_some();
        if !known && self.store().player_count() >= usize::from(self.config.max_players) {
            warn!(
                player = %player.name,
                max_players = self.config.max_players,
                "game is full, join refused"
            );
            return Vec::new();
        }

        self.game.handle_action(&Action::PlayerInit(player.clone()));
        info!(player = %player.name, id = %player.id, rejoin = known, "player joined");

        let mut outgoing = vec![
            route(Action::PlayerInitSuccess(PlayerInitSuccessPayload {
                player_id: player.id,
                units: self.store().all_units(),
                players: self.store().all_players(),
            })),
            route(Action::PlayerInit(player.clone())),
        ];

        if self.store().units_owned_by(player.id).next().is_some() {
            return outgoing;
        }

        match self.spawn_unit_for(&player) {
            Some(unit) => outgoing.push(route(Action::AddUnit(unit))),
            None => warn!(player = %player.name, "no free tile to spawn a unit"),
        }
        outgoing
    }

    fn spawn_unit_for(&mut self, player: &Player) -> Option<Unit> {
        let point = self.free_spawn_point()?;
        let sim = self.game.config();
        let unit = Unit::new(
            player.id,
            player.color,
            Vec2Fixed::from_grid(point),
            sim.unit_size,
            sim.sight_radius,
        );
        if let Err(err) = self.game.add_unit(unit.clone()) {
            warn!(%err, "spawn placement failed");
            return None;
        }
        info!(player = %player.name, unit = %unit.id, %point, "unit spawned");
        Some(unit)
    }

    /// First configured spawn point with no occupant, else the nearest free
    /// tile on growing rings around the first spawn point.
    fn free_spawn_point(&mut self) -> Option<GridPoint> {
        let store = self.game.store_mut();
        if let Some(point) = self
            .config
            .spawn_points
            .iter()
            .copied()
            .find(|p| !store.get_tile(*p).is_occupied())
        {
            return Some(point);
        }

        let center = self
            .config
            .spawn_points
            .first()
            .copied()
            .unwrap_or(GridPoint::ZERO);
        for radius in 1..=SPAWN_SEARCH_RADIUS {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx.abs() != radius && dy.abs() != radius {
                        continue;
                    }
                    let point = center.offset(GridPoint::new(dx, dy));
                    if !store.get_tile(point).is_occupied() {
                        return Some(point);
                    }
                }
            }
        }
        None
    }

    fn handle_map_load(&mut self, payload: &MapLoadPayload) -> Vec<Outgoing> {
        let rect = payload.rect;
        let limit = self.game.config().max_load_area;
        if rect.area() > limit {
            warn!(%rect, area = rect.area(), limit, "map load too large");
            return vec![route(Action::MapLoadFailure(MapLoadFailurePayload {
                rect,
                player_id: payload.player_id,
                message: format!("region of {} tiles exceeds limit of {limit}", rect.area()),
            }))];
        }

        match self.world.load(&WorldRequest { rect }) {
            Ok(response) => {
                let store = self.game.store_mut();
                for tile in &response.tiles {
                    store.merge_terrain(tile.clone());
                }
                debug!(%rect, tiles = response.tiles.len(), "map load served");
                vec![route(Action::MapLoadSuccess(MapLoadSuccessPayload {
                    rect: response.rect,
                    tiles: response.tiles,
                    player_id: payload.player_id,
                }))]
            }
            Err(err) => {
                warn!(%rect, %err, "error loading map");
                vec![route(Action::MapLoadFailure(MapLoadFailurePayload {
                    rect,
                    player_id: payload.player_id,
                    message: err.to_string(),
                }))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Recipient;
    use rts_core::components::{Color, UnitId};
    use rts_core::grid::GridRect;

    fn player(name: &str) -> Player {
        Player::new(name, Color::rgb(10, 20, 30))
    }

    fn server() -> ServerGame {
        ServerGame::with_procedural_world(ServerConfig::default())
    }

    #[test]
    fn test_join_sends_snapshot_notice_and_spawn() {
        let mut server = server();
        let alice = player("alice");
        let out = server.apply(Action::PlayerInit(alice.clone()));

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].recipient, Recipient::Player(alice.id));
        assert!(matches!(&out[0].action, Action::PlayerInitSuccess(p) if p.players.len() == 1));
        assert_eq!(out[1].action, Action::PlayerInit(alice.clone()));
        match &out[2].action {
            Action::AddUnit(unit) => {
                assert_eq!(unit.owner, alice.id);
                assert_eq!(unit.position, Vec2Fixed::ZERO);
            }
            other => panic!("expected AddUnit, got {other:?}"),
        }
        assert_eq!(out[2].recipient, Recipient::Everyone);
    }

    #[test]
    fn test_second_player_spawns_at_next_point() {
        let mut server = server();
        server.apply(Action::PlayerInit(player("alice")));
        let out = server.apply(Action::PlayerInit(player("bob")));

        let Action::PlayerInitSuccess(snapshot) = &out[0].action else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.units.len(), 1);
        assert_eq!(snapshot.players.len(), 2);
        let Action::AddUnit(unit) = &out[2].action else {
            panic!("expected AddUnit");
        };
        assert_eq!(unit.tile(), GridPoint::new(10, 0));
    }

    #[test]
    fn test_rejoin_gets_no_extra_unit() {
        let mut server = server();
        server.apply(Action::PlayerInit(player("alice")));
        let out = server.apply(Action::PlayerInit(player("alice")));
        assert_eq!(out.len(), 2);
        assert_eq!(server.store().unit_count(), 1);
    }

    #[test]
    fn test_full_game_refuses_join() {
        let config = ServerConfig {
            max_players: 1,
            ..ServerConfig::default()
        };
        let mut server = ServerGame::with_procedural_world(config);
        server.apply(Action::PlayerInit(player("alice")));
        assert!(server.apply(Action::PlayerInit(player("bob"))).is_empty());
        assert_eq!(server.store().player_count(), 1);
    }

    #[test]
    fn test_spawn_falls_back_to_ring_search() {
        let config = ServerConfig {
            spawn_points: vec![GridPoint::new(5, 5)],
            ..ServerConfig::default()
        };
        let mut server = ServerGame::with_procedural_world(config);
        server.apply(Action::PlayerInit(player("alice")));
        let out = server.apply(Action::PlayerInit(player("bob")));
        let Action::AddUnit(unit) = &out[2].action else {
            panic!("expected AddUnit");
        };
        assert_eq!(unit.tile().chebyshev_distance(GridPoint::new(5, 5)), 1);
    }

    #[test]
    fn test_map_load_is_unicast() {
        let mut server = server();
        let pid = player("alice").id;
        let rect = GridRect::new(0, 0, 4, 3);
        let out = server.apply(Action::map_load(rect, pid));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipient, Recipient::Player(pid));
        let Action::MapLoadSuccess(payload) = &out[0].action else {
            panic!("expected MapLoadSuccess");
        };
        assert_eq!(payload.tiles.len(), 12);
        assert_eq!(payload.rect, rect);
        assert_eq!(server.store().tile_count(), 12);
    }

    #[test]
    fn test_oversized_map_load_fails() {
        let mut server = server();
        let pid = player("alice").id;
        let out = server.apply(Action::map_load(GridRect::new(0, 0, 1000, 1000), pid));
        assert!(matches!(&out[0].action, Action::MapLoadFailure(p) if p.player_id == pid));
        assert_eq!(server.store().tile_count(), 0);
    }

    #[test]
    fn test_full_range_map_load_is_refused() {
        let mut server = server();
        let pid = player("alice").id;
        let line = Action::map_load(GridRect::new(i32::MIN, 0, i32::MAX, 1), pid)
            .to_json_line()
            .unwrap();
        let out = server.apply(Action::from_json(line.trim_end()).unwrap());

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].recipient, Recipient::Player(pid));
        assert!(matches!(
            &out[0].action,
            Action::MapLoadFailure(p) if p.rect.area() == u64::from(u32::MAX)
        ));
        assert_eq!(server.store().tile_count(), 0);
    }

    #[test]
    fn test_out_of_range_move_target_is_rejected() {
        let mut server = server();
        let out = server.apply(Action::PlayerInit(player("alice")));
        let Action::AddUnit(unit) = &out[2].action else {
            panic!("expected AddUnit");
        };
        let id = unit.id;

        let far = Vec2Fixed::new(rts_core::math::Fixed::MAX, rts_core::math::Fixed::ZERO);
        server.apply(Action::move_start(id, far));
        assert!(server.store().unit(id).unwrap().is_idle());
        assert!(server.tick().is_empty());

        // The server keeps serving orders afterwards.
        server.apply(Action::move_start(id, Vec2Fixed::from_ints(1, 0)));
        assert!(!server.store().unit(id).unwrap().is_idle());
    }

    #[test]
    fn test_tick_counter_advances() {
        let mut server = server();
        for _ in 0..3 {
            server.tick();
        }
        assert_eq!(server.game().current_tick(), 3);
    }

    #[test]
    fn test_move_start_is_rebroadcast() {
        let mut server = server();
        let out = server.apply(Action::PlayerInit(player("alice")));
        let Action::AddUnit(unit) = &out[2].action else {
            panic!("expected AddUnit");
        };
        let order = Action::move_start(unit.id, Vec2Fixed::from_ints(2, 0));
        let out = server.apply(order.clone());
        assert_eq!(out, vec![route(order)]);
    }

    #[test]
    fn test_server_only_actions_are_dropped() {
        let mut server = server();
        assert!(server.apply(Action::MoveStop(UnitId::new())).is_empty());
    }
}
