//! End-to-end scenarios: one authoritative server and several client
//! replicas connected by an in-memory router. Every action crosses the
//! "wire" as JSON so the codec is exercised on each hop.

use rts_client::ClientGame;
use rts_core::components::UnitId;
use rts_core::grid::{GridPoint, GridRect};
use rts_core::math::Vec2Fixed;
use rts_core::protocol::Action;
use rts_server::{Outgoing, ServerConfig, ServerGame};
use rts_test_utils::fixtures::{test_config, test_player, FailingWorld, StaticWorld};

struct Network {
    server: ServerGame,
    clients: Vec<ClientGame>,
    /// Every action delivered to any client, in order.
    log: Vec<Action>,
}

fn wire(action: &Action) -> Action {
    let bytes = action.encode().unwrap();
    Action::decode(&bytes).unwrap()
}

impl Network {
    fn new(server: ServerGame) -> Self {
        Self {
            server,
            clients: Vec::new(),
            log: Vec::new(),
        }
    }

    fn with_static_world() -> Self {
        Self::new(ServerGame::new(
            ServerConfig::default(),
            Box::new(StaticWorld::default()),
        ))
    }

    fn join(&mut self, name: &str) -> usize {
        let client = ClientGame::new(test_player(name), test_config());
        let request = client.join();
        self.clients.push(client);
        self.send(request);
        self.clients.len() - 1
    }

    fn send(&mut self, action: Action) {
        let outgoing = self.server.apply(wire(&action));
        self.deliver(outgoing);
    }

    fn send_all(&mut self, actions: Vec<Action>) {
        for action in actions {
            self.send(action);
        }
    }

    fn deliver(&mut self, outgoing: Vec<Outgoing>) {
        for out in outgoing {
            let action = wire(&out.action);
            for client in &mut self.clients {
                if out.is_for(Some(client.player_id())) {
                    client.handle_action(&action);
                }
            }
            self.log.push(action);
        }
    }

    fn tick(&mut self) {
        let outgoing = self.server.tick();
        self.deliver(outgoing);
        for client in &mut self.clients {
            client.tick();
        }
    }

    fn own_unit(&self, client: usize) -> UnitId {
        let owner = self.clients[client].player_id();
        self.server.store().units_owned_by(owner).next().unwrap().id
    }
}

#[test]
fn unit_walks_to_target_with_increasing_steps() {
    let mut net = Network::with_static_world();
    let a = net.join("alice");
    let unit = net.own_unit(a);
    assert_eq!(
        net.server.store().unit(unit).unwrap().position,
        Vec2Fixed::ZERO
    );

    net.send(Action::move_start(unit, Vec2Fixed::from_ints(3, 0)));
    net.log.clear();
    for _ in 0..200 {
        net.tick();
    }

    let steps: Vec<usize> = net
        .log
        .iter()
        .filter_map(|a| match a {
            Action::MoveStep(step) if step.unit_id == unit => Some(step.step),
            _ => None,
        })
        .collect();
    assert_eq!(steps, vec![1, 2, 3, 4]);

    let server_unit = net.server.store().unit(unit).unwrap();
    assert_eq!(server_unit.position, Vec2Fixed::from_ints(3, 0));
    assert_eq!(server_unit.step, server_unit.path.len());

    let replica_unit = net.clients[a].store().unit(unit).unwrap();
    assert_eq!(replica_unit.position, Vec2Fixed::from_ints(3, 0));
    assert_eq!(replica_unit.step, replica_unit.path.len());
}

#[test]
fn late_joiner_receives_snapshot_and_later_moves() {
    let mut net = Network::with_static_world();
    let a = net.join("alice");
    let b = net.join("bob");
    let alice_unit = net.own_unit(a);
    let bob_unit = net.own_unit(b);

    // Bob learned about Alice's unit from the snapshot, Alice about Bob's
    // from the broadcast spawn.
    assert!(net.clients[b].store().unit(alice_unit).is_some());
    assert!(net.clients[a].store().unit(bob_unit).is_some());
    assert_eq!(net.clients[a].store().player_count(), 2);
    assert_eq!(net.clients[b].store().player_count(), 2);

    net.send(Action::move_start(alice_unit, Vec2Fixed::from_ints(0, 4)));
    for _ in 0..300 {
        net.tick();
    }

    for client in &net.clients {
        assert_eq!(client.store().state_hash(), net.server.store().state_hash());
    }
}

#[test]
fn blocked_waypoint_stops_unit_everywhere() {
    let mut net = Network::with_static_world();
    let a = net.join("alice");
    net.join("bob"); // spawns on (10, 0)
    let unit = net.own_unit(a);

    net.send(Action::move_start(unit, Vec2Fixed::from_ints(12, 0)));
    for _ in 0..400 {
        net.tick();
    }

    assert!(net.log.contains(&Action::MoveStop(unit)));
    let stopped = net.server.store().unit(unit).unwrap();
    assert!(stopped.is_idle());
    assert_eq!(stopped.tile(), GridPoint::new(9, 0));
    for client in &net.clients {
        let replica = client.store().unit(unit).unwrap();
        assert!(replica.path.is_empty());
        assert_eq!(replica.tile(), GridPoint::new(9, 0));
    }
}

#[test]
fn reissued_order_does_not_restart_path() {
    let mut net = Network::with_static_world();
    let a = net.join("alice");
    let unit = net.own_unit(a);

    let order = Action::move_start(unit, Vec2Fixed::from_ints(5, 5));
    net.send(order.clone());
    for _ in 0..40 {
        net.tick();
    }
    let step = net.server.store().unit(unit).unwrap().step;
    assert!(step > 0);

    net.send(order);
    assert_eq!(net.server.store().unit(unit).unwrap().step, step);
}

#[test]
fn viewport_loads_are_unicast() {
    let mut net = Network::with_static_world();
    let a = net.join("alice");
    let b = net.join("bob");

    let requests = net.clients[a].set_viewport(GridRect::new(0, 0, 8, 8)).unwrap();
    net.send_all(requests);

    let tile = net.clients[a].store().tile(GridPoint::new(3, 3)).unwrap();
    assert_eq!(tile.back_style_class, "grass");
    assert!(net.clients[b].store().tile(GridPoint::new(3, 3)).is_none());

    // Alice's unit at the origin lights her view.
    assert!(net.clients[a].is_visible(GridPoint::new(5, 0)));
    assert!(!net.clients[a].is_visible(GridPoint::new(6, 0)));
}

#[test]
fn failed_load_is_reported_and_retried() {
    let mut net = Network::new(ServerGame::new(
        ServerConfig::default(),
        Box::new(FailingWorld),
    ));
    let a = net.join("alice");

    let requests = net.clients[a].set_viewport(GridRect::new(0, 0, 4, 4)).unwrap();
    net.send_all(requests);
    assert_eq!(net.clients[a].failed_loads(), &[GridRect::new(0, 0, 4, 4)]);

    let retry = net.clients[a].set_viewport(GridRect::new(0, 0, 5, 4)).unwrap();
    assert!(retry.contains(&Action::map_load(
        GridRect::new(0, 0, 4, 4),
        net.clients[a].player_id()
    )));
}
