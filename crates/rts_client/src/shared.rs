//! Serialized access to the client replica.
//!
//! The inbound transport thread and the render/tick loop both mutate the
//! replica; every mutation goes through one `parking_lot` mutex so actions
//! and ticks are applied strictly one at a time.

use std::sync::Arc;

use parking_lot::Mutex;
use rts_core::grid::{GridPoint, GridRect};
use rts_core::protocol::Action;

use crate::game::ClientGame;

/// Cloneable handle to one [`ClientGame`].
#[derive(Debug, Clone)]
pub struct SharedClient {
    inner: Arc<Mutex<ClientGame>>,
}

impl SharedClient {
    /// Take ownership of `game`.
    #[must_use]
    pub fn new(game: ClientGame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    /// Apply one action from the server.
    pub fn apply(&self, action: &Action) {
        self.inner.lock().handle_action(action);
    }

    /// Advance local interpolation one tick.
    pub fn tick(&self) {
        self.inner.lock().tick();
    }

    /// Move the viewport; see [`ClientGame::set_viewport`].
    pub fn set_viewport(&self, rect: GridRect) -> Option<Vec<Action>> {
        self.inner.lock().set_viewport(rect)
    }

    /// Box-select; see [`ClientGame::select_in_rect`].
    pub fn select_in_rect(&self, world_rect: GridRect, additive: bool) -> usize {
        self.inner.lock().select_in_rect(world_rect, additive)
    }

    /// Move orders for the current selection.
    #[must_use]
    pub fn order_move(&self, tile: GridPoint) -> Vec<Action> {
        self.inner.lock().order_move(tile)
    }

    /// Run a read-only query against the replica.
    pub fn read<R>(&self, f: impl FnOnce(&ClientGame) -> R) -> R {
        f(&self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rts_core::math::Vec2Fixed;
    use rts_test_utils::fixtures::{test_config, test_player, test_unit};
    use std::thread;

    #[test]
    fn test_inbound_and_tick_threads_share_replica() {
        let player = test_player("a");
        let shared = SharedClient::new(ClientGame::new(player.clone(), test_config()));
        shared.set_viewport(GridRect::new(-10, -10, 10, 10));
        let unit = test_unit(player.id, 0, 0);
        let id = unit.id;
        shared.apply(&Action::AddUnit(unit));

        let inbound = {
            let shared = shared.clone();
            thread::spawn(move || {
                for x in 0..20 {
                    shared.apply(&Action::move_start(id, Vec2Fixed::from_ints(x % 4, 0)));
                }
            })
        };
        let ticker = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    shared.tick();
                }
            })
        };
        inbound.join().unwrap();
        ticker.join().unwrap();

        shared.read(|game| {
            let unit = game.store().unit(id).unwrap();
            assert!(unit.step <= unit.path.len());
            assert_eq!(game.view().len(), 400);
        });
    }
}
