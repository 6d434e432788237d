//! Serialized access to the authoritative game.
//!
//! [`SharedServer::apply`] and [`SharedServer::tick`] are the only ways to
//! mutate server state. Both take the same process-wide lock, so an
//! inbound action and a simulation tick never interleave.
//!
//! The lock is a blocking `parking_lot` mutex held only for the duration of
//! one synchronous call; it is never held across an `.await`. Callers that
//! forward the routed output use [`SharedServer::apply_and`] and
//! [`SharedServer::tick_and`], which hand it over before the lock is
//! released, so peers see actions in the order the server applied them.

use std::sync::Arc;

use parking_lot::Mutex;
use rts_core::protocol::Action;

use crate::game::ServerGame;
use crate::router::Outgoing;

/// Cloneable handle to the one authoritative [`ServerGame`].
#[derive(Debug, Clone)]
pub struct SharedServer {
    inner: Arc<Mutex<ServerGame>>,
}

impl SharedServer {
    /// Take ownership of `game`.
    #[must_use]
    pub fn new(game: ServerGame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(game)),
        }
    }

    /// Apply one inbound action.
    pub fn apply(&self, action: Action) -> Vec<Outgoing> {
        self.apply_and(action, |outgoing| outgoing)
    }

    /// Advance all units one tick.
    pub fn tick(&self) -> Vec<Outgoing> {
        self.tick_and(|outgoing| outgoing)
    }

    /// Apply one inbound action and pass the output to `deliver` while
    /// still holding the lock.
    pub fn apply_and<R>(&self, action: Action, deliver: impl FnOnce(Vec<Outgoing>) -> R) -> R {
        let mut game = self.inner.lock();
        let outgoing = game.apply(action);
        deliver(outgoing)
    }

    /// Advance one tick and pass the output to `deliver` while still
    /// holding the lock.
    pub fn tick_and<R>(&self, deliver: impl FnOnce(Vec<Outgoing>) -> R) -> R {
        let mut game = self.inner.lock();
        let outgoing = game.tick();
        deliver(outgoing)
    }

    /// Run a read-only query against the game.
    pub fn read<R>(&self, f: impl FnOnce(&ServerGame) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Hash of the authoritative store.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.read(|game| game.store().state_hash())
    }
}
