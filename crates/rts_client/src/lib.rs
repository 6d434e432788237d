//! # RTS Client
//!
//! Client-side replica of the authoritative game.
//!
//! Mirrors server state from broadcast actions, streams terrain for the
//! current viewport, computes fog-of-war for the local player and turns
//! selection plus pointer input into move orders. No rendering: a
//! front-end draws from [`ClientGame::view`] and the store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod game;
pub mod shared;

pub use game::ClientGame;
pub use shared::SharedClient;
