//! # RTS Core
//!
//! Shared simulation core for Gridfront, used by both the authoritative
//! server and every client replica.
//!
//! This crate contains **only** transport-free logic:
//! - No rendering
//! - No sockets or channels
//! - No system randomness
//! - No floating-point math in positions (uses fixed-point)
//!
//! The same actions applied in the same order produce the same state on
//! every process; the server is ground truth and replicas converge on it.
//!
//! ## Crate Structure
//!
//! - [`protocol`] - Wire actions and their JSON envelope
//! - [`store`] - Players, units, tiles and occupancy
//! - [`movement`] - Path planning and per-tick interpolation
//! - [`visibility`] - Fog-of-war from sight-sets
//! - [`streaming`] - Viewport deltas and camera mapping
//! - [`world`] - Terrain generation collaborator
//! - [`game`] - Shared action handlers
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod components;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod math;
pub mod movement;
pub mod protocol;
pub mod store;
pub mod streaming;
pub mod visibility;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimulationConfig;
    pub use crate::error::{GameError, ProtocolError, Result};
    pub use crate::game::{Authority, Game};
    pub use crate::grid::{GridPoint, GridRect};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::protocol::{
        Action, ActionKind, MapLoadFailurePayload, MapLoadPayload, MapLoadSuccessPayload,
        MoveStartPayload, MoveStepPayload, PlayerInitSuccessPayload,
    };
    pub use crate::store::StateStore;
    pub use crate::streaming::{Camera, Viewport};
    pub use crate::visibility::{SightSet, VisibilityChange, VisibilityEngine};
    pub use crate::world::{ProceduralWorld, WorldGenerator, WorldRequest, WorldResponse};
}
