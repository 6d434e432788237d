//! Error types for the simulation core.

use thiserror::Error;

use crate::components::UnitId;
use crate::grid::{GridPoint, GridRect};

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Failures while decoding an action from the wire.
///
/// Fatal to the connection that produced the bytes, never to the process.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bytes are not a `{"Type": ..., "Payload": ...}` envelope.
    #[error("malformed action envelope: {0}")]
    Envelope(String),

    /// The `Type` discriminator names no known action kind.
    #[error("action type unrecognized: {0}")]
    UnknownType(String),

    /// The `Type` is known but the `Payload` does not match its shape.
    #[error("malformed {kind} payload: {message}")]
    MalformedPayload {
        /// Action kind that was being decoded.
        kind: &'static str,
        /// Decoder message.
        message: String,
    },

    /// An action could not be serialized.
    #[error("failed to encode {kind}: {message}")]
    Encode {
        /// Action kind that was being encoded.
        kind: &'static str,
        /// Encoder message.
        message: String,
    },
}

/// Top-level error type for the simulation core.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unrecognized or malformed action.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A unit tried to occupy a tile held by another unit.
    #[error("tile {point} is occupied by unit {occupant}, cannot place unit {unit}")]
    PlacementConflict {
        /// Contested tile.
        point: GridPoint,
        /// Unit that attempted the placement.
        unit: UnitId,
        /// Unit currently holding the tile.
        occupant: UnitId,
    },

    /// The world-generation collaborator could not produce a region.
    #[error("world load failed for {rect}: {message}")]
    WorldLoad {
        /// Requested region.
        rect: GridRect,
        /// Failure description.
        message: String,
    },

    /// No unit with this identifier exists in the store.
    #[error("unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Path generation hit the configured waypoint limit.
    #[error("path from {from} to {to} exceeds {limit} waypoints")]
    PathTooLong {
        /// Rounded start position.
        from: GridPoint,
        /// Rounded target position.
        to: GridPoint,
        /// Configured waypoint limit.
        limit: usize,
    },

    /// Invalid configuration value or unreadable config file.
    #[error("invalid configuration: {0}")]
    Config(String),
}
