//! Server error types.

use thiserror::Error;

use rts_core::error::{GameError, ProtocolError};

use crate::hub::PeerId;

/// Result type alias using [`ServerError`].
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors raised by the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Simulation-level failure.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A peer sent bytes that do not decode to an action.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Reading config or bridging stdio failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The hub is no longer accepting actions from this peer.
    #[error("peer {0} is disconnected")]
    Disconnected(PeerId),
}
