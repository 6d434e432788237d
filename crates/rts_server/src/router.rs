//! Action routing.
//!
//! Replies that answer one player's request go only to that player;
//! everything else is a shared-world change every replica must see.

use rts_core::components::PlayerId;
use rts_core::protocol::Action;

/// Who should receive an outgoing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Only the named player.
    Player(PlayerId),
    /// Every connected peer.
    Everyone,
}

/// An action paired with its audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Audience.
    pub recipient: Recipient,
    /// Action to deliver.
    pub action: Action,
}

impl Outgoing {
    /// True if a peer bound to `player` should receive this action.
    #[must_use]
    pub fn is_for(&self, player: Option<PlayerId>) -> bool {
        match self.recipient {
            Recipient::Everyone => true,
            Recipient::Player(target) => player == Some(target),
        }
    }
}

/// Decide the audience of `action`.
#[must_use]
pub fn route(action: Action) -> Outgoing {
    let recipient = match &action {
        Action::PlayerInitSuccess(payload) => Recipient::Player(payload.player_id),
        Action::MapLoadSuccess(payload) => Recipient::Player(payload.player_id),
        Action::MapLoadFailure(payload) => Recipient::Player(payload.player_id),
        Action::PlayerInit(_)
        | Action::AddUnit(_)
        | Action::MoveStart(_)
        | Action::MoveStep(_)
        | Action::MoveStop(_)
        | Action::MapLoad(_) => Recipient::Everyone,
    };
    Outgoing { recipient, action }
}
