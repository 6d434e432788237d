//! Action protocol shared by the server and its clients.
//!
//! Every state change request and notification is an [`Action`]: an
//! immutable, tagged value with a kind-specific payload. A single channel
//! per peer multiplexes all kinds, so the encoding is self-describing:
//!
//! ```text
//! {"Type":"MoveStart","Payload":{"UnitId":"…","Point":{"X":…,"Y":…}}}
//! {"Type":"MoveStop","Payload":"…"}
//! ```
//!
//! Decoders read the `Type` discriminator first and only then interpret
//! the `Payload`.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::components::{Player, PlayerId, Tile, Unit, UnitId};
use crate::error::ProtocolError;
use crate::grid::GridRect;
use crate::math::Vec2Fixed;

// ============================================================================
// Discriminator
// ============================================================================

/// Enumerated discriminator of every action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Client asks to join.
    PlayerInit,
    /// Server answers a join with the initial snapshot.
    PlayerInitSuccess,
    /// A unit was spawned.
    AddUnit,
    /// A unit was ordered to move.
    MoveStart,
    /// A unit reached a waypoint.
    MoveStep,
    /// A unit's path was aborted.
    MoveStop,
    /// Client asks for the tiles of a region.
    MapLoad,
    /// Server delivers the tiles of a region.
    MapLoadSuccess,
    /// Server could not produce a region.
    MapLoadFailure,
}

impl ActionKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::PlayerInit,
        Self::PlayerInitSuccess,
        Self::AddUnit,
        Self::MoveStart,
        Self::MoveStep,
        Self::MoveStop,
        Self::MapLoad,
        Self::MapLoadSuccess,
        Self::MapLoadFailure,
    ];

    /// Wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerInit => "PlayerInit",
            Self::PlayerInitSuccess => "PlayerInitSuccess",
            Self::AddUnit => "AddUnit",
            Self::MoveStart => "MoveStart",
            Self::MoveStep => "MoveStep",
            Self::MoveStop => "MoveStop",
            Self::MapLoad => "MapLoad",
            Self::MapLoadSuccess => "MapLoadSuccess",
            Self::MapLoadFailure => "MapLoadFailure",
        }
    }
}

impl FromStr for ActionKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older peers announce spawns as "SpawnUnit".
        if s == "SpawnUnit" {
            return Ok(Self::AddUnit);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownType(s.to_string()))
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Initial snapshot sent to a joining player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayerInitSuccessPayload {
    /// The player that asked to join.
    pub player_id: PlayerId,
    /// Units known to the server.
    #[serde(default)]
    pub units: Vec<Unit>,
    /// Players known to the server.
    #[serde(default)]
    pub players: Vec<Player>,
}

/// Order a unit toward a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MoveStartPayload {
    /// Unit to move.
    pub unit_id: UnitId,
    /// Target position.
    pub point: Vec2Fixed,
}

/// Waypoint arrival, carrying the full path so any replica can resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MoveStepPayload {
    /// Unit that moved.
    pub unit_id: UnitId,
    /// Position after the step (exactly the reached waypoint).
    pub position: Vec2Fixed,
    /// Complete current path.
    pub path: Vec<Vec2Fixed>,
    /// Index of the next unvisited waypoint.
    pub step: usize,
}

/// Request for the tiles of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapLoadPayload {
    /// Region to load.
    pub rect: GridRect,
    /// Player that asked.
    pub player_id: PlayerId,
}

/// Tiles of a previously requested region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapLoadSuccessPayload {
    /// Region that was loaded.
    pub rect: GridRect,
    /// Tiles covering the region.
    pub tiles: Vec<Tile>,
    /// Player that asked.
    pub player_id: PlayerId,
}

/// A region request the server could not satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MapLoadFailurePayload {
    /// Region that failed.
    pub rect: GridRect,
    /// Player that asked.
    pub player_id: PlayerId,
    /// Failure description.
    pub message: String,
}

// ============================================================================
// Action
// ============================================================================

/// A tagged, immutable event describing a state change request or notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "Type", content = "Payload")]
pub enum Action {
    /// Client asks to join (server re-broadcasts it as a join notice).
    PlayerInit(Player),
    /// Server answers a join with the initial snapshot.
    PlayerInitSuccess(PlayerInitSuccessPayload),
    /// A unit was spawned.
    AddUnit(Unit),
    /// A unit was ordered to move.
    MoveStart(MoveStartPayload),
    /// A unit reached a waypoint.
    MoveStep(MoveStepPayload),
    /// A unit's path was aborted.
    MoveStop(UnitId),
    /// Client asks for the tiles of a region.
    MapLoad(MapLoadPayload),
    /// Server delivers the tiles of a region.
    MapLoadSuccess(MapLoadSuccessPayload),
    /// Server could not produce a region.
    MapLoadFailure(MapLoadFailurePayload),
}

/// Wire envelope read before the payload is interpreted.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Payload", default)]
    payload: serde_json::Value,
}

fn payload<T: DeserializeOwned>(
    kind: ActionKind,
    value: serde_json::Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::MalformedPayload {
        kind: kind.as_str(),
        message: e.to_string(),
    })
}

impl Action {
    /// Discriminator of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::PlayerInit(_) => ActionKind::PlayerInit,
            Self::PlayerInitSuccess(_) => ActionKind::PlayerInitSuccess,
            Self::AddUnit(_) => ActionKind::AddUnit,
            Self::MoveStart(_) => ActionKind::MoveStart,
            Self::MoveStep(_) => ActionKind::MoveStep,
            Self::MoveStop(_) => ActionKind::MoveStop,
            Self::MapLoad(_) => ActionKind::MapLoad,
            Self::MapLoadSuccess(_) => ActionKind::MapLoadSuccess,
            Self::MapLoadFailure(_) => ActionKind::MapLoadFailure,
        }
    }

    /// Build a region request.
    #[must_use]
    pub const fn map_load(rect: GridRect, player_id: PlayerId) -> Self {
        Self::MapLoad(MapLoadPayload { rect, player_id })
    }

    /// Build a move order.
    #[must_use]
    pub const fn move_start(unit_id: UnitId, point: Vec2Fixed) -> Self {
        Self::MoveStart(MoveStartPayload { unit_id, point })
    }

    /// Serialize to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Encode {
            kind: self.kind().as_str(),
            message: e.to_string(),
        })
    }

    /// Serialize to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> Result<String, ProtocolError> {
        let mut json = serde_json::to_string(self).map_err(|e| ProtocolError::Encode {
            kind: self.kind().as_str(),
            message: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }

    /// Decode an action, dispatching on `Type` before reading `Payload`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnknownType`] for an unrecognized tag,
    /// [`ProtocolError::MalformedPayload`] when the payload does not fit the
    /// tag, [`ProtocolError::Envelope`] when the bytes are not an envelope.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_slice(bytes).map_err(|e| ProtocolError::Envelope(e.to_string()))?;
        let kind: ActionKind = envelope.kind.parse()?;
        let value = envelope.payload;

        Ok(match kind {
            ActionKind::PlayerInit => Self::PlayerInit(payload(kind, value)?),
            ActionKind::PlayerInitSuccess => Self::PlayerInitSuccess(payload(kind, value)?),
            ActionKind::AddUnit => Self::AddUnit(payload(kind, value)?),
            ActionKind::MoveStart => Self::MoveStart(payload(kind, value)?),
            ActionKind::MoveStep => Self::MoveStep(payload(kind, value)?),
            ActionKind::MoveStop => Self::MoveStop(payload(kind, value)?),
            ActionKind::MapLoad => Self::MapLoad(payload(kind, value)?),
            ActionKind::MapLoadSuccess => Self::MapLoadSuccess(payload(kind, value)?),
            ActionKind::MapLoadFailure => Self::MapLoadFailure(payload(kind, value)?),
        })
    }

    /// Decode an action from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Self::decode(json.as_bytes())
    }
}
