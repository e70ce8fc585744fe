//! Wire-level inputs accepted by a room and the batches it answers with.

use std::time::Duration;

use capyvent_core::{
    CellCoord, Color, Command, CrateId, Direction, Event, LaserId, MapSnapshot, SessionId, VentId,
};
use serde::{Deserialize, Serialize};

/// Request issued by a connected client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientRequest {
    /// Moves the client's player by a unit displacement.
    Move {
        /// Horizontal component, one of `-1`, `0`, `1`.
        dx: i32,
        /// Vertical component, one of `-1`, `0`, `1`.
        dy: i32,
    },
    /// Moves the client's player in a named direction.
    MoveDirection {
        /// Direction of travel.
        direction: Direction,
    },
    /// Shoves a crate chain without moving the player.
    PushCrate {
        /// Crate at the head of the chain.
        #[serde(rename = "crateId")]
        crate_id: CrateId,
        /// Horizontal component of the push.
        dx: i32,
        /// Vertical component of the push.
        dy: i32,
    },
    /// Toggles the client's personal beam.
    ToggleLaser {
        /// Cell the beam starts from.
        origin: CellCoord,
        /// Horizontal component of the beam direction.
        dx: i32,
        /// Vertical component of the beam direction.
        dy: i32,
        /// Beam colour, red when omitted.
        #[serde(default)]
        color: Color,
    },
    /// Fires a fixture laser once.
    FireLaserOnce {
        /// Fixture to fire.
        laser: LaserId,
    },
    /// Configures a fixture's auto-repeat cadence in milliseconds.
    SetLaserInterval {
        /// Fixture to configure.
        laser: LaserId,
        /// Interval in milliseconds; absent or zero disables repeating.
        #[serde(default)]
        ms: Option<u64>,
    },
    /// Opens a vent so the capybara may leave through it.
    OpenVent {
        /// Vent to open.
        vent: VentId,
    },
    /// Requests the full map snapshot.
    GetMapInfo,
}

impl ClientRequest {
    /// Translates the request into the world command it stands for.
    ///
    /// Returns `None` for map queries and for malformed displacements.
    #[must_use]
    pub fn into_command(self, session: &SessionId) -> Option<Command> {
        match self {
            Self::Move { dx, dy } => Some(Command::MovePlayer {
                session: session.clone(),
                direction: Direction::from_delta(dx, dy)?,
            }),
            Self::MoveDirection { direction } => Some(Command::MovePlayer {
                session: session.clone(),
                direction,
            }),
            Self::PushCrate { crate_id, dx, dy } => Some(Command::PushCrate {
                crate_id,
                direction: Direction::from_delta(dx, dy)?,
            }),
            Self::ToggleLaser {
                origin,
                dx,
                dy,
                color,
            } => Some(Command::ToggleLaser {
                session: session.clone(),
                origin,
                direction: Direction::from_delta(dx, dy)?,
                color,
            }),
            Self::FireLaserOnce { laser } => Some(Command::FireLaserOnce { laser }),
            Self::SetLaserInterval { laser, ms } => Some(Command::SetLaserInterval {
                laser,
                interval: ms.map(Duration::from_millis),
            }),
            Self::OpenVent { vent } => Some(Command::OpenVent { vent }),
            Self::GetMapInfo => None,
        }
    }
}

/// Everything a room's serial queue accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "camelCase")]
pub enum RoomInput {
    /// A request from a joined session.
    Client {
        /// Session issuing the request.
        session: SessionId,
        /// The request itself.
        request: ClientRequest,
    },
    /// A session connected and wants a player.
    Join {
        /// Connecting session.
        session: SessionId,
        /// Requested display name.
        #[serde(default)]
        name: Option<String>,
    },
    /// A new session takes over the player of an earlier one, keeping its
    /// name, cell and index.
    Takeover {
        /// Session that currently owns the player.
        previous: SessionId,
        /// Session that inherits the player.
        session: SessionId,
    },
    /// A session disconnected for good.
    Leave {
        /// Departing session.
        session: SessionId,
    },
    /// Simulated time elapsed.
    Tick {
        /// Elapsed time in milliseconds.
        ms: u64,
    },
    /// The room is being torn down.
    Dispose,
}

/// Diffs produced by one queued input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Events in the order the world produced them.
    pub events: Vec<Event>,
    /// Map snapshot, present only when the input asked for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MapSnapshot>,
}

impl Batch {
    /// Reports whether the batch carries nothing to broadcast.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.snapshot.is_none()
    }
}
