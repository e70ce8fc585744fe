//! Serialisable map snapshot served to clients between processed commands.

use serde::{Deserialize, Serialize};

use crate::{
    BeamSource, ButtonId, CableId, CapybaraState, CellCoord, Color, CrateId, Direction, DoorId,
    SessionId, VentId,
};

/// Full read-only picture of a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSnapshot {
    /// Layout codes arranged as `grid[row][column]`.
    pub grid: Vec<Vec<u8>>,
    /// Number of columns in the grid.
    pub width: u32,
    /// Number of rows in the grid.
    pub height: u32,
    /// Connected players ordered by spawn index.
    pub players: Vec<PlayerSnapshot>,
    /// Crates ordered by identifier.
    pub crates: Vec<CrateSnapshot>,
    /// Doors ordered by identifier.
    pub doors: Vec<DoorSnapshot>,
    /// Buttons ordered by identifier.
    pub buttons: Vec<ButtonSnapshot>,
    /// Cables ordered by identifier.
    pub cables: Vec<CableSnapshot>,
    /// Fixture lasers followed by session beams.
    pub lasers: Vec<LaserSnapshot>,
    /// Vents ordered by identifier.
    pub vents: Vec<VentSnapshot>,
    /// The capybara, when the level has one.
    pub capybara: Option<CapybaraSnapshot>,
}

/// Immutable representation of a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Session owning the player.
    pub session: SessionId,
    /// Spawn index of the player.
    pub index: u32,
    /// Normalised name.
    pub name: String,
    /// Cell the player occupies.
    pub cell: CellCoord,
}

/// Immutable representation of a crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateSnapshot {
    /// Identifier of the crate.
    pub id: CrateId,
    /// Cell the crate occupies.
    pub cell: CellCoord,
}

/// Immutable representation of a door.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSnapshot {
    /// Identifier of the door.
    pub id: DoorId,
    /// Colour of the door.
    pub color: Color,
    /// Cell occupied by the door.
    pub cell: CellCoord,
    /// Whether the door is open.
    pub open: bool,
}

/// Immutable representation of a button.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSnapshot {
    /// Identifier of the button.
    pub id: ButtonId,
    /// Colour of the button.
    pub color: Color,
    /// Cell occupied by the button.
    pub cell: CellCoord,
    /// Door wired to the button.
    pub door: DoorId,
    /// Whether a player or crate presses the button.
    pub pressed: bool,
}

/// Immutable representation of a cable hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableSnapshot {
    /// Identifier of the cable.
    pub id: CableId,
    /// Cell covered by the cable.
    pub cell: CellCoord,
    /// Whether the cable currently deals damage.
    pub damage: bool,
    /// Milliseconds left in the current period.
    pub timer_ms: i64,
}

/// Immutable representation of a beam.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserSnapshot {
    /// Owner of the beam.
    pub source: BeamSource,
    /// Cell the beam is emitted from.
    pub origin: CellCoord,
    /// Direction the beam travels.
    pub direction: Direction,
    /// Whether the beam is currently on.
    pub on: bool,
    /// Rendered end of the beam, equal to `origin` while off.
    pub endpoint: CellCoord,
    /// Colour of the beam.
    pub color: Color,
}

/// Immutable representation of a vent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VentSnapshot {
    /// Identifier of the vent.
    pub id: VentId,
    /// Cell occupied by the vent.
    pub cell: CellCoord,
    /// Whether the vent is open.
    pub open: bool,
}

/// Immutable representation of the capybara.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapybaraSnapshot {
    /// Cell the capybara occupies.
    pub cell: CellCoord,
    /// Behavioural state.
    pub state: CapybaraState,
}
