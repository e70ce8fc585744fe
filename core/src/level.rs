//! Validated level description consumed by the world at room creation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ButtonId, CellCoord, CellKind, Color, Direction, DoorId, LaserId};

/// Complete, validated description of a room's initial state.
///
/// Levels are produced by the bootstrap system, which rejects malformed
/// documents before a world is ever built from them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Row-major cell classifications, `columns * rows` entries long.
    pub cells: Vec<CellKind>,
    /// Cells players spawn on, selected by `index mod len`.
    pub spawn_points: Vec<CellCoord>,
    /// Initial crate cells.
    pub crates: Vec<CellCoord>,
    /// Doors placed in the level.
    pub doors: Vec<DoorSpec>,
    /// Buttons placed in the level.
    pub buttons: Vec<ButtonSpec>,
    /// Fixture lasers placed in the level.
    pub lasers: Vec<LaserSpec>,
    /// Periodic cable hazards placed in the level.
    pub cables: Vec<CableSpec>,
    /// Vents the capybara may escape through.
    pub vents: Vec<VentSpec>,
    /// Spawn cell of the capybara, if the level has one.
    pub capybara: Option<CellCoord>,
}

/// Door placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSpec {
    /// Identifier referenced by buttons.
    pub id: DoorId,
    /// Colour used to render the door.
    pub color: Color,
    /// Cell occupied by the door.
    pub cell: CellCoord,
}

/// Button placement wired to a single door.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    /// Identifier of the button.
    pub id: ButtonId,
    /// Colour used to render the button.
    pub color: Color,
    /// Cell occupied by the button.
    pub cell: CellCoord,
    /// Door opened while the button is pressed.
    pub door: DoorId,
}

/// Fixture laser placement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserSpec {
    /// Identifier of the laser.
    pub id: LaserId,
    /// Cell the beam is emitted from.
    pub origin: CellCoord,
    /// Direction the beam travels.
    pub direction: Direction,
    /// Maximum number of cells the beam may visit.
    pub range: u32,
    /// Colour of the beam.
    pub color: Color,
}

/// Periodic cable hazard placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableSpec {
    /// Cell covered by the cable.
    pub cell: CellCoord,
    /// Length of each damaging period.
    pub damage_duration: Duration,
    /// Length of each safe period.
    pub safe_duration: Duration,
    /// Whether the cable starts in its damaging period.
    pub start_damaging: bool,
}

/// Vent placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VentSpec {
    /// Cell occupied by the vent.
    pub cell: CellCoord,
    /// Whether the vent starts open.
    pub open: bool,
}
