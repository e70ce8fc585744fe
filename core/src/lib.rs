#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Capyvent room simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] diffs for systems and
//! participants to react to. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod level;
mod snapshot;

pub use level::{ButtonSpec, CableSpec, DoorSpec, LaserSpec, Level, VentSpec};
pub use snapshot::{
    ButtonSnapshot, CableSnapshot, CapybaraSnapshot, CrateSnapshot, DoorSnapshot, LaserSnapshot,
    MapSnapshot, PlayerSnapshot, VentSnapshot,
};

/// Name assigned to players that joined without a usable name.
pub const ANONYMOUS_PLAYER_NAME: &str = "ANONYMOUS";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Creates a player for a freshly connected session.
    JoinPlayer {
        /// Session that owns the new player.
        session: SessionId,
        /// Name requested by the client, normalised before storage.
        name: Option<String>,
    },
    /// Recreates a player with preserved state after a session takeover.
    RestorePlayer {
        /// Session that owns the restored player.
        session: SessionId,
        /// Name carried over from the previous session.
        name: String,
        /// Cell the player occupied before the takeover.
        cell: CellCoord,
        /// Spawn index reserved for the player.
        index: u32,
    },
    /// Removes the player owned by the session.
    LeavePlayer {
        /// Session whose player leaves the room.
        session: SessionId,
    },
    /// Requests that a player move one cell, pushing crates in the way.
    MovePlayer {
        /// Session whose player moves.
        session: SessionId,
        /// Direction of travel.
        direction: Direction,
    },
    /// Requests that a crate chain be shoved one cell without an actor.
    PushCrate {
        /// Crate at the head of the chain.
        crate_id: CrateId,
        /// Direction of the push.
        direction: Direction,
    },
    /// Switches the session's personal beam on, off, or onto new parameters.
    ToggleLaser {
        /// Session that owns the beam.
        session: SessionId,
        /// Cell the beam is emitted from.
        origin: CellCoord,
        /// Direction the beam travels.
        direction: Direction,
        /// Colour used to render the beam.
        color: Color,
    },
    /// Fires a fixture laser once.
    FireLaserOnce {
        /// Fixture laser to fire.
        laser: LaserId,
    },
    /// Switches a fixture laser off once its visibility window elapsed.
    ExtinguishLaser {
        /// Fixture laser to switch off.
        laser: LaserId,
    },
    /// Configures or clears the auto-repeat cadence of a fixture laser.
    SetLaserInterval {
        /// Fixture laser being configured.
        laser: LaserId,
        /// Time between automatic firings, `None` disables auto-repeat.
        interval: Option<Duration>,
    },
    /// Opens a vent so the capybara may escape through it.
    OpenVent {
        /// Vent to open.
        vent: VentId,
    },
    /// Requests that the capybara advance a single step.
    StepCapybara {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Tears down the room, clearing every collection.
    Dispose,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces a new player in the room.
    PlayerJoined {
        /// Session owning the player.
        session: SessionId,
        /// Normalised player name.
        name: String,
        /// Spawn index allocated to the player.
        index: u32,
        /// Cell the player spawned on.
        cell: CellCoord,
    },
    /// Announces that a player left the room.
    PlayerLeft {
        /// Session that owned the player.
        session: SessionId,
        /// Normalised player name.
        name: String,
    },
    /// Position update for a player.
    PlayerMoved {
        /// Session owning the player.
        session: SessionId,
        /// Normalised player name.
        name: String,
        /// Cell the player occupied before moving.
        from: CellCoord,
        /// Cell the player occupies after moving.
        to: CellCoord,
    },
    /// Reports that a player stands on a damaging cable cell.
    PlayerDamaged {
        /// Session owning the damaged player.
        session: SessionId,
        /// Cell where the damage was dealt.
        cell: CellCoord,
    },
    /// Confirms that a crate moved between two cells.
    CrateMoved {
        /// Identifier of the crate.
        crate_id: CrateId,
        /// Cell the crate occupied before the push.
        from: CellCoord,
        /// Cell the crate occupies after the push.
        to: CellCoord,
    },
    /// Reports that a beam destroyed a crate.
    CrateDestroyed {
        /// Identifier of the destroyed crate.
        crate_id: CrateId,
        /// Cell the crate occupied.
        cell: CellCoord,
    },
    /// Pressure state change of a button.
    ButtonChanged {
        /// Button whose state changed.
        button: ButtonId,
        /// Whether the button is now pressed.
        pressed: bool,
    },
    /// Open state change of a door.
    DoorChanged {
        /// Door whose state changed.
        door: DoorId,
        /// Whether the door is now open.
        open: bool,
    },
    /// A beam was cast; carries every visited cell.
    LaserFired {
        /// Owner of the beam.
        source: BeamSource,
        /// Cells visited by the beam in order.
        hits: Vec<BeamHit>,
        /// Last cell visited by the beam.
        endpoint: CellCoord,
        /// Colour of the beam.
        color: Color,
    },
    /// A beam was switched off and collapsed onto its origin.
    LaserSwitchedOff {
        /// Owner of the beam.
        source: BeamSource,
        /// Origin the beam collapsed onto.
        origin: CellCoord,
    },
    /// Destructible boxes removed by a beam.
    BoxesDestroyed {
        /// Cells whose contents were destroyed.
        cells: Vec<CellCoord>,
        /// Colour of the destroying beam.
        color: Color,
    },
    /// Confirms a change of a fixture laser's auto-repeat cadence.
    LaserIntervalChanged {
        /// Fixture laser that was configured.
        laser: LaserId,
        /// New cadence, `None` when auto-repeat was disabled.
        interval: Option<Duration>,
    },
    /// Damage state flip of a cable.
    CableChanged {
        /// Cable whose state changed.
        cable: CableId,
        /// Whether the cable now deals damage.
        damage: bool,
    },
    /// Confirms a vent was opened.
    VentOpened {
        /// Vent that opened.
        vent: VentId,
    },
    /// Confirms the capybara moved between two cells.
    CapybaraMoved {
        /// Cell occupied before the step.
        from: CellCoord,
        /// Cell occupied after the step.
        to: CellCoord,
    },
    /// The capybara reached an open vent.
    CapybaraEscaped {
        /// Vent used for the escape.
        vent: VentId,
        /// Cell of the vent.
        cell: CellCoord,
    },
    /// The room was torn down.
    RoomDisposed,
}

/// Cardinal directions available to actors and beams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    #[serde(rename = "up")]
    North,
    /// Movement toward increasing column indices.
    #[serde(rename = "right")]
    East,
    /// Movement toward increasing row indices.
    #[serde(rename = "down")]
    South,
    /// Movement toward decreasing column indices.
    #[serde(rename = "left")]
    West,
}

impl Direction {
    /// Converts a unit displacement into a direction.
    ///
    /// Exactly one component must be non-zero and both must lie within
    /// `-1..=1`; anything else yields `None`.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Self::North),
            (1, 0) => Some(Self::East),
            (0, 1) => Some(Self::South),
            (-1, 0) => Some(Self::West),
            _ => None,
        }
    }

    /// Unit displacement `(dx, dy)` represented by the direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    #[serde(rename = "x")]
    column: u32,
    #[serde(rename = "y")]
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Neighbouring cell in `direction`, or `None` when it leaves a
    /// `columns` x `rows` grid.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let next = match direction {
            Direction::North => CellCoord::new(self.column, self.row.checked_sub(1)?),
            Direction::East => CellCoord::new(self.column.checked_add(1)?, self.row),
            Direction::South => CellCoord::new(self.column, self.row.checked_add(1)?),
            Direction::West => CellCoord::new(self.column.checked_sub(1)?, self.row),
        };
        (next.column < columns && next.row < rows).then_some(next)
    }

    /// Direction leading from `self` to an orthogonally adjacent `other`.
    #[must_use]
    pub fn direction_to(self, other: CellCoord) -> Option<Direction> {
        let column_diff = self.column.abs_diff(other.column);
        let row_diff = self.row.abs_diff(other.row);
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if other.column > self.column {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if other.row > self.row {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }
}

/// Static classification of a grid location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Plain walkable floor.
    Floor,
    /// Impassable wall that also terminates beams.
    Wall,
    /// Destructible obstacle cleared by beams.
    Box,
    /// Marker for a hazard source such as a laser emitter.
    Emitter,
    /// Walkable floor carrying a level-defined tint code.
    Tinted(u8),
}

impl CellKind {
    /// Decodes the numeric layout code used by level documents.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Floor,
            1 => Self::Wall,
            2 => Self::Box,
            3 => Self::Emitter,
            other => Self::Tinted(other),
        }
    }

    /// Numeric layout code of the classification.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Floor => 0,
            Self::Wall => 1,
            Self::Box => 2,
            Self::Emitter => 3,
            Self::Tinted(code) => code,
        }
    }

    /// Reports whether actors and crates may stand on the cell.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Floor | Self::Tinted(_))
    }
}

/// Identity of a connected client session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a transport-provided session identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier assigned to a crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CrateId(u32);

impl CrateId {
    /// Creates a new crate identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a cable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CableId(u32);

impl CableId {
    /// Creates a new cable identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a vent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VentId(u32);

impl VentId {
    /// Creates a new vent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Level-authored identifier of a door.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DoorId(String);

impl DoorId {
    /// Wraps a level-authored door identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Level-authored identifier of a button.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ButtonId(String);

impl ButtonId {
    /// Wraps a level-authored button identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Level-authored identifier of a fixture laser.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaserId(String);

impl LaserId {
    /// Wraps a level-authored laser identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Named colour used for doors and beams.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(String);

impl Color {
    /// Wraps a colour name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed colour name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("red")
    }
}

/// Normalised player name used for display and uniqueness lookups.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerName(String);

impl PlayerName {
    /// Trims and upper-cases `raw`, falling back to [`ANONYMOUS_PLAYER_NAME`]
    /// when nothing usable remains.
    #[must_use]
    pub fn normalized(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(trimmed) if !trimmed.is_empty() => Self(trimmed.to_uppercase()),
            _ => Self(ANONYMOUS_PLAYER_NAME.to_owned()),
        }
    }

    /// Borrowed normalised name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Owner of a beam.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BeamSource {
    /// Personal beam toggled by a session.
    Session(SessionId),
    /// Level-placed fixture laser.
    Fixture(LaserId),
}

/// Classification of a cell visited by a beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    /// The beam passed through the cell.
    Beam,
    /// The beam terminated on a wall.
    Wall,
    /// The beam destroyed an obstacle and continued.
    Box,
}

/// Single cell visited by a beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeamHit {
    /// What the beam found in the cell.
    pub kind: HitKind,
    /// Cell that was visited.
    pub cell: CellCoord,
}

/// Behavioural state of the capybara.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapybaraState {
    /// Standing still, waiting for a route.
    Idle,
    /// Moving toward a vent.
    Fleeing,
    /// Left the room through a vent.
    Escaped,
}

/// Goal set used when searching for a capybara escape route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VentGoal {
    /// Only open vents terminate the search.
    OpenOnly,
    /// Any vent terminates the search.
    AnyVent,
}
