#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that turns level documents into ready rooms.
//!
//! Level documents are JSON objects of the shape
//! `{ width, height, layout, mechanics, entities }`. Loading is all or
//! nothing: any malformed piece rejects the whole document with a
//! [`LevelError`] so a room never starts from a partial world.

use std::{collections::BTreeSet, time::Duration};

use capyvent_core::{
    ButtonId, ButtonSpec, CableSpec, CellCoord, CellKind, Color, Direction, DoorId, DoorSpec,
    LaserId, LaserSpec, Level, VentSpec,
};
use capyvent_world::World;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Beam length used by fixture lasers that do not declare a range.
pub const DEFAULT_LASER_RANGE: u32 = 10;
/// Damage period used by cables that do not declare one.
pub const DEFAULT_CABLE_DAMAGE: Duration = Duration::from_millis(3_000);
/// Safe period used by cables that do not declare one.
pub const DEFAULT_CABLE_SAFE: Duration = Duration::from_millis(2_000);

/// Reasons a level document is rejected.
#[derive(Debug, Error)]
pub enum LevelError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("level document is malformed: {0}")]
    Json(#[from] serde_json::Error),
    /// The grid has no cells.
    #[error("level grid must have a positive width and height")]
    EmptyGrid,
    /// The layout does not contain exactly `width * height` codes.
    #[error("layout has {actual} cells, expected {expected}")]
    LayoutMismatch {
        /// Cell count implied by the dimensions.
        expected: u64,
        /// Cell count present in the layout.
        actual: u64,
    },
    /// An entity or mechanic lies outside the grid.
    #[error("{what} at ({x}, {y}) lies outside the grid")]
    OutOfBounds {
        /// Description of the offending entry.
        what: String,
        /// Column of the entry.
        x: u32,
        /// Row of the entry.
        y: u32,
    },
    /// An entity starts on a wall, a box, a closed door or another entity.
    #[error("{what} at ({x}, {y}) starts on a blocked cell")]
    Blocked {
        /// Description of the offending entry.
        what: String,
        /// Column of the entry.
        x: u32,
        /// Row of the entry.
        y: u32,
    },
    /// Two crates share a cell.
    #[error("more than one crate at ({x}, {y})")]
    StackedCrates {
        /// Column of the shared cell.
        x: u32,
        /// Row of the shared cell.
        y: u32,
    },
    /// Two mechanics of the same type share an identifier.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Mechanic type.
        kind: String,
        /// Repeated identifier.
        id: String,
    },
    /// The mechanic type is not recognised.
    #[error("unknown mechanic type '{kind}'")]
    UnknownMechanic {
        /// Type found in the document.
        kind: String,
    },
    /// A mechanic is missing a field its type requires.
    #[error("{kind} '{id}' is missing '{field}'")]
    MissingField {
        /// Mechanic type.
        kind: String,
        /// Mechanic identifier.
        id: String,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A button references a door the document does not define.
    #[error("button '{button}' references unknown door '{door}'")]
    UnknownDoor {
        /// Offending button.
        button: String,
        /// Door it references.
        door: String,
    },
    /// A laser direction is not a single orthogonal step.
    #[error("laser '{id}' has invalid direction ({dx}, {dy})")]
    InvalidDirection {
        /// Offending laser.
        id: String,
        /// Horizontal component.
        dx: i32,
        /// Vertical component.
        dy: i32,
    },
    /// A cable declares a zero-length period.
    #[error("cable '{id}' has a zero-length period")]
    ZeroDuration {
        /// Offending cable.
        id: String,
    },
    /// The document declares no player spawn points.
    #[error("level declares no player spawn points")]
    NoSpawnPoint,
}

#[derive(Debug, Deserialize)]
struct LevelDocument {
    width: u32,
    height: u32,
    layout: Vec<u8>,
    #[serde(default)]
    mechanics: Vec<MechanicDocument>,
    #[serde(default)]
    entities: EntitiesDocument,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct PositionDocument {
    x: u32,
    y: u32,
}

impl From<PositionDocument> for CellCoord {
    fn from(position: PositionDocument) -> Self {
        CellCoord::new(position.x, position.y)
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct DirectionDocument {
    dx: i32,
    dy: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MechanicDocument {
    #[serde(rename = "type")]
    kind: String,
    id: String,
    position: PositionDocument,
    color: Option<String>,
    door_id: Option<String>,
    direction: Option<DirectionDocument>,
    range: Option<u32>,
    damage_ms: Option<u64>,
    safe_ms: Option<u64>,
    start_damaging: Option<bool>,
    open: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct EntitiesDocument {
    #[serde(default)]
    crates: Vec<PositionDocument>,
    #[serde(default)]
    players: Vec<PositionDocument>,
    capybara: Option<PositionDocument>,
}

/// Builds rooms from level documents.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Parses and validates a level document.
    pub fn load_level(&self, document: &str) -> Result<Level, LevelError> {
        load_level(document)
    }

    /// Parses a level document and builds the room it describes.
    pub fn build_world(&self, document: &str) -> Result<World, LevelError> {
        Ok(World::from_level(load_level(document)?))
    }
}

/// Parses and validates a level document into a [`Level`].
pub fn load_level(document: &str) -> Result<Level, LevelError> {
    let parsed: LevelDocument = serde_json::from_str(document)?;
    let level = LevelBuilder::new(&parsed)?.build(parsed)?;
    debug!(
        columns = level.columns,
        rows = level.rows,
        crates = level.crates.len(),
        doors = level.doors.len(),
        buttons = level.buttons.len(),
        lasers = level.lasers.len(),
        cables = level.cables.len(),
        vents = level.vents.len(),
        "level loaded"
    );
    Ok(level)
}

struct LevelBuilder {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl LevelBuilder {
    fn new(document: &LevelDocument) -> Result<Self, LevelError> {
        if document.width == 0 || document.height == 0 {
            return Err(LevelError::EmptyGrid);
        }
        let expected = u64::from(document.width) * u64::from(document.height);
        let actual = u64::try_from(document.layout.len()).unwrap_or(u64::MAX);
        if expected != actual {
            return Err(LevelError::LayoutMismatch { expected, actual });
        }
        Ok(Self {
            columns: document.width,
            rows: document.height,
            cells: document
                .layout
                .iter()
                .map(|code| CellKind::from_code(*code))
                .collect(),
        })
    }

    fn kind_at(&self, cell: CellCoord) -> CellKind {
        let index = u64::from(cell.row()) * u64::from(self.columns) + u64::from(cell.column());
        usize::try_from(index)
            .ok()
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellKind::Wall)
    }

    fn inside(&self, what: &str, position: PositionDocument) -> Result<CellCoord, LevelError> {
        if position.x >= self.columns || position.y >= self.rows {
            return Err(LevelError::OutOfBounds {
                what: what.to_owned(),
                x: position.x,
                y: position.y,
            });
        }
        Ok(position.into())
    }

    fn walkable(&self, what: &str, position: PositionDocument) -> Result<CellCoord, LevelError> {
        let cell = self.inside(what, position)?;
        if !self.kind_at(cell).is_walkable() {
            return Err(blocked(what, position));
        }
        Ok(cell)
    }

    fn build(self, document: LevelDocument) -> Result<Level, LevelError> {
        let mut level = Level {
            columns: self.columns,
            rows: self.rows,
            cells: self.cells.clone(),
            spawn_points: Vec::new(),
            crates: Vec::new(),
            doors: Vec::new(),
            buttons: Vec::new(),
            lasers: Vec::new(),
            cables: Vec::new(),
            vents: Vec::new(),
            capybara: None,
        };

        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
        for mechanic in &document.mechanics {
            if !seen.insert((mechanic.kind.clone(), mechanic.id.clone())) {
                return Err(LevelError::DuplicateId {
                    kind: mechanic.kind.clone(),
                    id: mechanic.id.clone(),
                });
            }
            self.add_mechanic(&mut level, mechanic)?;
        }

        for button in &level.buttons {
            if !level.doors.iter().any(|door| door.id == button.door) {
                return Err(LevelError::UnknownDoor {
                    button: button.id.as_str().to_owned(),
                    door: button.door.as_str().to_owned(),
                });
            }
        }

        let door_cells: BTreeSet<CellCoord> = level.doors.iter().map(|door| door.cell).collect();
        let mut crate_cells = BTreeSet::new();
        for position in document.entities.crates {
            let cell = self.walkable("crate", position)?;
            if door_cells.contains(&cell) {
                return Err(blocked("crate", position));
            }
            if !crate_cells.insert(cell) {
                return Err(LevelError::StackedCrates {
                    x: position.x,
                    y: position.y,
                });
            }
            level.crates.push(cell);
        }

        for position in document.entities.players {
            level
                .spawn_points
                .push(self.walkable("player spawn", position)?);
        }
        if level.spawn_points.is_empty() {
            return Err(LevelError::NoSpawnPoint);
        }

        if let Some(position) = document.entities.capybara {
            let cell = self.walkable("capybara", position)?;
            if door_cells.contains(&cell) || crate_cells.contains(&cell) {
                return Err(blocked("capybara", position));
            }
            level.capybara = Some(cell);
        }

        Ok(level)
    }

    fn add_mechanic(
        &self,
        level: &mut Level,
        mechanic: &MechanicDocument,
    ) -> Result<(), LevelError> {
        let what = format!("{} '{}'", mechanic.kind, mechanic.id);
        let color = mechanic
            .color
            .as_deref()
            .map(Color::new)
            .unwrap_or_default();

        match mechanic.kind.as_str() {
            "door" => level.doors.push(DoorSpec {
                id: DoorId::new(mechanic.id.as_str()),
                color,
                cell: self.walkable(&what, mechanic.position)?,
            }),
            "button" => {
                let door = mechanic
                    .door_id
                    .as_deref()
                    .ok_or_else(|| missing(mechanic, "doorId"))?;
                level.buttons.push(ButtonSpec {
                    id: ButtonId::new(mechanic.id.as_str()),
                    color,
                    cell: self.walkable(&what, mechanic.position)?,
                    door: DoorId::new(door),
                });
            }
            "laser" => {
                let step = mechanic
                    .direction
                    .ok_or_else(|| missing(mechanic, "direction"))?;
                let direction = Direction::from_delta(step.dx, step.dy).ok_or_else(|| {
                    LevelError::InvalidDirection {
                        id: mechanic.id.clone(),
                        dx: step.dx,
                        dy: step.dy,
                    }
                })?;
                level.lasers.push(LaserSpec {
                    id: LaserId::new(mechanic.id.as_str()),
                    origin: self.inside(&what, mechanic.position)?,
                    direction,
                    range: mechanic.range.unwrap_or(DEFAULT_LASER_RANGE),
                    color,
                });
            }
            "cable" => {
                let damage_duration = mechanic
                    .damage_ms
                    .map_or(DEFAULT_CABLE_DAMAGE, Duration::from_millis);
                let safe_duration = mechanic
                    .safe_ms
                    .map_or(DEFAULT_CABLE_SAFE, Duration::from_millis);
                if damage_duration.is_zero() || safe_duration.is_zero() {
                    return Err(LevelError::ZeroDuration {
                        id: mechanic.id.clone(),
                    });
                }
                level.cables.push(CableSpec {
                    cell: self.walkable(&what, mechanic.position)?,
                    damage_duration,
                    safe_duration,
                    start_damaging: mechanic.start_damaging.unwrap_or(true),
                });
            }
            "vent" => level.vents.push(VentSpec {
                cell: self.walkable(&what, mechanic.position)?,
                open: mechanic.open.unwrap_or(false),
            }),
            other => {
                return Err(LevelError::UnknownMechanic {
                    kind: other.to_owned(),
                })
            }
        }
        Ok(())
    }
}

fn blocked(what: &str, position: PositionDocument) -> LevelError {
    LevelError::Blocked {
        what: what.to_owned(),
        x: position.x,
        y: position.y,
    }
}

fn missing(mechanic: &MechanicDocument, field: &'static str) -> LevelError {
    LevelError::MissingField {
        kind: mechanic.kind.clone(),
        id: mechanic.id.clone(),
        field,
    }
}
