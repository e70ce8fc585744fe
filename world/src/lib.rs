#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative room state for the Capyvent puzzle simulation.
//!
//! The [`World`] owns the grid, every entity collection and the interactable
//! wiring of a single room. All mutations flow through [`apply`], which
//! validates the command, applies it in full or not at all, and appends the
//! resulting diffs to the caller's event buffer. A command that changes
//! nothing appends nothing.

use std::time::Duration;

use capyvent_core::{
    BeamSource, CapybaraState, CellCoord, Color, Command, CrateId, Direction, Event, LaserId, Level,
    PlayerName, SessionId, VentId,
};
use tracing::{debug, info};

mod grid;
mod hazards;
mod interactables;
mod movement;
mod navigation;
mod registry;
mod roster;

use grid::Grid;
use hazards::{Cables, Lasers, Toggle};
use interactables::Interactables;
use registry::{Capybara, CrateRegistry, VentRegistry};
use roster::{Player, PlayerRoster};

/// Represents the authoritative state of one puzzle room.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    roster: PlayerRoster,
    crates: CrateRegistry,
    interactables: Interactables,
    lasers: Lasers,
    cables: Cables,
    vents: VentRegistry,
    capybara: Option<Capybara>,
    spawn_points: Vec<CellCoord>,
}

impl World {
    /// Builds a room from a validated level description.
    ///
    /// Button pressure is settled before the room is returned, so crates
    /// placed on buttons by the level start out holding their doors open.
    #[must_use]
    pub fn from_level(level: Level) -> Self {
        let mut world = Self {
            grid: Grid::new(level.columns, level.rows, level.cells),
            roster: PlayerRoster::default(),
            crates: CrateRegistry::default(),
            interactables: Interactables::default(),
            lasers: Lasers::default(),
            cables: Cables::default(),
            vents: VentRegistry::default(),
            capybara: level.capybara.map(Capybara::new),
            spawn_points: level.spawn_points,
        };

        for cell in level.crates {
            if world.crates.spawn(cell).is_none() {
                debug!(?cell, "skipping duplicate crate placement");
            }
        }
        for door in level.doors {
            world.interactables.add_door(door);
        }
        for button in level.buttons {
            world.interactables.add_button(button);
        }
        for laser in level.lasers {
            world.lasers.add_fixture(laser);
        }
        for cable in level.cables {
            let _ = world.cables.spawn(cable);
        }
        for vent in level.vents {
            let _ = world.vents.spawn(vent.cell, vent.open);
        }

        let mut settled = Vec::new();
        world.recompute_pressure(&mut settled);
        world
    }

    fn capybara_occupies(&self, cell: CellCoord) -> bool {
        self.capybara.is_some_and(|capybara| {
            capybara.state != CapybaraState::Escaped && capybara.cell == cell
        })
    }

    /// Terrain check shared by every actor: walkable tile without a closed door.
    fn terrain_open(&self, cell: CellCoord) -> bool {
        self.grid.in_bounds(cell)
            && self.grid.cell_at(cell).is_walkable()
            && !self.interactables.door_closed_at(cell)
    }

    fn player_can_enter(&self, cell: CellCoord) -> bool {
        self.terrain_open(cell) && !self.crates.contains_cell(cell) && !self.capybara_occupies(cell)
    }

    fn crate_can_enter(&self, cell: CellCoord) -> bool {
        self.terrain_open(cell)
            && !self.crates.contains_cell(cell)
            && !self.roster.occupies(cell)
            && !self.capybara_occupies(cell)
    }

    fn capybara_can_enter(&self, cell: CellCoord) -> bool {
        self.terrain_open(cell) && !self.crates.contains_cell(cell) && !self.roster.occupies(cell)
    }

    /// Spawn cell for `index`, falling back to the nearest enterable cell
    /// when the configured spawn point is blocked.
    fn spawn_cell(&self, index: u32) -> Option<CellCoord> {
        let count = u32::try_from(self.spawn_points.len()).ok()?;
        if count == 0 {
            return None;
        }
        let slot = usize::try_from(index % count).ok()?;
        let preferred = *self.spawn_points.get(slot)?;

        navigation::shortest_path(
            preferred,
            self.grid.columns(),
            self.grid.rows(),
            |cell| self.player_can_enter(cell),
            |cell| self.terrain_open(cell),
        )
        .and_then(|path| path.last().copied())
    }

    fn recompute_pressure(&mut self, out_events: &mut Vec<Event>) {
        let roster = &self.roster;
        let crates = &self.crates;
        let capybara = self
            .capybara
            .filter(|capybara| capybara.state != CapybaraState::Escaped)
            .map(|capybara| capybara.cell);

        self.interactables.recompute_pressure(
            |cell| roster.occupies(cell) || crates.contains_cell(cell),
            |cell| roster.occupies(cell) || crates.contains_cell(cell) || capybara == Some(cell),
            out_events,
        );
    }

    fn report_damage(&self, session: &SessionId, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.cables.damages_at(cell) {
            out_events.push(Event::PlayerDamaged {
                session: session.clone(),
                cell,
            });
        }
    }

    fn admit(&mut self, player: Player, out_events: &mut Vec<Event>) {
        let session = player.session.clone();
        let cell = player.cell;
        info!(
            session = session.as_str(),
            name = player.name.as_str(),
            index = player.index,
            "player joined"
        );
        out_events.push(Event::PlayerJoined {
            session: player.session.clone(),
            name: player.name.as_str().to_owned(),
            index: player.index,
            cell,
        });
        self.roster.insert(player);
        self.recompute_pressure(out_events);
        self.report_damage(&session, cell, out_events);
    }

    fn join(&mut self, session: SessionId, name: Option<String>, out_events: &mut Vec<Event>) {
        if self.roster.contains(&session) {
            debug!(session = session.as_str(), "session already joined");
            return;
        }
        let index = self.roster.next_free_index();
        let Some(cell) = self.spawn_cell(index) else {
            debug!(session = session.as_str(), "no free spawn cell");
            return;
        };
        let player = Player {
            session,
            index,
            name: PlayerName::normalized(name.as_deref()),
            cell,
        };
        self.admit(player, out_events);
    }

    fn restore(
        &mut self,
        session: SessionId,
        name: String,
        cell: CellCoord,
        index: u32,
        out_events: &mut Vec<Event>,
    ) {
        if self.roster.contains(&session)
            || self.roster.index_in_use(index)
            || !self.player_can_enter(cell)
        {
            debug!(session = session.as_str(), index, ?cell, "restore rejected");
            return;
        }
        let player = Player {
            session,
            index,
            name: PlayerName::normalized(Some(name.as_str())),
            cell,
        };
        self.admit(player, out_events);
    }

    fn leave(&mut self, session: &SessionId, out_events: &mut Vec<Event>) {
        let Some(player) = self.roster.remove(session) else {
            debug!(session = session.as_str(), "leave for unknown session");
            return;
        };
        if let Some(beam) = self.lasers.remove_session(session) {
            if beam.on {
                out_events.push(Event::LaserSwitchedOff {
                    source: BeamSource::Session(session.clone()),
                    origin: beam.origin,
                });
            }
        }
        info!(session = session.as_str(), name = player.name.as_str(), "player left");
        out_events.push(Event::PlayerLeft {
            session: player.session,
            name: player.name.as_str().to_owned(),
        });
        self.recompute_pressure(out_events);
    }

    fn move_player(
        &mut self,
        session: &SessionId,
        direction: Direction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(player) = self.roster.get(session) else {
            debug!(session = session.as_str(), "move for unknown session");
            return;
        };
        let from = player.cell;
        let name = player.name.as_str().to_owned();
        let (columns, rows) = (self.grid.columns(), self.grid.rows());
        let Some(target) = from.step(direction, columns, rows) else {
            debug!(session = session.as_str(), ?direction, "move leaves the grid");
            return;
        };

        if !self.player_can_enter(target) {
            if !self.crates.contains_cell(target) || !self.terrain_open(target) {
                debug!(session = session.as_str(), ?target, "move blocked");
                return;
            }
            let Some(chain) = movement::collect_push_chain(
                &self.crates,
                target,
                direction,
                columns,
                rows,
                |cell| self.crate_can_enter(cell),
            ) else {
                debug!(session = session.as_str(), ?target, "push chain blocked");
                return;
            };
            movement::shift_chain(
                &mut self.crates,
                &chain,
                direction,
                columns,
                rows,
                out_events,
            );
        }

        self.roster.relocate(session, target);
        out_events.push(Event::PlayerMoved {
            session: session.clone(),
            name,
            from,
            to: target,
        });
        self.recompute_pressure(out_events);
        self.report_damage(session, target, out_events);
    }

    fn push_crate(&mut self, crate_id: CrateId, direction: Direction, out_events: &mut Vec<Event>) {
        let Some(head) = self.crates.cell_of(crate_id) else {
            debug!(crate_id = crate_id.get(), "push for unknown crate");
            return;
        };
        let (columns, rows) = (self.grid.columns(), self.grid.rows());
        let Some(chain) = movement::collect_push_chain(
            &self.crates,
            head,
            direction,
            columns,
            rows,
            |cell| self.crate_can_enter(cell),
        ) else {
            debug!(crate_id = crate_id.get(), ?direction, "push chain blocked");
            return;
        };
        movement::shift_chain(
            &mut self.crates,
            &chain,
            direction,
            columns,
            rows,
            out_events,
        );
        self.recompute_pressure(out_events);
    }

    fn toggle_laser(
        &mut self,
        session: SessionId,
        origin: CellCoord,
        direction: Direction,
        color: Color,
        out_events: &mut Vec<Event>,
    ) {
        if !self.roster.contains(&session) || !self.grid.in_bounds(origin) {
            debug!(session = session.as_str(), ?origin, "toggle rejected");
            return;
        }
        match self.lasers.toggle(&session, origin, direction, color) {
            Toggle::SwitchedOff => out_events.push(Event::LaserSwitchedOff {
                source: BeamSource::Session(session),
                origin,
            }),
            Toggle::Lit => self.fire_beam(BeamSource::Session(session), out_events),
        }
    }

    fn fire_beam(&mut self, source: BeamSource, out_events: &mut Vec<Event>) {
        let Some(beam) = self.lasers.beam(&source) else {
            return;
        };
        let (origin, direction, color) = (beam.origin, beam.direction, beam.color.clone());
        let range = self.lasers.range(&source);

        let trace = hazards::cast(&mut self.grid, &mut self.crates, origin, direction, range);
        if let Some(beam) = self.lasers.beam_mut(&source) {
            beam.endpoint = trace.endpoint;
        }

        out_events.push(Event::LaserFired {
            source,
            hits: trace.hits,
            endpoint: trace.endpoint,
            color: color.clone(),
        });

        if trace.destroyed_boxes.is_empty() && trace.destroyed_crates.is_empty() {
            return;
        }
        let mut cells = trace.destroyed_boxes;
        for (crate_id, cell) in trace.destroyed_crates {
            out_events.push(Event::CrateDestroyed { crate_id, cell });
            cells.push(cell);
        }
        debug!(count = cells.len(), "beam destroyed obstacles");
        out_events.push(Event::BoxesDestroyed { cells, color });
        self.recompute_pressure(out_events);
    }

    fn fire_fixture(&mut self, laser: LaserId, out_events: &mut Vec<Event>) {
        if !self.lasers.ignite_fixture(&laser) {
            debug!(laser = laser.as_str(), "fire for unknown laser");
            return;
        }
        self.fire_beam(BeamSource::Fixture(laser), out_events);
    }

    fn extinguish_fixture(&mut self, laser: LaserId, out_events: &mut Vec<Event>) {
        let source = BeamSource::Fixture(laser);
        let Some(beam) = self.lasers.beam_mut(&source) else {
            return;
        };
        if beam.extinguish() {
            let origin = beam.origin;
            out_events.push(Event::LaserSwitchedOff { source, origin });
        }
    }

    fn set_laser_interval(
        &mut self,
        laser: LaserId,
        interval: Option<Duration>,
        out_events: &mut Vec<Event>,
    ) {
        let interval = interval.filter(|interval| !interval.is_zero());
        if !self.lasers.set_interval(&laser, interval) {
            debug!(laser = laser.as_str(), "interval for unknown laser");
            return;
        }
        out_events.push(Event::LaserIntervalChanged { laser, interval });
    }

    fn open_vent(&mut self, vent: VentId, out_events: &mut Vec<Event>) {
        if !self.vents.open(vent) {
            debug!(vent = vent.get(), "vent already open or unknown");
            return;
        }
        out_events.push(Event::VentOpened { vent });

        if let Some(capybara) = self.capybara {
            if self.vents.at(capybara.cell).is_some_and(|found| found.id == vent) {
                self.escape_through(vent, capybara.cell, out_events);
            }
        }
    }

    fn escape_through(&mut self, vent: VentId, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(capybara) = self.capybara.as_mut() else {
            return;
        };
        if capybara.state == CapybaraState::Escaped {
            return;
        }
        capybara.state = CapybaraState::Escaped;
        info!(vent = vent.get(), "capybara escaped");
        out_events.push(Event::CapybaraEscaped { vent, cell });
        self.recompute_pressure(out_events);
    }

    fn step_capybara(&mut self, direction: Direction, out_events: &mut Vec<Event>) {
        let Some(capybara) = self.capybara else {
            return;
        };
        if capybara.state == CapybaraState::Escaped {
            return;
        }
        let from = capybara.cell;
        let Some(to) = from.step(direction, self.grid.columns(), self.grid.rows()) else {
            return;
        };
        if !self.capybara_can_enter(to) {
            debug!(?to, "capybara step blocked");
            return;
        }

        self.capybara = Some(Capybara {
            cell: to,
            state: CapybaraState::Fleeing,
        });
        out_events.push(Event::CapybaraMoved { from, to });

        match self.vents.at(to).copied() {
            Some(vent) if vent.open => self.escape_through(vent.id, to, out_events),
            _ => self.recompute_pressure(out_events),
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        for (cable, damage) in self.cables.advance(dt) {
            out_events.push(Event::CableChanged { cable, damage });
        }
    }

    fn dispose(&mut self, out_events: &mut Vec<Event>) {
        self.grid.clear();
        self.roster.clear();
        self.crates.clear();
        self.interactables.clear();
        self.lasers.clear();
        self.cables.clear();
        self.vents.clear();
        self.capybara = None;
        self.spawn_points.clear();
        info!("room disposed");
        out_events.push(Event::RoomDisposed);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and append no events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::JoinPlayer { session, name } => world.join(session, name, out_events),
        Command::RestorePlayer {
            session,
            name,
            cell,
            index,
        } => world.restore(session, name, cell, index, out_events),
        Command::LeavePlayer { session } => world.leave(&session, out_events),
        Command::MovePlayer { session, direction } => {
            world.move_player(&session, direction, out_events)
        }
        Command::PushCrate {
            crate_id,
            direction,
        } => world.push_crate(crate_id, direction, out_events),
        Command::ToggleLaser {
            session,
            origin,
            direction,
            color,
        } => world.toggle_laser(session, origin, direction, color, out_events),
        Command::FireLaserOnce { laser } => world.fire_fixture(laser, out_events),
        Command::ExtinguishLaser { laser } => world.extinguish_fixture(laser, out_events),
        Command::SetLaserInterval { laser, interval } => {
            world.set_laser_interval(laser, interval, out_events)
        }
        Command::OpenVent { vent } => world.open_vent(vent, out_events),
        Command::StepCapybara { direction } => world.step_capybara(direction, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::Dispose => world.dispose(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use capyvent_core::{
        BeamSource, CapybaraSnapshot, CapybaraState, CellCoord, CellKind, CrateId, CrateSnapshot,
        LaserId, LaserSnapshot, MapSnapshot, PlayerSnapshot, SessionId, VentGoal, VentSnapshot,
    };

    use super::{navigation, roster::Player, World};

    fn player_snapshot(player: &Player) -> PlayerSnapshot {
        PlayerSnapshot {
            session: player.session.clone(),
            index: player.index,
            name: player.name.as_str().to_owned(),
            cell: player.cell,
        }
    }

    /// Classification of `cell`; cells outside the grid read as walls.
    #[must_use]
    pub fn cell_at(world: &World, cell: CellCoord) -> CellKind {
        world.grid.cell_at(cell)
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub fn in_bounds(world: &World, cell: CellCoord) -> bool {
        world.grid.in_bounds(cell)
    }

    /// Grid dimensions as `(columns, rows)`.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.grid.columns(), world.grid.rows())
    }

    /// Player owned by `session`, if connected.
    #[must_use]
    pub fn player(world: &World, session: &SessionId) -> Option<PlayerSnapshot> {
        world.roster.get(session).map(player_snapshot)
    }

    /// Connected players ordered by spawn index.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerSnapshot> {
        world
            .roster
            .by_index()
            .into_iter()
            .map(player_snapshot)
            .collect()
    }

    /// Number of connected players.
    #[must_use]
    pub fn player_count(world: &World) -> usize {
        world.roster.len()
    }

    /// Session currently holding the normalised form of `name`.
    #[must_use]
    pub fn session_for_name(world: &World, name: &str) -> Option<SessionId> {
        world.roster.session_for_name(name).cloned()
    }

    /// Crate standing on `cell`, if any.
    #[must_use]
    pub fn crate_at(world: &World, cell: CellCoord) -> Option<CrateId> {
        world.crates.at(cell)
    }

    /// Whether a cable on `cell` currently deals damage.
    #[must_use]
    pub fn cable_damages_at(world: &World, cell: CellCoord) -> bool {
        world.cables.damages_at(cell)
    }

    /// Rendered state of the beam owned by `source`.
    #[must_use]
    pub fn laser(world: &World, source: &BeamSource) -> Option<LaserSnapshot> {
        world
            .lasers
            .beam(source)
            .map(|beam| beam.snapshot(source.clone()))
    }

    /// Auto-repeat cadence configured for a fixture laser.
    #[must_use]
    pub fn laser_interval(world: &World, laser: &LaserId) -> Option<Duration> {
        world.lasers.interval(laser)
    }

    /// Current capybara position and behaviour, if the level has one.
    #[must_use]
    pub fn capybara(world: &World) -> Option<CapybaraSnapshot> {
        world.capybara.map(|capybara| CapybaraSnapshot {
            cell: capybara.cell,
            state: capybara.state,
        })
    }

    /// Breadth-first route from the capybara to the nearest vent in `goal`.
    ///
    /// The route runs around walls, crates and closed doors and includes the
    /// capybara's own cell. `None` when there is no capybara, it already
    /// escaped, or no vent is reachable.
    #[must_use]
    pub fn escape_path(world: &World, goal: VentGoal) -> Option<Vec<CellCoord>> {
        let capybara = world.capybara?;
        if capybara.state == CapybaraState::Escaped {
            return None;
        }
        navigation::shortest_path(
            capybara.cell,
            world.grid.columns(),
            world.grid.rows(),
            |cell| {
                world.vents.at(cell).is_some_and(|vent| match goal {
                    VentGoal::OpenOnly => vent.open,
                    VentGoal::AnyVent => true,
                })
            },
            |cell| world.terrain_open(cell) && !world.crates.contains_cell(cell),
        )
    }

    /// Full map description served to clients on request.
    #[must_use]
    pub fn map_snapshot(world: &World) -> MapSnapshot {
        MapSnapshot {
            grid: world.grid.code_rows(),
            width: world.grid.columns(),
            height: world.grid.rows(),
            players: players(world),
            crates: world
                .crates
                .iter()
                .map(|(id, cell)| CrateSnapshot { id, cell })
                .collect(),
            doors: world.interactables.door_snapshots(),
            buttons: world.interactables.button_snapshots(),
            cables: world.cables.snapshots(),
            lasers: world.lasers.snapshots(),
            vents: world
                .vents
                .iter()
                .map(|vent| VentSnapshot {
                    id: vent.id,
                    cell: vent.cell,
                    open: vent.open,
                })
                .collect(),
            capybara: capybara(world),
        }
    }
}
