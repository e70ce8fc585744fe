//! Synchronous room that drains one input at a time against its world.

use std::time::Duration;

use capyvent_core::{Command, Event, Level, MapSnapshot, SessionId};
use capyvent_system_bootstrap::Bootstrap;
use capyvent_system_escape::{self as escape, Escape};
use capyvent_system_laser_schedule::{self as laser_schedule, LaserSchedule};
use capyvent_world::{self as world, query, World};
use tracing::{debug, warn};

use crate::{Batch, ClientRequest, RoomConfig, RoomError, RoomInput};

/// Upper bound on system follow-up rounds triggered by a single input.
const MAX_FOLLOW_UP_ROUNDS: usize = 16;

/// One isolated simulation instance together with the systems that drive it.
#[derive(Debug)]
pub struct Room {
    world: World,
    config: RoomConfig,
    lasers: LaserSchedule,
    escape: Escape,
    disposed: bool,
}

impl Room {
    /// Creates a room around a validated level.
    #[must_use]
    pub fn new(level: Level, config: RoomConfig) -> Self {
        Self {
            world: World::from_level(level),
            config,
            lasers: LaserSchedule::new(laser_schedule::Config::new(config.laser_visibility())),
            escape: Escape::new(escape::Config::new(
                config.capybara_step(),
                config.capybara_goal(),
            )),
            disposed: false,
        }
    }

    /// Loads a JSON level document and creates a room around it.
    pub fn from_document(document: &str, config: RoomConfig) -> Result<Self, RoomError> {
        let level = Bootstrap.load_level(document)?;
        Ok(Self::new(level, config))
    }

    /// Configuration the room was created with.
    #[must_use]
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Reports whether the room has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Read-only view of the room's world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Captures the full map state between processed inputs.
    #[must_use]
    pub fn snapshot(&self) -> MapSnapshot {
        query::map_snapshot(&self.world)
    }

    /// Applies one input and returns every event it caused.
    ///
    /// Rejected client requests yield an empty batch; only a closed or full
    /// room is reported as an error.
    pub fn process(&mut self, input: RoomInput) -> Result<Batch, RoomError> {
        if self.disposed {
            return Err(RoomError::Closed);
        }

        match input {
            RoomInput::Join { session, name } => {
                self.ensure_capacity(&session)?;
                Ok(self.run(Command::JoinPlayer { session, name }))
            }
            RoomInput::Takeover { previous, session } => Ok(self.takeover(&previous, session)),
            RoomInput::Leave { session } => Ok(self.run(Command::LeavePlayer { session })),
            RoomInput::Tick { ms } => Ok(self.run(Command::Tick {
                dt: Duration::from_millis(ms),
            })),
            RoomInput::Dispose => {
                let batch = self.run(Command::Dispose);
                self.disposed = true;
                Ok(batch)
            }
            RoomInput::Client { session, request } => Ok(self.client(&session, request)),
        }
    }

    fn ensure_capacity(&self, session: &SessionId) -> Result<(), RoomError> {
        let capacity = self.config.max_players();
        if query::player(&self.world, session).is_none()
            && query::player_count(&self.world) >= capacity
        {
            warn!(session = session.as_str(), capacity, "room is full");
            return Err(RoomError::RoomFull { capacity });
        }
        Ok(())
    }

    fn takeover(&mut self, previous: &SessionId, session: SessionId) -> Batch {
        let Some(player) = query::player(&self.world, previous) else {
            warn!(
                previous = previous.as_str(),
                "takeover of a session without a player"
            );
            return Batch::default();
        };
        if query::player(&self.world, &session).is_some() {
            warn!(session = session.as_str(), "takeover by a joined session");
            return Batch::default();
        }

        let mut batch = self.run(Command::LeavePlayer {
            session: previous.clone(),
        });
        let restored = self.run(Command::RestorePlayer {
            session,
            name: player.name,
            cell: player.cell,
            index: player.index,
        });
        batch.events.extend(restored.events);
        batch
    }

    fn client(&mut self, session: &SessionId, request: ClientRequest) -> Batch {
        if query::player(&self.world, session).is_none() {
            warn!(
                session = session.as_str(),
                ?request,
                "request from a session without a player"
            );
            return Batch::default();
        }
        if request == ClientRequest::GetMapInfo {
            return Batch {
                events: Vec::new(),
                snapshot: Some(self.snapshot()),
            };
        }

        match request.clone().into_command(session) {
            Some(command) => self.run(command),
            None => {
                warn!(session = session.as_str(), ?request, "malformed request");
                Batch::default()
            }
        }
    }

    /// Applies `command`, then feeds the resulting events through the
    /// systems until they stop producing follow-up commands.
    fn run(&mut self, command: Command) -> Batch {
        let mut log = Vec::new();
        let mut pending = vec![command];
        let mut rounds = 0;

        while !pending.is_empty() {
            if rounds == MAX_FOLLOW_UP_ROUNDS {
                warn!(
                    dropped = pending.len(),
                    "follow-up commands did not settle"
                );
                break;
            }
            rounds += 1;

            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.drive_systems(&events, &mut pending);
            log.extend(events);
        }

        debug!(events = log.len(), rounds, "input processed");
        Batch {
            events: log,
            snapshot: None,
        }
    }

    fn drive_systems(&mut self, events: &[Event], out: &mut Vec<Command>) {
        self.lasers.handle(events, out);

        let view = &self.world;
        self.escape.handle(
            events,
            query::capybara(view),
            |goal| query::escape_path(view, goal),
            out,
        );
    }
}
