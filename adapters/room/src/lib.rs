#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Room adapter that serialises client inputs against a single world.
//!
//! A [`Room`] owns one world plus the pure systems that drive fixture
//! lasers and the capybara. Inputs are processed strictly one at a time,
//! either synchronously through [`Room::process`] or on a dedicated worker
//! thread through a [`Lobby`].

mod config;
mod request;
mod room;
mod worker;

pub use config::RoomConfig;
pub use request::{Batch, ClientRequest, RoomInput};
pub use room::Room;
pub use worker::{Lobby, RoomHandle, RoomId};

use capyvent_system_bootstrap::LevelError;
use thiserror::Error;

/// Failures surfaced to callers of a room.
#[derive(Debug, Error)]
pub enum RoomError {
    /// The level document could not be turned into a world.
    #[error(transparent)]
    Level(#[from] LevelError),
    /// The room was disposed and accepts no further input.
    #[error("room has been disposed")]
    Closed,
    /// The room already holds its maximum number of players.
    #[error("room is full ({capacity} players)")]
    RoomFull {
        /// Maximum number of players admitted at once.
        capacity: usize,
    },
    /// The lobby holds no room with the requested identifier.
    #[error("no room with id {0}")]
    UnknownRoom(RoomId),
    /// The room's worker thread stopped before answering.
    #[error("room worker is no longer running")]
    Disconnected,
}
