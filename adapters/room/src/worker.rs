//! Worker threads that give every room its own serial input queue.

use std::{
    collections::BTreeMap,
    fmt,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Instant,
};

use tracing::{info, warn};

use crate::{Batch, Room, RoomConfig, RoomError, RoomInput};

/// Identifier assigned to a room by its lobby.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(u64);

impl RoomId {
    /// Creates a new room identifier with the provided value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Reply = Sender<Result<Batch, RoomError>>;

#[derive(Debug)]
struct Envelope {
    input: RoomInput,
    reply: Option<Reply>,
}

/// Owning handle to a room running on its own worker thread.
///
/// Inputs are queued onto a single channel, so client requests and clock
/// ticks are applied strictly in arrival order.
#[derive(Debug)]
pub struct RoomHandle {
    id: RoomId,
    inputs: Sender<Envelope>,
    worker: Option<JoinHandle<()>>,
}

impl RoomHandle {
    /// Starts a worker thread that owns `room`.
    ///
    /// Every non-empty batch is sent to `broadcast`. When the configured
    /// tick interval is non-zero the worker also queues a clock tick each
    /// time the interval elapses, between client inputs.
    #[must_use]
    pub fn spawn(id: RoomId, room: Room, broadcast: Sender<(RoomId, Batch)>) -> Self {
        let (inputs, queue) = mpsc::channel();
        let worker = thread::spawn(move || run_worker(id, room, &queue, &broadcast));
        Self {
            id,
            inputs,
            worker: Some(worker),
        }
    }

    /// Identifier of the room.
    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Queues an input without waiting for its outcome.
    pub fn submit(&self, input: RoomInput) -> Result<(), RoomError> {
        self.inputs
            .send(Envelope { input, reply: None })
            .map_err(|_| RoomError::Disconnected)
    }

    /// Queues an input and blocks until the worker has processed it.
    pub fn request(&self, input: RoomInput) -> Result<Batch, RoomError> {
        let (reply, outcome) = mpsc::channel();
        self.inputs
            .send(Envelope {
                input,
                reply: Some(reply),
            })
            .map_err(|_| RoomError::Disconnected)?;
        outcome.recv().map_err(|_| RoomError::Disconnected)?
    }

    /// Disposes the room and waits for its worker to stop.
    pub fn dispose(mut self) -> Result<Batch, RoomError> {
        let outcome = self.request(RoomInput::Dispose);
        self.join();
        outcome
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(room = %self.id, "room worker panicked");
            }
        }
    }
}

impl Drop for RoomHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.submit(RoomInput::Dispose);
            self.join();
        }
    }
}

fn run_worker(
    id: RoomId,
    mut room: Room,
    queue: &Receiver<Envelope>,
    broadcast: &Sender<(RoomId, Batch)>,
) {
    let tick_interval = room.config().tick_interval();
    let tick = RoomInput::Tick {
        ms: u64::try_from(tick_interval.as_millis()).unwrap_or(u64::MAX),
    };
    let mut next_tick = Instant::now() + tick_interval;
    info!(room = %id, "room started");

    loop {
        let envelope = if tick_interval.is_zero() {
            match queue.recv() {
                Ok(envelope) => envelope,
                Err(_) => break,
            }
        } else if Instant::now() >= next_tick {
            next_tick += tick_interval;
            Envelope {
                input: tick.clone(),
                reply: None,
            }
        } else {
            match queue.recv_timeout(next_tick.saturating_duration_since(Instant::now())) {
                Ok(envelope) => envelope,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        };

        let outcome = room.process(envelope.input);
        if let Ok(batch) = &outcome {
            if !batch.events.is_empty() {
                let _ = broadcast.send((
                    id,
                    Batch {
                        events: batch.events.clone(),
                        snapshot: None,
                    },
                ));
            }
        }
        if let Some(reply) = envelope.reply {
            let _ = reply.send(outcome);
        }
        if room.is_disposed() {
            break;
        }
    }

    info!(room = %id, "room stopped");
}

/// Collection of independent rooms, each running on its own worker.
#[derive(Debug)]
pub struct Lobby {
    config: RoomConfig,
    rooms: BTreeMap<RoomId, RoomHandle>,
    next_id: u64,
    broadcast: Sender<(RoomId, Batch)>,
}

impl Lobby {
    /// Creates an empty lobby whose rooms share `config` and publish their
    /// batches to `broadcast`.
    #[must_use]
    pub fn new(config: RoomConfig, broadcast: Sender<(RoomId, Batch)>) -> Self {
        Self {
            config,
            rooms: BTreeMap::new(),
            next_id: 0,
            broadcast,
        }
    }

    /// Loads a level document and starts a room for it.
    ///
    /// A malformed document never starts a worker.
    pub fn create_room(&mut self, document: &str) -> Result<RoomId, RoomError> {
        let room = Room::from_document(document, self.config)?;
        let id = RoomId::new(self.next_id);
        self.next_id += 1;
        let handle = RoomHandle::spawn(id, room, self.broadcast.clone());
        let _ = self.rooms.insert(id, handle);
        Ok(id)
    }

    /// Handle of a running room.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&RoomHandle> {
        self.rooms.get(&id)
    }

    /// Queues an input for a room and waits for its outcome.
    pub fn request(&self, id: RoomId, input: RoomInput) -> Result<Batch, RoomError> {
        self.rooms
            .get(&id)
            .ok_or(RoomError::UnknownRoom(id))?
            .request(input)
    }

    /// Disposes a room and removes it from the lobby.
    pub fn dispose_room(&mut self, id: RoomId) -> Result<Batch, RoomError> {
        self.rooms
            .remove(&id)
            .ok_or(RoomError::UnknownRoom(id))?
            .dispose()
    }

    /// Number of running rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Reports whether the lobby holds no rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Disposes every room and waits for all workers to stop.
    pub fn shutdown(&mut self) {
        for (id, handle) in std::mem::take(&mut self.rooms) {
            if let Err(error) = handle.dispose() {
                warn!(room = %id, %error, "room did not shut down cleanly");
            }
        }
    }
}
