//! Seated players and the outbound sinks that reach them.

use crate::protocol::ServerEvent;
use derive_more::{Display, Error, From};
use duel_tictactoe::Mark;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// Process-unique identifier for one client connection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[display("conn-{_0}")]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw numeric id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One of the two seats at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Seat {
    /// Seat 1, plays `X` and moves first.
    First,
    /// Seat 2, plays `O`.
    Second,
}

impl Seat {
    /// Both seats in broadcast order.
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    /// The mark bound to this seat.
    pub fn mark(self) -> Mark {
        match self {
            Seat::First => Mark::X,
            Seat::Second => Mark::O,
        }
    }

    /// The opposite seat.
    pub fn other(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Index into a two-slot array.
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }
}

/// Why an event could not be handed to a player's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum SinkError {
    /// The connection is not draining its queue fast enough.
    #[display("outbound queue is full")]
    Full,
    /// The connection has gone away.
    #[display("outbound queue is closed")]
    Closed,
}

/// Outbound half of a player's connection.
///
/// Implementations must not block: the session calls `send` while it
/// holds exclusive access to game state.
pub trait PlayerSink: Send {
    /// Queues an event for delivery.
    fn send(&self, event: ServerEvent) -> Result<(), SinkError>;
}

/// [`PlayerSink`] backed by a bounded tokio channel.
///
/// A writer task on the other end serializes events onto the socket.
#[derive(Debug, Clone, derive_new::new)]
pub struct ChannelSink {
    tx: mpsc::Sender<ServerEvent>,
}

impl PlayerSink for ChannelSink {
    fn send(&self, event: ServerEvent) -> Result<(), SinkError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

/// A connection that holds a seat.
pub struct Player {
    id: ConnectionId,
    seat: Seat,
    mark: Mark,
    sink: Box<dyn PlayerSink>,
}

impl Player {
    /// Seats a connection. The mark is derived from the seat once, here.
    #[instrument(skip(sink))]
    pub fn new(id: ConnectionId, seat: Seat, sink: Box<dyn PlayerSink>) -> Self {
        let mark = seat.mark();
        debug!(%id, ?seat, %mark, "Assigned seat");
        Self {
            id,
            seat,
            mark,
            sink,
        }
    }

    /// Connection this player arrived on.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Seat held by this player.
    pub fn seat(&self) -> Seat {
        self.seat
    }

    /// Mark this player places.
    pub fn mark(&self) -> Mark {
        self.mark
    }

    /// Delivers an event, logging instead of failing when the sink is gone.
    ///
    /// Every event carries a full snapshot, so a missed one is repaired by
    /// the next.
    pub fn send(&self, event: ServerEvent) {
        if let Err(e) = self.sink.send(event) {
            warn!(id = %self.id, seat = ?self.seat, error = %e, "Failed to send event to player");
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("seat", &self.seat)
            .field("mark", &self.mark)
            .finish_non_exhaustive()
    }
}
