//! Single-writer command loop that owns the [`Session`].
//!
//! Connection tasks never touch the session directly. They send
//! [`SessionCommand`]s through a [`SessionHandle`]; one task applies them
//! in arrival order, so transitions never interleave. Disconnects travel
//! the same queue as moves.

use crate::player::{ConnectionId, PlayerSink, Seat};
use crate::protocol::{ClientCommand, Snapshot};
use crate::session::{Session, SessionError};
use derive_more::{Display, Error};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span};

/// A request for the session task.
pub enum SessionCommand {
    /// A connection was accepted and wants a seat.
    Joined {
        /// The new connection.
        id: ConnectionId,
        /// Where its events go.
        sink: Box<dyn PlayerSink>,
        /// Seat granted, or why not.
        reply: oneshot::Sender<Result<Seat, SessionError>>,
    },
    /// A seated player wants to place a mark.
    Move {
        /// The mover.
        id: ConnectionId,
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
    },
    /// A seated player wants a rematch.
    PlayAgain {
        /// The requester.
        id: ConnectionId,
    },
    /// A seated player asked for the current state.
    Resync {
        /// The requester.
        id: ConnectionId,
    },
    /// The transport saw the connection close.
    Disconnected {
        /// The departed connection.
        id: ConnectionId,
    },
    /// Read-only peek at the current state.
    Inspect {
        /// Receives the snapshot.
        reply: oneshot::Sender<Snapshot>,
    },
}

impl std::fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joined { id, .. } => f.debug_struct("Joined").field("id", id).finish(),
            Self::Move { id, row, col } => f
                .debug_struct("Move")
                .field("id", id)
                .field("row", row)
                .field("col", col)
                .finish(),
            Self::PlayAgain { id } => f.debug_struct("PlayAgain").field("id", id).finish(),
            Self::Resync { id } => f.debug_struct("Resync").field("id", id).finish(),
            Self::Disconnected { id } => f.debug_struct("Disconnected").field("id", id).finish(),
            Self::Inspect { .. } => f.write_str("Inspect"),
        }
    }
}

/// The session task has stopped and can no longer take commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("session task is no longer running")]
pub struct SessionClosed;

/// Cloneable sender side of the session queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Asks for a seat and waits for the answer.
    pub async fn join(
        &self,
        id: ConnectionId,
        sink: Box<dyn PlayerSink>,
    ) -> Result<Result<Seat, SessionError>, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Joined { id, sink, reply }).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Forwards a decoded client command.
    pub async fn dispatch(
        &self,
        id: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), SessionClosed> {
        let command = match command {
            ClientCommand::Join => SessionCommand::Resync { id },
            ClientCommand::Move { row, col } => SessionCommand::Move { id, row, col },
            ClientCommand::PlayAgain => SessionCommand::PlayAgain { id },
        };
        self.send(command).await
    }

    /// Reports that a connection is gone.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Disconnected { id }).await
    }

    /// Fetches the current state.
    pub async fn snapshot(&self) -> Result<Snapshot, SessionClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Inspect { reply }).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Enqueues a raw command.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.tx.send(command).await.map_err(|_| SessionClosed)
    }
}

/// Owns the session and drains the command queue.
#[derive(Debug)]
pub struct SessionActor {
    session: Session,
    rx: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    /// Wraps `session` with a queue of `buffer` pending commands.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is zero.
    pub fn new(session: Session, buffer: usize) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { session, rx }, SessionHandle { tx })
    }

    /// Applies commands until every handle is dropped, then returns the session.
    pub async fn run(mut self) -> Session {
        info!("Session task started");
        while let Some(command) = self.rx.recv().await {
            self.handle(command);
        }
        info!("All session handles dropped, session task exiting");
        self.session
    }

    fn handle(&mut self, command: SessionCommand) {
        debug!(?command, "Processing session command");
        match command {
            SessionCommand::Joined { id, sink, reply } => {
                let result = self.session.join(id, sink);
                let seated = result.is_ok();
                if reply.send(result).is_err() && seated {
                    // Connection vanished while waiting; free the seat again.
                    debug!(%id, "Join reply dropped");
                    self.session.disconnect(id);
                }
            }
            SessionCommand::Move { id, row, col } => {
                // Rejections are logged by the session.
                let _ = self.session.apply_move(id, row, col);
            }
            SessionCommand::PlayAgain { id } => {
                let _ = self.session.play_again(id);
            }
            SessionCommand::Resync { id } => {
                if let Err(e) = self.session.resync(id) {
                    debug!(%id, error = %e, "Resync rejected");
                }
            }
            SessionCommand::Disconnected { id } => {
                self.session.disconnect(id);
            }
            SessionCommand::Inspect { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
        }
    }
}

/// Spawns the session task.
///
/// The returned join handle yields the final session once all handles are
/// dropped.
pub fn spawn_session(session: Session, buffer: usize) -> (SessionHandle, JoinHandle<Session>) {
    let (actor, handle) = SessionActor::new(session, buffer);
    let task = tokio::spawn(actor.run().instrument(info_span!("session")));
    (handle, task)
}
