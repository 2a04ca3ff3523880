//! Wire protocol between browser clients and the server.
//!
//! Every frame is a JSON envelope `{"type": ..., "data": ...}`. Inbound
//! envelopes are decoded in two steps: the envelope shape first, then
//! `data` according to `type`, so an unknown command is reported
//! separately from a malformed payload.

use crate::session::Status;
use derive_more::{Display, Error};
use duel_tictactoe::{Board, Mark, Outcome};
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ─────────────────────────────────────────────────────────────
//  Inbound
// ─────────────────────────────────────────────────────────────

/// A command decoded from a client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Ask for the current state. Seating itself happens on connect.
    Join,
    /// Place the sender's mark at `(row, col)`.
    Move {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        col: usize,
    },
    /// Start a fresh game after the previous one ended.
    PlayAgain,
}

/// Reasons an inbound frame was not understood.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolError {
    /// Not JSON, or not a `{"type": ...}` envelope.
    #[display("malformed envelope: {reason}")]
    Malformed {
        /// Parser message.
        reason: String,
    },
    /// Envelope was fine but its `type` is not a known command.
    #[display("unknown message type: {kind}")]
    UnknownType {
        /// The `type` value received.
        kind: String,
    },
    /// Known command with a payload of the wrong shape.
    #[display("invalid {kind} payload: {reason}")]
    InvalidPayload {
        /// The command whose payload failed.
        kind: &'static str,
        /// Parser message.
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MovePayload {
    row: usize,
    col: usize,
}

/// Decodes one text frame into a command.
#[instrument(level = "debug")]
pub fn decode(text: &str) -> Result<ClientCommand, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| ProtocolError::Malformed {
        reason: e.to_string(),
    })?;

    match envelope.kind.as_str() {
        "join" => Ok(ClientCommand::Join),
        "playAgain" => Ok(ClientCommand::PlayAgain),
        "move" => {
            let MovePayload { row, col } =
                serde_json::from_value(envelope.data).map_err(|e| ProtocolError::InvalidPayload {
                    kind: "move",
                    reason: e.to_string(),
                })?;
            Ok(ClientCommand::Move { row, col })
        }
        _ => Err(ProtocolError::UnknownType {
            kind: envelope.kind,
        }),
    }
}

// ─────────────────────────────────────────────────────────────
//  Outbound
// ─────────────────────────────────────────────────────────────

/// Everything a client needs to redraw from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_new::new)]
pub struct Snapshot {
    /// 3x3 grid of `""`, `"X"` or `"O"`.
    pub board: Board,
    /// Session status.
    pub status: Status,
    /// Mark whose move it is, while a game is in progress.
    pub turn: Option<Mark>,
    /// Result of the finished game, if any.
    pub winner: Option<Outcome>,
}

/// Payload of a `notification` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Human-readable text.
    pub message: String,
    /// Current state.
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

/// Payload of a `gameStarted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStarted {
    /// The recipient's own mark.
    pub mark: Mark,
    /// Current state.
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

/// Event pushed from the session to a player.
///
/// `playerTurn` carries the mover in `snapshot.turn` and `gameEnded`
/// carries the result in `snapshot.winner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Free-form message plus state.
    Notification(Notification),
    /// Both seats filled, a new game begins.
    GameStarted(GameStarted),
    /// A move was accepted and play passes on.
    PlayerTurn(Snapshot),
    /// Win or draw.
    GameEnded(Snapshot),
}

impl ServerEvent {
    /// Builds a `notification` event.
    pub fn notification(message: impl Into<String>, snapshot: Snapshot) -> Self {
        Self::Notification(Notification {
            message: message.into(),
            snapshot,
        })
    }

    /// Builds a `gameStarted` event addressed to the holder of `mark`.
    pub fn game_started(mark: Mark, snapshot: Snapshot) -> Self {
        Self::GameStarted(GameStarted { mark, snapshot })
    }

    /// Snapshot embedded in any event.
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            Self::Notification(n) => &n.snapshot,
            Self::GameStarted(g) => &g.snapshot,
            Self::PlayerTurn(s) | Self::GameEnded(s) => s,
        }
    }

    /// Wire name of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Notification(_) => "notification",
            Self::GameStarted(_) => "gameStarted",
            Self::PlayerTurn(_) => "playerTurn",
            Self::GameEnded(_) => "gameEnded",
        }
    }
}

/// Encodes an event as a JSON text frame.
pub fn encode(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
