//! The match state machine.
//!
//! A [`Session`] owns the board and both seats. Every transition runs to
//! completion, including its broadcasts, before the caller regains
//! control; the actor in [`crate::actor`] guarantees only one transition
//! runs at a time.

use crate::player::{ConnectionId, Player, PlayerSink, Seat};
use crate::protocol::{ServerEvent, Snapshot};
use derive_more::{Display, Error};
use duel_tictactoe::{Board, Mark, Outcome, PlaceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

const WAITING_FOR_OPPONENT: &str = "Waiting for opponent to join";
const OPPONENT_LEFT: &str = "Your opponent has disconnected";

/// Lifecycle of the match.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Status {
    /// At least one seat is empty.
    #[default]
    Waiting,
    /// Both seats filled and no result yet.
    InProgress,
    /// Win or draw reached; waiting for `playAgain`.
    Ended,
}

/// Tunables that change how the session talks to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, derive_new::new)]
pub struct SessionOptions {
    /// Send rejected commands back to the offending player as a notification.
    pub echo_rejections: bool,
}

/// A command the session refused. The game state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// Both seats are taken.
    #[display("Game is full")]
    Full,
    /// This connection already holds a seat.
    #[display("Connection {id} is already seated")]
    AlreadySeated {
        /// The connection.
        id: ConnectionId,
    },
    /// The connection does not hold a seat.
    #[display("Connection {id} is not seated")]
    NotSeated {
        /// The connection.
        id: ConnectionId,
    },
    /// Moves are only accepted while a game is in progress.
    #[display("Game is not in progress ({status})")]
    NotInProgress {
        /// Status at the time of the move.
        status: Status,
    },
    /// The mover does not hold the turn.
    #[display("It's not your turn")]
    NotYourTurn {
        /// Mark of the player who tried to move.
        mark: Mark,
    },
    /// The target cell is taken or off the board.
    #[display("{source}")]
    InvalidCell {
        /// Board-level reason.
        source: PlaceError,
    },
    /// `playAgain` is only valid once a game has ended.
    #[display("Game has not ended ({status})")]
    NotEnded {
        /// Status at the time of the request.
        status: Status,
    },
}

/// Result of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Play continues with `next` to move.
    Continue {
        /// Mark that moves next.
        next: Mark,
    },
    /// The mover completed a line.
    Won(Mark),
    /// The board filled with no line.
    Draw,
}

/// The single live match.
#[derive(Debug, Default)]
pub struct Session {
    board: Board,
    seats: [Option<Player>; 2],
    turn: Option<Seat>,
    status: Status,
    winner: Option<Outcome>,
    options: SessionOptions,
}

impl Session {
    /// Creates an empty session in [`Status::Waiting`].
    #[instrument]
    pub fn new(options: SessionOptions) -> Self {
        info!("Creating new game session");
        Self {
            options,
            ..Self::default()
        }
    }

    // ─────────────────────────────────────────────────────────
    //  Read access
    // ─────────────────────────────────────────────────────────

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Result of the last finished game, until it is cleared.
    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    /// Seat holding the turn, while a game is in progress.
    pub fn turn(&self) -> Option<Seat> {
        self.turn
    }

    /// Player in `seat`, if occupied.
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.seats[seat.index()].as_ref()
    }

    /// Seat held by connection `id`.
    pub fn seat_of(&self, id: ConnectionId) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.player(*seat).is_some_and(|p| p.id() == id))
    }

    /// Number of occupied seats.
    pub fn seated(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    /// State as sent to clients.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.board.clone(),
            self.status,
            self.turn.map(Seat::mark),
            self.winner,
        )
    }

    // ─────────────────────────────────────────────────────────
    //  Transitions
    // ─────────────────────────────────────────────────────────

    /// Seats a new connection in the first free seat.
    ///
    /// Starts the game when this fills the table.
    #[instrument(skip(self, sink), fields(status = %self.status))]
    pub fn join(
        &mut self,
        id: ConnectionId,
        sink: Box<dyn PlayerSink>,
    ) -> Result<Seat, SessionError> {
        if self.seat_of(id).is_some() {
            warn!(%id, "Connection tried to join twice");
            return Err(SessionError::AlreadySeated { id });
        }

        let Some(seat) = Seat::ALL
            .into_iter()
            .find(|seat| self.player(*seat).is_none())
        else {
            warn!(%id, "Session already has 2 players");
            return Err(SessionError::Full);
        };

        info!(%id, ?seat, mark = %seat.mark(), "Player joined");
        self.seats[seat.index()] = Some(Player::new(id, seat, sink));

        self.notify(seat, WAITING_FOR_OPPONENT);
        if self.seated() == Seat::ALL.len() {
            self.start_game();
        }

        Ok(seat)
    }

    /// Applies a move from connection `id`.
    ///
    /// Rejections leave board, turn and status untouched.
    #[instrument(skip(self), fields(status = %self.status))]
    pub fn apply_move(
        &mut self,
        id: ConnectionId,
        row: usize,
        col: usize,
    ) -> Result<MoveOutcome, SessionError> {
        let result = self.try_move(id, row, col);
        if let Err(e) = &result {
            self.reject(id, e);
        }
        result
    }

    fn try_move(
        &mut self,
        id: ConnectionId,
        row: usize,
        col: usize,
    ) -> Result<MoveOutcome, SessionError> {
        let seat = self.seat_of(id).ok_or(SessionError::NotSeated { id })?;
        let mark = seat.mark();

        if self.status != Status::InProgress {
            return Err(SessionError::NotInProgress {
                status: self.status,
            });
        }
        if self.turn != Some(seat) {
            return Err(SessionError::NotYourTurn { mark });
        }

        self.board
            .place_mark(row, col, mark)
            .map_err(|source| SessionError::InvalidCell { source })?;
        debug!(%id, %mark, row, col, board = %self.board, "Mark placed");

        match self.board.outcome() {
            Some(outcome) => {
                self.finish(outcome);
                Ok(match outcome {
                    Outcome::Won(mark) => MoveOutcome::Won(mark),
                    Outcome::Draw => MoveOutcome::Draw,
                })
            }
            None => {
                let next = seat.other();
                self.turn = Some(next);
                info!(%mark, row, col, next = %next.mark(), "Move accepted");
                self.broadcast(|snapshot, _| ServerEvent::PlayerTurn(snapshot));
                Ok(MoveOutcome::Continue { next: next.mark() })
            }
        }
    }

    /// Removes connection `id` from its seat.
    ///
    /// The board and any result are cleared so the next pairing starts
    /// fresh. Returns the vacated seat, or `None` for an unknown id.
    #[instrument(skip(self), fields(status = %self.status))]
    pub fn disconnect(&mut self, id: ConnectionId) -> Option<Seat> {
        let Some(seat) = self.seat_of(id) else {
            debug!(%id, "Disconnect from connection without a seat");
            return None;
        };

        self.seats[seat.index()] = None;
        self.status = Status::Waiting;
        self.turn = None;
        self.winner = None;
        self.board.reset();
        info!(%id, ?seat, "Player disconnected");

        if self.player(seat.other()).is_some() {
            self.notify(seat.other(), OPPONENT_LEFT);
        }
        Some(seat)
    }

    /// Clears the finished game and starts another with the same seats.
    #[instrument(skip(self), fields(status = %self.status))]
    pub fn play_again(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        let result = self.try_play_again(id);
        if let Err(e) = &result {
            self.reject(id, e);
        }
        result
    }

    fn try_play_again(&mut self, id: ConnectionId) -> Result<(), SessionError> {
        if self.seat_of(id).is_none() {
            return Err(SessionError::NotSeated { id });
        }
        if self.status != Status::Ended {
            return Err(SessionError::NotEnded {
                status: self.status,
            });
        }

        info!(%id, "Play again requested");
        // A departure always drops the session back to waiting, so an ended
        // game still has both seats filled.
        debug_assert_eq!(self.seated(), Seat::ALL.len());
        self.start_game();
        Ok(())
    }

    /// Re-sends the current state to connection `id`.
    #[instrument(skip(self))]
    pub fn resync(&self, id: ConnectionId) -> Result<(), SessionError> {
        let seat = self.seat_of(id).ok_or(SessionError::NotSeated { id })?;
        let message = match self.status {
            Status::Waiting => WAITING_FOR_OPPONENT.to_string(),
            Status::InProgress => format!("Game in progress, you are {}", seat.mark()),
            Status::Ended => format!("Game over, you were {}", seat.mark()),
        };
        self.notify(seat, &message);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────

    fn start_game(&mut self) {
        self.board.reset();
        self.winner = None;
        self.turn = Some(Seat::First);
        self.status = Status::InProgress;
        info!("Game started");
        self.broadcast(|snapshot, seat| ServerEvent::game_started(seat.mark(), snapshot));
    }

    fn finish(&mut self, outcome: Outcome) {
        self.status = Status::Ended;
        self.winner = Some(outcome);
        self.turn = None;
        info!(%outcome, board = %self.board, "Game ended");
        self.broadcast(|snapshot, _| ServerEvent::GameEnded(snapshot));
    }

    fn reject(&self, id: ConnectionId, error: &SessionError) {
        warn!(%id, %error, "Command rejected");
        if self.options.echo_rejections
            && let Some(seat) = self.seat_of(id)
        {
            self.notify(seat, &error.to_string());
        }
    }

    fn notify(&self, seat: Seat, message: &str) {
        if let Some(player) = self.player(seat) {
            player.send(ServerEvent::notification(message, self.snapshot()));
        }
    }

    /// Sends one event per seated player, first seat first.
    fn broadcast(&self, event: impl Fn(Snapshot, Seat) -> ServerEvent) {
        for seat in Seat::ALL {
            if let Some(player) = self.player(seat) {
                player.send(event(self.snapshot(), seat));
            }
        }
    }
}
