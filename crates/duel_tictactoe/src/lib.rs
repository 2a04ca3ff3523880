//! Pure tic-tac-toe game data for the duel server.
//!
//! This crate holds the board, the marks players place on it, and the
//! rules that decide when a game is over. It performs no I/O and knows
//! nothing about players, connections or sessions.
//!
//! # Example
//!
//! ```
//! use duel_tictactoe::{Board, Mark, Outcome};
//!
//! let mut board = Board::new();
//! board.place_mark(0, 0, Mark::X).unwrap();
//! board.place_mark(0, 1, Mark::X).unwrap();
//! board.place_mark(0, 2, Mark::X).unwrap();
//! assert_eq!(board.evaluate_winner(), Some(Mark::X));
//! assert_eq!(board.outcome(), Some(Outcome::Won(Mark::X)));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
pub mod rules;
mod types;

pub use board::{BOARD_SIZE, Board, PlaceError};
pub use types::{Cell, Mark, Outcome};
