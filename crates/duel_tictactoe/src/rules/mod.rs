//! Game rules for tic-tac-toe.
//!
//! Pure functions that evaluate a board. They are kept apart from board
//! storage so the session layer and tests can call them directly.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};
