//! The 3x3 board.

use super::rules;
use super::types::{Cell, Mark, Outcome};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 3;

/// Why a mark could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum PlaceError {
    /// Coordinates fall outside the grid.
    #[display("cell ({row}, {col}) is out of bounds")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
    /// The cell already holds a mark.
    #[display("cell ({row}, {col}) is already taken")]
    AlreadyOccupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
    },
}

/// 3x3 tic-tac-toe board, addressed by `(row, col)`.
///
/// A marked cell never becomes empty again except through [`Board::reset`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cell at `(row, col)`, or `None` when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Returns a copy of the grid in row-major order.
    pub fn rows(&self) -> [[Cell; BOARD_SIZE]; BOARD_SIZE] {
        self.cells
    }

    /// Places `mark` at `(row, col)` if the cell exists and is empty.
    ///
    /// The board is left untouched on failure.
    #[instrument(skip(self))]
    pub fn place_mark(&mut self, row: usize, col: usize, mark: Mark) -> Result<(), PlaceError> {
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(PlaceError::OutOfBounds { row, col })?;

        if *cell != Cell::Empty {
            return Err(PlaceError::AlreadyOccupied { row, col });
        }

        *cell = Cell::Marked(mark);
        Ok(())
    }

    /// Returns the mark holding three in a row, if any.
    pub fn evaluate_winner(&self) -> Option<Mark> {
        rules::check_winner(self)
    }

    /// True when every cell holds a mark.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// Decides whether the game on this board is over.
    ///
    /// A line wins before a full board is considered a draw.
    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(mark) = self.evaluate_winner() {
            Some(Outcome::Won(mark))
        } else if rules::is_draw(self) {
            Some(Outcome::Draw)
        } else {
            None
        }
    }

    /// Number of marked cells.
    pub fn marked_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell != Cell::Empty)
            .count()
    }

    /// Clears every cell.
    pub fn reset(&mut self) {
        self.cells = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let symbol = match cell {
                    Cell::Empty => ".",
                    Cell::Marked(_) => cell.symbol(),
                };
                write!(f, "{symbol}")?;
                if c < BOARD_SIZE - 1 {
                    write!(f, "|")?;
                }
            }
            if r < BOARD_SIZE - 1 {
                write!(f, "\n-+-+-\n")?;
            }
        }
        Ok(())
    }
}
