//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A mark a player places on the board.
///
/// `X` always belongs to the first seat and moves first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
pub enum Mark {
    /// Mark of the first seat.
    X,
    /// Mark of the second seat.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A single cell of the board.
///
/// On the wire an empty cell is `""` and a marked cell is `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here yet.
    #[default]
    Empty,
    /// Occupied by a mark.
    Marked(Mark),
}

impl Cell {
    /// Returns the mark in this cell, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::Marked(mark) => Some(mark),
        }
    }

    /// Wire symbol for this cell.
    pub fn symbol(self) -> &'static str {
        match self {
            Cell::Empty => "",
            Cell::Marked(Mark::X) => "X",
            Cell::Marked(Mark::O) => "O",
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        match symbol.as_str() {
            "" => Ok(Cell::Empty),
            "X" => Ok(Cell::Marked(Mark::X)),
            "O" => Ok(Cell::Marked(Mark::O)),
            other => Err(serde::de::Error::custom(format!(
                "invalid cell symbol {other:?}"
            ))),
        }
    }
}

/// How a finished game ended.
///
/// Serialized as `"X"`, `"O"` or `"draw"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Outcome {
    /// Three in a row for the given mark.
    #[display("{_0}")]
    Won(Mark),
    /// Board full with no line.
    #[display("draw")]
    Draw,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Won(Mark::X) => serializer.serialize_str("X"),
            Outcome::Won(Mark::O) => serializer.serialize_str("O"),
            Outcome::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "X" => Ok(Outcome::Won(Mark::X)),
            "O" => Ok(Outcome::Won(Mark::O)),
            "draw" => Ok(Outcome::Draw),
            other => Err(serde::de::Error::custom(format!(
                "invalid outcome {other:?}"
            ))),
        }
    }
}
