//! Board Coordinates
//!
//! A cell on the 10×10 grid. Inbound coordinates come straight from
//! clients, so they are signed and may lie off the board; validation
//! turns those into `OUT_OF_BOUNDS` rejections rather than faults.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::BOARD_SIZE;

/// A `(row, col)` cell. Equality by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Row (0 = top)
    pub row: i32,
    /// Column (0 = left)
    pub col: i32,
}

impl Coord {
    /// Create a coordinate.
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Is this cell inside the board?
    #[inline]
    pub fn is_on_board(self) -> bool {
        self.is_within(BOARD_SIZE)
    }

    /// Is this cell inside a square board of the given size?
    #[inline]
    pub fn is_within(self, size: i32) -> bool {
        (0..size).contains(&self.row) && (0..size).contains(&self.col)
    }

    /// Cell `offset` steps away along a row (horizontal) or column.
    #[inline]
    pub fn step(self, offset: i32, horizontal: bool) -> Self {
        if horizontal {
            Self::new(self.row, self.col.saturating_add(offset))
        } else {
            Self::new(self.row.saturating_add(offset), self.col)
        }
    }

    /// The `length` consecutive cells starting at `self`.
    pub fn run(self, length: usize, horizontal: bool) -> Vec<Coord> {
        (0..length as i32).map(|i| self.step(i, horizontal)).collect()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
