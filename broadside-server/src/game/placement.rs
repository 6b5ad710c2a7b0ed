//! Fleet Placement
//!
//! Random, collision-free layout of the starting fleet. Each ship gets a
//! bounded number of attempts; running out is a reported error instead
//! of a silent spin.

use thiserror::Error;

use crate::core::coord::Coord;
use crate::core::rng::DeterministicRng;
use crate::game::state::{Ship, ShipId, ShipKind};
use crate::{BOARD_SIZE, PLACEMENT_ATTEMPTS};

/// Placement failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// No free spot found within the attempt budget.
    #[error("failed to place {kind:?} after {attempts} attempts")]
    AttemptsExhausted {
        /// Ship that could not be placed.
        kind: ShipKind,
        /// Attempts spent.
        attempts: u32,
    },

    /// Ship cannot fit on the board at all.
    #[error("{kind:?} (length {length}) does not fit a {board_size}x{board_size} board")]
    DoesNotFit {
        /// Ship kind.
        kind: ShipKind,
        /// Its length.
        length: usize,
        /// Board edge.
        board_size: i32,
    },
}

/// Random fleet layout.
#[derive(Debug, Clone, Copy)]
pub struct FleetPlacer {
    /// Board edge length.
    pub board_size: i32,
    /// Attempts allowed per ship.
    pub max_attempts: u32,
}

impl Default for FleetPlacer {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            max_attempts: PLACEMENT_ATTEMPTS,
        }
    }
}

impl FleetPlacer {
    /// Placer for the standard board with a custom attempt budget.
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Place the standard five-ship fleet.
    pub fn place_fleet(&self, rng: &mut DeterministicRng) -> Result<Vec<Ship>, PlacementError> {
        self.place(&ShipKind::FLEET, rng)
    }

    /// Place `kinds` in order on an empty board.
    pub fn place(&self, kinds: &[ShipKind], rng: &mut DeterministicRng) -> Result<Vec<Ship>, PlacementError> {
        let size = self.board_size.max(0) as usize;
        let mut occupied = vec![false; size * size];
        let mut ships = Vec::with_capacity(kinds.len());

        for &kind in kinds {
            let cells = self.place_one(kind, &occupied, rng)?;
            for cell in &cells {
                occupied[cell.row as usize * size + cell.col as usize] = true;
            }
            ships.push(Ship::new(ShipId(rng.next_bytes16()), kind, cells));
        }

        Ok(ships)
    }

    /// Sample positions for one ship until one is free.
    fn place_one(
        &self,
        kind: ShipKind,
        occupied: &[bool],
        rng: &mut DeterministicRng,
    ) -> Result<Vec<Coord>, PlacementError> {
        let length = kind.length();
        let size = self.board_size;
        if length as i32 > size || size <= 0 {
            return Err(PlacementError::DoesNotFit { kind, length, board_size: size });
        }

        // Origins that keep the whole ship on the board
        let span = (size - length as i32 + 1) as u32;
        let full = size as u32;

        for _ in 0..self.max_attempts {
            let horizontal = rng.next_bool();
            let (row, col) = if horizontal {
                (rng.next_int(full), rng.next_int(span))
            } else {
                (rng.next_int(span), rng.next_int(full))
            };

            let cells = Coord::new(row as i32, col as i32).run(length, horizontal);
            let free = cells
                .iter()
                .all(|c| !occupied[c.row as usize * size as usize + c.col as usize]);
            if free {
                return Ok(cells);
            }
        }

        Err(PlacementError::AttemptsExhausted { kind, attempts: self.max_attempts })
    }
}
