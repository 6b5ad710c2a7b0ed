//! Player Actions
//!
//! Inbound action payloads. Each carries a client-chosen `action_id`
//! used for idempotency and the turn number the client believes is
//! current.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::coord::Coord;
use crate::game::state::ShipId;

/// Kind of action, part of the idempotency key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Fire at a cell
    Attack,
    /// Reposition one of your ships
    Move,
}

impl ActionKind {
    /// Key segment.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Move => "move",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire at a cell of the opponent's board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackAction {
    /// Client-chosen idempotency token.
    pub action_id: String,
    /// Turn the client is acting in.
    pub turn_number: u32,
    /// Target cell.
    pub target: Coord,
}

/// Move one of your own active ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipMoveAction {
    /// Client-chosen idempotency token.
    pub action_id: String,
    /// Turn the client is acting in.
    pub turn_number: u32,
    /// Ship to move.
    pub ship_id: ShipId,
    /// New bow position.
    pub new_origin: Coord,
    /// Orientation at the new position.
    pub is_horizontal: bool,
}

impl AttackAction {
    /// Create an attack action.
    pub fn new(action_id: impl Into<String>, turn_number: u32, target: Coord) -> Self {
        Self {
            action_id: action_id.into(),
            turn_number,
            target,
        }
    }
}

impl ShipMoveAction {
    /// Create a move action.
    pub fn new(
        action_id: impl Into<String>,
        turn_number: u32,
        ship_id: ShipId,
        new_origin: Coord,
        is_horizontal: bool,
    ) -> Self {
        Self {
            action_id: action_id.into(),
            turn_number,
            ship_id,
            new_origin,
            is_horizontal,
        }
    }
}
