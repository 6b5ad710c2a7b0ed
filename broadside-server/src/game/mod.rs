//! Game Logic Module
//!
//! Pure, deterministic game code. Nothing in here touches storage, the
//! clock (except event timestamps) or the network.
//!
//! ## Module Structure
//!
//! - `state`: Game state, boards, ships, identifiers
//! - `action`: Inbound attack and move payloads
//! - `placement`: Random fleet layout
//! - `rules`: Validation and transitions
//! - `view`: Fog-of-war projection
//! - `events`: Journal events and notifications

pub mod state;
pub mod action;
pub mod placement;
pub mod rules;
pub mod view;
pub mod events;

// Re-export key types
pub use state::{GameId, GamePhase, GameState, PlayerId, Seat, Ship, ShipId, ShipKind};
pub use action::{ActionKind, AttackAction, ShipMoveAction};
pub use placement::{FleetPlacer, PlacementError};
pub use rules::{ActionOutcome, AttackOutcome, MoveOutcome, Rejection, SunkShip};
pub use view::PlayerView;
pub use events::{Event, EventPayload, EventType, Notification};
