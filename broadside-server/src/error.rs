//! Error types.
//!
//! Faults only. Rule violations are not errors: they travel as
//! [`Rejection`](crate::game::rules::Rejection) values inside an
//! [`ActionOutcome`](crate::game::rules::ActionOutcome).

use crate::game::placement::PlacementError;
use crate::game::state::{GameId, PlayerId};

/// Collaborator (cache, durable store, journal) errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value has the wrong shape (e.g. a non-numeric counter).
    #[error("invalid stored value for key {key}: {reason}")]
    InvalidValue {
        /// Offending key.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// Encoding state for storage failed.
    #[error("encode error: {0}")]
    Encode(String),
}

/// Broadcaster errors. Always logged and dropped by the core.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// Nobody is listening.
    #[error("no subscribers")]
    NoSubscribers,
}

/// Engine faults: environment or invariant failures that must fail the
/// request loudly.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Storage failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Neither the cache nor any snapshot knows this game.
    #[error("game not found: {0}")]
    NotFound(GameId),

    /// Cached state could not be decoded and no snapshot can replace it.
    #[error("corrupt state for game {game_id}: {reason}")]
    Corrupt {
        /// Game whose state is unreadable.
        game_id: GameId,
        /// Decoder message.
        reason: String,
    },

    /// Fleet placement failed.
    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    /// Player is not seated in this game.
    #[error("player {player_id} is not in game {game_id}")]
    UnknownPlayer {
        /// Game.
        game_id: GameId,
        /// Player.
        player_id: PlayerId,
    },

    /// A game needs two distinct players.
    #[error("a game needs two distinct players, got {0} twice")]
    InvalidPlayers(PlayerId),
}
