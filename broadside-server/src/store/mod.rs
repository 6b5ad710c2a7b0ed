//! Storage Layer
//!
//! Abstract collaborators consumed by the engine, plus the two pieces of
//! consistency machinery built on top of them:
//!
//! - [`StateStore`]: cache-first state with durable snapshot fallback
//! - [`ActionGate`]: per-action idempotency keys
//!
//! The `memory` module has in-process implementations of every trait.

pub mod codec;
pub mod gate;
pub mod memory;
pub mod state_store;

pub use codec::StateCodec;
pub use gate::{ActionGate, Admission};
pub use memory::{MemoryCache, MemoryDurableStore, MemoryJournal};
pub use state_store::StateStore;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::error::StoreError;
use crate::game::events::Event;
use crate::game::state::{GameId, GameState, PlayerId};

// =============================================================================
// KEYS
// =============================================================================

/// Hot-cache key of a game's state.
pub fn state_key(game_id: &GameId) -> String {
    format!("game:{}:state", game_id)
}

/// Cache key of a game's event sequence counter.
pub fn event_seq_key(game_id: &GameId) -> String {
    format!("game:{}:eventSeq", game_id)
}

// =============================================================================
// DURABLE RECORDS
// =============================================================================

/// Immutable point-in-time copy of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Game.
    pub game_id: GameId,
    /// Turn the copy was taken at.
    pub turn: u32,
    /// The copy.
    pub state: GameState,
    /// When it was taken.
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Snapshot `state` now.
    pub fn of(state: &GameState) -> Self {
        Self {
            game_id: state.game_id,
            turn: state.turn,
            state: state.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Match status in the durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// In play
    Active,
    /// Winner decided
    Ended,
}

/// Durable match-outcome record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Game.
    pub game_id: GameId,
    /// Room.
    pub room_id: String,
    /// First seat.
    pub first_player_id: PlayerId,
    /// Second seat.
    pub second_player_id: PlayerId,
    /// Status.
    pub status: GameStatus,
    /// Winner once ended.
    pub winner_player_id: Option<PlayerId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// End time.
    pub ended_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    /// ACTIVE record for a freshly created game.
    pub fn started(state: &GameState) -> Self {
        Self {
            game_id: state.game_id,
            room_id: state.room_id.clone(),
            first_player_id: state.players[0].player_id,
            second_player_id: state.players[1].player_id,
            status: GameStatus::Active,
            winner_player_id: None,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Mark the record ENDED with `winner`.
    pub fn finish(&mut self, winner: PlayerId) {
        self.status = GameStatus::Ended;
        self.winner_player_id = Some(winner);
        self.ended_at = Some(Utc::now());
    }
}

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// Fast mutable key-value cache (hot state, idempotency keys, counters).
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value, clearing any expiry.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Write only if absent. Returns true if this call wrote it.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError>;

    /// [`set_if_absent`](Self::set_if_absent) and [`expire`](Self::expire)
    /// as one atomic step (`SET key value NX EX ttl`). A claimed key always
    /// carries its TTL.
    async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, StoreError>;

    /// Atomically add one to a counter (absent counts as 0). Returns the new value.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Expire `key` after `ttl`.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;
}

/// Durable storage for snapshots and match records.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Append a snapshot.
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError>;

    /// Snapshot with the highest turn for `game_id`.
    async fn latest_snapshot(&self, game_id: &GameId) -> Result<Option<Snapshot>, StoreError>;

    /// Insert or replace a match record.
    async fn save_game_record(&self, record: GameRecord) -> Result<(), StoreError>;

    /// Read a match record.
    async fn game_record(&self, game_id: &GameId) -> Result<Option<GameRecord>, StoreError>;
}

/// Append-only event journal.
#[async_trait]
pub trait EventJournal: Send + Sync {
    /// Append an event.
    async fn append(&self, event: Event) -> Result<(), StoreError>;

    /// Events of `game_id` with `event_seq > after_seq`, ascending, at most `limit`.
    async fn events_after(
        &self,
        game_id: &GameId,
        after_seq: u64,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError>;
}
