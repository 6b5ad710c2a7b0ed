//! Action Idempotency Gate
//!
//! First submission of `(game, kind, action_id)` is admitted; repeats
//! within the TTL are reported as duplicates. The key deliberately
//! leaves out the player id.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::StoreError;
use crate::game::action::ActionKind;
use crate::game::state::GameId;
use crate::store::KeyValueCache;

/// Gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First time seen: process exactly once.
    Accepted,
    /// Seen before: do not process, return current state.
    Duplicate,
}

/// Idempotency key of an action.
pub fn action_key(game_id: &GameId, kind: ActionKind, action_id: &str) -> String {
    format!("{}:{}:{}", kind, game_id, action_id)
}

/// Duplicate suppression over a [`KeyValueCache`].
#[derive(Clone)]
pub struct ActionGate {
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl ActionGate {
    /// Gate whose keys live for `ttl`.
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Claim the action key.
    pub async fn admit(&self, game_id: &GameId, kind: ActionKind, action_id: &str) -> Result<Admission, StoreError> {
        let key = action_key(game_id, kind, action_id);

        if !self.cache.set_if_absent_with_ttl(&key, b"1".to_vec(), self.ttl).await? {
            debug!(game = %game_id.short(), %kind, action_id, "Duplicate action");
            return Ok(Admission::Duplicate);
        }
        Ok(Admission::Accepted)
    }
}
