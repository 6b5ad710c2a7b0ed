//! Event journaling and notification.
//!
//! Runs after a mutation is committed. Every failure in here is logged
//! and swallowed: the mutation is never rolled back or retried.

use std::sync::Arc;

use tracing::warn;

use crate::error::StoreError;
use crate::game::events::{room_topic, EndReason, Event, EventPayload, Notification};
use crate::game::rules::Rejection;
use crate::game::state::{GameId, GameState, PlayerId};
use crate::service::broadcast::Broadcaster;
use crate::store::{event_seq_key, EventJournal, KeyValueCache};

/// Sequences, journals and broadcasts game events.
#[derive(Clone)]
pub struct EventPublisher {
    cache: Arc<dyn KeyValueCache>,
    journal: Arc<dyn EventJournal>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl EventPublisher {
    /// Create a publisher.
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        journal: Arc<dyn EventJournal>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self { cache, journal, broadcaster }
    }

    /// The journal.
    pub fn journal(&self) -> &Arc<dyn EventJournal> {
        &self.journal
    }

    /// Next per-game sequence number.
    pub async fn next_seq(&self, game_id: &GameId) -> Result<u64, StoreError> {
        let key = event_seq_key(game_id);
        let seq = self.cache.increment(&key).await?;
        u64::try_from(seq)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(StoreError::InvalidValue {
                key,
                reason: format!("non-positive sequence {}", seq),
            })
    }

    /// Journal a committed action and tell the room the state changed.
    ///
    /// Returns the journaled event, if sequencing succeeded.
    pub async fn action_committed(&self, state: &GameState, payload: EventPayload) -> Option<Event> {
        let event = self.journal_event(state, payload).await?;

        let notification = Notification::state_updated(&event, state);
        if let Err(e) = self.broadcaster.publish(&room_topic(&state.room_id), notification).await {
            warn!(game = %state.game_id.short(), error = %e, "STATE_UPDATED broadcast failed");
        }
        Some(event)
    }

    /// Journal and broadcast the end of a game.
    pub async fn game_ended(&self, state: &GameState, winner: PlayerId) -> Option<Event> {
        let payload = EventPayload::GameEnded {
            winner_player_id: winner,
            reason: EndReason::AllSunk,
        };
        let event = self.journal_event(state, payload).await?;

        if let Err(e) = self.broadcaster.publish(&room_topic(&state.room_id), Notification::from(&event)).await {
            warn!(game = %state.game_id.short(), error = %e, "GAME_ENDED broadcast failed");
        }
        Some(event)
    }

    /// Tell only the acting user their action was rejected.
    pub async fn rejected(&self, user: &PlayerId, game_id: &GameId, action_id: &str, reason: Rejection) {
        let notification = Notification::rejected(*game_id, action_id, reason);
        if let Err(e) = self.broadcaster.publish_to_user(user, notification).await {
            warn!(game = %game_id.short(), user = %user.short(), error = %e, "ACTION_REJECTED delivery failed");
        }
    }

    async fn journal_event(&self, state: &GameState, payload: EventPayload) -> Option<Event> {
        let seq = match self.next_seq(&state.game_id).await {
            Ok(seq) => seq,
            Err(e) => {
                warn!(game = %state.game_id.short(), error = %e, "Event sequencing failed, event dropped");
                return None;
            }
        };

        let event = Event::new(state.game_id, seq, state.turn, payload);
        if let Err(e) = self.journal.append(event.clone()).await {
            warn!(game = %state.game_id.short(), seq, error = %e, "Journal append failed");
        }
        Some(event)
    }
}
