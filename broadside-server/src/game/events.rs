//! Game Events
//!
//! Journaled events and the notifications pushed to players.
//!
//! ```text
//! ATTACK_PROCESSED / SHIP_MOVED   journaled, own seq
//! STATE_UPDATED                   room broadcast, seq of the action event
//! GAME_ENDED                      journaled, own seq, room broadcast
//! ACTION_REJECTED                 acting user only, no seq
//! ```

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::rules::{AttackOutcome, MoveOutcome, Rejection};
use crate::game::state::{GameId, GameState, PlayerId};

/// Event discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// An attack was applied
    AttackProcessed,
    /// A ship was repositioned
    ShipMoved,
    /// Public state changed
    StateUpdated,
    /// A winner was decided
    GameEnded,
    /// An action broke a rule
    ActionRejected,
}

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    /// Every ship of the loser is sunk
    AllSunk,
}

/// Event body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Attack applied.
    AttackProcessed {
        /// Client action id.
        action_id: String,
        /// Attacker.
        attacker_id: PlayerId,
        /// What happened.
        outcome: AttackOutcome,
    },

    /// Ship moved.
    ShipMoved {
        /// Client action id.
        action_id: String,
        /// Owner of the ship.
        player_id: PlayerId,
        /// New placement.
        outcome: MoveOutcome,
    },

    /// Public state summary.
    StateUpdated {
        /// Version after the commit.
        state_version: u64,
        /// Turn after the commit.
        turn: u32,
        /// Whose move it is now.
        current_player_id: PlayerId,
    },

    /// Game over.
    GameEnded {
        /// Winner.
        winner_player_id: PlayerId,
        /// Reason.
        reason: EndReason,
    },

    /// Rule violation.
    ActionRejected {
        /// Client action id.
        action_id: String,
        /// Rejection code.
        reason: Rejection,
    },
}

impl EventPayload {
    /// Discriminator for this payload.
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::AttackProcessed { .. } => EventType::AttackProcessed,
            EventPayload::ShipMoved { .. } => EventType::ShipMoved,
            EventPayload::StateUpdated { .. } => EventType::StateUpdated,
            EventPayload::GameEnded { .. } => EventType::GameEnded,
            EventPayload::ActionRejected { .. } => EventType::ActionRejected,
        }
    }

    /// Public summary of a committed state.
    pub fn state_updated(state: &GameState) -> Self {
        EventPayload::StateUpdated {
            state_version: state.state_version,
            turn: state.turn,
            current_player_id: state.current_player_id,
        }
    }
}

/// A journaled event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub event_id: Uuid,
    /// Game.
    pub game_id: GameId,
    /// Per-game sequence number.
    pub event_seq: u64,
    /// Turn of the committed state.
    pub turn: u32,
    /// Discriminator.
    pub event_type: EventType,
    /// Body.
    pub payload: EventPayload,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// New event with a fresh id, stamped now.
    pub fn new(game_id: GameId, event_seq: u64, turn: u32, payload: EventPayload) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            game_id,
            event_seq,
            turn,
            event_type: payload.event_type(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// A message pushed to a room topic or a single user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event id (shared with the journaled event where there is one).
    pub event_id: Uuid,
    /// Sequence number, absent for rejections.
    pub event_seq: Option<u64>,
    /// Game.
    pub game_id: GameId,
    /// Discriminator.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Body.
    pub payload: EventPayload,
}

impl Notification {
    /// `STATE_UPDATED` for `state`, tied to the journaled action event.
    pub fn state_updated(action_event: &Event, state: &GameState) -> Self {
        Self {
            event_id: action_event.event_id,
            event_seq: Some(action_event.event_seq),
            game_id: state.game_id,
            event_type: EventType::StateUpdated,
            payload: EventPayload::state_updated(state),
        }
    }

    /// `ACTION_REJECTED` for the acting user.
    pub fn rejected(game_id: GameId, action_id: impl Into<String>, reason: Rejection) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_seq: None,
            game_id,
            event_type: EventType::ActionRejected,
            payload: EventPayload::ActionRejected {
                action_id: action_id.into(),
                reason,
            },
        }
    }
}

impl From<&Event> for Notification {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.event_id,
            event_seq: Some(event.event_seq),
            game_id: event.game_id,
            event_type: event.event_type,
            payload: event.payload.clone(),
        }
    }
}

/// Room topic name.
pub fn room_topic(room_id: &str) -> String {
    format!("rooms/{}", room_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_ended_event_shape() {
        let winner = PlayerId::new([4; 16]);
        let event = Event::new(
            GameId::new([1; 16]),
            12,
            30,
            EventPayload::GameEnded { winner_player_id: winner, reason: EndReason::AllSunk },
        );
        assert_eq!(event.event_type, EventType::GameEnded);

        let json = serde_json::to_value(Notification::from(&event)).unwrap();
        assert_eq!(json["type"], "GAME_ENDED");
        assert_eq!(json["event_seq"], 12);
        assert_eq!(json["payload"]["reason"], "ALL_SUNK");
    }

    #[test]
    fn test_rejection_notification_has_no_seq() {
        let n = Notification::rejected(GameId::new([1; 16]), "a-9", Rejection::OutOfBounds);
        assert_eq!(n.event_seq, None);
        assert_eq!(n.event_type, EventType::ActionRejected);

        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["payload"]["reason"], "OUT_OF_BOUNDS");
        assert_eq!(json["payload"]["action_id"], "a-9");
    }

    #[test]
    fn test_room_topic() {
        assert_eq!(room_topic("r1"), "rooms/r1");
    }
}
