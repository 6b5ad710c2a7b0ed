//! Game Service
//!
//! Orchestrates one inbound action end to end:
//!
//! ```text
//! gate.admit ──Duplicate──▶ load + project (no lock)
//!     │
//!  Accepted
//!     ▼
//! locks.acquire(game) ─▶ engine.attack / move_ship ─▶ engine.switch_turn
//!     ─▶ publisher (journal + STATE_UPDATED [+ GAME_ENDED]) ─▶ project
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::config::EngineConfig;
use crate::error::GameError;
use crate::game::action::{ActionKind, AttackAction, ShipMoveAction};
use crate::game::events::{Event, EventPayload};
use crate::game::rules::{ActionOutcome, AttackOutcome, MoveOutcome, Rejection};
use crate::game::state::{GameId, GameState, PlayerId};
use crate::game::view::{project, PlayerView};
use crate::service::broadcast::{Broadcaster, ChannelBroadcaster};
use crate::service::engine::{Committed, GameEngine};
use crate::service::locks::GameLocks;
use crate::service::publisher::EventPublisher;
use crate::store::memory::{MemoryCache, MemoryDurableStore, MemoryJournal};
use crate::store::{ActionGate, Admission, DurableStore, EventJournal, KeyValueCache, StateStore};

/// Response to a submitted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionResponse<T> {
    /// Applied; the actor's view after the commit.
    Applied {
        /// Outcome.
        outcome: T,
        /// Actor's view.
        view: PlayerView,
    },
    /// Rule violation, nothing changed.
    Rejected {
        /// Code.
        reason: Rejection,
    },
    /// Already processed; the actor's current view.
    Duplicate {
        /// Actor's view.
        view: PlayerView,
    },
}

impl<T> ActionResponse<T> {
    /// Rejection code, if rejected.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            ActionResponse::Rejected { reason } => Some(*reason),
            _ => None,
        }
    }

    /// View carried by the response, if any.
    pub fn view(&self) -> Option<&PlayerView> {
        match self {
            ActionResponse::Applied { view, .. } | ActionResponse::Duplicate { view } => Some(view),
            ActionResponse::Rejected { .. } => None,
        }
    }
}

/// Handles to the in-memory collaborators behind [`GameService::in_memory`].
#[derive(Clone)]
pub struct MemoryBackends {
    /// Hot cache.
    pub cache: Arc<MemoryCache>,
    /// Snapshots and records.
    pub durable: Arc<MemoryDurableStore>,
    /// Event journal.
    pub journal: Arc<MemoryJournal>,
    /// Notification channel.
    pub broadcaster: Arc<ChannelBroadcaster>,
}

/// Gate, lock, engine, journal, view.
#[derive(Clone)]
pub struct GameService {
    engine: GameEngine,
    gate: ActionGate,
    locks: Arc<GameLocks>,
    publisher: EventPublisher,
}

impl GameService {
    /// Wire a service over the given collaborators.
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        durable: Arc<dyn DurableStore>,
        journal: Arc<dyn EventJournal>,
        broadcaster: Arc<dyn Broadcaster>,
        config: &EngineConfig,
    ) -> Self {
        let store = StateStore::new(cache.clone(), durable, config.state_codec);
        Self {
            engine: GameEngine::new(store, config),
            gate: ActionGate::new(cache.clone(), config.action_ttl),
            locks: Arc::new(GameLocks::new()),
            publisher: EventPublisher::new(cache, journal, broadcaster),
        }
    }

    /// Service over fresh in-memory collaborators.
    pub fn in_memory(config: &EngineConfig) -> (Self, MemoryBackends) {
        let backends = MemoryBackends {
            cache: Arc::new(MemoryCache::new()),
            durable: Arc::new(MemoryDurableStore::new()),
            journal: Arc::new(MemoryJournal::new()),
            broadcaster: Arc::new(ChannelBroadcaster::new(config.event_channel_capacity)),
        };
        let service = Self::new(
            backends.cache.clone(),
            backends.durable.clone(),
            backends.journal.clone(),
            backends.broadcaster.clone(),
            config,
        );
        (service, backends)
    }

    /// The engine.
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Start a new game in `room_id` with a random id.
    pub async fn create_game(&self, room_id: &str, first: PlayerId, second: PlayerId) -> Result<GameState, GameError> {
        self.engine.create_game(GameId::random(), room_id, first, second, None).await
    }

    /// Start a game with a caller-chosen id and optional layout seed.
    pub async fn create_game_with(
        &self,
        game_id: GameId,
        room_id: &str,
        first: PlayerId,
        second: PlayerId,
        seed: Option<u64>,
    ) -> Result<GameState, GameError> {
        self.engine.create_game(game_id, room_id, first, second, seed).await
    }

    /// Current view of a game for `viewer`. Takes no lock.
    pub async fn view(&self, game_id: &GameId, viewer: &PlayerId) -> Result<PlayerView, GameError> {
        let state = self.engine.load(game_id).await?;
        project(&state, viewer)
    }

    /// Journaled events after `after_seq`, for catch-up.
    pub async fn events_after(&self, game_id: &GameId, after_seq: u64, limit: usize) -> Result<Vec<Event>, GameError> {
        Ok(self.publisher.journal().events_after(game_id, after_seq, limit).await?)
    }

    /// Submit an attack.
    #[instrument(skip(self, action), fields(game = %game_id.short(), action_id = %action.action_id))]
    pub async fn submit_attack(
        &self,
        game_id: &GameId,
        attacker: &PlayerId,
        action: &AttackAction,
    ) -> Result<ActionResponse<AttackOutcome>, GameError> {
        if self.gate.admit(game_id, ActionKind::Attack, &action.action_id).await? == Admission::Duplicate {
            return Ok(ActionResponse::Duplicate { view: self.view(game_id, attacker).await? });
        }

        let _guard = self.locks.acquire(game_id).await;

        let Committed { outcome, mut state } = match self.engine.attack(game_id, attacker, action).await? {
            ActionOutcome::Applied(committed) => committed,
            ActionOutcome::Rejected(reason) => {
                self.publisher.rejected(attacker, game_id, &action.action_id, reason).await;
                return Ok(ActionResponse::Rejected { reason });
            }
        };

        self.engine.switch_turn(&mut state).await?;

        let payload = EventPayload::AttackProcessed {
            action_id: action.action_id.clone(),
            attacker_id: *attacker,
            outcome: outcome.clone(),
        };
        self.publisher.action_committed(&state, payload).await;

        if let Some(winner) = outcome.winner {
            self.publisher.game_ended(&state, winner).await;
            self.locks.forget(game_id).await;
            let open_games = self.locks.len().await;
            info!(winner = %winner.short(), open_games = open_games, "Match over");
        }

        let view = project(&state, attacker)?;
        Ok(ActionResponse::Applied { outcome, view })
    }

    /// Submit a ship move.
    #[instrument(skip(self, action), fields(game = %game_id.short(), action_id = %action.action_id))]
    pub async fn submit_move(
        &self,
        game_id: &GameId,
        player: &PlayerId,
        action: &ShipMoveAction,
    ) -> Result<ActionResponse<MoveOutcome>, GameError> {
        if self.gate.admit(game_id, ActionKind::Move, &action.action_id).await? == Admission::Duplicate {
            return Ok(ActionResponse::Duplicate { view: self.view(game_id, player).await? });
        }

        let _guard = self.locks.acquire(game_id).await;

        let Committed { outcome, mut state } = match self.engine.move_ship(game_id, player, action).await? {
            ActionOutcome::Applied(committed) => committed,
            ActionOutcome::Rejected(reason) => {
                self.publisher.rejected(player, game_id, &action.action_id, reason).await;
                return Ok(ActionResponse::Rejected { reason });
            }
        };

        self.engine.switch_turn(&mut state).await?;

        let payload = EventPayload::ShipMoved {
            action_id: action.action_id.clone(),
            player_id: *player,
            outcome: outcome.clone(),
        };
        self.publisher.action_committed(&state, payload).await;

        let view = project(&state, player)?;
        Ok(ActionResponse::Applied { outcome, view })
    }
}
