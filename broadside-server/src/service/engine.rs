//! Game Engine
//!
//! Load, apply, persist. The engine owns the state machine
//! `ACTIVE -> ENDED` and the snapshot cadence; it does not serialize
//! callers (see [`GameLocks`](crate::service::locks::GameLocks)) and does
//! not journal or notify.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::rng::{derive_game_seed, DeterministicRng};
use crate::error::GameError;
use crate::game::action::{AttackAction, ShipMoveAction};
use crate::game::placement::FleetPlacer;
use crate::game::rules::{self, ActionOutcome, AttackOutcome, MoveOutcome};
use crate::game::state::{Board, GameId, GameState, PlayerId, PlayerState};
use crate::store::{GameRecord, StateStore};

/// An applied outcome together with the state it was committed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// What the action did.
    pub outcome: T,
    /// State after the commit.
    pub state: GameState,
}

/// Authoritative state machine over a [`StateStore`].
#[derive(Clone)]
pub struct GameEngine {
    store: StateStore,
    placer: FleetPlacer,
    snapshot_interval: u32,
}

impl GameEngine {
    /// Create an engine.
    pub fn new(store: StateStore, config: &EngineConfig) -> Self {
        Self {
            store,
            placer: FleetPlacer::with_attempts(config.placement_attempts),
            snapshot_interval: config.snapshot_interval.max(1),
        }
    }

    /// Underlying store.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Create a game with freshly placed fleets.
    ///
    /// Without an explicit seed the layout seed mixes fresh random bytes
    /// into the game and player ids, so nothing a player can see fixes it.
    /// Explicit seeds are for tests and replays.
    #[instrument(skip(self, room_id), fields(game = %game_id.short()))]
    pub async fn create_game(
        &self,
        game_id: GameId,
        room_id: &str,
        first: PlayerId,
        second: PlayerId,
        seed: Option<u64>,
    ) -> Result<GameState, GameError> {
        if first == second {
            return Err(GameError::InvalidPlayers(first));
        }

        let seed = seed.unwrap_or_else(|| {
            let entropy = Uuid::new_v4().into_bytes();
            derive_game_seed(&entropy, game_id.as_bytes(), &[*first.as_bytes(), *second.as_bytes()])
        });
        let mut rng = DeterministicRng::new(seed);
        let first_board = Board::with_ships(self.placer.place_fleet(&mut rng)?);
        let second_board = Board::with_ships(self.placer.place_fleet(&mut rng)?);

        let state = GameState::new(
            game_id,
            room_id,
            PlayerState::new(first, first_board),
            PlayerState::new(second, second_board),
        );

        self.store.save(&state).await?;
        self.store.snapshot(&state).await?;
        self.store.durable().save_game_record(GameRecord::started(&state)).await?;

        info!(room = room_id, first = %first.short(), second = %second.short(), "Game created");
        debug!(seed, "Fleet seed");
        Ok(state)
    }

    /// Load current state.
    pub async fn load(&self, game_id: &GameId) -> Result<GameState, GameError> {
        self.store.load(game_id).await
    }

    /// Validate and apply an attack, then persist it.
    #[instrument(skip(self, action), fields(game = %game_id.short(), attacker = %attacker.short(), turn = action.turn_number))]
    pub async fn attack(
        &self,
        game_id: &GameId,
        attacker: &PlayerId,
        action: &AttackAction,
    ) -> Result<ActionOutcome<Committed<AttackOutcome>>, GameError> {
        let mut state = self.store.load(game_id).await?;

        let outcome = match rules::attack(&mut state, attacker, action) {
            ActionOutcome::Applied(outcome) => outcome,
            ActionOutcome::Rejected(reason) => {
                debug!(reason = reason.code(), "Attack rejected");
                return Ok(ActionOutcome::Rejected(reason));
            }
        };

        state.state_version += 1;
        self.store.save(&state).await?;
        debug!(
            target_cell = %outcome.target,
            hit = outcome.is_hit,
            sunk = outcome.sunk_ship.is_some(),
            version = state.state_version,
            "Attack committed"
        );

        if let Some(winner) = outcome.winner {
            info!(winner = %winner.short(), turn = state.turn, "Game ended");
            self.record_winner(&state, winner).await?;
        }

        Ok(ActionOutcome::Applied(Committed { outcome, state }))
    }

    /// Validate and apply a ship move, then persist it.
    #[instrument(skip(self, action), fields(game = %game_id.short(), player = %player.short(), turn = action.turn_number))]
    pub async fn move_ship(
        &self,
        game_id: &GameId,
        player: &PlayerId,
        action: &ShipMoveAction,
    ) -> Result<ActionOutcome<Committed<MoveOutcome>>, GameError> {
        let mut state = self.store.load(game_id).await?;

        let outcome = match rules::move_ship(&mut state, player, action) {
            ActionOutcome::Applied(outcome) => outcome,
            ActionOutcome::Rejected(reason) => {
                debug!(reason = reason.code(), "Move rejected");
                return Ok(ActionOutcome::Rejected(reason));
            }
        };

        state.state_version += 1;
        self.store.save(&state).await?;
        debug!(ship = %outcome.ship_id, version = state.state_version, "Move committed");

        Ok(ActionOutcome::Applied(Committed { outcome, state }))
    }

    /// Hand the turn to the other player and persist.
    ///
    /// No-op on an ended game. Snapshots every `snapshot_interval` turns.
    pub async fn switch_turn(&self, state: &mut GameState) -> Result<(), GameError> {
        if state.is_ended() {
            return Ok(());
        }

        rules::advance_turn(state);
        self.store.save(state).await?;

        if state.turn % self.snapshot_interval == 0 {
            self.store.snapshot(state).await?;
        }

        debug!(
            game = %state.game_id.short(),
            turn = state.turn,
            next = %state.current_player_id.short(),
            "Turn switched"
        );
        Ok(())
    }

    async fn record_winner(&self, state: &GameState, winner: PlayerId) -> Result<(), GameError> {
        let durable = self.store.durable();
        let mut record = match durable.game_record(&state.game_id).await? {
            Some(record) => record,
            None => {
                warn!(game = %state.game_id.short(), "No game record, creating one at game end");
                GameRecord::started(state)
            }
        };
        record.finish(winner);
        durable.save_game_record(record).await?;
        Ok(())
    }
}
