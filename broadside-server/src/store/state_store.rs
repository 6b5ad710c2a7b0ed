//! Cache-first game state with durable snapshot fallback.
//!
//! The cache is the system of record for live play. Snapshots are written
//! only at creation and every few turns, so losing the cache between two
//! snapshots rewinds the game to the older one.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GameError;
use crate::game::state::{GameId, GameState};
use crate::store::codec::StateCodec;
use crate::store::{state_key, DurableStore, KeyValueCache, Snapshot};

/// Loads and persists [`GameState`].
#[derive(Clone)]
pub struct StateStore {
    cache: Arc<dyn KeyValueCache>,
    durable: Arc<dyn DurableStore>,
    codec: StateCodec,
}

impl StateStore {
    /// Create a store over the given collaborators.
    pub fn new(cache: Arc<dyn KeyValueCache>, durable: Arc<dyn DurableStore>, codec: StateCodec) -> Self {
        Self { cache, durable, codec }
    }

    /// The hot cache.
    pub fn cache(&self) -> &Arc<dyn KeyValueCache> {
        &self.cache
    }

    /// The durable store.
    pub fn durable(&self) -> &Arc<dyn DurableStore> {
        &self.durable
    }

    /// Load a game: cache first, then the latest snapshot.
    pub async fn load(&self, game_id: &GameId) -> Result<GameState, GameError> {
        let key = state_key(game_id);
        let mut corrupt = None;

        if let Some(bytes) = self.cache.get(&key).await? {
            match self.codec.decode(&bytes) {
                Ok(state) => return Ok(state),
                Err(reason) => {
                    warn!(game = %game_id.short(), %reason, "Cached state is corrupt, falling back to snapshot");
                    corrupt = Some(reason);
                }
            }
        }

        match self.durable.latest_snapshot(game_id).await? {
            Some(snapshot) => {
                warn!(
                    game = %game_id.short(),
                    turn = snapshot.turn,
                    "Recovered game from snapshot"
                );
                Ok(snapshot.state)
            }
            None => match corrupt {
                Some(reason) => Err(GameError::Corrupt { game_id: *game_id, reason }),
                None => Err(GameError::NotFound(*game_id)),
            },
        }
    }

    /// Write the full state to the cache.
    pub async fn save(&self, state: &GameState) -> Result<(), GameError> {
        let bytes = self.codec.encode(state)?;

        #[cfg(feature = "debug-tracing")]
        debug!(game = %state.game_id.short(), bytes = bytes.len(), codec = ?self.codec, "Encoded state");

        self.cache.set(&state_key(&state.game_id), bytes).await?;
        debug!(
            game = %state.game_id.short(),
            turn = state.turn,
            version = state.state_version,
            "Saved state"
        );
        Ok(())
    }

    /// Write an immutable copy to the durable store.
    pub async fn snapshot(&self, state: &GameState) -> Result<(), GameError> {
        self.durable.save_snapshot(Snapshot::of(state)).await?;
        debug!(game = %state.game_id.short(), turn = state.turn, "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::game::state::{Board, PlayerId, PlayerState};
    use crate::store::memory::{MemoryCache, MemoryDurableStore};

    fn state(turn: u32) -> GameState {
        let mut s = GameState::new(
            GameId::new([8; 16]),
            "r",
            PlayerState::new(PlayerId::new([1; 16]), Board::default()),
            PlayerState::new(PlayerId::new([2; 16]), Board::default()),
        );
        s.turn = turn;
        s
    }

    fn store(codec: StateCodec) -> (StateStore, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        let store = StateStore::new(cache.clone(), Arc::new(MemoryDurableStore::new()), codec);
        (store, cache)
    }

    #[tokio::test]
    async fn test_cache_hit() {
        for codec in [StateCodec::Json, StateCodec::Bincode] {
            let (store, _) = store(codec);
            store.save(&state(3)).await.unwrap();
            assert_eq!(store.load(&GameId::new([8; 16])).await.unwrap().turn, 3);
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_latest_snapshot() {
        let (store, cache) = store(StateCodec::Json);
        store.snapshot(&state(1)).await.unwrap();
        store.snapshot(&state(5)).await.unwrap();
        store.save(&state(7)).await.unwrap();

        cache.clear().await;
        assert_eq!(store.load(&GameId::new([8; 16])).await.unwrap().turn, 5);
    }

    #[tokio::test]
    async fn test_corrupt_cache_falls_back() {
        let (store, cache) = store(StateCodec::Json);
        store.snapshot(&state(1)).await.unwrap();
        cache.set(&state_key(&GameId::new([8; 16])), b"garbage".to_vec()).await.unwrap();

        assert_eq!(store.load(&GameId::new([8; 16])).await.unwrap().turn, 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_without_snapshot_is_a_fault() {
        let (store, cache) = store(StateCodec::Bincode);
        cache.set(&state_key(&GameId::new([8; 16])), vec![0xff; 3]).await.unwrap();

        let err = store.load(&GameId::new([8; 16])).await.unwrap_err();
        assert!(matches!(err, GameError::Corrupt { game_id, .. } if game_id == GameId::new([8; 16])));
    }

    #[tokio::test]
    async fn test_not_found() {
        let (store, _) = store(StateCodec::Json);
        let err = store.load(&GameId::new([8; 16])).await.unwrap_err();
        assert!(matches!(err, GameError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unreachable_cache_is_a_fault() {
        let (store, cache) = store(StateCodec::Json);
        store.snapshot(&state(1)).await.unwrap();
        cache.set_unavailable(true);

        let err = store.load(&GameId::new([8; 16])).await.unwrap_err();
        assert!(matches!(err, GameError::Store(StoreError::Unavailable(_))));
    }
}
