//! Per-game single-writer sections.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::game::state::GameId;

/// One async mutex per game. Unrelated games never contend.
#[derive(Debug, Default)]
pub struct GameLocks {
    locks: Mutex<BTreeMap<GameId, Arc<Mutex<()>>>>,
}

impl GameLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `game_id`. Held until the guard drops.
    pub async fn acquire(&self, game_id: &GameId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(*game_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop the entry of a finished game.
    ///
    /// Only valid once the game has ended: later actions on it are
    /// read-only rejections.
    pub async fn forget(&self, game_id: &GameId) {
        self.locks.lock().await.remove(game_id);
    }

    /// Number of games with a lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_game_is_exclusive() {
        let locks = Arc::new(GameLocks::new());
        let game = GameId::new([1; 16]);

        let guard = locks.acquire(&game).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&game).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_games_do_not_block() {
        let locks = GameLocks::new();
        let _a = locks.acquire(&GameId::new([1; 16])).await;
        let _b = locks.acquire(&GameId::new([2; 16])).await;
        assert_eq!(locks.len().await, 2);

        locks.forget(&GameId::new([1; 16])).await;
        assert_eq!(locks.len().await, 1);
    }
}
