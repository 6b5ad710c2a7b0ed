//! In-memory collaborators.
//!
//! Used by tests and the demo binary. Each behaves like its production
//! counterpart as far as the engine can observe: the cache expires keys,
//! the durable store keeps every snapshot, the journal orders by seq.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::game::events::Event;
use crate::game::state::GameId;
use crate::store::{DurableStore, EventJournal, GameRecord, KeyValueCache, Snapshot};

// =============================================================================
// CACHE
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Key-value cache with lazy TTL expiry.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every key, as if the cache node was lost.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Make every call fail with `Unavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory cache offline".into()));
        }
        Ok(())
    }

    /// Look up a live entry, evicting it if expired.
    fn live<'a>(entries: &'a mut BTreeMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    async fn claim(&self, key: &str, entry: Entry) -> Result<bool, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        if Self::live(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_string(), entry);
        Ok(true)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        Ok(Self::live(&mut entries, key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.check()?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), Entry { value, expires_at: None });
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> Result<bool, StoreError> {
        self.claim(key, Entry { value, expires_at: None }).await
    }

    async fn set_if_absent_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, StoreError> {
        self.claim(key, Entry { value, expires_at: Some(Instant::now() + ttl) }).await
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        let current = match Self::live(&mut entries, key) {
            Some(entry) => std::str::from_utf8(&entry.value)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| StoreError::InvalidValue {
                    key: key.to_string(),
                    reason: "not an integer".into(),
                })?,
            None => 0,
        };

        let next = current + 1;
        let expires_at = Self::live(&mut entries, key).and_then(|e| e.expires_at);
        entries.insert(
            key.to_string(),
            Entry { value: next.to_string().into_bytes(), expires_at },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        self.check()?;
        let mut entries = self.entries.lock().await;
        if let Some(entry) = Self::live(&mut entries, key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

// =============================================================================
// DURABLE STORE
// =============================================================================

/// Snapshot and record store.
#[derive(Debug, Default)]
pub struct MemoryDurableStore {
    snapshots: RwLock<BTreeMap<GameId, Vec<Snapshot>>>,
    records: RwLock<BTreeMap<GameId, GameRecord>>,
}

impl MemoryDurableStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns of every snapshot kept for a game, in write order.
    pub async fn snapshot_turns(&self, game_id: &GameId) -> Vec<u32> {
        self.snapshots
            .read()
            .await
            .get(game_id)
            .map(|list| list.iter().map(|s| s.turn).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DurableStore for MemoryDurableStore {
    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<(), StoreError> {
        self.snapshots
            .write()
            .await
            .entry(snapshot.game_id)
            .or_default()
            .push(snapshot);
        Ok(())
    }

    async fn latest_snapshot(&self, game_id: &GameId) -> Result<Option<Snapshot>, StoreError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(game_id)
            .and_then(|list| list.iter().max_by_key(|s| (s.turn, s.created_at)))
            .cloned())
    }

    async fn save_game_record(&self, record: GameRecord) -> Result<(), StoreError> {
        self.records.write().await.insert(record.game_id, record);
        Ok(())
    }

    async fn game_record(&self, game_id: &GameId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.records.read().await.get(game_id).cloned())
    }
}

// =============================================================================
// JOURNAL
// =============================================================================

/// Event journal keyed by game, ordered by seq.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    events: RwLock<BTreeMap<GameId, BTreeMap<u64, Event>>>,
}

impl MemoryJournal {
    /// Empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event of a game, ascending.
    pub async fn all(&self, game_id: &GameId) -> Vec<Event> {
        self.events
            .read()
            .await
            .get(game_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventJournal for MemoryJournal {
    async fn append(&self, event: Event) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let per_game = events.entry(event.game_id).or_default();
        if per_game.contains_key(&event.event_seq) {
            return Err(StoreError::InvalidValue {
                key: format!("{}#{}", event.game_id, event.event_seq),
                reason: "duplicate event sequence".into(),
            });
        }
        per_game.insert(event.event_seq, event);
        Ok(())
    }

    async fn events_after(
        &self,
        game_id: &GameId,
        after_seq: u64,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        Ok(events
            .get(game_id)
            .map(|m| {
                m.range(after_seq.saturating_add(1)..)
                    .take(limit)
                    .map(|(_, e)| e.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
