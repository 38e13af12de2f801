//! Session storage: the collaborator contract and a moka-backed cache.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use imposter_game::Session;
use imposter_protocol::GameId;
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::ops::compute::{CompResult, Op};
use moka::policy::EvictionPolicy;
use tokio::sync::{Mutex, mpsc};

use crate::DirectoryConfig;

/// moka rejects idle windows longer than 1000 years.
const MAX_RETENTION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// A keyed store of sessions with its own expiry policy.
///
/// Reads return copies. A mutation on a copy is invisible to other
/// readers until it is written back; there is no write-through.
///
/// Implementations are shared by reference and must synchronize
/// internally. Per-game ordering is the [`Directory`](crate::Directory)'s
/// job, not the store's.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns a copy of the live session, if any. Counts as an access.
    fn get(&self, id: &GameId) -> impl Future<Output = Option<Session>> + Send;

    /// Returns `true` if a live session is stored under `id`. Does not
    /// count as an access.
    fn contains(&self, id: &GameId) -> bool;

    /// Inserts or replaces the session under `id`.
    fn insert(&self, id: GameId, session: Session) -> impl Future<Output = ()> + Send;

    /// Stores `session` only if nothing live is stored under `id`.
    ///
    /// Returns `true` if this call inserted it. The check and the insert
    /// are one atomic step.
    fn insert_new(
        &self,
        id: GameId,
        session: Session,
    ) -> impl Future<Output = bool> + Send;

    /// Overwrites the session under `id` only if it is still live.
    ///
    /// Returns `false`, storing nothing, if the session expired or was
    /// evicted in the meantime.
    fn replace(
        &self,
        id: &GameId,
        session: Session,
    ) -> impl Future<Output = bool> + Send;

    /// Runs pending maintenance and returns the id of every session the
    /// store dropped on its own (expired or evicted for capacity) since
    /// the last call. Each id is reported once.
    fn purge(&self) -> impl Future<Output = Vec<GameId>> + Send;

    /// Number of live sessions.
    fn entry_count(&self) -> impl Future<Output = u64> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// An in-process [`SessionStore`] with idle expiry and LRU eviction.
///
/// Backed by a `moka` cache: `time_to_idle` is the retention window and
/// `max_capacity` the size limit. The eviction listener queues every id
/// the cache drops so [`purge`](SessionStore::purge) can report it.
pub struct MemoryStore {
    cache: Cache<GameId, Session>,
    removed: Mutex<mpsc::UnboundedReceiver<GameId>>,
}

impl MemoryStore {
    /// Creates an empty store with the given limits.
    pub fn new(config: DirectoryConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut builder = Cache::builder()
            .time_to_idle(config.retention.min(MAX_RETENTION))
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(move |id: Arc<GameId>, _session, cause: RemovalCause| {
                // Replacements and explicit removals are the caller's doing.
                if !cause.was_evicted() {
                    return;
                }
                tracing::info!(game_id = %id, ?cause, "session dropped from directory");
                let _ = tx.send(GameId::clone(&id));
            });
        if config.capacity > 0 {
            builder = builder.max_capacity(u64::try_from(config.capacity).unwrap_or(u64::MAX));
        }

        Self {
            cache: builder.build(),
            removed: Mutex::new(rx),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DirectoryConfig::default())
    }
}

impl SessionStore for MemoryStore {
    async fn get(&self, id: &GameId) -> Option<Session> {
        self.cache.get(id).await
    }

    fn contains(&self, id: &GameId) -> bool {
        self.cache.contains_key(id)
    }

    async fn insert(&self, id: GameId, session: Session) {
        self.cache.insert(id, session).await;
    }

    async fn insert_new(&self, id: GameId, session: Session) -> bool {
        self.cache
            .entry(id)
            .or_insert_with(async move { session })
            .await
            .is_fresh()
    }

    async fn replace(&self, id: &GameId, session: Session) -> bool {
        let result = self
            .cache
            .entry(id.clone())
            .and_compute_with(|current| {
                let op = match current {
                    Some(_) => Op::Put(session),
                    None => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        matches!(result, CompResult::ReplacedWith(_))
    }

    async fn purge(&self) -> Vec<GameId> {
        self.cache.run_pending_tasks().await;

        let mut removed = self.removed.lock().await;
        let mut ids = Vec::new();
        while let Ok(id) = removed.try_recv() {
            ids.push(id);
        }
        ids
    }

    async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

// =========================================================================
// Tests
// =========================================================================
