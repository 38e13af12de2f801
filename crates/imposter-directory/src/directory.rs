//! The session directory: id allocation and serialized access.

use std::sync::Arc;

use dashmap::DashMap;
use imposter_game::{GameError, Session};
use imposter_protocol::{ConnectionId, GameId, PlayerId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{DirectoryConfig, DirectoryError, MemoryStore, SessionStore, generate_game_id};

/// Maps game ids to sessions and serializes every mutation per game.
///
/// # Concurrency
///
/// The store synchronizes itself. On top of it each game has its own
/// mutex in `locks`, taken through [`lock`](Self::lock). Whoever holds a
/// game's [`SessionGuard`] is the only one reading, mutating, and
/// writing that session, so commands on the same game run one at a time
/// (including whatever the caller does with the result before dropping
/// the guard) while different games proceed independently.
///
/// Lock entries are created on first use and forgotten when the store
/// reports the session gone, in [`purge_expired`](Self::purge_expired).
///
/// The directory is shared by reference (`Arc<Directory>`); there is no
/// global instance.
pub struct Directory<S: SessionStore = MemoryStore> {
    store: S,
    locks: DashMap<GameId, Arc<Mutex<()>>>,
}

impl Directory<MemoryStore> {
    /// Creates a directory backed by an in-memory store.
    pub fn new(config: DirectoryConfig) -> Self {
        Self::with_store(MemoryStore::new(config))
    }
}

impl Default for Directory<MemoryStore> {
    fn default() -> Self {
        Self::new(DirectoryConfig::default())
    }
}

impl<S: SessionStore> Directory<S> {
    /// Creates a directory over an existing store.
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Creates a new session in `Lobby` and returns its id.
    ///
    /// Ids are drawn at random and redrawn until one is unused. The check
    /// and the insert are one atomic store operation, so two concurrent
    /// creates can't claim the same id.
    pub async fn create(
        &self,
        imposter_count: usize,
        innocent_prompt: impl Into<String>,
        imposter_prompt: impl Into<String>,
    ) -> GameId {
        let innocent_prompt = innocent_prompt.into();
        let imposter_prompt = imposter_prompt.into();

        let id = self
            .claim_id(
                || generate_game_id(&mut rand::rng()),
                |id| {
                    Session::new(
                        id,
                        imposter_count,
                        innocent_prompt.clone(),
                        imposter_prompt.clone(),
                    )
                },
            )
            .await;

        tracing::info!(game_id = %id, imposters = imposter_count, "game created");
        id
    }

    /// Returns a copy of the session.
    ///
    /// Changes to the copy are local until written back with
    /// [`put`](Self::put). Prefer [`update`](Self::update), which does
    /// both under the per-game lock.
    ///
    /// # Errors
    /// [`DirectoryError::SessionNotFound`] if no live session has this id.
    pub async fn get(&self, id: &GameId) -> Result<Session, DirectoryError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| DirectoryError::SessionNotFound(id.clone()))
    }

    /// Stores `session` under `id`, replacing whatever was there.
    pub async fn put(&self, id: GameId, session: Session) {
        self.store.insert(id, session).await;
    }

    /// Returns `true` if a live session has this id.
    pub fn contains(&self, id: &GameId) -> bool {
        self.store.contains(id)
    }

    /// Takes the game's lock and returns a guard for exclusive access.
    ///
    /// Other callers asking for the same game wait until the guard is
    /// dropped.
    ///
    /// # Errors
    /// [`DirectoryError::SessionNotFound`] for an unknown id. Unknown ids
    /// get no lock entry.
    pub async fn lock(&self, id: &GameId) -> Result<SessionGuard<'_, S>, DirectoryError> {
        if !self.store.contains(id) {
            return Err(DirectoryError::SessionNotFound(id.clone()));
        }
        let lock = Arc::clone(&self.locks.entry(id.clone()).or_default());
        let held = lock.lock_owned().await;

        // Dropped while we waited; its removal may already have been purged.
        if !self.store.contains(id) {
            self.locks.remove(id);
            return Err(DirectoryError::SessionNotFound(id.clone()));
        }

        Ok(SessionGuard {
            store: &self.store,
            id: id.clone(),
            _held: held,
        })
    }

    /// Adds a player to a session and returns their new id.
    ///
    /// # Errors
    /// - [`DirectoryError::SessionNotFound`] for an unknown id
    /// - [`DirectoryError::Game`] if the session is not accepting players
    pub async fn join(
        &self,
        id: &GameId,
        name: impl Into<String>,
        connection: ConnectionId,
    ) -> Result<PlayerId, DirectoryError> {
        self.lock(id).await?.join(name, connection).await
    }

    /// Runs `mutate` on the session as one atomic unit. Shorthand for
    /// [`lock`](Self::lock) then [`SessionGuard::update`].
    ///
    /// # Errors
    /// - [`DirectoryError::SessionNotFound`] for an unknown id
    /// - [`DirectoryError::Game`] carrying whatever `mutate` returned
    pub async fn update<F, R>(
        &self,
        id: &GameId,
        mutate: F,
    ) -> Result<R, DirectoryError>
    where
        F: FnOnce(&mut Session) -> Result<R, GameError> + Send,
        R: Send,
    {
        self.lock(id).await?.update(mutate).await
    }

    /// Returns the ids of every session the store has dropped since the
    /// last call, whether it went idle past the retention window or was
    /// evicted for capacity, and forgets their locks.
    ///
    /// Call this periodically; the server runs it on an interval.
    pub async fn purge_expired(&self) -> Vec<GameId> {
        let removed = self.store.purge().await;
        for id in &removed {
            self.locks.remove(id);
        }
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "dropped games purged");
        }
        removed
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> u64 {
        self.store.entry_count().await
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Inserts `make(id)` under the first drawn id that is free.
    ///
    /// Never returns without checking; with ~5.4 × 10¹² codes a retry is
    /// rare but always possible.
    async fn claim_id<D, M>(&self, mut draw: D, make: M) -> GameId
    where
        D: FnMut() -> GameId + Send,
        M: Fn(GameId) -> Session + Send,
    {
        loop {
            let id = draw();
            if self.store.insert_new(id.clone(), make(id.clone())).await {
                return id;
            }
            tracing::debug!(game_id = %id, "game id collision, retrying");
        }
    }
}

/// Exclusive access to one session, held until dropped.
///
/// Each [`update`](Self::update) reads the stored session, applies the
/// mutation, and writes it back only if the mutation succeeded and the
/// session is still live.
pub struct SessionGuard<'a, S: SessionStore> {
    store: &'a S,
    id: GameId,
    _held: OwnedMutexGuard<()>,
}

impl<S: SessionStore> SessionGuard<'_, S> {
    pub fn id(&self) -> &GameId {
        &self.id
    }

    /// A copy of the session as currently stored.
    ///
    /// # Errors
    /// [`DirectoryError::SessionNotFound`] if it expired or was evicted.
    pub async fn session(&self) -> Result<Session, DirectoryError> {
        self.store
            .get(&self.id)
            .await
            .ok_or_else(|| DirectoryError::SessionNotFound(self.id.clone()))
    }

    /// Applies `mutate` and persists the result only on `Ok`. On `Err`
    /// the stored session is untouched.
    ///
    /// `mutate` is synchronous; nothing may await while a session is
    /// half-modified.
    ///
    /// # Errors
    /// - [`DirectoryError::SessionNotFound`] if the session is gone,
    ///   before or after `mutate` ran; a dropped session is never revived
    /// - [`DirectoryError::Game`] carrying whatever `mutate` returned
    pub async fn update<F, R>(&mut self, mutate: F) -> Result<R, DirectoryError>
    where
        F: FnOnce(&mut Session) -> Result<R, GameError> + Send,
        R: Send,
    {
        let mut session = self.session().await?;
        let out = mutate(&mut session)?;
        if !self.store.replace(&self.id, session).await {
            tracing::debug!(game_id = %self.id, "session dropped during update");
            return Err(DirectoryError::SessionNotFound(self.id.clone()));
        }
        Ok(out)
    }

    /// Adds a player and returns their new id.
    ///
    /// # Errors
    /// As [`update`](Self::update).
    pub async fn join(
        &mut self,
        name: impl Into<String>,
        connection: ConnectionId,
    ) -> Result<PlayerId, DirectoryError> {
        let name = name.into();
        let player_name = name.clone();
        let player_id = self
            .update(move |session| session.add_player(player_name, connection))
            .await?;

        tracing::info!(game_id = %self.id, %player_id, %name, %connection, "player joined");
        Ok(player_id)
    }
}

// =========================================================================
// Tests
// =========================================================================
