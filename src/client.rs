//! High-level task client.
//!
//! [`TaskClient`] ties the identity boundary, the remote store, and the
//! query cache together: it gates queries on session readiness, coalesces
//! concurrent reads, validates mutations before any round trip, and keeps
//! the cache consistent with the latest known mutation outcome.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::cache::{CacheEvent, QueryCache, QueryKey, Snapshot};
use crate::error::{Error, Result};
use crate::identity::{Identity, IdentityProvider};
use crate::store::TaskStore;
use crate::types::{Task, TaskDraft, TaskId};

#[derive(Debug, Clone, Default)]
struct SessionState {
    /// Whether the identity has been resolved (present or definitively
    /// absent). Queries are ineligible until then.
    resolved: bool,
    identity: Option<Identity>,
}

/// Client for a remote personal task store.
///
/// Generic over the store and identity provider so tests and local
/// development can plug in [`crate::InMemoryStore`] and
/// [`crate::StaticIdentity`].
///
/// Queries return [`Snapshot`]s rather than bare results: before the
/// session is ready, or before the first fetch resolves, a snapshot simply
/// has no value, and "no data yet" is not an error. Mutations validate their
/// input first, fail fast with [`Error::Unavailable`] when the session is
/// not ready, and on success invalidate the affected cache key and
/// immediately re-fetch it.
///
/// # Examples
///
/// ```rust
/// use tasksync::{InMemoryStore, StaticIdentity, TaskClient, TaskDraft};
///
/// # async fn example() -> tasksync::Result<()> {
/// let client = TaskClient::new(InMemoryStore::new(), StaticIdentity::with_identity("alice"));
/// client.resolve_session().await;
/// client.sign_in().await?;
///
/// client.create_task(&TaskDraft::new("Buy milk")).await?;
/// let tasks = client.tasks().await;
/// assert_eq!(tasks.value.unwrap().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TaskClient<S, I> {
    store: Arc<S>,
    provider: Arc<I>,
    cache: QueryCache,
    session: RwLock<SessionState>,
}

impl<S, I> std::fmt::Debug for TaskClient<S, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.read();
        f.debug_struct("TaskClient")
            .field("resolved", &session.resolved)
            .field("identity", &session.identity)
            .finish()
    }
}

impl<S, I> TaskClient<S, I>
where
    S: TaskStore,
    I: IdentityProvider,
{
    /// Create a client over a store and an identity provider.
    ///
    /// The session starts unresolved; call [`TaskClient::resolve_session`]
    /// before issuing queries.
    pub fn new(store: S, provider: I) -> Self {
        Self {
            store: Arc::new(store),
            provider: Arc::new(provider),
            cache: QueryCache::new(),
            session: RwLock::new(SessionState::default()),
        }
    }

    /// Resolve the session: observe the provider's current identity and
    /// mark the session ready.
    ///
    /// This is itself an identity transition (unknown → known), so the
    /// whole cache is invalidated. Returns the resolved identity, if any.
    pub async fn resolve_session(&self) -> Option<Identity> {
        let identity = self.provider.identity().await;
        {
            let mut session = self.session.write();
            session.resolved = true;
            session.identity = identity.clone();
        }
        debug!(identity = ?identity.as_ref().map(Identity::as_str), "session resolved");
        self.cache.invalidate_all();
        identity
    }

    /// Sign in through the identity provider.
    ///
    /// On success the session switches to the new identity and the whole
    /// cache is invalidated: the previous identity's results must never
    /// leak into this session's view.
    pub async fn sign_in(&self) -> Result<Identity> {
        let identity = self.provider.login().await?;
        {
            let mut session = self.session.write();
            session.resolved = true;
            session.identity = Some(identity.clone());
        }
        info!(identity = identity.as_str(), "signed in");
        self.cache.invalidate_all();
        Ok(identity)
    }

    /// Sign out. Takes effect immediately; the whole cache is invalidated
    /// and results of any in-flight fetches are discarded on arrival.
    pub fn sign_out(&self) {
        self.provider.clear();
        self.session.write().identity = None;
        info!("signed out");
        self.cache.invalidate_all();
    }

    /// The identity this session currently operates as.
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.read().identity.clone()
    }

    /// Whether queries are eligible to run.
    pub fn is_ready(&self) -> bool {
        self.session.read().resolved
    }

    /// Subscribe to cache events (updates, invalidations, failures).
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    /// The query cache, for direct snapshot reads.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The task set, fetched through the cache.
    ///
    /// Before the session is ready this reports the current (empty)
    /// snapshot without touching the store. A fresh cached value answers
    /// without a round trip; a pending fetch is joined, not duplicated.
    pub async fn tasks(&self) -> Snapshot<Arc<Vec<Task>>> {
        if !self.is_ready() {
            return self.cache.tasks();
        }
        let store = Arc::clone(&self.store);
        self.cache
            .fetch_tasks(async move { store.fetch_tasks().await.map(Arc::new) })
            .await
    }

    /// The display name, fetched through the cache.
    ///
    /// A snapshot value of `Some(None)` means the store answered and no
    /// name has been set yet.
    pub async fn display_name(&self) -> Snapshot<Option<String>> {
        if !self.is_ready() {
            return self.cache.display_name();
        }
        let store = Arc::clone(&self.store);
        self.cache
            .fetch_display_name(async move { store.fetch_display_name().await })
            .await
    }

    /// Create a task. Returns the store-assigned id.
    ///
    /// Validates the draft first; an empty title never reaches the store.
    /// On success the `tasks` entry is invalidated and immediately
    /// re-fetched; a re-fetch failure is recorded on the entry but does
    /// not fail the mutation.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId> {
        draft.validate()?;
        self.ensure_ready()?;
        let id = self.store.create_task(draft).await?;
        debug!(id, "task created");
        self.cache.invalidate(QueryKey::Tasks);
        self.tasks().await;
        Ok(id)
    }

    /// Replace a task's mutable fields wholesale.
    ///
    /// Returns whether the task existed. When it did, the `tasks` entry is
    /// invalidated and re-fetched; when it did not, nothing changed
    /// server-side and the cached set is left exactly as it was.
    pub async fn update_task(
        &self,
        id: TaskId,
        draft: &TaskDraft,
        completed: bool,
    ) -> Result<bool> {
        draft.validate()?;
        self.ensure_ready()?;
        let existed = self.store.update_task(id, draft, completed).await?;
        if existed {
            debug!(id, completed, "task updated");
            self.cache.invalidate(QueryKey::Tasks);
            self.tasks().await;
        } else {
            debug!(id, "update targeted a missing task");
        }
        Ok(existed)
    }

    /// Toggle a task's completion state.
    ///
    /// Updates are full replacements, so this resends the unchanged
    /// title, due date, priority, and notes alongside the flipped flag.
    pub async fn toggle_completed(&self, task: &Task) -> Result<bool> {
        self.update_task(task.id, &TaskDraft::from_task(task), !task.completed)
            .await
    }

    /// Set the display name. Rejects empty input before any round trip.
    pub async fn set_display_name(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyDisplayName);
        }
        self.ensure_ready()?;
        self.store.set_display_name(name).await?;
        debug!("display name set");
        self.cache.invalidate(QueryKey::DisplayName);
        self.display_name().await;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::Unavailable);
        }
        Ok(())
    }
}
