//! Keyed query cache with explicit invalidation.
//!
//! The cache owns one entry per logical query key and is the single source
//! of truth for "current known server state". Mutations never patch cached
//! values; they invalidate the affected key, and the subsequent re-fetch
//! replaces the entry wholesale. Identity transitions reset every entry
//! unconditionally, since all keyed data is identity-scoped.
//!
//! Consumers observe changes through [`QueryCache::subscribe`], which
//! yields a [`CacheEvent`] per update, invalidation, or failed fetch:
//! an explicit observer channel rather than ambient global state.

mod entry;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::Result;
use crate::types::Task;

pub use entry::Snapshot;

use entry::{wait_settled, Entry, FetchPlan};

/// Logical name of one cached read operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The authenticated identity's task set.
    Tasks,
    /// The authenticated identity's display name.
    DisplayName,
}

impl QueryKey {
    /// The key's wire-style name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::DisplayName => "displayName",
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// A fetch resolved and replaced the entry's value.
    Updated,
    /// The entry was marked stale (or reset on an identity transition).
    Invalidated,
    /// A fetch failed; the previous value, if any, is retained.
    Failed,
}

/// Notification sent to cache subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEvent {
    /// The affected key.
    pub key: QueryKey,
    /// What happened to it.
    pub kind: CacheEventKind,
}

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Cache of query results keyed by logical name.
///
/// Holds one [`Snapshot`]-able entry per key plus an epoch counter. The
/// epoch is bumped by [`QueryCache::invalidate_all`]; a fetch that was in
/// flight across the bump has its result discarded on arrival, so data
/// belonging to a previous identity can never land in the new session's
/// cache.
pub struct QueryCache {
    tasks: Entry<Arc<Vec<Task>>>,
    display_name: Entry<Option<String>>,
    epoch: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .field("tasks", &self.tasks.snapshot().fresh)
            .field("display_name", &self.display_name.snapshot().fresh)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tasks: Entry::new(),
            display_name: Entry::new(),
            epoch: AtomicU64::new(0),
            events,
        }
    }

    /// Subscribe to cache events.
    ///
    /// Slow subscribers may observe lagged receives; the cache itself
    /// never blocks on them.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Current snapshot of the task set entry.
    pub fn tasks(&self) -> Snapshot<Arc<Vec<Task>>> {
        self.tasks.snapshot()
    }

    /// Current snapshot of the display name entry.
    ///
    /// The outer `Option` distinguishes "no data yet" from a fetched
    /// result; the inner one distinguishes "name not set" from a set name.
    pub fn display_name(&self) -> Snapshot<Option<String>> {
        self.display_name.snapshot()
    }

    /// Mark one entry stale. Readers keep seeing the previous value until
    /// a re-fetch resolves.
    pub fn invalidate(&self, key: QueryKey) {
        debug!(key = %key, "invalidate");
        match key {
            QueryKey::Tasks => self.tasks.mark_stale(),
            QueryKey::DisplayName => self.display_name.mark_stale(),
        }
        self.emit(key, CacheEventKind::Invalidated);
    }

    /// Reset every entry and supersede all in-flight fetches.
    ///
    /// Called on identity transitions. Results of fetches started before
    /// this call are discarded when they arrive.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        debug!(epoch = self.epoch.load(Ordering::SeqCst), "invalidate all");
        self.tasks.reset();
        self.display_name.reset();
        self.emit(QueryKey::Tasks, CacheEventKind::Invalidated);
        self.emit(QueryKey::DisplayName, CacheEventKind::Invalidated);
    }

    pub(crate) async fn fetch_tasks<Fut>(&self, fetch: Fut) -> Snapshot<Arc<Vec<Task>>>
    where
        Fut: Future<Output = Result<Arc<Vec<Task>>>>,
    {
        self.run(QueryKey::Tasks, &self.tasks, fetch).await
    }

    pub(crate) async fn fetch_display_name<Fut>(&self, fetch: Fut) -> Snapshot<Option<String>>
    where
        Fut: Future<Output = Result<Option<String>>>,
    {
        self.run(QueryKey::DisplayName, &self.display_name, fetch).await
    }

    /// Satisfy a query against one entry.
    ///
    /// A fresh entry answers without a round trip. A pending entry is
    /// awaited rather than duplicated. Otherwise this caller leads the
    /// fetch: the result is stored unless the cache epoch moved while the
    /// fetch was in flight, in which case it is dropped on the floor.
    async fn run<T, Fut>(&self, key: QueryKey, entry: &Entry<T>, fetch: Fut) -> Snapshot<T>
    where
        T: Clone,
        Fut: Future<Output = Result<T>>,
    {
        let epoch = self.epoch.load(Ordering::SeqCst);
        match entry.plan() {
            FetchPlan::Fresh(_) => entry.snapshot(),
            FetchPlan::Attach(rx) => {
                wait_settled(rx).await;
                entry.snapshot()
            },
            FetchPlan::Lead(lead) => {
                debug!(key = %key, "fetch");
                let outcome = fetch.await.map_err(|e| e.to_string());
                let ok = outcome.is_ok();
                let accept = self.epoch.load(Ordering::SeqCst) == epoch;
                entry.complete(lead, outcome, accept);
                if accept {
                    let kind = if ok {
                        CacheEventKind::Updated
                    } else {
                        CacheEventKind::Failed
                    };
                    self.emit(key, kind);
                } else {
                    debug!(key = %key, "discarding superseded fetch result");
                }
                entry.snapshot()
            },
        }
    }

    fn emit(&self, key: QueryKey, kind: CacheEventKind) {
        let _ = self.events.send(CacheEvent { key, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_tasks() -> Arc<Vec<Task>> {
        Arc::new(vec![Task {
            id: 1,
            title: "one".to_string(),
            completed: false,
            due_date: None,
            notes: None,
            priority: "medium".to_string(),
        }])
    }

    #[tokio::test]
    async fn fetch_populates_and_freshens() {
        let cache = QueryCache::new();
        let snap = cache.fetch_tasks(async { Ok(sample_tasks()) }).await;
        assert!(snap.fresh);
        assert_eq!(snap.value.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fresh_entry_skips_the_round_trip() {
        let cache = QueryCache::new();
        cache.fetch_tasks(async { Ok(sample_tasks()) }).await;

        // A fresh entry must answer without polling the fetch future.
        let hits = AtomicU64::new(0);
        let snap = cache
            .fetch_tasks(async {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(sample_tasks())
            })
            .await;
        assert!(snap.fresh);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalidate_marks_stale_but_keeps_value() {
        let cache = QueryCache::new();
        cache.fetch_tasks(async { Ok(sample_tasks()) }).await;
        cache.invalidate(QueryKey::Tasks);
        let snap = cache.tasks();
        assert!(!snap.fresh);
        assert!(snap.value.is_some());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_last_known_good() {
        let cache = QueryCache::new();
        cache.fetch_tasks(async { Ok(sample_tasks()) }).await;
        cache.invalidate(QueryKey::Tasks);
        let snap = cache
            .fetch_tasks(async { Err(Error::store("unreachable")) })
            .await;
        assert_eq!(snap.value.unwrap().len(), 1);
        assert!(snap.error.unwrap().contains("unreachable"));
    }

    #[tokio::test]
    async fn epoch_bump_discards_in_flight_result() {
        let cache = Arc::new(QueryCache::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let fetching = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                cache
                    .fetch_tasks(async {
                        let _ = release_rx.await;
                        Ok(sample_tasks())
                    })
                    .await
            })
        };

        // Let the leader start, then supersede it.
        tokio::task::yield_now().await;
        cache.invalidate_all();
        release_tx.send(()).ok();
        fetching.await.unwrap();

        assert_eq!(cache.tasks().value, None);
    }

    #[tokio::test]
    async fn events_fan_out_to_subscribers() {
        let cache = QueryCache::new();
        let mut rx = cache.subscribe();
        cache.fetch_tasks(async { Ok(sample_tasks()) }).await;
        cache.invalidate(QueryKey::Tasks);

        assert_eq!(
            rx.recv().await.unwrap(),
            CacheEvent {
                key: QueryKey::Tasks,
                kind: CacheEventKind::Updated
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CacheEvent {
                key: QueryKey::Tasks,
                kind: CacheEventKind::Invalidated
            }
        );
    }
}
