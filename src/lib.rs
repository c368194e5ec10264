//! Client-side synchronization and view-state engine for a remote
//! personal task store.
//!
//! Users authenticate, maintain a list of tasks (title, due date,
//! priority, notes, completion state), and a remote service persists
//! them. This crate implements the layer with the nontrivial
//! state-consistency concerns: how locally-held task data is fetched,
//! cached, mutated, invalidated, filtered, and sorted against an
//! asynchronous, possibly-unavailable remote store.
//!
//! # Overview
//!
//! Data flows store → cache → view: [`TaskStore`] performs typed
//! asynchronous round trips, [`cache::QueryCache`] holds the last known
//! result per logical key with freshness and error state, and
//! [`derive_view`] turns raw task data into filtered, partitioned, sorted
//! groups for display. Mutations flow the other way: a [`TaskClient`]
//! operation validates, calls the store, and on success invalidates the
//! affected cache key and re-fetches it. Identity transitions reset the
//! entire cache, since everything cached belongs to exactly one identity.
//!
//! # Module Organization
//!
//! - [`types`] - Task entity model, drafts, priority normalization
//! - [`store`] - Remote store boundary trait and in-memory double
//! - [`identity`] - Identity provider boundary
//! - [`cache`] - Keyed query cache: invalidation, coalescing, events
//! - [`client`] - High-level client tying the layers together
//! - [`view`] - Pure view-state derivation and memoization
//! - [`error`] - Error taxonomy
//!
//! # Example
//!
//! ```rust
//! use tasksync::{InMemoryStore, SortKey, StaticIdentity, TaskClient, TaskDraft};
//!
//! # async fn example() -> tasksync::Result<()> {
//! let client = TaskClient::new(
//!     InMemoryStore::new(),
//!     StaticIdentity::with_identity("alice"),
//! );
//! client.resolve_session().await;
//! client.sign_in().await?;
//!
//! client
//!     .create_task(&TaskDraft::new("Buy milk").with_priority("high"))
//!     .await?;
//!
//! let tasks = client.tasks().await.value.unwrap_or_default();
//! let view = tasksync::derive_view(&tasks, "buy", SortKey::Priority);
//! assert_eq!(view.uncompleted.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cache;
pub mod client;
pub mod error;
pub mod identity;
pub mod store;
pub mod types;
pub mod view;

#[cfg(feature = "logging")]
pub mod logging;

// Re-exports for ergonomic access
pub use cache::{CacheEvent, CacheEventKind, QueryCache, QueryKey, Snapshot};
pub use client::TaskClient;
pub use error::{Error, Result};
pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use store::{InMemoryStore, TaskStore};
pub use types::{due_instant, Priority, Task, TaskDraft, TaskId};
pub use view::form;
pub use view::{derive_view, MemoizedView, SortKey, TaskView};
