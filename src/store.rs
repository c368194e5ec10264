//! Remote task store boundary.
//!
//! [`TaskStore`] is the typed interface to the backend holding the durable
//! task records. Each operation is a single round trip with no retry or
//! batching; retries are a user-initiated re-attempt at a higher layer,
//! and caching is the responsibility of [`crate::cache::QueryCache`].
//!
//! [`InMemoryStore`] is a complete in-process implementation for tests and
//! local development. **Never use it in production**; it keeps nothing
//! beyond the life of the process.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{Task, TaskDraft, TaskId};

/// Typed asynchronous operations against the remote task store.
///
/// The store is the authority for task ownership: it only ever returns the
/// authenticated identity's tasks, and the client never has to filter by
/// owner. All five operations are independently invocable and atomic from
/// the client's perspective.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch the complete current task set for the authenticated identity.
    ///
    /// Returns an empty set when there are no tasks or no authenticated
    /// identity.
    async fn fetch_tasks(&self) -> Result<Vec<Task>>;

    /// Fetch the identity's display name, if one has been set.
    ///
    /// `None` means "not yet set", which is distinct from an empty string.
    async fn fetch_display_name(&self) -> Result<Option<String>>;

    /// Set the identity's display name.
    ///
    /// The caller validates non-emptiness before calling.
    async fn set_display_name(&self, name: &str) -> Result<()>;

    /// Create a task from a draft. The store assigns and returns the id.
    ///
    /// The caller validates the title before calling.
    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId>;

    /// Replace a task's mutable fields wholesale.
    ///
    /// There is no partial patch: every call carries all fields. Returns
    /// whether a task with this id existed and was updated.
    async fn update_task(&self, id: TaskId, draft: &TaskDraft, completed: bool) -> Result<bool>;
}

#[async_trait]
impl<T: TaskStore + ?Sized> TaskStore for std::sync::Arc<T> {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        (**self).fetch_tasks().await
    }

    async fn fetch_display_name(&self) -> Result<Option<String>> {
        (**self).fetch_display_name().await
    }

    async fn set_display_name(&self, name: &str) -> Result<()> {
        (**self).set_display_name(name).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId> {
        (**self).create_task(draft).await
    }

    async fn update_task(&self, id: TaskId, draft: &TaskDraft, completed: bool) -> Result<bool> {
        (**self).update_task(id, draft, completed).await
    }
}

/// In-memory [`TaskStore`] for tests and local development.
///
/// Tasks live in a map keyed by id; ids are assigned from a monotonic
/// counter starting at 1. A failure can be injected with
/// [`InMemoryStore::set_failing`], after which every operation returns a
/// store error until cleared, useful for exercising the client's
/// last-known-good retention.
///
/// # Examples
///
/// ```rust
/// use tasksync::{InMemoryStore, TaskDraft, TaskStore};
///
/// # async fn example() -> tasksync::Result<()> {
/// let store = InMemoryStore::new();
/// let id = store.create_task(&TaskDraft::new("Buy milk")).await?;
/// assert_eq!(store.fetch_tasks().await?.len(), 1);
///
/// let existed = store
///     .update_task(id, &TaskDraft::new("Buy milk"), true)
///     .await?;
/// assert!(existed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    tasks: BTreeMap<TaskId, Task>,
    display_name: Option<String>,
    next_id: TaskId,
    failing: bool,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with tasks.
    ///
    /// The id counter continues past the highest seeded id.
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            for task in tasks {
                state.next_id = state.next_id.max(task.id);
                state.tasks.insert(task.id, task);
            }
        }
        store
    }

    /// Inject or clear a failure: while failing, every operation returns a
    /// store error and mutates nothing.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Number of tasks currently held.
    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Whether the store holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(state: &StoreState) -> Result<()> {
        if state.failing {
            return Err(Error::store("injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.tasks.values().cloned().collect())
    }

    async fn fetch_display_name(&self) -> Result<Option<String>> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.display_name.clone())
    }

    async fn set_display_name(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        state.display_name = Some(name.to_string());
        Ok(())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskId> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        state.next_id += 1;
        let id = state.next_id;
        state.tasks.insert(
            id,
            Task {
                id,
                title: draft.title.clone(),
                completed: false,
                due_date: draft.due_date,
                notes: draft.notes.clone(),
                priority: draft.priority.clone(),
            },
        );
        Ok(id)
    }

    async fn update_task(&self, id: TaskId, draft: &TaskDraft, completed: bool) -> Result<bool> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        match state.tasks.get_mut(&id) {
            Some(task) => {
                task.title = draft.title.clone();
                task.due_date = draft.due_date;
                task.priority = draft.priority.clone();
                task.notes = draft.notes.clone();
                task.completed = completed;
                Ok(true)
            },
            None => Ok(false),
        }
    }
}
