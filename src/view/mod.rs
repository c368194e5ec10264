//! View-state derivation: filter, partition, and sort tasks for display.
//!
//! This layer is a pure function of `(tasks, search term, sort key)`: it
//! never touches the network or the cache, and it has no error path since
//! it only operates on already-validated in-memory data. [`MemoizedView`]
//! adds an explicit memo cell on top so the pipeline reruns exactly when
//! one of its inputs changes.

pub mod form;

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::types::Task;

/// Sort key selected for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    /// Ascending by due instant; tasks without a due date sort last.
    #[default]
    DueDate,
    /// Ascending by normalized priority rank (high, medium, low).
    Priority,
    /// Ascending case-insensitive title order.
    Title,
}

/// The derived, display-ready task groups.
///
/// Both groups are filtered and sorted; whether the completed group is
/// shown at all is an independent toggle owned by the presentation layer,
/// not part of this derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskView {
    /// Uncompleted tasks, in display order.
    pub uncompleted: Vec<Task>,
    /// Completed tasks, in display order.
    pub completed: Vec<Task>,
}

impl TaskView {
    /// Whether both groups are empty.
    pub fn is_empty(&self) -> bool {
        self.uncompleted.is_empty() && self.completed.is_empty()
    }
}

/// Derive the display view from raw task data.
///
/// 1. keep tasks whose title contains `search` case-insensitively (an
///    empty term keeps all);
/// 2. partition by completion state;
/// 3. stable-sort each group by `sort`.
///
/// # Examples
///
/// ```rust
/// use tasksync::{derive_view, SortKey, Task};
///
/// let tasks = vec![
///     Task { id: 1, title: "Buy milk".into(), completed: false,
///            due_date: None, notes: None, priority: "low".into() },
///     Task { id: 2, title: "buy bread".into(), completed: false,
///            due_date: None, notes: None, priority: "high".into() },
/// ];
/// let view = derive_view(&tasks, "buy", SortKey::Priority);
/// assert_eq!(view.uncompleted[0].id, 2);
/// ```
pub fn derive_view(tasks: &[Task], search: &str, sort: SortKey) -> TaskView {
    let needle = search.to_lowercase();
    let (mut completed, mut uncompleted): (Vec<Task>, Vec<Task>) = tasks
        .iter()
        .filter(|task| needle.is_empty() || task.title.to_lowercase().contains(&needle))
        .cloned()
        .partition(|task| task.completed);

    sort_tasks(&mut uncompleted, sort);
    sort_tasks(&mut completed, sort);
    TaskView {
        uncompleted,
        completed,
    }
}

fn sort_tasks(tasks: &mut [Task], sort: SortKey) {
    // Vec::sort_by is stable: ties keep their original relative order.
    match sort {
        SortKey::DueDate => tasks.sort_by(compare_due_dates),
        SortKey::Priority => tasks.sort_by_key(|t| t.priority().rank()),
        SortKey::Title => tasks.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
}

fn compare_due_dates(a: &Task, b: &Task) -> Ordering {
    match (a.has_due_date(), b.has_due_date()) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => a.due_date.cmp(&b.due_date),
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    // Case-insensitive Unicode comparison with a raw tiebreak for
    // determinism.
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Explicit memo cell for the view derivation.
///
/// Holds the last `(inputs hash, result)` pair; [`MemoizedView::view`]
/// recomputes only when the hash of `(tasks, search, sort)` differs from
/// the cached one, otherwise it hands back the prior `Arc` untouched.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use tasksync::{MemoizedView, SortKey};
///
/// let mut memo = MemoizedView::new();
/// let first = memo.view(&[], "", SortKey::Title);
/// let second = memo.view(&[], "", SortKey::Title);
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct MemoizedView {
    cached: Option<(u64, Arc<TaskView>)>,
}

impl MemoizedView {
    /// Create an empty memo cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// The view for these inputs, recomputed only on input change.
    pub fn view(&mut self, tasks: &[Task], search: &str, sort: SortKey) -> Arc<TaskView> {
        let key = input_hash(tasks, search, sort);
        if let Some((cached_key, cached)) = &self.cached {
            if *cached_key == key {
                return Arc::clone(cached);
            }
        }
        let view = Arc::new(derive_view(tasks, search, sort));
        self.cached = Some((key, Arc::clone(&view)));
        view
    }

    /// Drop the cached result, forcing the next call to recompute.
    pub fn clear(&mut self) {
        self.cached = None;
    }
}

fn input_hash(tasks: &[Task], search: &str, sort: SortKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    tasks.hash(&mut hasher);
    search.hash(&mut hasher);
    sort.hash(&mut hasher);
    hasher.finish()
}
