//! Task entity model and derived semantics.
//!
//! The [`Task`] struct mirrors the wire shape used by the remote store.
//! Everything derived from a task for presentation purposes (priority
//! normalization, due-date presence, overdue state) lives here as pure
//! functions so the rest of the crate never re-implements these rules.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a task by the remote store at creation.
///
/// Stable and unique across the task set held by one identity.
pub type TaskId = u64;

/// Normalized task priority.
///
/// Priorities are stored as free-form text tags on the wire. Any tag that
/// is not exactly `high`, `medium`, or `low` (case-insensitive) is treated
/// as [`Priority::Medium`] for sorting and display, but the stored tag is
/// never rewritten.
///
/// The variant order gives the sort rank: high before medium before low.
///
/// # Examples
///
/// ```rust
/// use tasksync::Priority;
///
/// assert_eq!(Priority::normalize("HIGH"), Priority::High);
/// assert_eq!(Priority::normalize("urgent!!"), Priority::Medium);
/// assert!(Priority::High < Priority::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Highest urgency, sorts first.
    High,
    /// Default urgency; also the fallback for unrecognized tags.
    Medium,
    /// Lowest urgency, sorts last.
    Low,
}

impl Priority {
    /// Normalize a raw priority tag.
    ///
    /// Lower-cases the input; anything not exactly matching one of the
    /// three known tags maps to `Medium` so the client never faults on an
    /// unexpected value.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    /// Sort rank: high 0, medium 1, low 2.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// The canonical lowercase tag for this priority.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task as held by the remote store.
///
/// `due_date` is nanoseconds since the Unix epoch; absent or zero means
/// "no due date". `priority` is the raw stored tag; use
/// [`Task::priority`] wherever the value affects ordering or display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier, immutable after creation.
    pub id: TaskId,
    /// Task title. Non-empty; enforced client-side before submission.
    pub title: String,
    /// Completion state.
    pub completed: bool,
    /// Due instant in nanoseconds since epoch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    /// Free-form notes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Raw priority tag as stored.
    pub priority: String,
}

impl Task {
    /// Normalized priority of this task.
    pub fn priority(&self) -> Priority {
        Priority::normalize(&self.priority)
    }

    /// Whether the task has a due date (present and non-zero).
    pub fn has_due_date(&self) -> bool {
        matches!(self.due_date, Some(n) if n != 0)
    }

    /// Whether the task has notes that survive whitespace trimming.
    pub fn has_notes(&self) -> bool {
        self.notes
            .as_deref()
            .is_some_and(|n| !n.trim().is_empty())
    }

    /// The due date's calendar day in local time, if the task has one.
    pub fn due_day(&self) -> Option<NaiveDate> {
        if !self.has_due_date() {
            return None;
        }
        self.due_date
            .map(|n| DateTime::from_timestamp_nanos(n).with_timezone(&Local).date_naive())
    }

    /// Whether the task is overdue relative to `today`.
    ///
    /// True iff the task has a due date, is not completed, and the due
    /// instant's local calendar day is strictly earlier than `today`.
    /// Comparison is by calendar date, not instant, so a task due today is
    /// never overdue regardless of time of day.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        if self.completed {
            return false;
        }
        self.due_day().is_some_and(|due| due < today)
    }

    /// Whether the task is overdue as of the local clock.
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Local::now().date_naive())
    }
}

/// The due instant for a calendar date: local midnight, in nanoseconds
/// since epoch.
///
/// Returns `None` when the instant cannot be represented (a midnight
/// skipped by a DST transition with no later reading, or out of range for
/// nanosecond precision).
pub fn due_instant(date: NaiveDate) -> Option<i64> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .and_then(|dt| dt.timestamp_nanos_opt())
}

/// Client-side payload for creating or updating a task.
///
/// Updates are full replacements: every mutable field is sent on each
/// call, so toggling completion resends the unchanged title, due date,
/// priority, and notes alongside the new flag. [`TaskDraft::from_task`]
/// builds that resend payload.
///
/// # Examples
///
/// ```rust
/// use tasksync::TaskDraft;
///
/// let draft = TaskDraft::new("  Buy milk  ")
///     .with_priority("high")
///     .with_notes("2% if they have it");
/// assert_eq!(draft.title, "Buy milk");
/// assert!(draft.validate().is_ok());
///
/// assert!(TaskDraft::new("   ").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Trimmed title.
    pub title: String,
    /// Due instant in nanoseconds since epoch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    /// Priority tag, sent as-is.
    pub priority: String,
    /// Trimmed notes; whitespace-only input becomes absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskDraft {
    /// Create a draft with the given title and medium priority.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into().trim().to_string(),
            due_date: None,
            priority: Priority::Medium.as_str().to_string(),
            notes: None,
        }
    }

    /// Build the full-replacement payload for an existing task.
    ///
    /// Copies every mutable field verbatim, including an unrecognized
    /// priority tag, which must survive the round trip unchanged.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            due_date: task.due_date,
            priority: task.priority.clone(),
            notes: task.notes.clone(),
        }
    }

    /// Set the due instant in nanoseconds since epoch.
    pub fn with_due_date(mut self, nanos: i64) -> Self {
        self.due_date = Some(nanos);
        self
    }

    /// Set the due date to local midnight of a calendar date.
    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = due_instant(date);
        self
    }

    /// Set the priority tag.
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// Set the notes, trimming whitespace; whitespace-only input clears
    /// them.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let trimmed = notes.into().trim().to_string();
        self.notes = if trimmed.is_empty() { None } else { Some(trimmed) };
        self
    }

    /// Validate the draft before submission.
    ///
    /// The only client-side rule is a non-empty title; everything else is
    /// accepted as-is.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::error::Error::EmptyTitle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, TimeZone};

    fn task(id: TaskId, title: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            completed: false,
            due_date: None,
            notes: None,
            priority: "medium".to_string(),
        }
    }

    #[test]
    fn normalize_known_tags_any_case() {
        assert_eq!(Priority::normalize("high"), Priority::High);
        assert_eq!(Priority::normalize("High"), Priority::High);
        assert_eq!(Priority::normalize("MEDIUM"), Priority::Medium);
        assert_eq!(Priority::normalize("LoW"), Priority::Low);
    }

    #[test]
    fn normalize_unknown_tags_to_medium() {
        for raw in ["", "urgent", "hi", "low ", "critical", "0", "médium"] {
            assert_eq!(Priority::normalize(raw), Priority::Medium, "tag {raw:?}");
            assert_eq!(Priority::normalize(raw).rank(), 1);
        }
    }

    #[test]
    fn priority_rank_order() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::High.rank(), 0);
        assert_eq!(Priority::Low.rank(), 2);
    }

    #[test]
    fn due_date_absent_or_zero_is_no_due_date() {
        let mut t = task(1, "a");
        assert!(!t.has_due_date());
        t.due_date = Some(0);
        assert!(!t.has_due_date());
        t.due_date = Some(1);
        assert!(t.has_due_date());
    }

    #[test]
    fn notes_presence_ignores_whitespace() {
        let mut t = task(1, "a");
        assert!(!t.has_notes());
        t.notes = Some("   \n\t".to_string());
        assert!(!t.has_notes());
        t.notes = Some(" call back ".to_string());
        assert!(t.has_notes());
    }

    #[test]
    fn overdue_is_by_calendar_day_not_instant() {
        let today = Local::now().date_naive();
        let late_today = Local
            .from_local_datetime(
                &today.and_time(chrono::NaiveTime::from_hms_opt(23, 59, 0).unwrap()),
            )
            .earliest()
            .unwrap();

        let mut t = task(1, "a");
        t.due_date = late_today.timestamp_nanos_opt();
        // Due today, even one minute before midnight: never overdue.
        assert!(!t.is_overdue_on(today));

        let yesterday = today - Duration::days(1);
        t.due_date = due_instant(yesterday);
        assert!(t.is_overdue_on(today));

        t.completed = true;
        assert!(!t.is_overdue_on(today));
    }

    #[test]
    fn overdue_requires_a_due_date() {
        let t = task(1, "a");
        assert!(!t.is_overdue_on(Local::now().date_naive()));
    }

    #[test]
    fn due_instant_lands_on_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let nanos = due_instant(date).unwrap();
        let back = DateTime::from_timestamp_nanos(nanos).with_timezone(&Local);
        assert_eq!(back.date_naive(), date);
        assert_eq!(back.year(), 2026);
    }

    #[test]
    fn draft_trims_title_and_notes() {
        let draft = TaskDraft::new("  Water plants ").with_notes("  \n ");
        assert_eq!(draft.title, "Water plants");
        assert_eq!(draft.notes, None);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn draft_from_task_preserves_raw_priority() {
        let mut t = task(7, "odd");
        t.priority = "Urgent!".to_string();
        let draft = TaskDraft::from_task(&t);
        assert_eq!(draft.priority, "Urgent!");
    }

    #[test]
    fn empty_title_fails_validation() {
        assert_eq!(
            TaskDraft::new("").validate(),
            Err(crate::error::Error::EmptyTitle)
        );
    }

    #[test]
    fn task_wire_shape_is_camel_case() {
        let mut t = task(3, "Ship it");
        t.due_date = Some(42);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["dueDate"], 42);
        assert!(json.get("notes").is_none());
    }
}
