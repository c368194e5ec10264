//! Transient UI state machines.
//!
//! The task form and the profile menu carry the only presentation state
//! with consistency rules of its own: a failed submission must keep the
//! form open with its draft so the user can retry, and losing focus must
//! close the menu and abandon its editor. Both are modeled as explicit
//! state machines driven by discrete events, independent of any rendering
//! lifecycle.

use crate::types::{Priority, Task, TaskDraft, TaskId};

/// Lifecycle phase of the task create/edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    /// Not shown.
    #[default]
    Closed,
    /// Shown and editable.
    Open,
    /// A submission is in flight; fields are not editable.
    Submitting,
}

/// Create/edit form for a task.
///
/// Flow: `Closed → Open → Submitting → Closed` on success, and
/// `Submitting → Open` on failure with the draft intact. A validation
/// failure never leaves `Open`; it records the error and no submission
/// starts.
///
/// The machine does not perform the remote call itself: the driver takes
/// the payload from [`TaskForm::begin_submit`], runs the mutation, and
/// reports back with [`TaskForm::submit_succeeded`] or
/// [`TaskForm::submit_failed`].
///
/// # Examples
///
/// ```rust
/// use tasksync::form::{FormPhase, TaskForm};
///
/// let mut form = TaskForm::new();
/// form.open_blank();
/// form.draft_mut().unwrap().title = "Buy milk".to_string();
///
/// let (draft, editing) = form.begin_submit().unwrap();
/// assert_eq!(editing, None);
/// assert_eq!(form.phase(), FormPhase::Submitting);
///
/// // ... run the mutation with `draft` ...
/// # let _ = draft;
/// form.submit_succeeded();
/// assert_eq!(form.phase(), FormPhase::Closed);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    phase: FormPhase,
    draft: Option<TaskDraft>,
    editing: Option<TaskId>,
    error: Option<String>,
}

impl TaskForm {
    /// A closed form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// The id of the task being edited, if this is an edit rather than a
    /// create.
    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    /// The current draft, while the form is open or submitting.
    pub fn draft(&self) -> Option<&TaskDraft> {
        self.draft.as_ref()
    }

    /// Mutable access to the draft, only while the form is open.
    pub fn draft_mut(&mut self) -> Option<&mut TaskDraft> {
        match self.phase {
            FormPhase::Open => self.draft.as_mut(),
            FormPhase::Closed | FormPhase::Submitting => None,
        }
    }

    /// The error from the last validation or submission failure.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open the form with a blank draft, for creating a task.
    pub fn open_blank(&mut self) {
        self.phase = FormPhase::Open;
        self.draft = Some(TaskDraft::new(""));
        self.editing = None;
        self.error = None;
    }

    /// Open the form seeded from an existing task, for editing it.
    ///
    /// The priority is normalized for the editor's three-way choice; the
    /// stored tag itself is only rewritten if the user saves.
    pub fn open_edit(&mut self, task: &Task) {
        let mut draft = TaskDraft::new(task.title.clone())
            .with_priority(Priority::normalize(&task.priority).as_str());
        draft.due_date = task.due_date.filter(|&n| n != 0);
        if let Some(notes) = &task.notes {
            draft = draft.with_notes(notes.clone());
        }
        self.phase = FormPhase::Open;
        self.draft = Some(draft);
        self.editing = Some(task.id);
        self.error = None;
    }

    /// Close the form, discarding the draft.
    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// Validate the draft and move to `Submitting`.
    ///
    /// Returns the payload to send: the draft and, for edits, the target
    /// task id. On validation failure the form stays open with the error
    /// recorded and nothing is returned.
    pub fn begin_submit(&mut self) -> Option<(TaskDraft, Option<TaskId>)> {
        if self.phase != FormPhase::Open {
            return None;
        }
        let draft = self.draft.clone()?;
        if let Err(err) = draft.validate() {
            self.error = Some(err.to_string());
            return None;
        }
        self.phase = FormPhase::Submitting;
        self.error = None;
        Some((draft, self.editing))
    }

    /// The submission resolved successfully; close the form.
    pub fn submit_succeeded(&mut self) {
        if self.phase == FormPhase::Submitting {
            *self = Self::default();
        }
    }

    /// The submission failed; reopen with the draft intact so the user
    /// can retry.
    pub fn submit_failed(&mut self, error: impl Into<String>) {
        if self.phase == FormPhase::Submitting {
            self.phase = FormPhase::Open;
            self.error = Some(error.into());
        }
    }
}

/// State of the profile dropdown and inline name editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileMenuState {
    /// Menu closed, name shown read-only.
    #[default]
    Closed,
    /// Dropdown open.
    Open,
    /// Inline editor active with a draft name.
    Editing,
}

/// Profile dropdown / display-name editor.
///
/// `Closed → Open → Editing → Closed`, driven by discrete events. Focus
/// loss closes both the dropdown and the editor from any state, the
/// click-outside behavior expressed as an event instead of a DOM hook.
#[derive(Debug, Clone, Default)]
pub struct ProfileMenu {
    state: ProfileMenuState,
    draft: String,
}

impl ProfileMenu {
    /// A closed menu.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &ProfileMenuState {
        &self.state
    }

    /// The name being edited.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the editor draft. Ignored outside `Editing`.
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        if self.state == ProfileMenuState::Editing {
            self.draft = draft.into();
        }
    }

    /// Whether the draft would pass display-name validation.
    pub fn can_save(&self) -> bool {
        self.state == ProfileMenuState::Editing && !self.draft.trim().is_empty()
    }

    /// Toggle the dropdown. Ignored while the editor is active.
    pub fn toggle(&mut self) {
        self.state = match self.state {
            ProfileMenuState::Closed => ProfileMenuState::Open,
            ProfileMenuState::Open => ProfileMenuState::Closed,
            ProfileMenuState::Editing => ProfileMenuState::Editing,
        };
    }

    /// Start editing the display name, seeded with the current one.
    ///
    /// Only reachable from the open dropdown, which closes behind it.
    pub fn begin_edit(&mut self, current: Option<&str>) {
        if self.state == ProfileMenuState::Open {
            self.draft = current.unwrap_or_default().to_string();
            self.state = ProfileMenuState::Editing;
        }
    }

    /// Focus moved outside the menu: close everything.
    pub fn focus_lost(&mut self) {
        *self = Self::default();
    }

    /// Abandon the editor.
    pub fn cancel(&mut self) {
        if self.state == ProfileMenuState::Editing {
            *self = Self::default();
        }
    }

    /// The new name was saved; close the editor.
    pub fn saved(&mut self) {
        if self.state == ProfileMenuState::Editing {
            *self = Self::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            id: 9,
            title: "Water plants".to_string(),
            completed: false,
            due_date: Some(0),
            notes: Some("  balcony too ".to_string()),
            priority: "URGENT".to_string(),
        }
    }

    #[test]
    fn blank_form_rejects_empty_title_and_stays_open() {
        let mut form = TaskForm::new();
        form.open_blank();
        assert!(form.begin_submit().is_none());
        assert_eq!(form.phase(), FormPhase::Open);
        assert!(form.error().is_some());
    }

    #[test]
    fn successful_submit_closes_the_form() {
        let mut form = TaskForm::new();
        form.open_blank();
        form.draft_mut().unwrap().title = "Buy milk".to_string();
        let (draft, editing) = form.begin_submit().unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(editing, None);
        form.submit_succeeded();
        assert_eq!(form.phase(), FormPhase::Closed);
        assert!(form.draft().is_none());
    }

    #[test]
    fn failed_submit_keeps_the_draft_for_retry() {
        let mut form = TaskForm::new();
        form.open_blank();
        form.draft_mut().unwrap().title = "Buy milk".to_string();
        form.begin_submit().unwrap();
        form.submit_failed("store error: unreachable");

        assert_eq!(form.phase(), FormPhase::Open);
        assert_eq!(form.draft().unwrap().title, "Buy milk");
        assert!(form.error().unwrap().contains("unreachable"));

        // Retry goes straight back to Submitting with the same payload.
        let (draft, _) = form.begin_submit().unwrap();
        assert_eq!(draft.title, "Buy milk");
    }

    #[test]
    fn edit_seeds_from_task_with_normalized_priority() {
        let mut form = TaskForm::new();
        form.open_edit(&sample_task());
        let draft = form.draft().unwrap();
        assert_eq!(draft.title, "Water plants");
        assert_eq!(draft.priority, "medium"); // "URGENT" normalizes
        assert_eq!(draft.due_date, None); // zero means no due date
        assert_eq!(draft.notes.as_deref(), Some("balcony too"));
        assert_eq!(form.editing(), Some(9));
    }

    #[test]
    fn fields_are_frozen_while_submitting() {
        let mut form = TaskForm::new();
        form.open_blank();
        form.draft_mut().unwrap().title = "x".to_string();
        form.begin_submit().unwrap();
        assert!(form.draft_mut().is_none());
        assert!(form.begin_submit().is_none());
    }

    #[test]
    fn menu_walks_closed_open_editing_closed() {
        let mut menu = ProfileMenu::new();
        menu.toggle();
        assert_eq!(*menu.state(), ProfileMenuState::Open);
        menu.begin_edit(Some("Ada"));
        assert_eq!(*menu.state(), ProfileMenuState::Editing);
        assert_eq!(menu.draft(), "Ada");
        menu.saved();
        assert_eq!(*menu.state(), ProfileMenuState::Closed);
    }

    #[test]
    fn focus_loss_closes_everything() {
        let mut menu = ProfileMenu::new();
        menu.toggle();
        menu.begin_edit(None);
        menu.set_draft("halfway");
        menu.focus_lost();
        assert_eq!(*menu.state(), ProfileMenuState::Closed);
        assert_eq!(menu.draft(), "");
    }

    #[test]
    fn save_gate_requires_nonempty_draft() {
        let mut menu = ProfileMenu::new();
        menu.toggle();
        menu.begin_edit(None);
        assert!(!menu.can_save());
        menu.set_draft("  ");
        assert!(!menu.can_save());
        menu.set_draft("Ada");
        assert!(menu.can_save());
    }

    #[test]
    fn toggle_is_inert_while_editing() {
        let mut menu = ProfileMenu::new();
        menu.toggle();
        menu.begin_edit(Some("Ada"));
        menu.toggle();
        assert_eq!(*menu.state(), ProfileMenuState::Editing);
    }

    #[test]
    fn begin_edit_requires_open_menu() {
        let mut menu = ProfileMenu::new();
        menu.begin_edit(Some("Ada"));
        assert_eq!(*menu.state(), ProfileMenuState::Closed);
    }
}
