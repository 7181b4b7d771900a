//! Task list view: which tasks are visible, and how user intents reach the
//! store and the editor.

use crate::editor::TaskEditor;
use crate::error::AppError;
use crate::model::{NewTask, Task};
use crate::storage::KeyValueStorage;
use crate::store::TaskStore;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    #[default]
    All,
    Pending,
    Completed,
    Pinned,
}

impl ListFilter {
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Pinned => "pinned",
        }
    }
}

impl FromStr for ListFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" | "done" => Ok(Self::Completed),
            "pinned" => Ok(Self::Pinned),
            other => Err(AppError::invalid_input(format!(
                "unknown list filter '{other}'; expected all|pending|completed|pinned"
            ))),
        }
    }
}

/// Something the user asked the list to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Create(NewTask),
    Delete(String),
    TogglePin(String),
    ToggleComplete(String),
    OpenEditor(String),
    CloseEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Created(Task),
    Deleted(Task),
    Updated(Task),
    EditorOpened(String),
    EditorClosed,
    /// The intent named an id the store does not hold. Nothing changed.
    NotFound(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskListView {
    pub filter: ListFilter,
}

impl TaskListView {
    pub fn new(filter: ListFilter) -> Self {
        Self { filter }
    }

    /// Tasks matching the current filter, newest first.
    pub fn visible<S: KeyValueStorage>(&self, store: &TaskStore<S>) -> Vec<Task> {
        match self.filter {
            ListFilter::All => store.list_all(),
            ListFilter::Pending => store.list_pending(),
            ListFilter::Completed => store.list_completed(),
            ListFilter::Pinned => store.list_pinned(),
        }
    }

    /// Routes `intent` to the store or the editor.
    ///
    /// The only error is a creation whose title fails validation.
    pub fn dispatch<S: KeyValueStorage>(
        &self,
        store: &mut TaskStore<S>,
        editor: &mut TaskEditor,
        intent: Intent,
    ) -> Result<IntentOutcome, AppError> {
        let outcome = match intent {
            Intent::Create(input) => IntentOutcome::Created(store.create(input)?),
            Intent::Delete(id) => {
                if editor.task_id() == Some(id.as_str()) {
                    editor.close();
                }
                found(store.delete(&id), id, IntentOutcome::Deleted)
            }
            Intent::TogglePin(id) => found(store.toggle_pin(&id), id, IntentOutcome::Updated),
            Intent::ToggleComplete(id) => {
                found(store.toggle_complete(&id), id, IntentOutcome::Updated)
            }
            Intent::OpenEditor(id) => {
                if editor.open(store, &id) {
                    IntentOutcome::EditorOpened(id)
                } else {
                    IntentOutcome::NotFound(id)
                }
            }
            Intent::CloseEditor => {
                editor.close();
                IntentOutcome::EditorClosed
            }
        };
        Ok(outcome)
    }
}

fn found<F>(task: Option<Task>, id: String, wrap: F) -> IntentOutcome
where
    F: FnOnce(Task) -> IntentOutcome,
{
    task.map(wrap).unwrap_or(IntentOutcome::NotFound(id))
}
