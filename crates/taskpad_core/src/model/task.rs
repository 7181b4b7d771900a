use crate::error::AppError;
use crate::model::timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// A single task as held by the store and persisted under the `tasks` key.
///
/// Field names are camelCase on the wire so snapshots written by earlier
/// releases keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "todo" | "open" => Ok(Self::Pending),
            "completed" | "complete" | "done" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "unknown status '{other}'; expected pending|completed"
            ))),
        }
    }
}

/// Input collected by the creator form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn new<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Partial update of the mutable task fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
    pub pinned: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.pinned.is_none()
    }

    pub fn title<T: Into<String>>(mut self, title: T) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn assigned_to<A: Into<String>>(mut self, assigned_to: A) -> Self {
        self.assigned_to = Some(assigned_to.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    /// Applies the patch. `id` and `created_at` are never touched.
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(title) = self.title.as_ref() {
            task.title = title.clone();
        }
        if let Some(description) = self.description.as_ref() {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to) = self.assigned_to.as_ref() {
            task.assigned_to = assigned_to.clone();
        }
        if let Some(pinned) = self.pinned {
            task.pinned = pinned;
        }
    }
}
