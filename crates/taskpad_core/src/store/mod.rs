//! The task store: sole owner of the task collection.
//!
//! # Invariants
//! - Task ids are unique for the lifetime of the store.
//! - `created_at` is assigned once in [`TaskStore::create`] and never patched.
//! - Every mutation writes the whole collection under [`TASKS_KEY`]. A failed
//!   write is logged; the in-memory collection stays authoritative.
//! - Operations on unknown ids are no-ops reported as `None`.

pub mod views;

use crate::error::AppError;
use crate::model::{NewTask, Task, TaskPatch, TaskStatus};
use crate::sanitize::strip_comments;
use crate::storage::{KeyValueStorage, LocalStorage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

pub use views::Counts;

pub const TASKS_KEY: &str = "tasks";
pub const SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_ASSIGNEE: &str = "User";
/// Where a snapshot that could not be fully read is copied before the store
/// writes over it.
pub const UNREADABLE_TASKS_KEY: &str = "tasks.unreadable";
const ID_PREFIX: &str = "task-";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredTasksRef<'a> {
    schema_version: u32,
    tasks: &'a [Task],
}

/// Records are decoded one by one so a single bad entry cannot hide the rest.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Value>,
}

/// Snapshots written before the envelope existed are a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedTasks {
    Versioned(StoredTasks),
    Legacy(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&[Task])>;
type Clock = Box<dyn Fn() -> OffsetDateTime>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub default_assignee: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_assignee: DEFAULT_ASSIGNEE.to_string(),
        }
    }
}

pub struct TaskStore<S> {
    storage: LocalStorage<S>,
    tasks: Vec<Task>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: u64,
    default_assignee: String,
    clock: Clock,
}

impl<S> fmt::Debug for TaskStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("listeners", &self.listeners.len())
            .field("default_assignee", &self.default_assignee)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Loads the persisted collection. Missing or unreadable data starts empty.
    pub fn initialize(backend: S) -> Self {
        Self::with_options(backend, StoreOptions::default())
    }

    pub fn with_options(backend: S, options: StoreOptions) -> Self {
        let mut storage = LocalStorage::new(backend);
        let tasks = load_snapshot(&mut storage);
        info!(
            "event=store_init module=store status=ok tasks={}",
            tasks.len()
        );

        Self {
            storage,
            tasks,
            listeners: Vec::new(),
            next_listener_id: 0,
            default_assignee: options.default_assignee,
            clock: Box::new(OffsetDateTime::now_utc),
        }
    }

    /// Replaces the source of `created_at` timestamps.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> OffsetDateTime + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Re-reads the persisted snapshot, discarding the in-memory collection.
    pub fn reload(&mut self) {
        self.tasks = load_snapshot(&mut self.storage);
        self.notify();
    }

    pub fn storage(&self) -> &LocalStorage<S> {
        &self.storage
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn list_all(&self) -> Vec<Task> {
        views::by_recency(&self.tasks)
    }

    pub fn list_pending(&self) -> Vec<Task> {
        views::pending(&self.tasks)
    }

    pub fn list_completed(&self) -> Vec<Task> {
        views::completed(&self.tasks)
    }

    pub fn list_pinned(&self) -> Vec<Task> {
        views::pinned(&self.tasks)
    }

    pub fn counts(&self) -> Counts {
        views::counts(&self.tasks)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn create(&mut self, input: NewTask) -> Result<Task, AppError> {
        let title = clean_text(&input.title);
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let task = Task {
            id: self.generate_id(),
            title,
            description: clean_text(&input.description),
            status: TaskStatus::Pending,
            pinned: false,
            assigned_to: self.default_assignee.clone(),
            created_at: (self.clock)(),
        };

        self.tasks.push(task.clone());
        info!("event=task_create module=store status=ok id={}", task.id);
        self.commit();

        Ok(task)
    }

    /// Applies `patch` to the task with `id`.
    ///
    /// Returns `Ok(None)` without writing when the id is unknown, and an
    /// `invalid_input` error when the patch would blank the title.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Option<Task>, AppError> {
        let patch = normalize_patch(patch)?;
        Ok(self.mutate(id, "task_update", |task| patch.apply_to(task)))
    }

    pub fn delete(&mut self, id: &str) -> Option<Task> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_delete module=store status=not_found id={id}");
            return None;
        };

        let removed = self.tasks.remove(index);
        info!("event=task_delete module=store status=ok id={id}");
        self.commit();

        Some(removed)
    }

    pub fn toggle_pin(&mut self, id: &str) -> Option<Task> {
        self.mutate(id, "task_toggle_pin", |task| task.pinned = !task.pinned)
    }

    /// Flips between pending and completed.
    pub fn toggle_complete(&mut self, id: &str) -> Option<Task> {
        self.mutate(id, "task_toggle_complete", |task| {
            task.status = task.status.toggled()
        })
    }

    /// Marks the task completed. Already completed tasks stay completed.
    pub fn complete(&mut self, id: &str) -> Option<Task> {
        self.mutate(id, "task_complete", |task| {
            task.status = TaskStatus::Completed
        })
    }

    /// Registers a listener called with the collection after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&[Task]) + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn mutate<F>(&mut self, id: &str, event: &str, change: F) -> Option<Task>
    where
        F: FnOnce(&mut Task),
    {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event={event} module=store status=not_found id={id}");
            return None;
        };

        change(task);
        let updated = task.clone();
        debug!("event={event} module=store status=ok id={id}");
        self.commit();

        Some(updated)
    }

    fn commit(&mut self) {
        let snapshot = StoredTasksRef {
            schema_version: SCHEMA_VERSION,
            tasks: &self.tasks,
        };
        if !self.storage.save(TASKS_KEY, &snapshot) {
            warn!(
                "event=store_persist module=store status=error tasks={} detail=in_memory_state_kept",
                self.tasks.len()
            );
        }
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.tasks);
        }
    }

    fn generate_id(&self) -> String {
        loop {
            let id = format!("{ID_PREFIX}{}", Uuid::new_v4().simple());
            if !self.tasks.iter().any(|task| task.id == id) {
                return id;
            }
        }
    }
}

fn clean_text(raw: &str) -> String {
    strip_comments(raw).trim().to_string()
}

fn normalize_patch(mut patch: TaskPatch) -> Result<TaskPatch, AppError> {
    if let Some(title) = patch.title.as_deref() {
        let title = clean_text(title);
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }
        patch.title = Some(title);
    }
    patch.description = patch.description.as_deref().map(clean_text);
    patch.assigned_to = patch.assigned_to.as_deref().map(|value| value.trim().to_string());
    Ok(patch)
}

fn load_snapshot<S: KeyValueStorage>(storage: &mut LocalStorage<S>) -> Vec<Task> {
    let records = match storage.load::<PersistedTasks>(TASKS_KEY) {
        None => {
            set_aside(storage, "undecodable");
            return Vec::new();
        }
        Some(PersistedTasks::Legacy(records)) => records,
        Some(PersistedTasks::Versioned(stored)) if stored.schema_version > SCHEMA_VERSION => {
            warn!(
                "event=store_load module=store status=error code=invalid_data schema_version={} supported={}",
                stored.schema_version, SCHEMA_VERSION
            );
            set_aside(storage, "future_version");
            return Vec::new();
        }
        Some(PersistedTasks::Versioned(stored)) => stored.tasks,
    };

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for (index, record) in records.into_iter().enumerate() {
        let task = match serde_json::from_value::<Task>(record) {
            Ok(task) => task,
            Err(err) => {
                warn!(
                    "event=store_load module=store status=record_skipped index={index} error={err}"
                );
                skipped += 1;
                continue;
            }
        };

        if seen.insert(task.id.clone()) {
            tasks.push(task);
        } else {
            warn!(
                "event=store_load module=store status=duplicate_dropped id={}",
                task.id
            );
        }
    }

    if skipped > 0 {
        set_aside(storage, "records_skipped");
    }
    tasks
}

fn set_aside<S: KeyValueStorage>(storage: &mut LocalStorage<S>, reason: &str) {
    if storage.copy_raw(TASKS_KEY, UNREADABLE_TASKS_KEY) {
        warn!(
            "event=store_load module=store status=set_aside reason={reason} backup_key={UNREADABLE_TASKS_KEY}"
        );
    }
}
