//! Single-task editor with debounced auto-save.
//!
//! # State machine
//! - `Closed -> Open(id)` via [`TaskEditor::open`]; the task is read once.
//! - Every field edit while open restarts the autosave deadline.
//! - [`TaskEditor::tick`] saves once the deadline passes with no new edits.
//! - `Open -> Closed` via [`TaskEditor::close`], which drops a pending save.

pub mod debounce;

pub use debounce::{DEFAULT_AUTOSAVE_DELAY, Debouncer};

use crate::form::EditableText;
use crate::model::{Task, TaskPatch, TaskStatus};
use crate::storage::KeyValueStorage;
use crate::store::TaskStore;
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use time::OffsetDateTime;

/// Editable copy of one task.
#[derive(Debug)]
pub struct EditorForm {
    pub title: EditableText,
    pub description: EditableText,
    pub status: TaskStatus,
    pub assigned_to: String,
    pub pinned: bool,
    created_at: OffsetDateTime,
}

impl EditorForm {
    fn from_task(task: &Task) -> Self {
        let mut title = EditableText::required().with_placeholder("Task title");
        title.set_value(task.title.clone());
        let mut description = EditableText::new().with_placeholder("Add a description");
        description.set_value(task.description.clone());

        Self {
            title,
            description,
            status: task.status,
            assigned_to: task.assigned_to.clone(),
            pinned: task.pinned,
            created_at: task.created_at,
        }
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn is_valid(&self) -> bool {
        self.title.is_valid() && self.description.is_valid()
    }

    fn to_patch(&self) -> TaskPatch {
        TaskPatch::default()
            .title(self.title.value())
            .description(self.description.value())
            .status(self.status)
            .assigned_to(self.assigned_to.clone())
            .pinned(self.pinned)
    }
}

#[derive(Debug)]
struct EditorSession {
    task_id: String,
    form: EditorForm,
    autosave: Debouncer,
}

#[derive(Debug)]
pub struct TaskEditor {
    delay: Duration,
    session: Option<EditorSession>,
}

impl Default for TaskEditor {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl TaskEditor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            session: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Opens the task with `id`, replacing any open session.
    ///
    /// Returns `false` and stays closed when the id is unknown.
    pub fn open<S: KeyValueStorage>(&mut self, store: &TaskStore<S>, id: &str) -> bool {
        self.close();

        let Some(task) = store.get_by_id(id) else {
            debug!("event=editor_open module=editor status=not_found id={id}");
            return false;
        };

        info!("event=editor_open module=editor status=ok id={id}");
        self.session = Some(EditorSession {
            task_id: task.id.clone(),
            form: EditorForm::from_task(&task),
            autosave: Debouncer::new(self.delay),
        });
        true
    }

    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            if session.autosave.is_pending() {
                debug!(
                    "event=editor_close module=editor status=pending_save_dropped id={}",
                    session.task_id
                );
            }
            info!(
                "event=editor_close module=editor status=ok id={}",
                session.task_id
            );
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn task_id(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.task_id.as_str())
    }

    pub fn form(&self) -> Option<&EditorForm> {
        self.session.as_ref().map(|session| &session.form)
    }

    pub fn has_pending_save(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.autosave.is_pending())
    }

    /// When the pending save becomes due, if one is scheduled.
    pub fn save_due_at(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|session| session.autosave.deadline())
    }

    pub fn set_title(&mut self, value: &str, now: Instant) -> bool {
        self.edit(now, |form| form.title.input(value))
    }

    pub fn set_description(&mut self, value: &str, now: Instant) -> bool {
        self.edit(now, |form| form.description.input(value))
    }

    pub fn set_status(&mut self, status: TaskStatus, now: Instant) -> bool {
        self.edit(now, |form| {
            form.status = status;
            true
        })
    }

    pub fn set_assignee(&mut self, assignee: &str, now: Instant) -> bool {
        self.edit(now, |form| {
            form.assigned_to = assignee.trim().to_string();
            true
        })
    }

    pub fn toggle_pin(&mut self, now: Instant) -> bool {
        self.edit(now, |form| {
            form.pinned = !form.pinned;
            true
        })
    }

    /// Saves if the autosave deadline has passed. Returns the saved task.
    pub fn tick<S: KeyValueStorage>(
        &mut self,
        store: &mut TaskStore<S>,
        now: Instant,
    ) -> Option<Task> {
        let due = self
            .session
            .as_mut()
            .is_some_and(|session| session.autosave.fire(now));
        if due { self.save(store) } else { None }
    }

    /// Saves a pending edit immediately instead of waiting for the deadline.
    pub fn flush<S: KeyValueStorage>(&mut self, store: &mut TaskStore<S>) -> Option<Task> {
        let session = self.session.as_mut()?;
        if !session.autosave.is_pending() {
            return None;
        }
        session.autosave.cancel();
        self.save(store)
    }

    fn edit<F>(&mut self, now: Instant, change: F) -> bool
    where
        F: FnOnce(&mut EditorForm) -> bool,
    {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !change(&mut session.form) {
            return false;
        }
        session.autosave.schedule(now);
        true
    }

    fn save<S: KeyValueStorage>(&mut self, store: &mut TaskStore<S>) -> Option<Task> {
        let session = self.session.as_mut()?;
        if !session.form.is_valid() {
            session.form.title.mark_as_touched();
            debug!(
                "event=editor_save module=editor status=skipped_invalid id={}",
                session.task_id
            );
            return None;
        }

        match store.update(&session.task_id, session.form.to_patch()) {
            Ok(Some(task)) => {
                debug!("event=editor_save module=editor status=ok id={}", task.id);
                Some(task)
            }
            Ok(None) => {
                warn!(
                    "event=editor_save module=editor status=not_found id={}",
                    session.task_id
                );
                self.session = None;
                None
            }
            Err(err) => {
                warn!(
                    "event=editor_save module=editor status=error id={} code={} error={}",
                    session.task_id,
                    err.code(),
                    err.message()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskEditor;
    use crate::model::{NewTask, TaskStatus};
    use crate::storage::MemoryStorage;
    use crate::store::TaskStore;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    const DELAY: Duration = Duration::from_millis(900);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn setup() -> (TaskStore<MemoryStorage>, String, Rc<Cell<usize>>) {
        let mut store = TaskStore::initialize(MemoryStorage::new());
        let id = store.create(NewTask::new("Buy milk", "")).unwrap().id;
        let saves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&saves);
        store.subscribe(move |_| counter.set(counter.get() + 1));
        (store, id, saves)
    }

    #[test]
    fn open_loads_snapshot_into_form() {
        let (store, id, _) = setup();
        let mut editor = TaskEditor::new(DELAY);

        assert!(editor.open(&store, &id));

        let form = editor.form().unwrap();
        assert_eq!(editor.task_id(), Some(id.as_str()));
        assert_eq!(form.title.value(), "Buy milk");
        assert_eq!(form.status, TaskStatus::Pending);
        assert!(!editor.has_pending_save());
    }

    #[test]
    fn open_unknown_id_stays_closed() {
        let (store, _, _) = setup();
        let mut editor = TaskEditor::new(DELAY);

        assert!(!editor.open(&store, "task-missing"));
        assert!(!editor.is_open());
        assert!(!editor.set_title("x", Instant::now()));
    }

    #[test]
    fn rapid_edits_produce_one_save_with_latest_title() {
        let (mut store, id, saves) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        editor.set_title("Buy oat milk", start);
        assert!(editor.tick(&mut store, start + ms(300)).is_none());
        editor.set_title("Buy soy milk", start + ms(400));

        assert!(editor.tick(&mut store, start + ms(1000)).is_none());
        let saved = editor.tick(&mut store, start + ms(1300)).unwrap();
        assert!(editor.tick(&mut store, start + ms(5000)).is_none());

        assert_eq!(saved.title, "Buy soy milk");
        assert_eq!(saves.get(), 1);
        assert_eq!(store.get_by_id(&id).unwrap().title, "Buy soy milk");
    }

    #[test]
    fn close_discards_pending_save() {
        let (mut store, id, saves) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        editor.set_title("never saved", start);
        editor.close();

        assert!(editor.tick(&mut store, start + ms(2000)).is_none());
        assert_eq!(saves.get(), 0);
        assert_eq!(store.get_by_id(&id).unwrap().title, "Buy milk");
    }

    #[test]
    fn status_pin_and_assignee_edits_are_saved_together() {
        let (mut store, id, saves) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        editor.set_status(TaskStatus::Completed, start);
        editor.toggle_pin(start + ms(100));
        editor.set_assignee(" Jane Smith ", start + ms(200));
        let saved = editor.tick(&mut store, start + ms(1100)).unwrap();

        assert_eq!(saved.status, TaskStatus::Completed);
        assert!(saved.pinned);
        assert_eq!(saved.assigned_to, "Jane Smith");
        assert_eq!(saves.get(), 1);
    }

    #[test]
    fn invalid_form_is_not_saved() {
        let (mut store, id, saves) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        editor.set_title("  ", start);

        assert!(editor.tick(&mut store, start + ms(1000)).is_none());
        assert_eq!(saves.get(), 0);
        assert!(editor.form().unwrap().title.is_invalid());
    }

    #[test]
    fn flush_saves_immediately_and_clears_timer() {
        let (mut store, id, saves) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        assert!(editor.flush(&mut store).is_none());
        editor.set_description("from the corner shop", start);
        let saved = editor.flush(&mut store).unwrap();

        assert_eq!(saved.description, "from the corner shop");
        assert!(!editor.has_pending_save());
        assert!(editor.tick(&mut store, start + ms(2000)).is_none());
        assert_eq!(saves.get(), 1);
    }

    #[test]
    fn save_after_external_delete_closes_editor() {
        let (mut store, id, _) = setup();
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);
        editor.set_title("renamed", start);

        store.delete(&id);

        assert!(editor.tick(&mut store, start + ms(1000)).is_none());
        assert!(!editor.is_open());
        assert!(store.is_empty());
    }

    #[test]
    fn reopening_replaces_the_session() {
        let (mut store, first, saves) = setup();
        let second = store.create(NewTask::new("Walk dog", "")).unwrap().id;
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        let baseline = saves.get();

        editor.open(&store, &first);
        editor.set_title("dropped", start);
        editor.open(&store, &second);

        assert_eq!(editor.task_id(), Some(second.as_str()));
        assert!(!editor.has_pending_save());
        assert!(editor.tick(&mut store, start + ms(2000)).is_none());
        assert_eq!(saves.get(), baseline);
    }

    #[test]
    fn created_at_is_carried_but_not_editable() {
        let (mut store, id, _) = setup();
        let original = store.get_by_id(&id).unwrap().created_at;
        let mut editor = TaskEditor::new(DELAY);
        let start = Instant::now();
        editor.open(&store, &id);

        editor.set_title("later", start);
        let saved = editor.tick(&mut store, start + DELAY).unwrap();

        assert_eq!(editor.form().unwrap().created_at(), original);
        assert_eq!(saved.created_at, original);
    }
}
