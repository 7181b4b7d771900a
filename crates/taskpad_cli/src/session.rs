//! One CLI session: the store, the editor and the list view, driven by parsed
//! commands.

use crate::cli::{Cli, Command};
use crate::render;
use log::debug;
use std::time::Instant;
use taskpad_core::config::{Config, Palette, canonical_key};
use taskpad_core::error::AppError;
use taskpad_core::model::{Task, TaskPatch, TaskStatus};
use taskpad_core::storage::KeyValueStorage;
use taskpad_core::store::TaskStore;
use taskpad_core::{Intent, IntentOutcome, ListFilter, TaskCreator, TaskEditor, TaskListView};

pub struct Session<S: KeyValueStorage> {
    store: TaskStore<S>,
    editor: TaskEditor,
    view: TaskListView,
    palette: Palette,
}

impl<S: KeyValueStorage> Session<S> {
    pub fn new(mut store: TaskStore<S>, config: &Config) -> Self {
        store.subscribe(|tasks| {
            debug!(
                "event=store_change module=cli status=ok tasks={}",
                tasks.len()
            )
        });

        Self {
            store,
            editor: TaskEditor::new(config.autosave_delay()),
            view: TaskListView::default(),
            palette: config.palette(),
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn editor(&self) -> &TaskEditor {
        &self.editor
    }

    pub fn run(&mut self, cli: Cli) -> Result<(), AppError> {
        self.run_at(cli, Instant::now())
    }

    /// Runs one command. `now` stamps editor edits for the autosave timer.
    pub fn run_at(&mut self, cli: Cli, now: Instant) -> Result<(), AppError> {
        let json = cli.json;
        match cli.command {
            Command::Add { title, description } => {
                let mut creator = TaskCreator::new();
                creator.title.input(title.as_deref().unwrap_or_default());
                creator
                    .description
                    .input(description.as_deref().unwrap_or_default());
                let input = creator
                    .submit()
                    .ok_or_else(|| AppError::invalid_input("title is required"))?;

                let task = match self.dispatch(Intent::Create(input))? {
                    IntentOutcome::Created(task) => task,
                    other => return Err(unexpected(other)),
                };
                report(json, &task, "Added task")?;
            }
            Command::List { filter } => {
                self.view.filter = filter.parse::<ListFilter>()?;
                let tasks = self.view.visible(&self.store);
                if json {
                    render::print_tasks_json(&tasks)?;
                } else {
                    render::print_tasks(&tasks, &self.store.counts(), &self.palette);
                }
            }
            Command::Show { id } => {
                let task = self.store.get_by_id(&id).ok_or_else(|| not_found(&id))?;
                if json {
                    render::print_task_json(&task)?;
                } else {
                    render::print_task_details(&task, &self.palette);
                }
            }
            Command::Edit {
                id,
                title,
                description,
                status,
                assignee,
            } => {
                let mut patch = TaskPatch::default();
                if let Some(title) = title {
                    patch = patch.title(title);
                }
                if let Some(description) = description {
                    patch = patch.description(description);
                }
                if let Some(status) = status {
                    patch = patch.status(status.parse::<TaskStatus>()?);
                }
                if let Some(assignee) = assignee {
                    patch = patch.assigned_to(assignee);
                }
                if patch.is_empty() {
                    return Err(AppError::invalid_input(
                        "nothing to update; pass --title, --description, --status or --assignee",
                    ));
                }

                let task = self.store.update(&id, patch)?.ok_or_else(|| not_found(&id))?;
                self.refresh_editor(&id);
                report(json, &task, "Updated task")?;
            }
            Command::Delete { id } => {
                let task = self.updated(Intent::Delete(id))?;
                report(json, &task, "Deleted task")?;
            }
            Command::Pin { id } => {
                let task = self.updated(Intent::TogglePin(id.clone()))?;
                self.refresh_editor(&id);
                let label = if task.pinned { "Pinned task" } else { "Unpinned task" };
                report(json, &task, label)?;
            }
            Command::Done { id } => {
                let task = self.updated(Intent::ToggleComplete(id.clone()))?;
                self.refresh_editor(&id);
                let label = if task.is_completed() {
                    "Completed task"
                } else {
                    "Reopened task"
                };
                report(json, &task, label)?;
            }
            Command::Open { id } => {
                if self.editor.has_pending_save() {
                    self.save_pending(json)?;
                }
                match self.dispatch(Intent::OpenEditor(id.clone()))? {
                    IntentOutcome::EditorOpened(_) => {}
                    IntentOutcome::NotFound(id) => return Err(not_found(&id)),
                    other => return Err(unexpected(other)),
                }
                let task = self.store.get_by_id(&id).ok_or_else(|| not_found(&id))?;
                report(json, &task, "Editing task")?;
            }
            Command::Set { field, value } => {
                let value = value.unwrap_or_default();
                self.set_field(&field, &value, now)?;
            }
            Command::Save => self.save_pending(json)?,
            Command::Close => {
                let discarded = self.editor.has_pending_save();
                self.dispatch(Intent::CloseEditor)?;
                if discarded {
                    println!("Closed editor; unsaved changes discarded");
                } else {
                    println!("Closed editor");
                }
            }
        }

        Ok(())
    }

    /// Lets the editor autosave once its quiet period has passed.
    pub fn tick(&mut self, now: Instant) -> Option<Task> {
        self.editor.tick(&mut self.store, now)
    }

    /// Saves whatever the editor still holds. Used when the session ends.
    pub fn finish(&mut self) -> Option<Task> {
        self.editor.flush(&mut self.store)
    }

    fn dispatch(&mut self, intent: Intent) -> Result<IntentOutcome, AppError> {
        self.view.dispatch(&mut self.store, &mut self.editor, intent)
    }

    fn updated(&mut self, intent: Intent) -> Result<Task, AppError> {
        match self.dispatch(intent)? {
            IntentOutcome::Updated(task) | IntentOutcome::Deleted(task) => Ok(task),
            IntentOutcome::NotFound(id) => Err(not_found(&id)),
            other => Err(unexpected(other)),
        }
    }

    /// Reloads the editor form after a direct change to the task it holds,
    /// unless the form carries edits of its own.
    fn refresh_editor(&mut self, id: &str) {
        if self.editor.task_id() == Some(id) && !self.editor.has_pending_save() {
            self.editor.open(&self.store, id);
        }
    }

    fn set_field(&mut self, field: &str, value: &str, now: Instant) -> Result<(), AppError> {
        let Some(form) = self.editor.form() else {
            return Err(AppError::invalid_input(
                "no task is open; run `open <id>` first",
            ));
        };
        let pinned = form.pinned;

        let field = canonical_key(field);
        let changed = match field.as_str() {
            "title" => self.editor.set_title(value, now),
            "description" => self.editor.set_description(value, now),
            "status" => self
                .editor
                .set_status(value.parse::<TaskStatus>()?, now),
            "assignee" | "assigned_to" => self.editor.set_assignee(value, now),
            "pinned" | "pin" => {
                parse_flag(value)? != pinned && self.editor.toggle_pin(now)
            }
            other => {
                return Err(AppError::invalid_input(format!(
                    "unknown field '{other}'; expected title|description|status|assignee|pinned"
                )));
            }
        };

        if !changed {
            println!("No change to {field}");
        } else if self.editor.form().is_some_and(|form| !form.is_valid()) {
            println!(
                "{}",
                self.palette
                    .mutedize("Title is required; changes are held until it is set")
            );
        } else {
            println!(
                "Changed {field}; saving after {}ms without edits",
                self.editor.delay().as_millis()
            );
        }
        Ok(())
    }

    fn save_pending(&mut self, json: bool) -> Result<(), AppError> {
        if !self.editor.has_pending_save() {
            println!("No pending changes");
            return Ok(());
        }

        match self.editor.flush(&mut self.store) {
            Some(task) => report(json, &task, "Saved task"),
            None if self.editor.form().is_some_and(|form| !form.is_valid()) => {
                Err(AppError::invalid_input("title is required"))
            }
            None => Err(AppError::not_found("the edited task no longer exists")),
        }
    }
}

fn report(json: bool, task: &Task, label: &str) -> Result<(), AppError> {
    if json {
        render::print_task_json(task)
    } else {
        println!("{label}: {} ({})", task.title, task.id);
        Ok(())
    }
}

fn not_found(id: &str) -> AppError {
    AppError::not_found(format!("task not found: {id}"))
}

fn unexpected(outcome: IntentOutcome) -> AppError {
    AppError::invalid_data(format!("unexpected outcome: {outcome:?}"))
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(AppError::invalid_input(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}
