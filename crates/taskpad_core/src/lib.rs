//! Core of taskpad: the task store, its local persistence, and the form and
//! editor state that drive it.

pub mod config;
pub mod editor;
pub mod error;
pub mod form;
pub mod logging;
pub mod model;
pub mod sanitize;
pub mod storage;
pub mod store;
pub mod view;

pub use editor::TaskEditor;
pub use error::AppError;
pub use form::{EditableText, TaskCreator};
pub use model::{NewTask, Task, TaskPatch, TaskStatus};
pub use storage::{FileStorage, KeyValueStorage, LocalStorage, MemoryStorage};
pub use store::{StoreOptions, TaskStore};
pub use view::{Intent, IntentOutcome, ListFilter, TaskListView};
