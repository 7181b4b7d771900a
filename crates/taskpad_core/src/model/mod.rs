//! Domain records shared by the store, forms, and editor.

pub mod task;
pub mod timestamp;

pub use task::{NewTask, Task, TaskPatch, TaskStatus};
