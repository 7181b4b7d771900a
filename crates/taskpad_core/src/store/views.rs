//! Pure derivations over a task collection.
//!
//! Every view returns owned snapshots ordered newest first, so callers never
//! observe the insertion order of the underlying collection.

use crate::model::{Task, TaskStatus};

pub fn by_recency(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|left, right| right.created_at.cmp(&left.created_at));
    sorted
}

pub fn with_status(tasks: &[Task], status: TaskStatus) -> Vec<Task> {
    by_recency(tasks)
        .into_iter()
        .filter(|task| task.status == status)
        .collect()
}

pub fn pending(tasks: &[Task]) -> Vec<Task> {
    with_status(tasks, TaskStatus::Pending)
}

pub fn completed(tasks: &[Task]) -> Vec<Task> {
    with_status(tasks, TaskStatus::Completed)
}

pub fn pinned(tasks: &[Task]) -> Vec<Task> {
    by_recency(tasks)
        .into_iter()
        .filter(|task| task.pinned)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub pinned: usize,
}

pub fn counts(tasks: &[Task]) -> Counts {
    tasks.iter().fold(
        Counts {
            total: tasks.len(),
            ..Counts::default()
        },
        |mut counts, task| {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
            if task.pinned {
                counts.pinned += 1;
            }
            counts
        },
    )
}
