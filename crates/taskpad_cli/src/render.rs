//! Terminal and JSON rendering of tasks.

use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskpad_core::config::Palette;
use taskpad_core::error::AppError;
use taskpad_core::model::Task;
use taskpad_core::store::Counts;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const TITLE_WIDTH: usize = 48;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Pin")]
    pin: &'static str,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl TaskRow {
    fn from_task(task: &Task, offset: UtcOffset) -> Self {
        Self {
            id: task.id.clone(),
            title: shorten(&task.title, TITLE_WIDTH),
            status: task.status.label(),
            pin: if task.pinned { "*" } else { "" },
            assignee: task.assigned_to.clone(),
            created: format_created(task.created_at, offset),
        }
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn format_created(at: OffsetDateTime, offset: UtcOffset) -> String {
    at.to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string())
}

fn shorten(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short = text.chars().take(width.saturating_sub(3)).collect::<String>();
    short.push_str("...");
    short
}

pub fn task_table(tasks: &[Task], offset: UtcOffset) -> String {
    let rows = tasks
        .iter()
        .map(|task| TaskRow::from_task(task, offset))
        .collect::<Vec<_>>();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn summary_line(counts: &Counts) -> String {
    format!(
        "{} tasks: {} pending, {} completed, {} pinned",
        counts.total, counts.pending, counts.completed, counts.pinned
    )
}

pub fn print_tasks(tasks: &[Task], counts: &Counts, palette: &Palette) {
    if tasks.is_empty() {
        println!("{}", palette.mutedize("No tasks."));
        return;
    }
    println!("{}", task_table(tasks, local_offset()));
    println!("{}", palette.mutedize(&summary_line(counts)));
}

pub fn task_details(task: &Task, palette: &Palette, offset: UtcOffset) -> String {
    let mut lines = vec![
        palette.accentize(&task.title),
        format!("  id:        {}", task.id),
        format!("  status:    {}", task.status.label()),
        format!("  pinned:    {}", if task.pinned { "yes" } else { "no" }),
        format!("  assignee:  {}", task.assigned_to),
        format!("  created:   {}", format_created(task.created_at, offset)),
    ];

    if task.description.is_empty() {
        lines.push(palette.mutedize("  (no description)"));
    } else {
        lines.push(String::new());
        lines.extend(task.description.lines().map(|line| format!("  {line}")));
    }

    lines.join("\n")
}

pub fn print_task_details(task: &Task, palette: &Palette) {
    println!("{}", task_details(task, palette, local_offset()));
}

pub fn print_task_json(task: &Task) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(task)?);
    Ok(())
}

pub fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(tasks)?);
    Ok(())
}
