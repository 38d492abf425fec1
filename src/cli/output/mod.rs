pub mod grid;

use chrono::Local;

use crate::tasks::entities::{Task, TaskStatus};

/// One task per line: checkbox, short id, title, then whatever metadata the
/// task actually carries.
pub fn format_task_line(task: &Task) -> String {
    let marker = match task.status {
        TaskStatus::Active => "[ ]",
        TaskStatus::Completed => "[x]",
    };
    let mut line = format!("{marker} {}\t{}", task.id.short(), task.title);
    if let Some(recurrence) = task.recurrence {
        line += &format!(" ({recurrence})");
    }
    if let Some(priority) = task.priority {
        line += &format!(" !{priority}");
    }
    if let Some(due) = task.due_date {
        line += &format!(" due {}", due.with_timezone(&Local).format("%x"));
    }
    for tag in &task.tags {
        line += &format!(" #{tag}");
    }
    line
}
