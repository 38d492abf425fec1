use std::fmt::Display;
use std::path::Path;
use std::time::Duration as StdDuration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Subcommand, ValueEnum};
use now::DateTimeNow;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::storage::journal::TaskJournalImpl;
use crate::tasks::entities::{NewTask, Priority, Recurrence, Task, TaskId, TaskPatch};
use crate::tasks::resetter::{AutoResetter, detect_shutdown};
use crate::tasks::service::{LocalTaskService, TaskService};
use crate::tasks::stats::routine_consistency;
use crate::utils::clock::DefaultClock;
use crate::utils::percentage::Percentage;
use crate::utils::time::next_day_start;

use super::Args;
use super::output::format_task_line;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaskView {
    /// One-off tasks: everything active plus what got done today.
    Inbox,
    /// Recurring tasks that haven't been terminated.
    Routine,
    /// Everything still active, recurring or not.
    Active,
}

impl Display for TaskView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskView::Inbox => write!(f, "inbox"),
            TaskView::Routine => write!(f, "routine"),
            TaskView::Active => write!(f, "active"),
        }
    }
}

const DATE_HELP: &str =
    "Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\"";

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    #[command(about = "Add a task. With --repeat it becomes a routine")]
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "repeat", value_enum)]
        recurrence: Option<Recurrence>,
        #[arg(long, help = DATE_HELP)]
        due: Option<String>,
        #[arg(long = "tag", help = "May be given multiple times")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Edit a task")]
    Edit {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long = "repeat", value_enum)]
        recurrence: Option<Recurrence>,
        #[arg(long, help = DATE_HELP)]
        due: Option<String>,
        #[arg(long = "tag", help = "Replaces the task's tags; may be given multiple times")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "List tasks")]
    List {
        #[arg(long, value_enum, default_value_t = TaskView::Inbox)]
        view: TaskView,
    },
    #[command(about = "Show one task in full")]
    Show {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
    },
    #[command(about = "Check a task off")]
    Done {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
    },
    #[command(about = "Uncheck a task")]
    Undone {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
    },
    #[command(about = "Retire a routine for good, keeping its history")]
    Terminate {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
    },
    #[command(about = "Delete a task outright")]
    Rm {
        #[arg(help = "Task id prefix or exact title")]
        task: String,
    },
    #[command(about = "Show completed tasks between two dates")]
    History {
        #[arg(long = "start", short, help = DATE_HELP)]
        start_date: Option<String>,
        #[arg(long = "end", short, help = DATE_HELP)]
        end_date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
    },
    #[command(about = "Routine consistency over a date range, this week by default")]
    Stats {
        #[arg(long = "start", short, help = DATE_HELP)]
        start_date: Option<String>,
        #[arg(long = "end", short, help = DATE_HELP)]
        end_date: Option<String>,
        #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
        date_style: DateStyle,
        #[arg(short = 'p', long = "percentage", help = "Hide routines below this consistency", default_value_t = Percentage::new_opt(0.).unwrap())]
        min_percentage: Percentage,
    },
    #[command(about = "Keep flipping elapsed routines back to active while running")]
    Autoreset {
        #[arg(long = "every", default_value_t = 30, help = "Check interval in minutes")]
        every: u64,
    },
}

pub async fn process_tasks_command(command: TasksCommand, app_dir: &Path) -> Result<()> {
    let service = open_service(app_dir)?;

    match command {
        TasksCommand::Add {
            title,
            description,
            recurrence,
            due,
            tags,
            priority,
            date_style,
        } => {
            let due_date = due.map(|due| parse_one_date(&due, date_style)).transpose()?;
            let id = service
                .create_task(NewTask {
                    title,
                    description,
                    recurrence,
                    due_date: due_date.map(|date| date.to_utc()),
                    tags,
                    priority,
                })
                .await?;
            println!("Added task {}", id.short());
            Ok(())
        }
        TasksCommand::Edit {
            task,
            title,
            description,
            recurrence,
            due,
            tags,
            priority,
            date_style,
        } => {
            let id = resolve_task(&service, &task).await?;
            let due_date = due.map(|due| parse_one_date(&due, date_style)).transpose()?;
            service
                .update_task(
                    id,
                    TaskPatch {
                        title,
                        description,
                        recurrence,
                        due_date: due_date.map(|date| date.to_utc()),
                        tags: if tags.is_empty() { None } else { Some(tags) },
                        priority,
                    },
                )
                .await?;
            println!("Updated task {}", id.short());
            Ok(())
        }
        TasksCommand::List { view } => {
            // Catch up on routines before querying, the way the dashboard does
            // on load.
            let reset = service.reset_completed_recurring().await?;
            debug!("Reset {reset} routines before listing");

            let tasks = match view {
                TaskView::Inbox => service.inbox_tasks().await?,
                TaskView::Routine => service.routine_tasks().await?,
                TaskView::Active => service.active_tasks().await?,
            };
            if tasks.is_empty() {
                println!("Nothing in the {view} view");
                return Ok(());
            }
            for task in tasks {
                println!("{}", format_task_line(&task));
            }
            Ok(())
        }
        TasksCommand::Show { task } => {
            let id = resolve_task(&service, &task).await?;
            let task = service
                .task(id)
                .await?
                .ok_or_else(|| anyhow!("Task {id} not found"))?;
            print_task_details(&task);
            Ok(())
        }
        TasksCommand::Done { task } => {
            let id = resolve_task(&service, &task).await?;
            service.complete_task(id).await?;
            println!("Done {}", id.short());
            Ok(())
        }
        TasksCommand::Undone { task } => {
            let id = resolve_task(&service, &task).await?;
            service.uncomplete_task(id).await?;
            println!("Reopened {}", id.short());
            Ok(())
        }
        TasksCommand::Terminate { task } => {
            let id = resolve_task(&service, &task).await?;
            service.terminate_task(id).await?;
            println!("Terminated {}", id.short());
            Ok(())
        }
        TasksCommand::Rm { task } => {
            let id = resolve_task(&service, &task).await?;
            service.delete_task(id).await?;
            println!("Deleted {}", id.short());
            Ok(())
        }
        TasksCommand::History {
            start_date,
            end_date,
            date_style,
        } => {
            let week_ago = Local::now().beginning_of_day() - chrono::Duration::days(7);
            let (start, end) = parse_date_range(start_date, end_date, date_style, week_ago)?;

            let completions = service.completions().await?;
            let mut any = false;
            for event in completions {
                let at = event.completed_at.with_timezone(&Local);
                if at < start || at >= end {
                    continue;
                }
                any = true;
                println!("{}\t{}", at.format("%x %H:%M"), event.title);
            }
            if !any {
                println!("Nothing completed in that range");
            }
            Ok(())
        }
        TasksCommand::Stats {
            start_date,
            end_date,
            date_style,
            min_percentage,
        } => {
            let week_start = Local::now().beginning_of_week();
            let (start, end) = parse_date_range(start_date, end_date, date_style, week_start)?;

            let routines = service.routine_tasks().await?;
            let completions = service.completions().await?;
            let stats = routine_consistency(
                &routines,
                &completions,
                start.date_naive(),
                end.date_naive(),
                &Local,
            );
            for entry in stats {
                if entry.consistency < min_percentage {
                    continue;
                }
                println!(
                    "{}%\t{} day(s)\t{}",
                    *entry.consistency as i32, entry.days_completed, entry.title
                );
            }
            Ok(())
        }
        TasksCommand::Autoreset { every } => {
            let shutdown_token = CancellationToken::new();
            let resetter = AutoResetter::new(
                service,
                shutdown_token.clone(),
                StdDuration::from_secs(every * 60),
                Box::new(DefaultClock),
            );
            let (_, run_result) = tokio::join!(detect_shutdown(shutdown_token), resetter.run());
            run_result
        }
    }
}

fn open_service(app_dir: &Path) -> Result<LocalTaskService<TaskJournalImpl>> {
    let journal = TaskJournalImpl::new(app_dir.join("tasks"))?;
    Ok(LocalTaskService::new(journal, Box::new(DefaultClock)))
}

async fn resolve_task(
    service: &LocalTaskService<TaskJournalImpl>,
    needle: &str,
) -> Result<TaskId> {
    let prefix = needle.to_lowercase();
    let tasks = service.all_tasks().await?;
    let matches = tasks
        .iter()
        .filter(|task| {
            task.title.eq_ignore_ascii_case(needle) || task.id.to_string().starts_with(&prefix)
        })
        .collect::<Vec<_>>();
    match matches.as_slice() {
        [task] => Ok(task.id),
        [] => Err(anyhow!("No task matches {needle:?}")),
        _ => Err(anyhow!(
            "{needle:?} is ambiguous: {}",
            matches
                .iter()
                .map(|task| format!("{} ({})", task.title, task.id.short()))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

fn print_task_details(task: &Task) {
    println!("{}", format_task_line(task));
    if let Some(description) = &task.description {
        println!("\t{description}");
    }
    println!(
        "\tcreated {}",
        task.created_at.with_timezone(&Local).format("%x %H:%M")
    );
    if let Some(completed_at) = task.completed_at {
        println!(
            "\tcompleted {}",
            completed_at.with_timezone(&Local).format("%x %H:%M")
        );
    }
    if task.terminated {
        println!("\tterminated");
    }
}

fn parse_one_date(value: &str, date_style: DateStyle) -> Result<DateTime<Local>> {
    match parse_date_string(value, Local::now(), date_style.into()) {
        Ok(date) => Ok(date.with_timezone(&Local)),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value:?}: {e}"),
            )
            .into()),
    }
}

/// Parses an inclusive day range and widens it to whole days: the start drops
/// to its midnight, the end extends to the start of the following day.
fn parse_date_range(
    start_date: Option<String>,
    end_date: Option<String>,
    date_style: DateStyle,
    default_start: DateTime<Local>,
) -> Result<(DateTime<Local>, DateTime<Local>)> {
    let start = match start_date {
        Some(value) => parse_one_date(&value, date_style)?,
        None => default_start,
    };
    let end = match end_date {
        Some(value) => parse_one_date(&value, date_style)?,
        None => Local::now(),
    };
    Ok((start.beginning_of_day(), next_day_start(end)))
}
