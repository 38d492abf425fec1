use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A to-do item. Recurring tasks flip back from completed to active when
/// their recurrence window elapses; terminating one retires it for good while
/// keeping its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub terminated: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Arguments for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
}

/// Partial update for a task. Fields left as `None` keep their current value;
/// a recurrence, once set, cannot be cleared through a patch.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub priority: Option<Priority>,
}

impl Task {
    pub fn create(new_task: NewTask, created_at: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            title: new_task.title,
            description: new_task.description,
            status: TaskStatus::Active,
            recurrence: new_task.recurrence,
            due_date: new_task.due_date,
            completed_at: None,
            terminated: false,
            created_at,
            tags: new_task.tags,
            priority: new_task.priority,
        }
    }

    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(recurrence) = patch.recurrence {
            self.recurrence = Some(recurrence);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(priority) = patch.priority {
            self.priority = Some(priority);
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active && !self.terminated
    }

    /// Recurring tasks make up the routine view, terminated ones drop out.
    pub fn is_routine(&self) -> bool {
        self.recurrence.is_some() && !self.terminated
    }

    /// Whether the task was completed on the same calendar day as `now`, in
    /// that timestamp's timezone.
    pub fn completed_on<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.completed_at
            .map(|at| at.with_timezone(&now.timezone()).date_naive() == now.date_naive())
            .unwrap_or(false)
    }

    /// Inbox shows one-off tasks: everything still active, plus what got done
    /// today so it can still be unchecked.
    pub fn is_inbox<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.recurrence.is_none() && (self.status == TaskStatus::Active || self.completed_on(now))
    }
}
