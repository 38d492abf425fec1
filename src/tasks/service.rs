use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Local;

use crate::storage::journal::{
    CompletionEvent, TaskJournal, TaskRecord, completion_events, fold_records,
};
use crate::utils::clock::Clock;

use super::entities::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
use super::recurrence::should_reset;

/// The mutation/query surface the dashboard talks to. Every call is scoped to
/// the local user; there is no cross-session sharing behind this trait.
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn create_task(&self, new_task: NewTask) -> Result<TaskId>;
    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<()>;
    async fn complete_task(&self, id: TaskId) -> Result<()>;
    async fn uncomplete_task(&self, id: TaskId) -> Result<()>;
    /// Retires a recurring task for good. It keeps its history but leaves
    /// every view.
    async fn terminate_task(&self, id: TaskId) -> Result<()>;
    async fn delete_task(&self, id: TaskId) -> Result<()>;
    /// Flips completed recurring tasks whose window has elapsed back to
    /// active. Returns how many were reset.
    async fn reset_completed_recurring(&self) -> Result<usize>;

    async fn task(&self, id: TaskId) -> Result<Option<Task>>;
    async fn active_tasks(&self) -> Result<Vec<Task>>;
    async fn routine_tasks(&self) -> Result<Vec<Task>>;
    async fn inbox_tasks(&self) -> Result<Vec<Task>>;
}

/// [TaskService] over the local journal.
pub struct LocalTaskService<J> {
    journal: J,
    clock: Box<dyn Clock>,
}

impl<J: TaskJournal> LocalTaskService<J> {
    pub fn new(journal: J, clock: Box<dyn Clock>) -> Self {
        Self { journal, clock }
    }

    /// Current state of every task on record, in creation order.
    pub async fn all_tasks(&self) -> Result<Vec<Task>> {
        Ok(fold_records(self.journal.records().await?))
    }

    async fn find(&self, id: TaskId) -> Result<Task> {
        self.all_tasks()
            .await?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| anyhow!("Task {id} not found"))
    }

    async fn put(&self, task: Task) -> Result<()> {
        let date = self.clock.time().date_naive();
        self.journal.append(date, TaskRecord::Put { task }).await
    }

    /// Every distinct completion on record, oldest first. Not part of
    /// [TaskService] -- it reads journal history rather than current state.
    pub async fn completions(&self) -> Result<Vec<CompletionEvent>> {
        Ok(completion_events(&self.journal.records().await?))
    }
}

#[async_trait]
impl<J: TaskJournal> TaskService for LocalTaskService<J> {
    async fn create_task(&self, new_task: NewTask) -> Result<TaskId> {
        let task = Task::create(new_task, self.clock.time());
        let id = task.id;
        self.put(task).await?;
        Ok(id)
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<()> {
        let mut task = self.find(id).await?;
        task.apply_patch(patch);
        self.put(task).await
    }

    async fn complete_task(&self, id: TaskId) -> Result<()> {
        let mut task = self.find(id).await?;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(self.clock.time());
        self.put(task).await
    }

    async fn uncomplete_task(&self, id: TaskId) -> Result<()> {
        let mut task = self.find(id).await?;
        task.status = TaskStatus::Active;
        task.completed_at = None;
        self.put(task).await
    }

    async fn terminate_task(&self, id: TaskId) -> Result<()> {
        let mut task = self.find(id).await?;
        task.terminated = true;
        task.status = TaskStatus::Completed;
        task.completed_at = Some(self.clock.time());
        self.put(task).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<()> {
        // Deleting something that's already gone is an error, same as updates.
        let task = self.find(id).await?;
        let date = self.clock.time().date_naive();
        self.journal
            .append(date, TaskRecord::Remove { id: task.id })
            .await
    }

    async fn reset_completed_recurring(&self) -> Result<usize> {
        let now = self.clock.time().with_timezone(&Local);
        let mut reset_count = 0;
        for task in self.all_tasks().await? {
            let (Some(recurrence), Some(completed_at)) = (task.recurrence, task.completed_at)
            else {
                continue;
            };
            if task.status != TaskStatus::Completed {
                continue;
            }
            if should_reset(recurrence, &completed_at.with_timezone(&Local), &now) {
                let mut task = task;
                task.status = TaskStatus::Active;
                task.completed_at = None;
                self.put(task).await?;
                reset_count += 1;
            }
        }
        Ok(reset_count)
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>> {
        Ok(self.all_tasks().await?.into_iter().find(|task| task.id == id))
    }

    async fn active_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .all_tasks()
            .await?
            .into_iter()
            .filter(Task::is_active)
            .collect())
    }

    async fn routine_tasks(&self) -> Result<Vec<Task>> {
        Ok(self
            .all_tasks()
            .await?
            .into_iter()
            .filter(Task::is_routine)
            .collect())
    }

    async fn inbox_tasks(&self) -> Result<Vec<Task>> {
        let now = self.clock.time().with_timezone(&Local);
        Ok(self
            .all_tasks()
            .await?
            .into_iter()
            .filter(|task| task.is_inbox(&now))
            .collect())
    }
}
