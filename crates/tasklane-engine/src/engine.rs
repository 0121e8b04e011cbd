//! Task lifecycle controller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tasklane_core::{
    Clock, SystemClock, Task, TaskDraft, TaskFilter, TaskPatch, TaskStats, TaskStatus, TaskStore,
};
use tasklane_notify::{Notification, NotificationDispatcher, NotificationKind};
use tasklane_scheduler::{JobHandler, JobKey, JobKind, JobScheduler, SchedulerError};
use tasklane_snapshot::{Snapshot, SnapshotStore};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Task lifecycle controller.
///
/// Owns the task store and job scheduler; mutations flow through here so
/// that store updates, job (re)scheduling and snapshot persistence happen
/// as one logical operation. Jobs are re-validated against current task
/// state when they fire, since the task may have changed or been deleted
/// since scheduling.
pub struct TaskEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    store: TaskStore,
    scheduler: Arc<JobScheduler>,
    snapshots: Arc<dyn SnapshotStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl TaskEngine {
    /// Create an engine on the system clock.
    pub fn new(
        config: EngineConfig,
        snapshots: Arc<dyn SnapshotStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Arc<Self> {
        Self::with_clock(config, snapshots, dispatcher, Arc::new(SystemClock))
    }

    /// Create an engine on a custom clock.
    pub fn with_clock(
        config: EngineConfig,
        snapshots: Arc<dyn SnapshotStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            scheduler: Arc::new(JobScheduler::with_clock(clock.clone())),
            clock,
            store: TaskStore::new(),
            snapshots,
            dispatcher,
        })
    }

    /// Start the engine: restore persisted state, re-arm outstanding jobs
    /// and start the job dispatch loop.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        self.restore().await;
        self.scheduler.run(Arc::clone(self) as Arc<dyn JobHandler>)?;
        info!(
            tasks = self.store.len().await,
            pending_jobs = self.scheduler.pending_len(),
            "task engine started"
        );
        Ok(())
    }

    /// Stop the engine: persist a final snapshot and stop job dispatch.
    ///
    /// Outstanding jobs are not cancelled; they are simply never fired.
    pub async fn shutdown(&self) {
        self.persist().await;
        self.scheduler.shutdown();
        info!("task engine stopped");
    }

    /// Create a task and schedule its jobs.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, EngineError> {
        if draft.title.trim().is_empty() {
            return Err(EngineError::Validation("title must not be empty".into()));
        }

        let task = Task::from_draft(draft, self.clock.now());

        self.store.insert(task.clone()).await;

        if task.reminder_enabled {
            if let Some(remind_at) = task.remind_at {
                self.scheduler.schedule(JobKey::reminder(task.id), remind_at);
            }
        }
        if let Some(due_at) = task.due_at {
            self.scheduler
                .schedule(JobKey::overdue_check(task.id), due_at + self.config.grace());
        }

        info!(task_id = %task.id, title = %task.title, "created task");
        self.persist().await;
        Ok(task)
    }

    /// Look up a task.
    pub async fn get(&self, id: Uuid) -> Result<Task, EngineError> {
        self.store.get(id).await.ok_or(EngineError::NotFound(id))
    }

    /// Apply a partial update, adjusting scheduled jobs as needed.
    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task, EngineError> {
        let mut task = self.store.get(id).await.ok_or(EngineError::NotFound(id))?;

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(EngineError::Validation("title must not be empty".into()));
            }
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(assignee) = patch.assignee {
            task.assignee = Some(assignee);
        }

        // Due changes replace the overdue check; clearing only cancels.
        if patch.clear_due {
            task.due_at = None;
            self.scheduler.cancel(JobKey::overdue_check(id));
        } else if let Some(due_at) = patch.due_at {
            task.due_at = Some(due_at);
            self.scheduler
                .schedule(JobKey::overdue_check(id), due_at + self.config.grace());
        }

        if let Some(priority) = patch.priority {
            task.priority = priority;
        }

        if let Some(status) = patch.status {
            let old_status = task.status;
            task.status = status;
            if status == TaskStatus::Completed && old_status != TaskStatus::Completed {
                // Completion instant is set exactly once; a completed task
                // can no longer be flagged overdue.
                if task.completed_at.is_none() {
                    task.completed_at = Some(self.clock.now());
                }
                self.scheduler.cancel(JobKey::overdue_check(id));
            }
        }

        // Reminder changes are last-write-wins: cancel, then re-schedule
        // from the task's resulting reminder fields.
        let reminder_changed =
            patch.reminder_enabled.is_some() || patch.remind_at.is_some() || patch.clear_reminder;
        if patch.clear_reminder {
            task.remind_at = None;
        } else if let Some(remind_at) = patch.remind_at {
            task.remind_at = Some(remind_at);
        }
        if let Some(enabled) = patch.reminder_enabled {
            task.reminder_enabled = enabled;
        }
        if reminder_changed {
            self.scheduler.cancel(JobKey::reminder(id));
            if task.reminder_enabled {
                if let Some(remind_at) = task.remind_at {
                    self.scheduler.schedule(JobKey::reminder(id), remind_at);
                }
            }
        }

        if let Some(tags) = patch.tags {
            task.tags = tags;
        }

        task.updated_at = self.clock.now();
        self.store.insert(task.clone()).await;

        debug!(task_id = %id, "updated task");
        self.persist().await;
        Ok(task)
    }

    /// Delete a task, cancelling any outstanding jobs for it.
    pub async fn delete(&self, id: Uuid) -> Result<(), EngineError> {
        // Jobs may have already fired or never existed; cancellation of an
        // absent key is a no-op.
        self.scheduler.cancel(JobKey::reminder(id));
        self.scheduler.cancel(JobKey::overdue_check(id));

        if self.store.remove(id).await.is_none() {
            return Err(EngineError::NotFound(id));
        }

        info!(task_id = %id, "deleted task");
        self.persist().await;
        Ok(())
    }

    /// List tasks matching a filter, most recently created first.
    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.store.list(filter).await
    }

    /// Aggregate statistics, optionally scoped to one client.
    pub async fn statistics(&self, client_id: Option<&str>) -> TaskStats {
        let filter = match client_id {
            Some(client_id) => TaskFilter::for_client(client_id),
            None => TaskFilter::default(),
        };
        let tasks = self.store.list(&filter).await;
        TaskStats::from_tasks(&tasks)
    }

    /// Number of tasks currently in the store.
    pub async fn task_count(&self) -> usize {
        self.store.len().await
    }

    /// Number of jobs currently pending in the scheduler.
    pub fn pending_jobs(&self) -> usize {
        self.scheduler.pending_len()
    }

    /// Restore state from the latest snapshot and re-derive jobs.
    ///
    /// Job state is a pure function of task state: jobs are re-armed from
    /// current field values, never from persisted job identifiers. Instants
    /// already in the past are not re-armed, and completed tasks are never
    /// rescheduled.
    async fn restore(&self) {
        let snapshot = match self.snapshots.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("snapshot load failed, starting empty: {e}");
                None
            }
        };
        let Some(snapshot) = snapshot else {
            return;
        };

        let restored = snapshot.len();
        self.store
            .restore(snapshot.tasks, snapshot.client_index)
            .await;

        let now = self.clock.now();
        let mut rearmed = 0usize;
        for task in self.store.list(&TaskFilter::default()).await {
            if task.status == TaskStatus::Completed {
                continue;
            }
            if task.reminder_enabled {
                if let Some(remind_at) = task.remind_at {
                    if remind_at > now {
                        self.scheduler.schedule(JobKey::reminder(task.id), remind_at);
                        rearmed += 1;
                    }
                }
            }
            if let Some(due_at) = task.due_at {
                if due_at > now {
                    self.scheduler
                        .schedule(JobKey::overdue_check(task.id), due_at + self.config.grace());
                    rearmed += 1;
                }
            }
        }

        info!(restored, rearmed, "restored tasks from snapshot");
    }

    /// Persist the complete state.
    ///
    /// Persistence failures are logged and swallowed: the in-memory
    /// mutation has already succeeded, and the engine keeps serving from
    /// memory at the risk of losing the delta on restart.
    async fn persist(&self) {
        let (tasks, client_index) = self.store.export().await;
        let snapshot = Snapshot::new(tasks, client_index);
        if let Err(e) = self.snapshots.save(&snapshot).await {
            warn!("snapshot save failed: {e}");
        }
    }

    /// Hand a notification to the dispatcher, fire-and-forget.
    async fn dispatch(&self, notification: Notification) {
        if let Err(e) = self.dispatcher.notify(&notification).await {
            warn!(task_id = %notification.task_id, "notification dispatch failed: {e}");
        }
    }

    /// A reminder job fired.
    async fn fire_reminder(&self, id: Uuid) -> Result<(), EngineError> {
        let Some(task) = self.store.get(id).await else {
            return Ok(());
        };
        if task.status == TaskStatus::Completed {
            return Ok(());
        }

        let subject = format!("Task Reminder: {}", task.title);
        let mut message = format!("This is a reminder for the task: {}", task.title);
        if let Some(description) = &task.description {
            message.push_str(&format!("\n\nDescription: {description}"));
        }
        if let Some(due_at) = task.due_at {
            message.push_str(&format!("\n\nDue: {}", due_at.format("%Y-%m-%d %H:%M")));
        }
        if let Some(assignee) = &task.assignee {
            message.push_str(&format!("\n\nAssigned to: {assignee}"));
        }

        self.dispatch(Notification::new(
            NotificationKind::TaskReminder,
            task.id,
            task.client_id.clone(),
            subject,
            message,
        ))
        .await;

        info!(task_id = %id, "sent reminder");
        Ok(())
    }

    /// An overdue-check job fired.
    async fn fire_overdue_check(&self, id: Uuid) -> Result<(), EngineError> {
        let Some(task) = self.store.get(id).await else {
            return Ok(());
        };
        if task.status == TaskStatus::Completed {
            return Ok(());
        }
        let Some(due_at) = task.due_at else {
            return Ok(());
        };
        if due_at >= self.clock.now() {
            // The due date moved after this job was queued. Not an error.
            debug!(task_id = %id, "due date no longer past, skipping overdue check");
            return Ok(());
        }

        // Same update path as external mutations, so the update instant and
        // snapshot persistence happen uniformly.
        match self
            .update(id, TaskPatch::default().with_status(TaskStatus::Overdue))
            .await
        {
            Ok(_) => {}
            Err(EngineError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        }

        let subject = format!("Task Overdue: {}", task.title);
        let mut message = format!("The task '{}' is now overdue.", task.title);
        if let Some(assignee) = &task.assignee {
            message.push_str(&format!(" Please follow up with {assignee}."));
        }

        self.dispatch(Notification::new(
            NotificationKind::TaskOverdue,
            task.id,
            task.client_id.clone(),
            subject,
            message,
        ))
        .await;

        info!(task_id = %id, "marked task overdue");
        Ok(())
    }
}

#[async_trait]
impl JobHandler for TaskEngine {
    async fn on_fire(&self, key: JobKey) -> Result<(), SchedulerError> {
        let result = match key.kind {
            JobKind::Reminder => self.fire_reminder(key.task_id).await,
            JobKind::OverdueCheck => self.fire_overdue_check(key.task_id).await,
        };
        result.map_err(|e| SchedulerError::Callback(e.to_string()))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
