//! Task entity, lifecycle status and mutation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task lifecycle status.
///
/// `Completed` and `Cancelled` are terminal for scheduling purposes;
/// `Overdue` is not and may still become `Completed` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not started yet.
    Pending,
    /// Being worked on.
    InProgress,
    /// Done. Completion instant is recorded on the task.
    Completed,
    /// Abandoned before completion.
    Cancelled,
    /// Past its due date without being completed.
    Overdue,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Overdue => "overdue",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "overdue" => Ok(Self::Overdue),
            _ => Err(format!("unknown task status: {s}")),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low = 0,
    /// Medium priority (default).
    Medium = 1,
    /// High priority.
    High = 2,
    /// Urgent priority.
    Urgent = 3,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// All priority levels, lowest first.
    pub fn all() -> [TaskPriority; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Urgent]
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("unknown task priority: {s}")),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trackable unit of work with optional due date and reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID, assigned at creation, immutable.
    pub id: Uuid,
    /// Owning client ID.
    pub client_id: String,
    /// Task title (non-empty).
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional assignee.
    pub assignee: Option<String>,
    /// Optional due instant.
    pub due_at: Option<DateTime<Utc>>,
    /// Task priority.
    pub priority: TaskPriority,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Whether a reminder should fire for this task.
    pub reminder_enabled: bool,
    /// Reminder instant. Independent of the due instant.
    pub remind_at: Option<DateTime<Utc>>,
    /// Free-form tags, ordered, duplicates permitted.
    pub tags: Vec<String>,
    /// Creation time, immutable.
    pub created_at: DateTime<Utc>,
    /// Last update time, monotonically non-decreasing.
    pub updated_at: DateTime<Utc>,
    /// Completion time, set once when the task first becomes completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Materialize a task from a creation draft.
    pub fn from_draft(draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: draft.client_id,
            title: draft.title,
            description: draft.description,
            assignee: draft.assignee,
            due_at: draft.due_at,
            priority: draft.priority,
            status: TaskStatus::Pending,
            reminder_enabled: draft.reminder_enabled,
            remind_at: draft.remind_at,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Request shape for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub reminder_enabled: bool,
    #[serde(default)]
    pub remind_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaskDraft {
    /// Create a draft with the required fields.
    pub fn new(client_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            title: title.into(),
            description: None,
            assignee: None,
            due_at: None,
            priority: TaskPriority::default(),
            reminder_enabled: false,
            remind_at: None,
            tags: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the assignee.
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Set the due instant.
    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Enable a reminder at the given instant.
    pub fn with_reminder(mut self, remind_at: DateTime<Utc>) -> Self {
        self.reminder_enabled = true;
        self.remind_at = Some(remind_at);
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial update for a task. Absent fields are left unchanged.
///
/// Clearing an optional instant is distinct from leaving it unchanged, so
/// clearing is expressed with the dedicated `clear_due` / `clear_reminder`
/// markers rather than an absent field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    /// Clear the due instant. Takes precedence over `due_at`.
    #[serde(default)]
    pub clear_due: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<DateTime<Utc>>,
    /// Clear the reminder instant. Takes precedence over `remind_at`.
    #[serde(default)]
    pub clear_reminder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the assignee.
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Set the due instant.
    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Clear the due instant.
    pub fn with_due_cleared(mut self) -> Self {
        self.clear_due = true;
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the reminder flag.
    pub fn with_reminder_enabled(mut self, enabled: bool) -> Self {
        self.reminder_enabled = Some(enabled);
        self
    }

    /// Set the reminder instant.
    pub fn with_remind_at(mut self, remind_at: DateTime<Utc>) -> Self {
        self.remind_at = Some(remind_at);
        self
    }

    /// Clear the reminder instant.
    pub fn with_reminder_cleared(mut self) -> Self {
        self.clear_reminder = true;
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Whether the patch changes no fields at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assignee.is_none()
            && self.due_at.is_none()
            && !self.clear_due
            && self.priority.is_none()
            && self.status.is_none()
            && self.reminder_enabled.is_none()
            && self.remind_at.is_none()
            && !self.clear_reminder
            && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
            TaskStatus::Overdue,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            let back: TaskStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_priority_order() {
        assert!(TaskPriority::Urgent > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_priority_roundtrip() {
        for priority in TaskPriority::all() {
            assert_eq!(priority.as_str().parse::<TaskPriority>().unwrap(), priority);
        }
        assert!("critical".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_from_draft() {
        let now = Utc::now();
        let draft = TaskDraft::new("acme-corp", "Write report")
            .with_description("Quarterly report")
            .with_priority(TaskPriority::High)
            .with_tags(vec!["report".to_string(), "q3".to_string()]);

        let task = Task::from_draft(draft, now);
        assert_eq!(task.client_id, "acme-corp");
        assert_eq!(task.title, "Write report");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
        assert!(task.completed_at.is_none());
        assert!(task.due_at.is_none());
        assert!(!task.reminder_enabled);
    }

    #[test]
    fn test_draft_with_reminder() {
        let at = Utc::now();
        let draft = TaskDraft::new("c", "t").with_reminder(at);
        assert!(draft.reminder_enabled);
        assert_eq!(draft.remind_at, Some(at));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TaskPatch::default().is_empty());
        assert!(!TaskPatch::default().with_title("x").is_empty());
        assert!(!TaskPatch::default().with_due_cleared().is_empty());
    }

    #[test]
    fn test_patch_deserialize_missing_fields() {
        let patch: TaskPatch = serde_json::from_str("{\"status\": \"completed\"}").unwrap();
        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert!(patch.title.is_none());
        assert!(!patch.clear_due);
    }
}
