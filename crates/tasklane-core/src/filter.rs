//! Conjunctive task filtering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPriority, TaskStatus};

/// Filter predicate for task listings.
///
/// All present fields must match (conjunction). A task matches the `tags`
/// predicate if at least one requested tag is present on the task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    /// Matches tasks whose due instant is at or before this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_before: Option<DateTime<Utc>>,
    /// Matches tasks whose due instant is at or after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TaskFilter {
    /// Filter scoped to a single client.
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }

    /// Whether a task satisfies every present predicate.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(client_id) = &self.client_id {
            if task.client_id != *client_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(assignee) = &self.assignee {
            if task.assignee.as_deref() != Some(assignee.as_str()) {
                return false;
            }
        }
        if let Some(before) = self.due_before {
            if !task.due_at.is_some_and(|due| due <= before) {
                return false;
            }
        }
        if let Some(after) = self.due_after {
            if !task.due_at.is_some_and(|due| due >= after) {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            if !tags.iter().any(|tag| task.tags.contains(tag)) {
                return false;
            }
        }
        true
    }
}
