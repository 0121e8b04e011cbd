//! Notification payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification kinds emitted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task reminder fired.
    TaskReminder,
    /// A task transitioned to overdue.
    TaskOverdue,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskReminder => "task_reminder",
            Self::TaskOverdue => "task_overdue",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reminder or overdue alert handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub task_id: Uuid,
    pub client_id: String,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Create a notification.
    pub fn new(
        kind: NotificationKind,
        task_id: Uuid,
        client_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            task_id,
            client_id: client_id.into(),
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_snake_case() {
        let json = serde_json::to_string(&NotificationKind::TaskReminder).unwrap();
        assert_eq!(json, "\"task_reminder\"");
        let back: NotificationKind = serde_json::from_str("\"task_overdue\"").unwrap();
        assert_eq!(back, NotificationKind::TaskOverdue);
    }

    #[test]
    fn test_notification_wire_shape() {
        let n = Notification::new(
            NotificationKind::TaskOverdue,
            Uuid::new_v4(),
            "acme-corp",
            "Task Overdue: Prepare proposal",
            "The task 'Prepare proposal' is now overdue.",
        );
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "task_overdue");
        assert_eq!(value["client_id"], "acme-corp");
        assert!(value["task_id"].is_string());
    }
}
