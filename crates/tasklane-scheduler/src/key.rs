//! Composite job keys.

use uuid::Uuid;

/// The two job kinds derived from task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Fires once at the task's reminder instant.
    Reminder,
    /// Fires once at the task's due instant plus the grace offset.
    OverdueCheck,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::OverdueCheck => "overdue_check",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key identifying a scheduled job: one task, one job kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub task_id: Uuid,
    pub kind: JobKind,
}

impl JobKey {
    /// Reminder job key for a task.
    pub fn reminder(task_id: Uuid) -> Self {
        Self {
            task_id,
            kind: JobKind::Reminder,
        }
    }

    /// Overdue-check job key for a task.
    pub fn overdue_check(task_id: Uuid) -> Self {
        Self {
            task_id,
            kind: JobKind::OverdueCheck,
        }
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_distinct_per_kind() {
        let id = Uuid::new_v4();
        assert_ne!(JobKey::reminder(id), JobKey::overdue_check(id));
        assert_eq!(JobKey::reminder(id), JobKey::reminder(id));
    }

    #[test]
    fn test_display() {
        let id = Uuid::new_v4();
        let key = JobKey::reminder(id);
        assert_eq!(key.to_string(), format!("reminder:{id}"));
    }
}
