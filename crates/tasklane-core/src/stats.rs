//! Per-client task statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPriority, TaskStatus};

/// Aggregate task statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStats {
    /// Total number of tasks.
    pub total: u64,
    /// Number of completed tasks.
    pub completed: u64,
    /// Number of pending tasks.
    pub pending: u64,
    /// Number of overdue tasks.
    pub overdue: u64,
    /// Percentage of tasks completed (0.0 when there are no tasks).
    pub completion_rate: f64,
    /// Task count per priority. Every priority is present, possibly zero.
    pub priority_breakdown: BTreeMap<String, u64>,
}

impl TaskStats {
    /// Compute statistics over a set of tasks.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len() as u64;
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count() as u64;
        let pending = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count() as u64;
        let overdue = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Overdue)
            .count() as u64;

        let mut priority_breakdown = BTreeMap::new();
        for priority in TaskPriority::all() {
            let count = tasks.iter().filter(|t| t.priority == priority).count() as u64;
            priority_breakdown.insert(priority.as_str().to_string(), count);
        }

        let completion_rate = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total,
            completed,
            pending,
            overdue,
            completion_rate,
            priority_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::Utc;

    fn task(status: TaskStatus, priority: TaskPriority) -> Task {
        let mut task = Task::from_draft(
            TaskDraft::new("client", "title").with_priority(priority),
            Utc::now(),
        );
        task.status = status;
        task
    }

    #[test]
    fn test_empty_stats() {
        let stats = TaskStats::from_tasks(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0.0);
        assert_eq!(stats.priority_breakdown.len(), 4);
        assert_eq!(stats.priority_breakdown["medium"], 0);
    }

    #[test]
    fn test_counts_and_rate() {
        let tasks = vec![
            task(TaskStatus::Completed, TaskPriority::High),
            task(TaskStatus::Completed, TaskPriority::Low),
            task(TaskStatus::Pending, TaskPriority::Medium),
            task(TaskStatus::Overdue, TaskPriority::Urgent),
        ];

        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 50.0);
        assert_eq!(stats.priority_breakdown["high"], 1);
        assert_eq!(stats.priority_breakdown["urgent"], 1);
    }

    #[test]
    fn test_in_progress_and_cancelled_count_only_in_total() {
        let tasks = vec![
            task(TaskStatus::InProgress, TaskPriority::Medium),
            task(TaskStatus::Cancelled, TaskPriority::Medium),
        ];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.overdue, 0);
    }
}
