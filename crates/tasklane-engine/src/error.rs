//! Engine errors.

use thiserror::Error;
use uuid::Uuid;

use tasklane_scheduler::SchedulerError;
use tasklane_snapshot::SnapshotError;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced task does not exist.
    #[error("Task not found: {0}")]
    NotFound(Uuid),

    /// A field failed validation.
    #[error("Invalid field: {0}")]
    Validation(String),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Snapshot error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}
