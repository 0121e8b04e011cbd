//! Scheduler errors.

use thiserror::Error;

/// Scheduler error types.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The dispatch loop was already started.
    #[error("dispatch loop already running")]
    AlreadyRunning,

    /// A job callback failed.
    #[error("job callback failed: {0}")]
    Callback(String),
}
