//! Notification errors.

use thiserror::Error;

/// Notification error types.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level delivery failure.
    #[error("webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The webhook endpoint rejected the notification.
    #[error("webhook returned status {0}")]
    Status(u16),
}
