//! # Tasklane Notify
//!
//! Notification dispatch interface for the tasklane engine.
//!
//! The engine hands reminder and overdue alerts to a
//! [`NotificationDispatcher`] fire-and-forget: delivery failures are logged
//! by the caller and never retried.

pub mod dispatcher;
pub mod error;
pub mod notification;

pub use dispatcher::{LogDispatcher, MemoryDispatcher, NotificationDispatcher, WebhookDispatcher};
pub use error::NotifyError;
pub use notification::{Notification, NotificationKind};
