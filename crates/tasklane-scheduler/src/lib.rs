//! # Tasklane Scheduler
//!
//! One-shot job scheduling for the tasklane engine.
//!
//! ## Features
//!
//! - Composite job keys (task ID + job kind), at most one pending timer per key
//! - Atomic cancel-then-replace on re-scheduling an existing key
//! - Clock-driven dispatch loop decoupled from job submission
//! - Pluggable time source for deterministic tests

pub mod error;
pub mod key;
pub mod scheduler;

pub use error::SchedulerError;
pub use key::{JobKey, JobKind};
pub use scheduler::{JobHandle, JobHandler, JobScheduler};
