//! # Tasklane Snapshot
//!
//! Full-state snapshot persistence for the tasklane engine.
//!
//! ## Features
//!
//! - Task map and client index serialized together as one unit
//! - File-backed store with load-time tolerance for missing/corrupt state
//! - In-memory store for tests

pub mod config;
pub mod error;
pub mod snapshot;
pub mod store;

pub use config::SnapshotConfig;
pub use error::SnapshotError;
pub use snapshot::Snapshot;
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
