//! Snapshot payload.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tasklane_core::Task;

/// Complete engine state, serialized as one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// All tasks by ID.
    pub tasks: HashMap<Uuid, Task>,
    /// Task IDs per client, in insertion order.
    pub client_index: HashMap<String, Vec<Uuid>>,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from exported store state.
    pub fn new(tasks: HashMap<Uuid, Task>, client_index: HashMap<String, Vec<Uuid>>) -> Self {
        Self {
            tasks,
            client_index,
            saved_at: Utc::now(),
        }
    }

    /// Number of tasks in the snapshot.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the snapshot holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
