//! In-memory task store with a client index.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::filter::TaskFilter;
use crate::task::Task;

/// Task map and client index, guarded together.
///
/// Both maps live under one lock so that no reader ever observes a task
/// present in the store but missing from the index, or vice versa.
#[derive(Debug, Default)]
struct StoreInner {
    tasks: HashMap<Uuid, Task>,
    client_index: HashMap<String, Vec<Uuid>>,
}

/// In-memory task store.
///
/// Owns task identity for the lifetime of the process. Constructed once
/// per engine, never shared as ambient global state.
#[derive(Debug, Default)]
pub struct TaskStore {
    inner: RwLock<StoreInner>,
}

impl TaskStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a task by ID.
    ///
    /// Newly inserted tasks are appended to their client's index entry;
    /// replacing an existing task leaves the index untouched.
    pub async fn insert(&self, task: Task) {
        let mut inner = self.inner.write().await;
        let newly_inserted = !inner.tasks.contains_key(&task.id);
        if newly_inserted {
            inner
                .client_index
                .entry(task.client_id.clone())
                .or_default()
                .push(task.id);
        }
        debug!(task_id = %task.id, newly_inserted, "storing task");
        inner.tasks.insert(task.id, task);
    }

    /// Look up a task by ID.
    pub async fn get(&self, id: Uuid) -> Option<Task> {
        let inner = self.inner.read().await;
        inner.tasks.get(&id).cloned()
    }

    /// List tasks matching a filter, most recently created first.
    pub async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Remove a task and its client index entry.
    ///
    /// Returns the removed task, or `None` if the ID was unknown.
    pub async fn remove(&self, id: Uuid) -> Option<Task> {
        let mut inner = self.inner.write().await;
        let task = inner.tasks.remove(&id)?;
        if let Some(ids) = inner.client_index.get_mut(&task.client_id) {
            ids.retain(|tid| *tid != id);
            if ids.is_empty() {
                inner.client_index.remove(&task.client_id);
            }
        }
        debug!(task_id = %id, "removed task");
        Some(task)
    }

    /// Task IDs for a client, in insertion order.
    pub async fn tasks_for_client(&self, client_id: &str) -> Vec<Uuid> {
        let inner = self.inner.read().await;
        inner
            .client_index
            .get(client_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Export the complete state for snapshotting.
    pub async fn export(&self) -> (HashMap<Uuid, Task>, HashMap<String, Vec<Uuid>>) {
        let inner = self.inner.read().await;
        (inner.tasks.clone(), inner.client_index.clone())
    }

    /// Replace the complete state from a snapshot.
    pub async fn restore(
        &self,
        tasks: HashMap<Uuid, Task>,
        client_index: HashMap<String, Vec<Uuid>>,
    ) {
        let mut inner = self.inner.write().await;
        debug!(tasks = tasks.len(), "restoring task store");
        inner.tasks = tasks;
        inner.client_index = client_index;
    }

    /// Number of tasks in the store.
    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    /// Whether the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.tasks.is_empty()
    }
}
