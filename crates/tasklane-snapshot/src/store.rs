//! Snapshot storage.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::SnapshotConfig;
use crate::error::SnapshotError;
use crate::snapshot::Snapshot;

const SNAPSHOT_FILE: &str = "tasks.json";

/// Snapshot storage trait.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one.
    async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError>;

    /// Load the most recent snapshot, or `None` if there is none.
    async fn load(&self) -> Result<Option<Snapshot>, SnapshotError>;
}

/// In-memory snapshot store for testing.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshot: tokio::sync::RwLock<Option<Snapshot>>,
}

impl MemorySnapshotStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let mut slot = self.snapshot.write().await;
        *slot = Some(snapshot.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let slot = self.snapshot.read().await;
        Ok(slot.clone())
    }
}

/// File system based snapshot store.
///
/// The complete state lives in a single JSON file:
/// ```text
/// {data_dir}/
/// └── tasks.json
/// ```
///
/// A missing or unreadable snapshot file is not fatal: `load` logs and
/// returns `None`, and the engine starts empty.
pub struct FileSnapshotStore {
    config: SnapshotConfig,
}

impl FileSnapshotStore {
    /// Create a file-backed store, ensuring the data directory exists.
    pub async fn new(config: SnapshotConfig) -> Result<Self, SnapshotError> {
        fs::create_dir_all(&config.data_dir).await?;
        debug!("FileSnapshotStore initialized at {:?}", config.data_dir);
        Ok(Self { config })
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.config.data_dir.join(SNAPSHOT_FILE)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let content = if self.config.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
        .map_err(|e| SnapshotError::Serialization(format!("Failed to serialize snapshot: {e}")))?;

        let path = self.snapshot_path();
        fs::write(&path, content).await?;

        debug!("Saved snapshot of {} tasks to {:?}", snapshot.len(), path);
        Ok(())
    }

    async fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) => {
                debug!("Loaded snapshot of {} tasks from {:?}", snapshot.len(), path);
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!("Failed to deserialize snapshot from {:?}: {}", path, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tasklane_core::{Task, TaskDraft};
    use tempfile::TempDir;

    fn sample_snapshot() -> Snapshot {
        let task = Task::from_draft(
            TaskDraft::new("acme-corp", "Prepare proposal"),
            Utc::now(),
        );
        let mut tasks = HashMap::new();
        tasks.insert(task.id, task.clone());
        let mut index = HashMap::new();
        index.insert("acme-corp".to_string(), vec![task.id]);
        Snapshot::new(tasks, index)
    }

    async fn file_store(dir: &TempDir) -> FileSnapshotStore {
        let config = SnapshotConfig {
            data_dir: dir.path().to_path_buf(),
            pretty: true,
        };
        FileSnapshotStore::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_file_store_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir).await;

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.client_index, snapshot.client_index);
    }

    #[tokio::test]
    async fn test_file_store_load_missing() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir).await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_load_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir).await;

        fs::write(store.snapshot_path(), "not json").await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_save_replaces() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir).await;

        store.save(&sample_snapshot()).await.unwrap();
        let empty = Snapshot::new(HashMap::new(), HashMap::new());
        store.save(&empty).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySnapshotStore::new();
        assert!(store.load().await.unwrap().is_none());

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
