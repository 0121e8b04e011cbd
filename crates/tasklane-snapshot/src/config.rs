//! Snapshot configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory holding the snapshot file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Pretty-print the snapshot JSON.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tasklane"))
        .unwrap_or_else(|| PathBuf::from("/tmp/tasklane"))
}

fn default_pretty() -> bool {
    true
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pretty: default_pretty(),
        }
    }
}
