//! Engine configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed delay after a task's due instant before it is checked for
    /// overdue status, in seconds. Not configurable per task.
    #[serde(default = "default_overdue_grace_secs")]
    pub overdue_grace_secs: u64,
}

fn default_overdue_grace_secs() -> u64 {
    300
}

impl EngineConfig {
    /// The grace offset as a duration.
    pub fn grace(&self) -> Duration {
        Duration::seconds(self.overdue_grace_secs as i64)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overdue_grace_secs: default_overdue_grace_secs(),
        }
    }
}
