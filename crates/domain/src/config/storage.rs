use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where the governance core keeps its durable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `usage.json` and its lock file.
    #[serde(default = "d_state_path")]
    pub state_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: d_state_path(),
        }
    }
}

fn d_state_path() -> String {
    "./data/state".into()
}
