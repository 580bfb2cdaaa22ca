use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Governor tuning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tuning knobs for admission and fallback behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Fraction of the daily limit at which a usage warning is emitted.
    #[serde(default = "d_08")]
    pub warning_threshold: f64,
    /// When false, fallback selection always returns `None`.
    #[serde(default = "d_true")]
    pub fallback_enabled: bool,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 0.8,
            fallback_enabled: true,
        }
    }
}

fn d_08() -> f64 {
    0.8
}

fn d_true() -> bool {
    true
}
