use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Per-model limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Call and token ceilings for a single model.
///
/// Admission counts calls, not tokens; `token_limit` is carried for
/// reporting only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ModelLimits {
    /// Calls allowed per UTC day.
    #[serde(default)]
    pub daily_limit: u64,
    /// Calls allowed per UTC hour.
    #[serde(default)]
    pub hourly_limit: u64,
    /// Advisory per-request token ceiling.
    #[serde(default)]
    pub token_limit: u64,
}

/// Per-model limits plus the priority tier table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LimitsConfig {
    /// Key = model name (e.g. `"gpt-4"`, `"ollama/llama3"`).
    #[serde(default)]
    pub models: HashMap<String, ModelLimits>,
    #[serde(default)]
    pub tiers: TierConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Priority tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Priority bucket used for fallback ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
    Unlimited,
}

impl PriorityTier {
    /// All tiers in descending priority.
    pub const ORDER: [PriorityTier; 4] = [
        PriorityTier::High,
        PriorityTier::Medium,
        PriorityTier::Low,
        PriorityTier::Unlimited,
    ];
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityTier::High => "high",
            PriorityTier::Medium => "medium",
            PriorityTier::Low => "low",
            PriorityTier::Unlimited => "unlimited",
        };
        f.write_str(name)
    }
}

/// Models grouped by priority tier.
///
/// `unlimited` members are exempt from quota checks entirely; the list
/// doubles as the exemption set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TierConfig {
    #[serde(default)]
    pub high: Vec<String>,
    #[serde(default)]
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
    #[serde(default)]
    pub unlimited: Vec<String>,
}

impl TierConfig {
    /// The model list for one tier.
    pub fn models(&self, tier: PriorityTier) -> &[String] {
        match tier {
            PriorityTier::High => &self.high,
            PriorityTier::Medium => &self.medium,
            PriorityTier::Low => &self.low,
            PriorityTier::Unlimited => &self.unlimited,
        }
    }

    /// The tier a model belongs to. A model listed in several tiers
    /// belongs to the highest one.
    pub fn tier_of(&self, model: &str) -> Option<PriorityTier> {
        PriorityTier::ORDER
            .into_iter()
            .find(|tier| self.models(*tier).iter().any(|m| m == model))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
