mod governor;
mod limits;
mod storage;

pub use governor::*;
pub use limits::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub governor: GovernorConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for missing keys.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // State path must not be empty.
        if self.storage.state_path.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "storage.state_path".into(),
                message: "state_path must not be empty".into(),
            });
        }

        // Warning threshold must be a usable fraction.
        let t = self.governor.warning_threshold;
        if !(t > 0.0 && t <= 1.0) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "governor.warning_threshold".into(),
                message: format!("threshold {t} must be within (0, 1]"),
            });
        }

        // Models with limits but no tier can never be reached by fallback.
        for model in self.limits.models.keys() {
            if self.limits.tiers.tier_of(model).is_none() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("limits.models.{model}"),
                    message: "model has limits but is in no tier (unreachable by fallback)".into(),
                });
            }
        }

        // Tier members without a limits entry default to zero limits and are
        // never admitted (unless unlimited).
        for tier in PriorityTier::ORDER {
            if tier == PriorityTier::Unlimited {
                continue;
            }
            for model in self.limits.tiers.models(tier) {
                if !self.limits.models.contains_key(model) {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Warning,
                        field: format!("limits.tiers.{tier}"),
                        message: format!("{model} has no limits entry (defaults to 0, never admitted)"),
                    });
                }
            }
        }

        // A model listed in several tiers belongs to the highest one.
        let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for tier in PriorityTier::ORDER {
            for model in self.limits.tiers.models(tier) {
                if !seen.insert(model.as_str()) {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Warning,
                        field: format!("limits.tiers.{tier}"),
                        message: format!("{model} appears in more than one tier (highest wins)"),
                    });
                }
            }
        }

        errors
    }
}
