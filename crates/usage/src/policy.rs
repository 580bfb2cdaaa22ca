//! Limit policy resolution.
//!
//! Pure, synchronous view over configured limits and tiers. No I/O and no
//! clock; built once from [`LimitsConfig`] so the model-to-tier mapping has
//! a single canonical source.

use std::collections::HashMap;

use mf_domain::config::{LimitsConfig, ModelLimits, PriorityTier, TierConfig};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LimitPolicy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read-only policy: per-model ceilings plus the priority tier table.
#[derive(Debug)]
pub struct LimitPolicy {
    limits: HashMap<String, ModelLimits>,
    tiers: TierConfig,
    /// Canonical model to tier map; duplicates resolve to the highest tier.
    tier_of: HashMap<String, PriorityTier>,
}

impl LimitPolicy {
    pub fn from_config(config: &LimitsConfig) -> Self {
        let mut tier_of = HashMap::new();
        for tier in PriorityTier::ORDER {
            for model in config.tiers.models(tier) {
                tier_of.entry(model.clone()).or_insert(tier);
            }
        }

        Self {
            limits: config.models.clone(),
            tiers: config.tiers.clone(),
            tier_of,
        }
    }

    /// Configured limits for `model`. Absent models get all-zero limits and
    /// are never admitted unless they are unlimited.
    pub fn limits_for(&self, model: &str) -> ModelLimits {
        self.limits.get(model).copied().unwrap_or_default()
    }

    /// Canonical tier for `model`, `None` when it is in no tier.
    pub fn tier_of(&self, model: &str) -> Option<PriorityTier> {
        self.tier_of.get(model).copied()
    }

    /// Whether `model` is exempt from quota checks.
    pub fn is_unlimited(&self, model: &str) -> bool {
        self.tier_of(model) == Some(PriorityTier::Unlimited)
    }

    /// Fallback candidates for `model`, best first: the rest of its own
    /// tier, then each lower tier in order, ending with the unlimited tier.
    /// The original model is excluded everywhere and duplicates keep their
    /// first position. An unknown model yields only the unlimited tier.
    pub fn fallback_chain(&self, model: &str) -> Vec<String> {
        let start = self.tier_of(model).unwrap_or(PriorityTier::Unlimited);
        let skip = PriorityTier::ORDER
            .iter()
            .position(|t| *t == start)
            .unwrap_or(0);

        let mut chain: Vec<String> = Vec::new();
        for tier in &PriorityTier::ORDER[skip..] {
            for candidate in self.tiers.models(*tier) {
                if candidate == model || chain.contains(candidate) {
                    continue;
                }
                chain.push(candidate.clone());
            }
        }
        chain
    }

    /// Every model the policy names: tier members first in tier order, then
    /// limit-only models sorted by name. Deterministic, used for reporting.
    pub fn known_models(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for tier in PriorityTier::ORDER {
            for model in self.tiers.models(tier) {
                if !out.contains(model) {
                    out.push(model.clone());
                }
            }
        }

        let mut rest: Vec<&String> = self.limits.keys().filter(|m| !out.contains(*m)).collect();
        rest.sort();
        out.extend(rest.into_iter().cloned());
        out
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
