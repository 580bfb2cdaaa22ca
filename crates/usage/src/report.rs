//! Read-only usage reporting.
//!
//! Builds per-model status rows and aggregate reports from the store and
//! policy. Every entry point refreshes the windows first, so displayed
//! counters never show a stale day or hour.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use mf_domain::config::PriorityTier;

use crate::policy::LimitPolicy;
use crate::store::UsageStore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Status types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Usage within one window.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WindowStatus {
    pub current: u64,
    pub limit: u64,
    pub remaining: u64,
    /// Percent of the limit consumed. A zero limit displays against 1; this
    /// only affects presentation, never admission.
    pub pct: f64,
}

impl WindowStatus {
    fn new(current: u64, limit: u64) -> Self {
        Self {
            current,
            limit,
            remaining: limit.saturating_sub(current),
            pct: current as f64 / limit.max(1) as f64 * 100.0,
        }
    }
}

/// Per-model usage snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model: String,
    pub tier: Option<PriorityTier>,
    pub unlimited: bool,
    pub daily: WindowStatus,
    pub hourly: WindowStatus,
    /// Informational only; admission never counts tokens.
    pub token_limit: u64,
}

/// Aggregate snapshot across all models.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    pub generated_at: DateTime<Utc>,
    pub models: Vec<ModelStatus>,
    pub total_daily_calls: u64,
    pub total_hourly_calls: u64,
    /// Model with the highest daily count; `None` when nothing was used.
    pub most_used: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UsageReporter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read-only aggregation over the store and policy.
#[derive(Debug)]
pub struct UsageReporter {
    store: Arc<UsageStore>,
    policy: Arc<LimitPolicy>,
}

impl UsageReporter {
    pub fn new(store: Arc<UsageStore>, policy: Arc<LimitPolicy>) -> Self {
        Self { store, policy }
    }

    /// Status for one model.
    pub fn status_for(&self, model: &str, now: DateTime<Utc>) -> ModelStatus {
        self.store.check_and_reset(now);
        self.status_row(model)
    }

    /// Status for every model the policy names, in the policy's
    /// deterministic order.
    pub fn status_all(&self, now: DateTime<Utc>) -> Vec<ModelStatus> {
        self.store.check_and_reset(now);
        self.policy
            .known_models()
            .iter()
            .map(|m| self.status_row(m))
            .collect()
    }

    /// Full snapshot: policy models first, then any counted models the
    /// policy does not list (sorted by name), plus aggregate totals and the
    /// most-used model.
    pub fn export_report(&self, now: DateTime<Utc>) -> UsageReport {
        self.store.check_and_reset(now);

        let (daily, hourly) = self.store.snapshot();

        let mut names = self.policy.known_models();
        let mut extras: Vec<String> = daily
            .keys()
            .chain(hourly.keys())
            .filter(|m| !names.contains(*m))
            .cloned()
            .collect();
        extras.sort();
        extras.dedup();
        names.extend(extras);

        let models: Vec<ModelStatus> = names.iter().map(|m| self.status_row(m)).collect();

        // Ties keep the first model in report order.
        let mut most_used: Option<String> = None;
        let mut best = 0u64;
        for row in &models {
            if row.daily.current > best {
                best = row.daily.current;
                most_used = Some(row.model.clone());
            }
        }

        UsageReport {
            generated_at: now,
            models,
            total_daily_calls: daily.values().sum(),
            total_hourly_calls: hourly.values().sum(),
            most_used,
        }
    }

    fn status_row(&self, model: &str) -> ModelStatus {
        let limits = self.policy.limits_for(model);
        ModelStatus {
            model: model.to_owned(),
            tier: self.policy.tier_of(model),
            unlimited: self.policy.is_unlimited(model),
            daily: WindowStatus::new(self.store.daily_count(model), limits.daily_limit),
            hourly: WindowStatus::new(self.store.hourly_count(model), limits.hourly_limit),
            token_limit: limits.token_limit,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
