//! Quota admission checks.
//!
//! [`QuotaGuard`] is the single decision point for "may this model be used
//! right now". `can_use` never mutates counters, so callers can probe as
//! often as they like; `record_usage` is the write side and also watches the
//! warning threshold.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mf_domain::config::GovernorConfig;
use mf_domain::trace::TraceEvent;

use crate::policy::LimitPolicy;
use crate::store::UsageStore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Admission decision
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The model is exempt from quota checks.
    Unlimited,
    /// Within both windows.
    Admitted,
    DailyLimitExceeded { current: u64, limit: u64 },
    HourlyLimitExceeded { current: u64, limit: u64 },
}

impl AdmissionDecision {
    pub fn allowed(&self) -> bool {
        matches!(
            self,
            AdmissionDecision::Unlimited | AdmissionDecision::Admitted
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// QuotaGuard
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Checks usage against policy limits and records completed calls.
#[derive(Debug, Clone)]
pub struct QuotaGuard {
    store: Arc<UsageStore>,
    policy: Arc<LimitPolicy>,
    config: GovernorConfig,
}

impl QuotaGuard {
    pub fn new(store: Arc<UsageStore>, policy: Arc<LimitPolicy>, config: GovernorConfig) -> Self {
        Self {
            store,
            policy,
            config,
        }
    }

    /// Whether a call against `model` is currently permitted.
    ///
    /// Never increments anything; calling this a hundred times leaves the
    /// counters untouched.
    pub fn can_use(&self, model: &str, now: DateTime<Utc>) -> AdmissionDecision {
        self.store.check_and_reset(now);

        if self.policy.is_unlimited(model) {
            return AdmissionDecision::Unlimited;
        }

        let limits = self.policy.limits_for(model);

        // Daily before hourly, so a doubly exhausted model reports the same
        // reason every time.
        let daily = self.store.daily_count(model);
        if daily >= limits.daily_limit {
            TraceEvent::QuotaDenied {
                model: model.to_owned(),
                window: "daily".into(),
                current: daily,
                limit: limits.daily_limit,
            }
            .emit();
            return AdmissionDecision::DailyLimitExceeded {
                current: daily,
                limit: limits.daily_limit,
            };
        }

        let hourly = self.store.hourly_count(model);
        if hourly >= limits.hourly_limit {
            TraceEvent::QuotaDenied {
                model: model.to_owned(),
                window: "hourly".into(),
                current: hourly,
                limit: limits.hourly_limit,
            }
            .emit();
            return AdmissionDecision::HourlyLimitExceeded {
                current: hourly,
                limit: limits.hourly_limit,
            };
        }

        AdmissionDecision::Admitted
    }

    /// Record one completed call against `model`.
    ///
    /// Recording is unconditional: the orchestrator reports the call whether
    /// or not the provider succeeded, since the slot was consumed either way.
    pub fn record_usage(&self, model: &str, now: DateTime<Utc>) {
        self.store.record(model, now);

        if self.policy.is_unlimited(model) {
            return;
        }
        let limits = self.policy.limits_for(model);
        if limits.daily_limit == 0 {
            return;
        }

        let count = self.store.daily_count(model);
        let threshold = self.config.warning_threshold;
        if crossed_threshold(count, limits.daily_limit, threshold) {
            TraceEvent::UsageWarning {
                model: model.to_owned(),
                daily_count: count,
                daily_limit: limits.daily_limit,
                threshold,
            }
            .emit();
            tracing::warn!(
                model,
                daily_count = count,
                daily_limit = limits.daily_limit,
                "usage nearing daily limit"
            );
        }
    }
}

/// True exactly when this call moved the daily usage fraction from below the
/// threshold to at or above it. Fires once per window, not on every call
/// past the line.
fn crossed_threshold(count: u64, limit: u64, threshold: f64) -> bool {
    let before = count.saturating_sub(1) as f64 / limit as f64;
    let after = count as f64 / limit as f64;
    before < threshold && after >= threshold
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mf_domain::config::{LimitsConfig, ModelLimits, StorageConfig, TierConfig};
    use std::collections::HashMap;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn test_guard(dir: &std::path::Path) -> QuotaGuard {
        let mut models = HashMap::new();
        models.insert(
            "gpt-4".to_string(),
            ModelLimits {
                daily_limit: 50,
                hourly_limit: 10,
                token_limit: 8000,
            },
        );
        models.insert(
            "tiny".to_string(),
            ModelLimits {
                daily_limit: 3,
                hourly_limit: 2,
                token_limit: 0,
            },
        );
        let limits = LimitsConfig {
            models,
            tiers: TierConfig {
                high: vec!["gpt-4".into()],
                low: vec!["tiny".into()],
                unlimited: vec!["ollama/llama3".into()],
                ..Default::default()
            },
        };

        let storage = StorageConfig {
            state_path: dir.display().to_string(),
        };
        let store = Arc::new(UsageStore::open(&storage, utc(2024, 1, 2, 13, 0, 0)).unwrap());
        let policy = Arc::new(LimitPolicy::from_config(&limits));
        QuotaGuard::new(store, policy, GovernorConfig::default())
    }

    #[test]
    fn unlimited_model_always_admits() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());
        let now = utc(2024, 1, 2, 13, 0, 0);

        for _ in 0..100 {
            guard.record_usage("ollama/llama3", now);
        }
        assert_eq!(
            guard.can_use("ollama/llama3", now),
            AdmissionDecision::Unlimited
        );
    }

    #[test]
    fn can_use_never_increments() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());
        let now = utc(2024, 1, 2, 13, 0, 0);

        for _ in 0..5 {
            assert!(guard.can_use("tiny", now).allowed());
        }
        guard.record_usage("tiny", now);
        assert_eq!(
            guard.can_use("tiny", now),
            AdmissionDecision::Admitted,
            "one recorded call out of three must still admit"
        );
    }

    #[test]
    fn hourly_limit_denies_within_the_hour() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());
        let now = utc(2024, 1, 2, 13, 0, 0);

        guard.record_usage("tiny", now);
        guard.record_usage("tiny", now);
        assert_eq!(
            guard.can_use("tiny", now),
            AdmissionDecision::HourlyLimitExceeded {
                current: 2,
                limit: 2
            }
        );

        // Next hour the hourly window clears but the daily one does not.
        let later = utc(2024, 1, 2, 14, 0, 0);
        assert_eq!(guard.can_use("tiny", later), AdmissionDecision::Admitted);
        guard.record_usage("tiny", later);
        assert_eq!(
            guard.can_use("tiny", later),
            AdmissionDecision::DailyLimitExceeded {
                current: 3,
                limit: 3
            }
        );
    }

    #[test]
    fn daily_reported_before_hourly_when_both_exceeded() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());
        let now = utc(2024, 1, 2, 13, 0, 0);

        // 3 calls exhaust both the daily (3) and hourly (2) windows.
        for _ in 0..3 {
            guard.record_usage("tiny", now);
        }
        assert_eq!(
            guard.can_use("tiny", now),
            AdmissionDecision::DailyLimitExceeded {
                current: 3,
                limit: 3
            }
        );
    }

    #[test]
    fn unknown_model_is_denied_with_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());
        let now = utc(2024, 1, 2, 13, 0, 0);

        assert_eq!(
            guard.can_use("mystery", now),
            AdmissionDecision::DailyLimitExceeded {
                current: 0,
                limit: 0
            }
        );
    }

    #[test]
    fn fifty_calls_exhaust_a_fifty_call_limit() {
        let dir = tempfile::tempdir().unwrap();
        let guard = test_guard(dir.path());

        // Spread across hours so the hourly limit (10) never trips.
        for i in 0..50u32 {
            let at = utc(2024, 1, 2, 13, 0, 0) + chrono::Duration::minutes(i as i64 * 10);
            guard.record_usage("gpt-4", at);
        }
        let end_of_day = utc(2024, 1, 2, 23, 0, 0);
        assert_eq!(
            guard.can_use("gpt-4", end_of_day),
            AdmissionDecision::DailyLimitExceeded {
                current: 50,
                limit: 50
            }
        );
    }

    // ── crossed_threshold ─────────────────────────────────────────

    #[test]
    fn threshold_fires_exactly_on_the_crossing_call() {
        // 40 of 50 is the 0.8 line.
        assert!(!crossed_threshold(39, 50, 0.8));
        assert!(crossed_threshold(40, 50, 0.8));
        assert!(!crossed_threshold(41, 50, 0.8));
    }

    #[test]
    fn threshold_handles_limit_of_one() {
        assert!(crossed_threshold(1, 1, 0.8));
    }
}
