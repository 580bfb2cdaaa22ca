//! Facade wiring the governance components together.
//!
//! One [`UsageGovernor`] is constructed at process start and passed by
//! reference into the orchestrator; there are no globals. `flush` is the
//! final durability point at shutdown.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mf_domain::config::Config;
use mf_domain::error::Result;

use crate::fallback::FallbackSelector;
use crate::guard::{AdmissionDecision, QuotaGuard};
use crate::policy::LimitPolicy;
use crate::report::{ModelStatus, UsageReport, UsageReporter};
use crate::store::UsageStore;

/// Owns the store, policy, and the components built on them.
#[derive(Debug)]
pub struct UsageGovernor {
    store: Arc<UsageStore>,
    guard: QuotaGuard,
    selector: FallbackSelector,
    reporter: UsageReporter,
}

impl UsageGovernor {
    /// Open the store under the configured state path and wire everything
    /// up. Fails when the state is corrupt or another process holds it.
    pub fn new(config: &Config, now: DateTime<Utc>) -> Result<Self> {
        let store = Arc::new(UsageStore::open(&config.storage, now)?);
        let policy = Arc::new(LimitPolicy::from_config(&config.limits));

        let guard = QuotaGuard::new(store.clone(), policy.clone(), config.governor.clone());
        let selector = FallbackSelector::new(
            policy.clone(),
            guard.clone(),
            config.governor.fallback_enabled,
        );
        let reporter = UsageReporter::new(store.clone(), policy);

        Ok(Self {
            store,
            guard,
            selector,
            reporter,
        })
    }

    /// Whether a call against `model` is currently permitted.
    pub fn can_use(&self, model: &str, now: DateTime<Utc>) -> AdmissionDecision {
        self.guard.can_use(model, now)
    }

    /// Record one completed call against `model`.
    pub fn record_usage(&self, model: &str, now: DateTime<Utc>) {
        self.guard.record_usage(model, now)
    }

    /// Find a usable alternative for `original`.
    pub fn find_fallback(&self, original: &str, now: DateTime<Utc>) -> Option<String> {
        self.selector.find_fallback(original, now)
    }

    /// Status for one model.
    pub fn status_for(&self, model: &str, now: DateTime<Utc>) -> ModelStatus {
        self.reporter.status_for(model, now)
    }

    /// Status for every model the policy names.
    pub fn status_all(&self, now: DateTime<Utc>) -> Vec<ModelStatus> {
        self.reporter.status_all(now)
    }

    /// Aggregate usage report.
    pub fn export_report(&self, now: DateTime<Utc>) -> UsageReport {
        self.reporter.export_report(now)
    }

    /// Persist counters, propagating failures. Call at shutdown.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
