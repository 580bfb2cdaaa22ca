//! Fallback model selection.
//!
//! Greedy walk over the policy's candidate chain: the first model whose
//! admission check passes wins. Deterministic and priority-descending; the
//! original model is never returned, and a candidate from a higher tier than
//! the original is never considered.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mf_domain::trace::TraceEvent;

use crate::guard::QuotaGuard;
use crate::policy::LimitPolicy;

/// Picks an alternative model when the requested one is unavailable or over
/// quota.
#[derive(Debug)]
pub struct FallbackSelector {
    policy: Arc<LimitPolicy>,
    guard: QuotaGuard,
    enabled: bool,
}

impl FallbackSelector {
    pub fn new(policy: Arc<LimitPolicy>, guard: QuotaGuard, enabled: bool) -> Self {
        Self {
            policy,
            guard,
            enabled,
        }
    }

    /// Find a usable alternative for `original`.
    ///
    /// Returns `None` when fallback is disabled or every candidate is over
    /// quota; the orchestrator turns that into a user-visible failure.
    pub fn find_fallback(&self, original: &str, now: DateTime<Utc>) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let candidates = self.policy.fallback_chain(original);
        for (i, candidate) in candidates.iter().enumerate() {
            if self.guard.can_use(candidate, now).allowed() {
                TraceEvent::FallbackSelected {
                    from_model: original.to_owned(),
                    to_model: candidate.clone(),
                    candidates_tried: i + 1,
                }
                .emit();
                return Some(candidate.clone());
            }
        }

        TraceEvent::FallbackExhausted {
            from_model: original.to_owned(),
            candidates_tried: candidates.len(),
        }
        .emit();
        None
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
