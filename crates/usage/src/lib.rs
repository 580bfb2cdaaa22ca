//! Usage governance core for Museforge.
//!
//! Decides whether a model invocation is currently allowed (quota guard),
//! records completed calls into a durable reset-aware store, picks a
//! fallback model when the primary is over quota, and reports per-model
//! status. No HTTP and no provider calls; the orchestrator wires this in
//! before and after its provider requests.

pub mod fallback;
pub mod governor;
pub mod guard;
pub mod policy;
pub mod report;
pub mod store;

pub use fallback::FallbackSelector;
pub use governor::UsageGovernor;
pub use guard::{AdmissionDecision, QuotaGuard};
pub use policy::LimitPolicy;
pub use report::{ModelStatus, UsageReport, UsageReporter, WindowStatus};
pub use store::{LastReset, UsageCounters, UsageStore};
