//! Shared domain types for the Museforge usage governance core.
//!
//! Configuration (storage paths, per-model limits, priority tiers, governor
//! tuning), the shared error type, and structured trace events. The stateful
//! pieces (usage store, quota guard, fallback selector, reporter) live in
//! `mf-usage`.

pub mod config;
pub mod error;
pub mod trace;

pub use config::Config;
pub use error::{Error, Result};
pub use trace::TraceEvent;
