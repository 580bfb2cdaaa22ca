//! Durable usage counters with window-boundary resets.
//!
//! Persists per-model daily and hourly call counts in `usage.json` under the
//! configured state path. Counters clear when the UTC day or hour advances
//! past the recorded watermark; the rollover check runs on every access, so
//! no timer is needed. An `fs2` exclusive lock on a sibling `usage.lock`
//! file enforces single-process ownership of the state.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use fs2::FileExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use mf_domain::config::StorageConfig;
use mf_domain::error::{Error, Result};
use mf_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Persisted state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Watermarks of the last observed window boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastReset {
    /// UTC calendar day of the current daily window.
    pub daily: NaiveDate,
    /// Start of the current hourly window (UTC, minutes and below zeroed).
    pub hourly: NaiveDateTime,
}

/// Per-model call counters for the current windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub daily: HashMap<String, u64>,
    #[serde(default)]
    pub hourly: HashMap<String, u64>,
    pub last_reset: LastReset,
}

impl UsageCounters {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            daily: HashMap::new(),
            hourly: HashMap::new(),
            last_reset: LastReset {
                daily: day_stamp(now),
                hourly: hour_stamp(now),
            },
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Usage store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// File-backed usage store.
///
/// Thread-safe (`parking_lot::RwLock`); every mutation persists before
/// returning. Callers inject `now` so window boundaries stay testable.
#[derive(Debug)]
pub struct UsageStore {
    usage_path: PathBuf,
    counters: RwLock<UsageCounters>,
    /// Held for the lifetime of the store so the advisory lock stays ours.
    _lock: File,
}

impl UsageStore {
    /// Load or create the usage store at `state_path/usage.json`.
    ///
    /// A missing file initializes empty counters. Any other read or parse
    /// failure is surfaced: reinitializing over corrupt state would erase
    /// quota history.
    pub fn open(config: &StorageConfig, now: DateTime<Utc>) -> Result<Self> {
        let dir = Path::new(&config.state_path);
        std::fs::create_dir_all(dir).map_err(Error::Io)?;

        let lock = acquire_lock(&dir.join("usage.lock"))?;

        let usage_path = dir.join("usage.json");
        let counters = match std::fs::read_to_string(&usage_path) {
            Ok(raw) => {
                let counters: UsageCounters = serde_json::from_str(&raw).map_err(|e| {
                    Error::StorageRead(format!("corrupt {}: {e}", usage_path.display()))
                })?;
                TraceEvent::StoreLoaded {
                    path: usage_path.display().to_string(),
                    daily_models: counters.daily.len(),
                    hourly_models: counters.hourly.len(),
                }
                .emit();
                counters
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let counters = UsageCounters::empty(now);
                persist(&usage_path, &counters)?;
                TraceEvent::StoreInitialized {
                    path: usage_path.display().to_string(),
                }
                .emit();
                counters
            }
            Err(e) => {
                return Err(Error::StorageRead(format!(
                    "reading {}: {e}",
                    usage_path.display()
                )));
            }
        };

        tracing::info!(
            path = %usage_path.display(),
            daily_models = counters.daily.len(),
            "usage store ready"
        );

        Ok(Self {
            usage_path,
            counters: RwLock::new(counters),
            _lock: lock,
        })
    }

    /// Clear any window whose boundary has passed. Runs on every access, so
    /// callers always see fresh counters without a background timer.
    pub fn check_and_reset(&self, now: DateTime<Utc>) {
        let today = day_stamp(now);
        let this_hour = hour_stamp(now);

        let mut counters = self.counters.write();
        let mut reset = false;

        if counters.last_reset.daily != today {
            let cleared = counters.daily.len();
            counters.daily.clear();
            counters.last_reset.daily = today;
            TraceEvent::WindowReset {
                window: "daily".into(),
                cleared_models: cleared,
            }
            .emit();
            reset = true;
        }

        if counters.last_reset.hourly != this_hour {
            let cleared = counters.hourly.len();
            counters.hourly.clear();
            counters.last_reset.hourly = this_hour;
            TraceEvent::WindowReset {
                window: "hourly".into(),
                cleared_models: cleared,
            }
            .emit();
            reset = true;
        }

        if reset {
            self.persist_logged(&counters);
        }
    }

    /// Record one call against `model` in both windows.
    pub fn record(&self, model: &str, now: DateTime<Utc>) {
        self.check_and_reset(now);

        let mut counters = self.counters.write();
        *counters.daily.entry(model.to_owned()).or_insert(0) += 1;
        *counters.hourly.entry(model.to_owned()).or_insert(0) += 1;

        TraceEvent::UsageRecorded {
            model: model.to_owned(),
            daily_count: counters.daily[model],
            hourly_count: counters.hourly[model],
        }
        .emit();

        self.persist_logged(&counters);
    }

    /// Current daily count for `model` (0 when absent).
    pub fn daily_count(&self, model: &str) -> u64 {
        self.counters.read().daily.get(model).copied().unwrap_or(0)
    }

    /// Current hourly count for `model` (0 when absent).
    pub fn hourly_count(&self, model: &str) -> u64 {
        self.counters.read().hourly.get(model).copied().unwrap_or(0)
    }

    /// Snapshot of both counter maps: `(daily, hourly)`.
    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, u64>) {
        let counters = self.counters.read();
        (counters.daily.clone(), counters.hourly.clone())
    }

    /// Watermarks of the current windows.
    pub fn last_reset(&self) -> LastReset {
        self.counters.read().last_reset
    }

    /// Persist the current counters, propagating failures. Call at shutdown.
    pub fn flush(&self) -> Result<()> {
        let counters = self.counters.read();
        persist(&self.usage_path, &counters)
    }

    /// Persist after a mutation. Failures are logged, not propagated: the
    /// in-memory counters stay authoritative and the next write retries.
    fn persist_logged(&self, counters: &UsageCounters) {
        if let Err(e) = persist(&self.usage_path, counters) {
            tracing::warn!(error = %e, "usage persist failed, counters remain in memory");
        }
    }
}

// ── Persistence ─────────────────────────────────────────────────────

fn persist(path: &Path, counters: &UsageCounters) -> Result<()> {
    let json = serde_json::to_string_pretty(counters)
        .map_err(|e| Error::StorageWrite(format!("serializing usage: {e}")))?;
    // Write-then-rename keeps a crash from truncating the live file.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| Error::StorageWrite(format!("writing {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::StorageWrite(format!("renaming {}: {e}", tmp.display())))?;
    Ok(())
}

fn acquire_lock(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .read(true)
        .open(path)
        .map_err(Error::Io)?;

    file.try_lock_exclusive().map_err(|_| {
        Error::StoreLocked(format!(
            "another process owns the usage store ({} is locked)",
            path.display()
        ))
    })?;

    Ok(file)
}

// ── Window stamps ───────────────────────────────────────────────────

fn day_stamp(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

fn hour_stamp(now: DateTime<Utc>) -> NaiveDateTime {
    now.date_naive()
        .and_hms_opt(now.hour(), 0, 0)
        .unwrap_or_else(|| now.naive_utc())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
