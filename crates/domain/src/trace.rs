use serde::Serialize;

/// Structured trace events emitted across all Museforge crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StoreLoaded {
        path: String,
        daily_models: usize,
        hourly_models: usize,
    },
    StoreInitialized {
        path: String,
    },
    WindowReset {
        window: String,
        cleared_models: usize,
    },
    UsageRecorded {
        model: String,
        daily_count: u64,
        hourly_count: u64,
    },
    QuotaDenied {
        model: String,
        window: String,
        current: u64,
        limit: u64,
    },
    UsageWarning {
        model: String,
        daily_count: u64,
        daily_limit: u64,
        threshold: f64,
    },
    FallbackSelected {
        from_model: String,
        to_model: String,
        candidates_tried: usize,
    },
    FallbackExhausted {
        from_model: String,
        candidates_tried: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mf_event");
    }
}
