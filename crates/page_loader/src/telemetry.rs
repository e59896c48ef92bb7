//! Phase timings for one page load, formatted as a single JSON line.
//! Callers fill the counters; this module only formats and emits them.
use crate::sections::SectionsReport;
use crate::status::LoadStatus;
use log::info;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTimings {
    pub eager_ms: u64,
    pub lazy_ms: u64,
    pub total_ms: u64,
    pub sections_loaded: usize,
    pub sections_failed: usize,
}

impl PhaseTimings {
    /// Count the first section together with the lazy batch.
    pub fn record_sections(&mut self, first: Option<LoadStatus>, rest: &SectionsReport) {
        self.sections_loaded = rest.loaded + usize::from(first == Some(LoadStatus::Loaded));
        self.sections_failed = rest.failed + usize::from(first == Some(LoadStatus::Error));
    }
}

pub fn phase_timings_json(timings: &PhaseTimings) -> String {
    serde_json::to_string(timings).unwrap_or_else(|err| format!("{{\"error\":\"{err}\"}}"))
}

pub fn maybe_emit(enabled: bool, json_line: &str) {
    if enabled {
        info!(target: "page_loader::telemetry", "{json_line}");
    }
}
