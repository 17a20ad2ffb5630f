use serde::Serialize;
use std::sync::{Arc, Mutex};

/// A single timed operation.
#[derive(Debug, Clone, Serialize)]
pub struct OpTiming {
    /// Operation name: "database_info", "list_tables", "table_objects",
    /// "stored_procedures" or "compare".
    pub operation: &'static str,
    /// What the operation ran on: a table, a category, or a database.
    pub object: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of records involved (fetched or compared).
    pub rows: usize,
}

/// Accumulated performance timings for a single comparison run.
///
/// Shared across all decorator instances for one run via `Arc<Mutex<_>>`.
/// Filled by the monitoring decorators in the application layer.
#[derive(Debug, Default, Clone, Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_rows_fetched: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Copy out the current state of a shared report.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub(crate) fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.operation != "compare" {
                r.total_rows_fetched += timing.rows;
            }
            r.timings.push(timing);
        }
    }
}
