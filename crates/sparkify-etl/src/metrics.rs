//! ETL metrics.
//!
//! Complements the structured row-count logs. The binary installs the
//! Prometheus recorder through [`init_metrics`] and renders the text
//! exposition once the run finishes.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use sparkify_core::StarTable;

use crate::error::{EtlError, Result};

/// Rows written per table.
pub const ROWS_WRITTEN: &str = "sparkify_rows_written_total";

/// Tables written.
pub const TABLES_WRITTEN: &str = "sparkify_tables_written_total";

/// Duration of each pipeline stage.
pub const STAGE_DURATION: &str = "sparkify_stage_duration_seconds";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder and registers metric descriptions.
///
/// Safe to call multiple times; subsequent calls return the same handle.
///
/// # Errors
///
/// Returns `EtlError::Internal` if another recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EtlError::Internal {
            message: format!("failed to install prometheus recorder: {e}"),
        })?;
    register_metrics();
    tracing::info!("Prometheus metrics recorder initialized");
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Returns the global Prometheus handle, if initialized.
#[must_use]
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

/// Registers all metric descriptions with the current recorder.
pub fn register_metrics() {
    describe_counter!(ROWS_WRITTEN, "Total rows written per output table");
    describe_counter!(TABLES_WRITTEN, "Total output tables written");
    describe_histogram!(STAGE_DURATION, "Duration of pipeline stages in seconds");
}

/// Records a completed table write.
pub fn record_table_written(table: StarTable, rows: u64) {
    let labels = [("table", table.as_str().to_string())];
    counter!(ROWS_WRITTEN, &labels).increment(rows);
    counter!(TABLES_WRITTEN, &labels).increment(1);
}

/// Records how long a pipeline stage took.
pub fn record_stage_duration(pipeline: &str, stage: &str, duration_secs: f64) {
    histogram!(
        STAGE_DURATION,
        "pipeline" => pipeline.to_string(),
        "stage" => stage.to_string()
    )
    .record(duration_secs);
}
