//! Run command - build the star schema.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use metrics_exporter_prometheus::PrometheusHandle;

use sparkify_core::{EtlConfig, Stage};
use sparkify_etl::job::{self, RunSummary};
use sparkify_etl::{Engine, LoggingObserver};

use crate::OutputFormat;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Pipelines to run: `all`, `catalog` or `activity`.
    ///
    /// `activity` needs the songs table from an earlier run.
    #[arg(long, default_value = "all")]
    pub stage: Stage,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any pipeline fails.
pub async fn execute(config: &EtlConfig, format: OutputFormat) -> Result<()> {
    let engine =
        Engine::local(config.target_partitions).with_observer(Arc::new(LoggingObserver));

    let summary = job::run(&engine, config)
        .await
        .inspect_err(|e| tracing::error!(error = %e, stage = %config.stage, "run aborted"))
        .with_context(|| format!("{} run failed", config.stage))?;

    print_summary(&summary, format)
}

/// Writes the Prometheus text exposition of every recorded metric to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn export_metrics(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    std::fs::write(path, handle.render())
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    tracing::info!(path = %path.display(), "metrics exported");
    Ok(())
}

fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let tables: Vec<_> = summary
                .tables()
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "table": t.table.as_str(),
                        "rows": t.rows,
                        "location": t.location,
                        "partitionBy": t.partition_by,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "tables": tables }))
                    .context("Failed to serialize summary")?
            );
        }
        OutputFormat::Text => {
            for t in summary.tables() {
                println!("  {:<16} {:>10} rows  {}", t.table.as_str(), t.rows, t.location);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use sparkify_core::StarTable;
    use sparkify_etl::metrics::{ROWS_WRITTEN, record_table_written};

    use super::*;

    #[test]
    fn test_export_metrics_writes_prometheus_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sparkify.prom");
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || record_table_written(StarTable::Time, 4));

        export_metrics(&handle, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(
            text.contains(&format!("{ROWS_WRITTEN}{{table=\"time_table\"}} 4")),
            "{text}"
        );
    }

    #[test]
    fn test_export_metrics_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let handle = PrometheusBuilder::new().build_recorder().handle();

        let err = export_metrics(&handle, &dir.path().join("missing/sparkify.prom")).unwrap_err();
        assert!(err.to_string().contains("Failed to write metrics"), "{err}");
    }
}
