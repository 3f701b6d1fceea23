//! Job driver: runs the selected pipelines in order.

use sparkify_core::EtlConfig;

use crate::activity::{ActivitySummary, process_log_data};
use crate::catalog::{CatalogSummary, process_song_data};
use crate::engine::Engine;
use crate::error::Result;
use crate::observer::TableSummary;

/// Outcome of a run. A pipeline that was not selected is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Catalog pipeline output.
    pub catalog: Option<CatalogSummary>,
    /// Activity pipeline output.
    pub activity: Option<ActivitySummary>,
}

impl RunSummary {
    /// Returns every written table, in write order.
    #[must_use]
    pub fn tables(&self) -> Vec<&TableSummary> {
        let mut tables = Vec::with_capacity(5);
        if let Some(catalog) = &self.catalog {
            tables.extend([&catalog.songs, &catalog.artists]);
        }
        if let Some(activity) = &self.activity {
            tables.extend([&activity.users, &activity.time, &activity.songplays]);
        }
        tables
    }
}

/// Validates `config` and runs the selected pipelines.
///
/// The catalog pipeline always finishes before the activity pipeline
/// starts. Any failure aborts the run; tables already written stay in place
/// and are replaced by the next run.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or any pipeline fails.
pub async fn run(engine: &Engine, config: &EtlConfig) -> Result<RunSummary> {
    config.validate()?;
    tracing::info!(
        stage = %config.stage,
        song_data = %config.song_data,
        log_data = %config.log_data,
        output_data = %config.output_data,
        "starting etl run"
    );

    let mut summary = RunSummary::default();
    if config.stage.runs_catalog() {
        summary.catalog =
            Some(process_song_data(engine, &config.song_data, &config.output_data).await?);
    }
    if config.stage.runs_activity() {
        summary.activity =
            Some(process_log_data(engine, &config.log_data, &config.output_data).await?);
    }

    tracing::info!(tables = summary.tables().len(), "etl run complete");
    Ok(summary)
}
