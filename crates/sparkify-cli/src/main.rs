//! Sparkify CLI - batch ETL entry point.
//!
//! The main entry point for the `sparkify` binary.

use anyhow::Result;
use clap::Parser;

use sparkify_cli::{Cli, Commands};
use sparkify_core::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    init_logging(config.log_format);
    let metrics = sparkify_etl::metrics::init_metrics()?;

    // DataFusion spawns partition streams onto this runtime.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        match cli.command {
            Commands::Run(_) => sparkify_cli::commands::run::execute(&config, cli.format).await,
        }
    });

    // Exported even when the run fails.
    if let Some(path) = &cli.metrics_file {
        sparkify_cli::commands::run::export_metrics(&metrics, path)?;
    }
    result
}
