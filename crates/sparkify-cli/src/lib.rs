//! # sparkify-cli
//!
//! Command-line interface for the Sparkify star-schema ETL.
//!
//! ## Commands
//!
//! - `sparkify run` - Build the star schema from raw song and activity data
//!
//! ## Configuration
//!
//! Every location and engine knob can be set by flag or environment variable:
//!
//! - `SPARKIFY_SONG_DATA` - Catalog input glob (default: `song_data/*/*/*/*.json`)
//! - `SPARKIFY_LOG_DATA` - Activity input glob (default: `log_data/*.json`)
//! - `SPARKIFY_OUTPUT_DATA` - Output root (default: `sparkify_data`)
//! - `SPARKIFY_TARGET_PARTITIONS` - Engine parallelism (default: CPU count)
//! - `SPARKIFY_LOG_FORMAT` - `pretty` or `json`
//! - `SPARKIFY_METRICS_FILE` - Where to write Prometheus metrics after the run

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sparkify_core::config::{DEFAULT_LOG_DATA, DEFAULT_OUTPUT_DATA, DEFAULT_SONG_DATA};
use sparkify_core::{EtlConfig, LogFormat};

/// Sparkify ETL - build the analytics star schema.
#[derive(Debug, Parser)]
#[command(name = "sparkify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog (song metadata) input: path or glob over NDJSON files.
    #[arg(long, env = "SPARKIFY_SONG_DATA", default_value = DEFAULT_SONG_DATA)]
    pub song_data: String,

    /// Activity-log input: path or glob over NDJSON files.
    #[arg(long, env = "SPARKIFY_LOG_DATA", default_value = DEFAULT_LOG_DATA)]
    pub log_data: String,

    /// Root directory for the output tables.
    #[arg(long, env = "SPARKIFY_OUTPUT_DATA", default_value = DEFAULT_OUTPUT_DATA)]
    pub output_data: String,

    /// Number of partitions the engine plans with.
    #[arg(long, env = "SPARKIFY_TARGET_PARTITIONS")]
    pub target_partitions: Option<usize>,

    /// Log format (`pretty` or `json`).
    #[arg(long, env = "SPARKIFY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// File receiving the Prometheus text exposition once the run ends.
    #[arg(long, env = "SPARKIFY_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,

    /// Output format for the run summary.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective job configuration.
    ///
    /// The stage comes from the subcommand; everything else from global flags.
    #[must_use]
    pub fn config(&self) -> EtlConfig {
        let stage = match &self.command {
            Commands::Run(args) => args.stage,
        };
        EtlConfig {
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            output_data: self.output_data.clone(),
            target_partitions: self.target_partitions,
            stage,
            log_format: self.log_format,
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the ETL job.
    Run(commands::run::RunArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

#[cfg(test)]
mod tests {
    use sparkify_core::Stage;

    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "sparkify",
            "--song-data",
            "s3a://bucket/song_data/*/*/*/*.json",
            "--log-data",
            "data/log_data/*.json",
            "--output-data",
            "out",
            "--target-partitions",
            "4",
            "--log-format",
            "json",
            "--format",
            "json",
            "--metrics-file",
            "run.prom",
            "run",
            "--stage",
            "catalog",
        ]);

        let config = cli.config();
        assert_eq!(config.song_data, "s3a://bucket/song_data/*/*/*/*.json");
        assert_eq!(config.log_data, "data/log_data/*.json");
        assert_eq!(config.output_data, "out");
        assert_eq!(config.target_partitions, Some(4));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.stage, Stage::Catalog);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.metrics_file, Some(PathBuf::from("run.prom")));
    }

    #[test]
    fn test_cli_defaults_match_local_layout() {
        let cli = Cli::parse_from(["sparkify", "run"]);
        let config = cli.config();
        assert_eq!(config.stage, Stage::All);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.target_partitions.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_cli_rejects_unknown_stage() {
        let result = Cli::try_parse_from(["sparkify", "run", "--stage", "users"]);
        assert!(result.is_err());
    }
}
