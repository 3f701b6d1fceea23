//! Job configuration.
//!
//! The job needs three locations (catalog input, activity input, output root)
//! and a few engine knobs. Values come from CLI flags or their `SPARKIFY_*`
//! environment counterparts; this module only holds and validates them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::observability::LogFormat;

/// Default catalog input glob (local dataset layout).
pub const DEFAULT_SONG_DATA: &str = "song_data/*/*/*/*.json";

/// Default activity-log input glob (local dataset layout).
pub const DEFAULT_LOG_DATA: &str = "log_data/*.json";

/// Default output root.
pub const DEFAULT_OUTPUT_DATA: &str = "sparkify_data";

/// Which pipelines a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Catalog pipeline, then activity pipeline.
    #[default]
    All,
    /// Catalog pipeline only (songs, artists).
    Catalog,
    /// Activity pipeline only (users, time, songplays).
    ///
    /// The songs table from an earlier run must already exist at the output root.
    Activity,
}

impl Stage {
    /// Returns the stage name as accepted on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Catalog => "catalog",
            Self::Activity => "activity",
        }
    }

    /// Returns true when the catalog pipeline runs.
    #[must_use]
    pub fn runs_catalog(self) -> bool {
        matches!(self, Self::All | Self::Catalog)
    }

    /// Returns true when the activity pipeline runs.
    #[must_use]
    pub fn runs_activity(self) -> bool {
        matches!(self, Self::All | Self::Activity)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "catalog" | "songs" => Ok(Self::Catalog),
            "activity" | "logs" => Ok(Self::Activity),
            other => Err(Error::InvalidInput(format!("unknown stage '{other}'"))),
        }
    }
}

/// Resolved configuration for one ETL run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Catalog (song metadata) input: path or glob over NDJSON files.
    pub song_data: String,
    /// Activity-log input: path or glob over NDJSON files.
    pub log_data: String,
    /// Output root; each table gets a directory beneath it.
    pub output_data: String,
    /// Engine parallelism. `None` lets the engine pick (number of CPUs).
    #[serde(default)]
    pub target_partitions: Option<usize>,
    /// Pipelines to run.
    #[serde(default)]
    pub stage: Stage,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            song_data: DEFAULT_SONG_DATA.to_string(),
            log_data: DEFAULT_LOG_DATA.to_string(),
            output_data: DEFAULT_OUTPUT_DATA.to_string(),
            target_partitions: None,
            stage: Stage::All,
            log_format: LogFormat::Pretty,
        }
    }
}

impl EtlConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a location needed by the selected stage is blank,
    /// or if `target_partitions` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.stage.runs_catalog() && self.song_data.trim().is_empty() {
            return Err(Error::invalid_config("song_data", "must not be empty"));
        }
        if self.stage.runs_activity() && self.log_data.trim().is_empty() {
            return Err(Error::invalid_config("log_data", "must not be empty"));
        }
        if self.output_data.trim().is_empty() {
            return Err(Error::invalid_config("output_data", "must not be empty"));
        }
        if self.target_partitions == Some(0) {
            return Err(Error::invalid_config(
                "target_partitions",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
