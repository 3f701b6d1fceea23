//! Error types for ETL runs.
//!
//! Every variant is terminal for the run: pipelines never recover locally,
//! and a re-run from scratch is the recovery path (all writes overwrite).

use datafusion::error::DataFusionError;
use thiserror::Error;

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors that can occur while building or persisting the star schema.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A source location could not be located, listed or opened.
    #[error("source unreadable: {location}: {message}")]
    SourceUnreadable {
        /// The location that was requested.
        location: String,
        /// Description of the failure.
        message: String,
    },

    /// An output table could not be persisted.
    #[error("write failed: {destination}: {message}")]
    WriteFailure {
        /// The destination that was being written.
        destination: String,
        /// Description of the failure.
        message: String,
    },

    /// A table did not have the expected columns or types.
    #[error("schema error: {message}")]
    Schema {
        /// Description of the mismatch.
        message: String,
    },

    /// The execution engine failed while planning or running a query.
    #[error("engine error: {0}")]
    Engine(#[from] DataFusionError),

    /// An internal error that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },

    /// The job configuration was rejected.
    #[error(transparent)]
    Config(#[from] sparkify_core::Error),
}

impl EtlError {
    /// Creates a [`EtlError::SourceUnreadable`].
    #[must_use]
    pub fn source_unreadable(location: impl Into<String>, message: impl ToString) -> Self {
        Self::SourceUnreadable {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Creates a [`EtlError::WriteFailure`].
    #[must_use]
    pub fn write_failure(destination: impl Into<String>, message: impl ToString) -> Self {
        Self::WriteFailure {
            destination: destination.into(),
            message: message.to_string(),
        }
    }
}
