//! Error types and result aliases shared across Sparkify crates.

/// The result type used by `sparkify-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving or validating job configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is missing or out of range.
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Name of the offending setting.
        field: &'static str,
        /// Description of what is wrong with it.
        message: String,
    },

    /// A value could not be parsed into the expected type.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The global log subscriber could not be installed.
    #[error("logging initialization failed: {0}")]
    Logging(String),
}

impl Error {
    /// Creates a new configuration error for `field`.
    #[must_use]
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}
