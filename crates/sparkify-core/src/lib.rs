//! # sparkify-core
//!
//! Shared primitives for the Sparkify star-schema ETL.
//!
//! This crate provides the pieces every other Sparkify crate agrees on:
//!
//! - **Table Layout**: the five output tables, their partition columns and
//!   their location under the output root
//! - **Configuration**: resolved input/output locations and engine sizing
//! - **Error Types**: configuration and validation errors
//! - **Observability**: logging initialization and span helpers
//!
//! ## Example
//!
//! ```rust
//! use sparkify_core::prelude::*;
//!
//! let location = StarTable::Songs.location("sparkify_data");
//! assert_eq!(location, "sparkify_data/songs_table/songs_table.parquet/");
//! assert_eq!(StarTable::Songs.partition_columns(), &["year", "artist_id"]);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod observability;
pub mod table_paths;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{EtlConfig, Stage};
    pub use crate::error::{Error, Result};
    pub use crate::observability::{LogFormat, init_logging, pipeline_span, try_init_logging};
    pub use crate::table_paths::StarTable;
}

pub use config::{EtlConfig, Stage};
pub use error::{Error, Result};
pub use observability::{LogFormat, init_logging, pipeline_span, try_init_logging};
pub use table_paths::StarTable;
