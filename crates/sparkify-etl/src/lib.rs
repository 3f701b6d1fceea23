//! # sparkify-etl
//!
//! Batch ETL that turns two raw event streams into an analytical star schema.
//!
//! ## Pipelines
//!
//! - **Catalog** ([`catalog::process_song_data`]): song metadata →
//!   `songs` (partitioned by year, artist) and `artists`
//! - **Activity** ([`activity::process_log_data`]): user activity →
//!   `users`, `time` (partitioned by year, month) and the `songplays` fact
//!   table, joined against the persisted `songs` table
//!
//! Both pipelines are declarative: they build DataFusion plans and hand them
//! to an [`Engine`], which carries the session plus the collaborators that
//! read raw records and persist tables. [`job::run`] sequences the two.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sparkify_core::EtlConfig;
//! use sparkify_etl::{Engine, LoggingObserver, job};
//!
//! # async fn example() -> sparkify_etl::Result<()> {
//! let engine = Engine::local(None).with_observer(Arc::new(LoggingObserver));
//! let summary = job::run(&engine, &EtlConfig::default()).await?;
//! for table in summary.tables() {
//!     println!("{}: {} rows", table.table, table.rows);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod activity;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod job;
pub mod local;
pub mod memory;
pub mod metrics;
pub mod observer;
pub mod schema;
pub mod songplays;
pub mod time;

pub use engine::{Engine, RecordReader, TableWriter};
pub use error::{EtlError, Result};
pub use local::{JsonRecordReader, ParquetTableWriter};
pub use memory::{MemoryRecordReader, MemoryTableWriter, StoredTable};
pub use observer::{LoggingObserver, RecordingObserver, TableSummary, WriteObserver};
pub use schema::RecordKind;
