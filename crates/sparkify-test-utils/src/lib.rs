//! Shared test utilities for Sparkify ETL tests.
//!
//! This crate provides:
//! - [`TestContext`]: an in-memory engine with inspectable collaborators
//! - Record fixtures that build batches or NDJSON files
//! - Column extraction and assertion helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use sparkify_test_utils::{ActivityRecordFixture, CatalogRecordFixture, TestContext};
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let ctx = TestContext::with_records(
//!         &[CatalogRecordFixture::test_song()],
//!         &[ActivityRecordFixture::test_play()],
//!     );
//!     sparkify_etl::job::run(&ctx.engine, &ctx.config()).await.unwrap();
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::missing_panics_doc)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("sparkify_etl=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}
