//! Logging bootstrap when another subscriber already owns the process.
//!
//! Runs in its own test binary: the global subscriber can only be set once.

#![allow(clippy::expect_used)]

use sparkify_core::{Error, LogFormat, init_logging, try_init_logging};
use tracing_subscriber::util::SubscriberInitExt as _;

#[test]
fn test_existing_subscriber_is_reported_and_kept() {
    tracing_subscriber::registry().init();

    let err = try_init_logging(LogFormat::Json).expect_err("subscriber already installed");
    assert!(matches!(err, Error::Logging(_)), "{err}");

    // Reports through the existing subscriber instead of panicking.
    init_logging(LogFormat::Pretty);
}
