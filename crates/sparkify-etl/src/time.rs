//! Timestamp derivation and calendar decomposition.
//!
//! Activity timestamps are epoch milliseconds. They are truncated (not
//! rounded) to epoch seconds and turned into a second-precision UTC
//! timestamp, `start_time`; every calendar field derives from that.
//!
//! `weekday` follows ISO 8601: 1 = Monday through 7 = Sunday. The engine's
//! `dow` part is 0 = Sunday, so it is shifted here.

use arrow::datatypes::DataType;
use datafusion::functions::expr_fn::{date_part, to_timestamp_seconds};
use datafusion::prelude::{Expr, cast, lit};

const MILLIS_PER_SECOND: i64 = 1000;

/// Epoch milliseconds to epoch seconds, truncating.
#[must_use]
pub fn epoch_seconds(ts_millis: Expr) -> Expr {
    ts_millis / lit(MILLIS_PER_SECOND)
}

/// Epoch milliseconds to a second-precision timestamp.
#[must_use]
pub fn start_time(ts_millis: Expr) -> Expr {
    to_timestamp_seconds(vec![epoch_seconds(ts_millis)])
}

fn part(name: &str, timestamp: Expr) -> Expr {
    cast(date_part(lit(name), timestamp), DataType::Int32)
}

/// Hour of day, 0–23.
#[must_use]
pub fn hour(timestamp: Expr) -> Expr {
    part("hour", timestamp)
}

/// Day of month, 1-based.
#[must_use]
pub fn day(timestamp: Expr) -> Expr {
    part("day", timestamp)
}

/// ISO week of year.
#[must_use]
pub fn week(timestamp: Expr) -> Expr {
    part("week", timestamp)
}

/// Month, 1–12.
#[must_use]
pub fn month(timestamp: Expr) -> Expr {
    part("month", timestamp)
}

/// Calendar year.
#[must_use]
pub fn year(timestamp: Expr) -> Expr {
    part("year", timestamp)
}

/// ISO day of week, 1 = Monday … 7 = Sunday.
#[must_use]
pub fn weekday(timestamp: Expr) -> Expr {
    (part("dow", timestamp) + lit(6_i32)) % lit(7_i32) + lit(1_i32)
}
