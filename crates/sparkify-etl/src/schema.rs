//! Fixed record schemas for the two raw inputs.
//!
//! Raw records are schema-on-read NDJSON. Applying a fixed schema keeps the
//! column set stable regardless of which fields a particular file carries:
//! extra fields are ignored and missing fields read as null.
//!
//! The output column lists here are the contract for downstream readers;
//! the schema contract tests pin them.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::prelude::{Expr, ident};

/// The kind of raw record a source location holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Song/artist metadata, one record per song.
    Catalog,
    /// User activity log, one record per user action.
    Activity,
}

impl RecordKind {
    /// Returns the fixed schema applied when reading this kind of record.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        match self {
            Self::Catalog => catalog_record_schema(),
            Self::Activity => activity_record_schema(),
        }
    }

    /// Returns the name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Activity => "activity",
        }
    }
}

/// Schema of a catalog record.
#[must_use]
pub fn catalog_record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("artist_name", DataType::Utf8, true),
        Field::new("artist_location", DataType::Utf8, true),
        Field::new("artist_latitude", DataType::Float64, true),
        Field::new("artist_longitude", DataType::Float64, true),
        Field::new("year", DataType::Int64, true),
        Field::new("duration", DataType::Float64, true),
    ]))
}

/// Schema of an activity-log record.
#[must_use]
pub fn activity_record_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ts", DataType::Int64, true),
        Field::new("page", DataType::Utf8, true),
        Field::new("userId", DataType::Utf8, true),
        Field::new("firstName", DataType::Utf8, true),
        Field::new("lastName", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("song", DataType::Utf8, true),
        Field::new("artist", DataType::Utf8, true),
        Field::new("sessionId", DataType::Int64, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("userAgent", DataType::Utf8, true),
    ]))
}

/// Columns of the songs dimension, in output order.
pub const SONGS_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];

/// Columns of the artists dimension, in output order.
pub const ARTISTS_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

/// Columns of the users dimension, in output order.
pub const USERS_COLUMNS: [&str; 5] = ["userId", "firstName", "lastName", "gender", "level"];

/// Columns of the time dimension, in output order.
pub const TIME_COLUMNS: [&str; 7] = [
    "start_time",
    "hour",
    "day",
    "week",
    "month",
    "year",
    "weekday",
];

/// Columns of the songplays fact table, in output order.
pub const SONGPLAYS_COLUMNS: [&str; 11] = [
    "songplay_id",
    "start_time",
    "userId",
    "level",
    "song_id",
    "artist_id",
    "sessionId",
    "location",
    "userAgent",
    "year",
    "month",
];

/// Column references for `names`, case preserved.
#[must_use]
pub fn columns(names: &[&str]) -> Vec<Expr> {
    names.iter().map(|name| ident(*name)).collect()
}
