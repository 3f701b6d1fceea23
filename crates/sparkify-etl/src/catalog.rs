//! Catalog pipeline: song metadata → `songs` and `artists`.

use std::time::Instant;

use datafusion::prelude::{DataFrame, ident, lit};
use tracing::Instrument as _;

use sparkify_core::{StarTable, pipeline_span};

use crate::engine::Engine;
use crate::error::Result;
use crate::metrics;
use crate::observer::TableSummary;
use crate::schema::{ARTISTS_COLUMNS, RecordKind, SONGS_COLUMNS, columns};

const PIPELINE: &str = "catalog";

/// Tables written by one catalog run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSummary {
    /// The songs dimension.
    pub songs: TableSummary,
    /// The artists dimension.
    pub artists: TableSummary,
}

/// Songs dimension: one row per non-empty `song_id`.
///
/// Which duplicate survives is unspecified; catalog entries are assumed
/// consistent per id.
///
/// # Errors
///
/// Returns an error if `catalog` lacks a catalog-record column.
pub fn songs_table(catalog: DataFrame) -> Result<DataFrame> {
    let songs = catalog
        .select(columns(&SONGS_COLUMNS))?
        .filter(ident("song_id").not_eq(lit("")))?
        .distinct_on(vec![ident("song_id")], columns(&SONGS_COLUMNS), None)?;
    Ok(songs)
}

/// Artists dimension: one row per non-empty `artist_id`.
///
/// # Errors
///
/// Returns an error if `catalog` lacks a catalog-record column.
pub fn artists_table(catalog: DataFrame) -> Result<DataFrame> {
    let artists = catalog
        .select(columns(&ARTISTS_COLUMNS))?
        .filter(ident("artist_id").not_eq(lit("")))?
        .distinct_on(vec![ident("artist_id")], columns(&ARTISTS_COLUMNS), None)?;
    Ok(artists)
}

/// Reads catalog records from `song_data` and writes `songs` and `artists`
/// under `output_data`.
///
/// `songs` is fully written before this returns, so the activity pipeline
/// can join against it.
///
/// # Errors
///
/// Returns an error if the source cannot be read or either table cannot be
/// written. A failure writing `artists` leaves `songs` in place.
pub async fn process_song_data(
    engine: &Engine,
    song_data: &str,
    output_data: &str,
) -> Result<CatalogSummary> {
    let catalog = engine
        .read_records(song_data, RecordKind::Catalog)
        .instrument(pipeline_span(PIPELINE, "read"))
        .await?;

    let started = Instant::now();
    let songs = engine
        .write_table(StarTable::Songs, songs_table(catalog.clone())?, output_data)
        .instrument(pipeline_span(PIPELINE, "songs"))
        .await?;
    metrics::record_stage_duration(PIPELINE, "songs", started.elapsed().as_secs_f64());

    let started = Instant::now();
    let artists = engine
        .write_table(StarTable::Artists, artists_table(catalog)?, output_data)
        .instrument(pipeline_span(PIPELINE, "artists"))
        .await?;
    metrics::record_stage_duration(PIPELINE, "artists", started.elapsed().as_secs_f64());

    Ok(CatalogSummary { songs, artists })
}
