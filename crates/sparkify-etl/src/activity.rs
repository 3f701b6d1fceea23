//! Activity pipeline: song plays → `users`, `time` and `songplays`.

use std::time::Instant;

use datafusion::prelude::{DataFrame, ident, lit};
use tracing::Instrument as _;

use sparkify_core::{StarTable, pipeline_span};

use crate::engine::Engine;
use crate::error::Result;
use crate::metrics;
use crate::observer::TableSummary;
use crate::schema::{RecordKind, USERS_COLUMNS, columns};
use crate::songplays::songplays_table;
use crate::time;

const PIPELINE: &str = "activity";

/// Page value marking a song play.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// Tables written by one activity run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySummary {
    /// The users dimension.
    pub users: TableSummary,
    /// The time dimension.
    pub time: TableSummary,
    /// The songplays fact table.
    pub songplays: TableSummary,
}

/// Keeps only song-play records.
///
/// # Errors
///
/// Returns an error if `activity` has no `page` column.
pub fn song_plays(activity: DataFrame) -> Result<DataFrame> {
    Ok(activity.filter(ident("page").eq(lit(NEXT_SONG_PAGE)))?)
}

/// Users dimension: one row per non-empty `userId`, taken from that user's
/// most recent play.
///
/// Rows are ordered by `ts` descending before deduplication and the first
/// row per user wins, so `level` reflects the latest activity.
///
/// # Errors
///
/// Returns an error if `plays` lacks an activity-record column.
pub fn users_table(plays: DataFrame) -> Result<DataFrame> {
    let users = plays
        .filter(ident("userId").not_eq(lit("")))?
        .distinct_on(
            vec![ident("userId")],
            columns(&USERS_COLUMNS),
            Some(vec![
                ident("userId").sort(true, false),
                ident("ts").sort(false, false),
            ]),
        )?;
    Ok(users)
}

/// Adds `start_time`, derived from the millisecond `ts`.
///
/// # Errors
///
/// Returns an error if `plays` has no `ts` column.
pub fn with_start_time(plays: DataFrame) -> Result<DataFrame> {
    Ok(plays.with_column("start_time", time::start_time(ident("ts")))?)
}

/// Time dimension: one row per distinct `start_time`, decomposed into
/// calendar fields.
///
/// Plays without a timestamp contribute nothing.
///
/// # Errors
///
/// Returns an error if `plays` has no `start_time` column.
pub fn time_table(plays: DataFrame) -> Result<DataFrame> {
    let start_time = || ident("start_time");
    let time = plays
        .select(vec![start_time()])?
        .filter(start_time().is_not_null())?
        .distinct()?
        .select(vec![
            start_time(),
            time::hour(start_time()).alias("hour"),
            time::day(start_time()).alias("day"),
            time::week(start_time()).alias("week"),
            time::month(start_time()).alias("month"),
            time::year(start_time()).alias("year"),
            time::weekday(start_time()).alias("weekday"),
        ])?;
    Ok(time)
}

/// Reads activity records from `log_data` and writes `users`, `time` and
/// `songplays` under `output_data`.
///
/// The songplays stage reads the persisted `songs` table from
/// `output_data`, so the catalog pipeline must have completed first.
///
/// # Errors
///
/// Returns an error if the source cannot be read, `songs` has not been
/// written, or any table cannot be written.
pub async fn process_log_data(
    engine: &Engine,
    log_data: &str,
    output_data: &str,
) -> Result<ActivitySummary> {
    let activity = engine
        .read_records(log_data, RecordKind::Activity)
        .instrument(pipeline_span(PIPELINE, "read"))
        .await?;
    let plays = song_plays(activity)?;

    let started = Instant::now();
    let users = engine
        .write_table(StarTable::Users, users_table(plays.clone())?, output_data)
        .instrument(pipeline_span(PIPELINE, "users"))
        .await?;
    metrics::record_stage_duration(PIPELINE, "users", started.elapsed().as_secs_f64());

    let plays = with_start_time(plays)?;

    let started = Instant::now();
    let time = engine
        .write_table(StarTable::Time, time_table(plays.clone())?, output_data)
        .instrument(pipeline_span(PIPELINE, "time"))
        .await?;
    metrics::record_stage_duration(PIPELINE, "time", started.elapsed().as_secs_f64());

    let started = Instant::now();
    let songplays = async {
        let songs = engine.read_table(StarTable::Songs, output_data).await?;
        engine
            .write_table(
                StarTable::Songplays,
                songplays_table(plays, songs)?,
                output_data,
            )
            .await
    }
    .instrument(pipeline_span(PIPELINE, "songplays"))
    .await?;
    metrics::record_stage_duration(PIPELINE, "songplays", started.elapsed().as_secs_f64());

    Ok(ActivitySummary {
        users,
        time,
        songplays,
    })
}
