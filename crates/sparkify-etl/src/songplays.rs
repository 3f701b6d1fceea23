//! Songplays fact assembly.
//!
//! Plays are linked to the catalog by an exact match of the play's `song`
//! against the catalog `title`. The two inputs share no identifier, so this
//! is the only available key; differences in casing or punctuation leave the
//! play unlinked (`song_id` and `artist_id` null) rather than dropping it.

use arrow::datatypes::DataType;
use datafusion::common::JoinType;
use datafusion::functions::expr_fn::nullif;
use datafusion::functions_window::expr_fn::row_number;
use datafusion::prelude::{DataFrame, cast, ident, lit};

use crate::error::Result;
use crate::local::HIVE_DEFAULT_PARTITION;
use crate::schema::{SONGPLAYS_COLUMNS, columns};
use crate::time;

/// Columns carried from each play into the fact table.
const PLAY_COLUMNS: [&str; 8] = [
    "start_time",
    "userId",
    "level",
    "song_id",
    "artist_id",
    "sessionId",
    "location",
    "userAgent",
];

/// Reduces persisted songs to one catalog entry per title.
///
/// A title shared by several songs would otherwise fan one play out into
/// several fact rows; the lowest `song_id` wins.
fn songs_by_title(songs: DataFrame) -> Result<DataFrame> {
    let text = |name: &str| cast(ident(name), DataType::Utf8).alias(name);
    let songs = songs
        .select(vec![
            text("song_id"),
            text("title"),
            nullif(
                cast(ident("artist_id"), DataType::Utf8),
                lit(HIVE_DEFAULT_PARTITION),
            )
            .alias("artist_id"),
        ])?
        .filter(ident("title").is_not_null())?
        .distinct_on(
            vec![ident("title")],
            columns(&["song_id", "title", "artist_id"]),
            Some(vec![
                ident("title").sort(true, false),
                ident("song_id").sort(true, false),
            ]),
        )?;
    Ok(songs)
}

/// Songplays fact table: one row per play, left-joined to `songs`.
///
/// `plays` must already carry `start_time`. `songplay_id` is a 1-based row
/// number, unique within the run only.
///
/// # Errors
///
/// Returns an error if either input lacks a required column.
pub fn songplays_table(plays: DataFrame, songs: DataFrame) -> Result<DataFrame> {
    let songplays = plays
        .join(
            songs_by_title(songs)?,
            JoinType::Left,
            &["song"],
            &["title"],
            None,
        )?
        .select(columns(&PLAY_COLUMNS))?
        .with_column("songplay_id", row_number())?
        .with_column("year", time::year(ident("start_time")))?
        .with_column("month", time::month(ident("start_time")))?
        .select(columns(&SONGPLAYS_COLUMNS))?;
    Ok(songplays)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array as _, AsArray as _, Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{Field, Schema};
    use datafusion::prelude::SessionContext;

    use super::*;

    fn plays(ctx: &SessionContext, songs: &[Option<&str>]) -> DataFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ts", DataType::Int64, true),
            Field::new("userId", DataType::Utf8, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("song", DataType::Utf8, true),
            Field::new("sessionId", DataType::Int64, true),
            Field::new("location", DataType::Utf8, true),
            Field::new("userAgent", DataType::Utf8, true),
        ]));
        let n = songs.len();
        let ts: Vec<i64> = (0..n)
            .map(|i| 1_541_990_258_796 + i64::try_from(i).expect("small") * 1_000)
            .collect();
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(ts)),
                Arc::new(StringArray::from(vec!["42"; n])),
                Arc::new(StringArray::from(vec!["paid"; n])),
                Arc::new(StringArray::from(songs.to_vec())),
                Arc::new(Int64Array::from(vec![1_i64; n])),
                Arc::new(StringArray::from(vec!["Berlin"; n])),
                Arc::new(StringArray::from(vec!["curl"; n])),
            ],
        )
        .expect("batch");
        ctx.read_batch(batch)
            .expect("frame")
            .with_column("start_time", time::start_time(ident("ts")))
            .expect("start_time")
    }

    fn songs(ctx: &SessionContext, rows: &[(&str, &str, &str)]) -> DataFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("song_id", DataType::Utf8, true),
            Field::new("title", DataType::Utf8, true),
            Field::new("artist_id", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.1))),
                Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.2))),
            ],
        )
        .expect("batch");
        ctx.read_batch(batch).expect("frame")
    }

    async fn collect(frame: DataFrame) -> RecordBatch {
        let schema = Arc::new(frame.schema().as_arrow().clone());
        let batches = frame.collect().await.expect("collect");
        arrow::compute::concat_batches(&schema, &batches).expect("concat")
    }

    #[tokio::test]
    async fn test_unmatched_play_keeps_row_with_null_keys() {
        let ctx = SessionContext::new();
        let table = songplays_table(
            plays(&ctx, &[Some("Unknown Song")]),
            songs(&ctx, &[("S1", "Test Song", "A1")]),
        )
        .expect("plan");
        let batch = collect(table).await;

        assert_eq!(batch.num_rows(), 1);
        assert!(batch.column_by_name("song_id").expect("song_id").is_null(0));
        assert!(batch.column_by_name("artist_id").expect("artist_id").is_null(0));
    }

    #[tokio::test]
    async fn test_duplicate_titles_do_not_fan_out() {
        let ctx = SessionContext::new();
        let table = songplays_table(
            plays(&ctx, &[Some("Test Song"), None]),
            songs(&ctx, &[("S2", "Test Song", "A2"), ("S1", "Test Song", "A1")]),
        )
        .expect("plan");
        let batch = collect(table).await;

        assert_eq!(batch.num_rows(), 2);
        let song_ids = batch.column_by_name("song_id").expect("song_id");
        let song_ids = arrow::compute::cast(song_ids, &DataType::Utf8).expect("utf8");
        let matched: Vec<_> = song_ids.as_string::<i32>().iter().flatten().collect();
        assert_eq!(matched, vec!["S1"]);
    }

    #[tokio::test]
    async fn test_output_columns_and_unique_ids() {
        let ctx = SessionContext::new();
        let table = songplays_table(
            plays(&ctx, &[Some("Test Song"), Some("Test Song"), Some("Other")]),
            songs(&ctx, &[("S1", "Test Song", "A1")]),
        )
        .expect("plan");

        let names: Vec<_> = table
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, SONGPLAYS_COLUMNS.to_vec());

        let batch = collect(table).await;
        let ids = arrow::compute::cast(
            batch.column_by_name("songplay_id").expect("songplay_id"),
            &DataType::Int64,
        )
        .expect("int64");
        let mut ids = ids.as_primitive::<arrow::datatypes::Int64Type>().values().to_vec();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
