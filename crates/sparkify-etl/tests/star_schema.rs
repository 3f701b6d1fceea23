//! End-to-end runs against the in-memory engine.
//!
//! Each test registers raw records, runs the job and inspects what the
//! writer captured at each table's canonical location.

use sparkify_core::{Stage, StarTable};
use sparkify_etl::{EtlError, job};
use sparkify_test_utils::{
    ActivityRecordFixture, CatalogRecordFixture, TestContext, assert_non_empty, assert_unique,
    init_test_logging, string_values,
};

fn stored(ctx: &TestContext, table: StarTable) -> Vec<arrow::array::RecordBatch> {
    ctx.writer
        .table(&table.location(TestContext::OUTPUT_DATA))
        .unwrap_or_else(|| panic!("{table} was not written"))
        .batches
}

fn strings(ctx: &TestContext, table: StarTable, column: &str) -> Vec<Option<String>> {
    string_values(&stored(ctx, table), column)
}

fn some(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some((*v).to_string())).collect()
}

#[tokio::test]
async fn test_reference_scenario_links_play_to_catalog() {
    init_test_logging();
    let ctx = TestContext::with_records(
        &[CatalogRecordFixture::test_song()],
        &[ActivityRecordFixture::test_play()],
    );

    let summary = job::run(&ctx.engine, &ctx.config()).await.unwrap();

    assert_eq!(strings(&ctx, StarTable::Songs, "song_id"), some(&["S1"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "userId"), some(&["42"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "song_id"), some(&["S1"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "artist_id"), some(&["A1"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "level"), some(&["paid"]));

    let rows: Vec<_> = summary.tables().iter().map(|t| (t.table, t.rows)).collect();
    assert_eq!(
        rows,
        vec![
            (StarTable::Songs, 1),
            (StarTable::Artists, 1),
            (StarTable::Users, 1),
            (StarTable::Time, 1),
            (StarTable::Songplays, 1),
        ]
    );
}

#[tokio::test]
async fn test_dimension_keys_are_unique_and_non_empty() {
    let catalog = vec![
        CatalogRecordFixture::new("S1", "One", "A1"),
        CatalogRecordFixture::new("S1", "One", "A1"),
        CatalogRecordFixture::new("S2", "Two", "A1"),
        CatalogRecordFixture::new("", "Nameless", ""),
    ];
    let activity = vec![
        ActivityRecordFixture::play(1_541_990_258_796, "1", "free", "One"),
        ActivityRecordFixture::play(1_541_990_258_100, "1", "free", "Two"),
        ActivityRecordFixture::play(1_541_990_300_000, "2", "paid", "One"),
        ActivityRecordFixture::play(1_541_990_400_000, "", "paid", "One"),
    ];
    let ctx = TestContext::with_records(&catalog, &activity);

    job::run(&ctx.engine, &ctx.config()).await.unwrap();

    for (table, key) in [
        (StarTable::Songs, "song_id"),
        (StarTable::Artists, "artist_id"),
        (StarTable::Users, "userId"),
        (StarTable::Time, "start_time"),
    ] {
        let keys = strings(&ctx, table, key);
        assert_unique(&keys, key);
        assert_non_empty(&keys, key);
    }
    assert_eq!(strings(&ctx, StarTable::Time, "start_time").len(), 3);
    assert_eq!(stored(&ctx, StarTable::Songplays).iter().map(|b| b.num_rows()).sum::<usize>(), 4);
}

#[tokio::test]
async fn test_non_play_pages_never_reach_activity_tables() {
    let activity = vec![
        ActivityRecordFixture::play(1_541_990_258_796, "1", "free", "Test Song"),
        ActivityRecordFixture::play(1_541_990_999_000, "2", "paid", "Test Song").on_page("Home"),
        ActivityRecordFixture::play(1_541_991_999_000, "3", "paid", "Test Song").on_page("Logout"),
    ];
    let ctx = TestContext::with_records(&[CatalogRecordFixture::test_song()], &activity);

    job::run(&ctx.engine, &ctx.config()).await.unwrap();

    assert_eq!(strings(&ctx, StarTable::Users, "userId"), some(&["1"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "userId"), some(&["1"]));
    assert_eq!(strings(&ctx, StarTable::Time, "start_time").len(), 1);
}

#[tokio::test]
async fn test_user_level_reflects_latest_play() {
    let activity = vec![
        ActivityRecordFixture::play(1_541_990_000_000, "7", "free", "Test Song"),
        ActivityRecordFixture::play(1_541_999_000_000, "7", "paid", "Test Song"),
        ActivityRecordFixture::play(1_541_995_000_000, "7", "free", "Test Song"),
    ];
    let ctx = TestContext::with_records(&[CatalogRecordFixture::test_song()], &activity);

    job::run(&ctx.engine, &ctx.config()).await.unwrap();

    assert_eq!(strings(&ctx, StarTable::Users, "level"), some(&["paid"]));
}

#[tokio::test]
async fn test_unmatched_play_is_kept_with_null_keys() {
    let ctx = TestContext::with_records(
        &[CatalogRecordFixture::test_song()],
        &[ActivityRecordFixture::play(
            1_541_990_258_796,
            "42",
            "paid",
            "test song",
        )],
    );

    job::run(&ctx.engine, &ctx.config()).await.unwrap();

    assert_eq!(strings(&ctx, StarTable::Songplays, "userId"), some(&["42"]));
    assert_eq!(strings(&ctx, StarTable::Songplays, "song_id"), vec![None]);
    assert_eq!(strings(&ctx, StarTable::Songplays, "artist_id"), vec![None]);
}

#[tokio::test]
async fn test_no_song_plays_yields_empty_tables() {
    let activity =
        vec![ActivityRecordFixture::play(1_541_990_258_796, "1", "free", "x").on_page("Home")];
    let ctx = TestContext::with_records(&[CatalogRecordFixture::test_song()], &activity);

    let summary = job::run(&ctx.engine, &ctx.config()).await.unwrap();

    let activity = summary.activity.expect("activity ran");
    assert_eq!(activity.users.rows, 0);
    assert_eq!(activity.time.rows, 0);
    assert_eq!(activity.songplays.rows, 0);
    let stored = ctx
        .writer
        .table(&StarTable::Songplays.location(TestContext::OUTPUT_DATA))
        .expect("empty table still written");
    assert_eq!(stored.num_rows(), 0);
    assert_eq!(
        stored.schema.fields().len(),
        sparkify_etl::schema::SONGPLAYS_COLUMNS.len()
    );
}

#[tokio::test]
async fn test_write_failure_aborts_run() {
    let ctx = TestContext::with_records(
        &[CatalogRecordFixture::test_song()],
        &[ActivityRecordFixture::test_play()],
    );
    ctx.writer
        .fail_writes_to(StarTable::Artists.location(TestContext::OUTPUT_DATA))
        .unwrap();

    let err = job::run(&ctx.engine, &ctx.config()).await.unwrap_err();

    assert!(matches!(err, EtlError::WriteFailure { .. }), "{err}");
    let written = ctx.writer.destinations();
    assert_eq!(written, vec![StarTable::Songs.location(TestContext::OUTPUT_DATA)]);
    assert_eq!(ctx.observer.summaries().len(), 1);
}

#[tokio::test]
async fn test_missing_source_is_unreadable() {
    let ctx = TestContext::new();

    let err = job::run(&ctx.engine, &ctx.config()).await.unwrap_err();

    assert!(matches!(err, EtlError::SourceUnreadable { .. }), "{err}");
    assert!(ctx.writer.destinations().is_empty());
}

#[tokio::test]
async fn test_observer_sees_tables_in_write_order() {
    let ctx = TestContext::with_records(
        &[CatalogRecordFixture::test_song()],
        &[ActivityRecordFixture::test_play()],
    );

    job::run(&ctx.engine, &ctx.config()).await.unwrap();

    let order: Vec<_> = ctx.observer.summaries().iter().map(|s| s.table).collect();
    assert_eq!(order, StarTable::all().to_vec());
}

#[tokio::test]
async fn test_activity_stage_needs_persisted_songs() {
    let ctx = TestContext::with_records(
        &[CatalogRecordFixture::test_song()],
        &[ActivityRecordFixture::test_play()],
    );
    let activity_only = sparkify_core::EtlConfig {
        stage: Stage::Activity,
        ..ctx.config()
    };

    let err = job::run(&ctx.engine, &activity_only).await.unwrap_err();
    assert!(matches!(err, EtlError::SourceUnreadable { .. }), "{err}");

    let catalog_only = sparkify_core::EtlConfig {
        stage: Stage::Catalog,
        ..ctx.config()
    };
    let summary = job::run(&ctx.engine, &catalog_only).await.unwrap();
    assert!(summary.activity.is_none());

    let summary = job::run(&ctx.engine, &activity_only).await.unwrap();
    assert!(summary.catalog.is_none());
    assert_eq!(strings(&ctx, StarTable::Songplays, "song_id"), some(&["S1"]));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_reading() {
    let ctx = TestContext::new();
    let config = sparkify_core::EtlConfig {
        output_data: "  ".to_string(),
        ..ctx.config()
    };

    let err = job::run(&ctx.engine, &config).await.unwrap_err();
    assert!(matches!(err, EtlError::Config(_)), "{err}");
}
