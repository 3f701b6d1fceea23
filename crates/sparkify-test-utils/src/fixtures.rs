//! Pre-built records and engines for common test scenarios.
//!
//! Record fixtures serialize to the same NDJSON shape the raw datasets use,
//! so one value can feed either the in-memory engine (as a record batch) or
//! the local engine (as a file on disk).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use serde::Serialize;

use sparkify_etl::schema::{activity_record_schema, catalog_record_schema};
use sparkify_etl::{Engine, MemoryRecordReader, MemoryTableWriter, RecordingObserver};

/// Millisecond timestamp of 2018-11-12T02:37:38.796Z.
pub const REFERENCE_TS: i64 = 1_541_990_258_796;

/// A song/artist metadata record.
///
/// Fields mirror the raw record keys.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecordFixture {
    pub song_id: Option<String>,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub year: Option<i64>,
    pub duration: Option<f64>,
}

impl CatalogRecordFixture {
    /// Creates a record with the given ids and title.
    pub fn new(song_id: &str, title: &str, artist_id: &str) -> Self {
        Self {
            song_id: Some(song_id.to_string()),
            title: Some(title.to_string()),
            artist_id: Some(artist_id.to_string()),
            artist_name: Some(format!("Artist {artist_id}")),
            artist_location: None,
            artist_latitude: None,
            artist_longitude: None,
            year: Some(2000),
            duration: Some(200.0),
        }
    }

    /// The catalog side of the reference scenario.
    pub fn test_song() -> Self {
        Self {
            artist_name: Some("Test Artist".to_string()),
            ..Self::new("S1", "Test Song", "A1")
        }
    }

    /// Sets the release year.
    #[must_use]
    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }
}

/// A user activity record, with the camelCase keys of the raw log.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecordFixture {
    pub ts: Option<i64>,
    pub page: Option<String>,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl ActivityRecordFixture {
    /// Creates a `NextSong` play of `song` by `user_id` at `ts`.
    pub fn play(ts: i64, user_id: &str, level: &str, song: &str) -> Self {
        Self {
            ts: Some(ts),
            page: Some("NextSong".to_string()),
            user_id: Some(user_id.to_string()),
            first_name: Some(format!("First{user_id}")),
            last_name: Some(format!("Last{user_id}")),
            gender: Some("F".to_string()),
            level: Some(level.to_string()),
            song: Some(song.to_string()),
            artist: None,
            session_id: Some(1),
            location: Some("Somewhere, CA".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    /// The activity side of the reference scenario.
    pub fn test_play() -> Self {
        Self::play(REFERENCE_TS, "42", "paid", "Test Song")
    }

    /// Replaces the page, turning the record into a non-play event.
    #[must_use]
    pub fn on_page(mut self, page: &str) -> Self {
        self.page = Some(page.to_string());
        self
    }
}

fn strings<T>(records: &[T], field: impl Fn(&T) -> Option<&str>) -> ArrayRef {
    Arc::new(records.iter().map(field).collect::<StringArray>())
}

fn longs<T>(records: &[T], field: impl Fn(&T) -> Option<i64>) -> ArrayRef {
    Arc::new(records.iter().map(field).collect::<Int64Array>())
}

fn doubles<T>(records: &[T], field: impl Fn(&T) -> Option<f64>) -> ArrayRef {
    Arc::new(records.iter().map(field).collect::<Float64Array>())
}

/// Builds a catalog-record batch.
pub fn catalog_batch(records: &[CatalogRecordFixture]) -> RecordBatch {
    RecordBatch::try_new(
        catalog_record_schema(),
        vec![
            strings(records, |r| r.song_id.as_deref()),
            strings(records, |r| r.title.as_deref()),
            strings(records, |r| r.artist_id.as_deref()),
            strings(records, |r| r.artist_name.as_deref()),
            strings(records, |r| r.artist_location.as_deref()),
            doubles(records, |r| r.artist_latitude),
            doubles(records, |r| r.artist_longitude),
            longs(records, |r| r.year),
            doubles(records, |r| r.duration),
        ],
    )
    .expect("catalog batch matches schema")
}

/// Builds an activity-record batch.
pub fn activity_batch(records: &[ActivityRecordFixture]) -> RecordBatch {
    RecordBatch::try_new(
        activity_record_schema(),
        vec![
            longs(records, |r| r.ts),
            strings(records, |r| r.page.as_deref()),
            strings(records, |r| r.user_id.as_deref()),
            strings(records, |r| r.first_name.as_deref()),
            strings(records, |r| r.last_name.as_deref()),
            strings(records, |r| r.gender.as_deref()),
            strings(records, |r| r.level.as_deref()),
            strings(records, |r| r.song.as_deref()),
            strings(records, |r| r.artist.as_deref()),
            longs(records, |r| r.session_id),
            strings(records, |r| r.location.as_deref()),
            strings(records, |r| r.user_agent.as_deref()),
        ],
    )
    .expect("activity batch matches schema")
}

/// Writes `records` as NDJSON to `dir/relative`, creating parent directories.
pub fn write_ndjson<T: Serialize>(dir: &Path, relative: &str, records: &[T]) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record).expect("serialize fixture"));
        body.push('\n');
    }
    fs::write(&path, body).expect("write fixture");
    path
}

/// An in-memory engine with its collaborators exposed for inspection.
pub struct TestContext {
    /// Serves raw records.
    pub reader: Arc<MemoryRecordReader>,
    /// Captures written tables.
    pub writer: Arc<MemoryTableWriter>,
    /// Records every table summary.
    pub observer: Arc<RecordingObserver>,
    /// Engine wired to the collaborators above.
    pub engine: Engine,
}

impl TestContext {
    /// Catalog source location.
    pub const SONG_DATA: &'static str = "memory://song_data";
    /// Activity source location.
    pub const LOG_DATA: &'static str = "memory://log_data";
    /// Output root.
    pub const OUTPUT_DATA: &'static str = "memory://out";

    /// Creates a context with no sources registered.
    pub fn new() -> Self {
        let reader = Arc::new(MemoryRecordReader::new());
        let writer = Arc::new(MemoryTableWriter::new());
        let observer = Arc::new(RecordingObserver::new());
        let engine = Engine::in_memory(Arc::clone(&reader), Arc::clone(&writer))
            .with_observer(observer.clone());
        Self {
            reader,
            writer,
            observer,
            engine,
        }
    }

    /// Creates a context serving `catalog` and `activity` at the default locations.
    pub fn with_records(
        catalog: &[CatalogRecordFixture],
        activity: &[ActivityRecordFixture],
    ) -> Self {
        let ctx = Self::new();
        ctx.reader
            .insert(Self::SONG_DATA, vec![catalog_batch(catalog)])
            .expect("register catalog");
        ctx.reader
            .insert(Self::LOG_DATA, vec![activity_batch(activity)])
            .expect("register activity");
        ctx
    }

    /// A run configuration pointing at this context's locations.
    pub fn config(&self) -> sparkify_core::EtlConfig {
        sparkify_core::EtlConfig {
            song_data: Self::SONG_DATA.to_string(),
            log_data: Self::LOG_DATA.to_string(),
            output_data: Self::OUTPUT_DATA.to_string(),
            ..sparkify_core::EtlConfig::default()
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
