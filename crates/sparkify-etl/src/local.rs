//! Filesystem collaborators: NDJSON in, Hive-partitioned Parquet out.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Array as _, UInt64Array};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::config::TableParquetOptions;
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::datasource::listing::ListingTableUrl;
use datafusion::functions::expr_fn::{coalesce, nullif};
use datafusion::prelude::{
    DataFrame, NdJsonReadOptions, ParquetReadOptions, SessionContext, cast, ident, lit,
};
use futures::TryStreamExt as _;
use glob::{MatchOptions, Pattern};
use object_store::ObjectMeta;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;

use crate::engine::{RecordReader, TableWriter};
use crate::error::{EtlError, Result};
use crate::schema::RecordKind;

/// Directory value used for null and empty partition values.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Value of the `created_by` key stamped into every Parquet file.
pub const CREATED_BY: &str = "sparkify-etl";

/// File holding the schema of a table written with no rows.
pub const EMPTY_TABLE_FILE: &str = "part-00000-empty.parquet";

const JSON_EXTENSION: &str = ".json";
const PARQUET_EXTENSION: &str = ".parquet";
const GLOB_CHARS: [char; 3] = ['*', '?', '['];

/// `*` stops at directory boundaries, so each wildcard spans one level.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Reads newline-delimited `.json` files through DataFusion.
///
/// Globs are expanded here rather than by DataFusion: a pattern such as
/// `song_data/*/*/*/*.json` may cross any number of directory levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordReader;

#[async_trait]
impl RecordReader for JsonRecordReader {
    async fn read(
        &self,
        ctx: &SessionContext,
        location: &str,
        kind: RecordKind,
    ) -> Result<DataFrame> {
        let files = list_matching_files(ctx, location, JSON_EXTENSION).await?;
        if files.is_empty() {
            return Err(EtlError::source_unreadable(
                location,
                format!("no '{JSON_EXTENSION}' files matched"),
            ));
        }
        tracing::info!(
            location,
            files = files.len(),
            kind = kind.as_str(),
            "source resolved"
        );

        let schema = kind.schema();
        let options = NdJsonReadOptions::default()
            .schema(&schema)
            .file_extension(JSON_EXTENSION);
        ctx.read_json(files, options)
            .await
            .map_err(|e| EtlError::source_unreadable(location, e))
    }
}

/// Writes Parquet file sets through DataFusion, Hive-partitioned.
///
/// A table with no rows is persisted as [`EMPTY_TABLE_FILE`] (under default
/// partition directories when partitioned) so it reads back with its schema.
#[derive(Debug, Clone, Default)]
pub struct ParquetTableWriter;

impl ParquetTableWriter {
    fn parquet_options() -> TableParquetOptions {
        let mut options = TableParquetOptions::default();
        options.global.compression = Some("snappy".to_string());
        options
            .key_value_metadata
            .insert("created_by".to_string(), Some(CREATED_BY.to_string()));
        options
    }

    fn writer_properties() -> WriterProperties {
        let created_by = KeyValue {
            key: "created_by".to_string(),
            value: Some(CREATED_BY.to_string()),
        };
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_key_value_metadata(Some(vec![created_by]))
            .build()
    }
}

#[async_trait]
impl TableWriter for ParquetTableWriter {
    async fn write(
        &self,
        table: DataFrame,
        destination: &str,
        partition_by: &[&str],
    ) -> Result<u64> {
        clear_destination(destination).await?;

        let table = stringify_partition_columns(table, partition_by)?;
        let schema = table.schema().as_arrow().clone();
        let options = DataFrameWriteOptions::new()
            .with_partition_by(partition_by.iter().map(ToString::to_string).collect());

        let batches = table
            .write_parquet(destination, options, Some(Self::parquet_options()))
            .await
            .map_err(|e| EtlError::write_failure(destination, e))?;

        let rows = rows_written(&batches);
        if rows == 0 {
            clear_destination(destination).await?;
            write_empty_table(destination, &schema, partition_by).await?;
        }
        tracing::debug!(destination, rows, ?partition_by, "parquet written");
        Ok(rows)
    }

    async fn read_back(
        &self,
        ctx: &SessionContext,
        destination: &str,
        partition_by: &[&str],
    ) -> Result<DataFrame> {
        if list_matching_files(ctx, destination, PARQUET_EXTENSION)
            .await?
            .is_empty()
        {
            return Err(EtlError::source_unreadable(
                destination,
                "no parquet files found; was the table written?",
            ));
        }

        let partition_cols = partition_by
            .iter()
            .map(|name| ((*name).to_string(), DataType::Utf8))
            .collect();
        let options = ParquetReadOptions::default().table_partition_cols(partition_cols);
        ctx.read_parquet(destination, options)
            .await
            .map_err(|e| EtlError::source_unreadable(destination, e))
    }
}

/// Splits `location` at the directory holding its first wildcard.
///
/// Returns the directory (with trailing `/`) and the pattern below it, or
/// the location unchanged when it has no wildcard.
fn split_glob(location: &str) -> (&str, Option<&str>) {
    let Some(wildcard) = location.find(GLOB_CHARS) else {
        return (location, None);
    };
    match location[..wildcard].rfind('/') {
        Some(slash) => (&location[..=slash], Some(&location[slash + 1..])),
        None => ("./", Some(location)),
    }
}

/// Lists the files under `location` (file, directory or glob) ending in
/// `file_extension`, as sorted URLs.
///
/// Directories are listed recursively.
async fn list_matching_files(
    ctx: &SessionContext,
    location: &str,
    file_extension: &str,
) -> Result<Vec<String>> {
    let (base, pattern) = split_glob(location);
    let url = ListingTableUrl::parse(base).map_err(|e| EtlError::source_unreadable(location, e))?;
    let store = ctx
        .runtime_env()
        .object_store(&url)
        .map_err(|e| EtlError::source_unreadable(location, e))?;

    let matcher = pattern
        .map(|pattern| {
            let prefix = url.prefix().as_ref();
            if prefix.is_empty() {
                Pattern::new(pattern)
            } else {
                Pattern::new(&format!("{}/{pattern}", Pattern::escape(prefix)))
            }
        })
        .transpose()
        .map_err(|e| EtlError::source_unreadable(location, e))?;

    let objects: Vec<ObjectMeta> = if url.is_collection() {
        store
            .list(Some(url.prefix()))
            .try_collect()
            .await
            .map_err(|e| EtlError::source_unreadable(location, e))?
    } else {
        match store.head(url.prefix()).await {
            Ok(meta) => vec![meta],
            Err(object_store::Error::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(EtlError::source_unreadable(location, e)),
        }
    };

    let store_url = url.object_store();
    let mut files: Vec<String> = objects
        .into_iter()
        .map(|meta| meta.location)
        .filter(|path| path.as_ref().ends_with(file_extension))
        .filter(|path| {
            matcher
                .as_ref()
                .is_none_or(|m| m.matches_with(path.as_ref(), MATCH_OPTIONS))
        })
        .map(|path| format!("{}{path}", store_url.as_str()))
        .collect();
    files.sort();
    Ok(files)
}

fn local_path(destination: &str) -> &str {
    destination.strip_prefix("file://").unwrap_or(destination)
}

/// Removes any previous output at `destination`.
async fn clear_destination(destination: &str) -> Result<()> {
    match tokio::fs::remove_dir_all(local_path(destination)).await {
        Ok(()) => {
            tracing::debug!(destination, "previous output removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EtlError::write_failure(
            destination,
            format!("failed to clear previous output: {e}"),
        )),
    }
}

/// Writes a row-less file carrying the non-partition columns of `schema`.
async fn write_empty_table(destination: &str, schema: &Schema, partition_by: &[&str]) -> Result<()> {
    let fields: Vec<_> = schema
        .fields()
        .iter()
        .filter(|field| !partition_by.contains(&field.name().as_str()))
        .cloned()
        .collect();

    let mut cursor = Cursor::new(Vec::<u8>::new());
    let writer = ArrowWriter::try_new(
        &mut cursor,
        Arc::new(Schema::new(fields)),
        Some(ParquetTableWriter::writer_properties()),
    )
    .map_err(|e| EtlError::write_failure(destination, format!("parquet writer init failed: {e}")))?;
    writer
        .close()
        .map_err(|e| EtlError::write_failure(destination, format!("parquet close failed: {e}")))?;

    let mut dir = PathBuf::from(local_path(destination));
    for column in partition_by {
        dir.push(format!("{column}={HIVE_DEFAULT_PARTITION}"));
    }
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| EtlError::write_failure(destination, e))?;
    tokio::fs::write(dir.join(EMPTY_TABLE_FILE), cursor.into_inner())
        .await
        .map_err(|e| EtlError::write_failure(destination, e))?;

    tracing::debug!(destination, "empty table written");
    Ok(())
}

/// Renders partition columns as strings so any column type can key a directory.
///
/// Nulls and empty strings both land in [`HIVE_DEFAULT_PARTITION`].
fn stringify_partition_columns(mut table: DataFrame, partition_by: &[&str]) -> Result<DataFrame> {
    for name in partition_by {
        let rendered = coalesce(vec![
            nullif(cast(ident(*name), DataType::Utf8), lit("")),
            lit(HIVE_DEFAULT_PARTITION),
        ]);
        table = table.with_column(name, rendered)?;
    }
    Ok(table)
}

/// Sums the `count` column DataFusion returns from a write.
fn rows_written(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter_map(|batch| batch.column_by_name("count"))
        .filter_map(|column| column.as_any().downcast_ref::<UInt64Array>())
        .flat_map(|counts| counts.iter().flatten())
        .sum()
}

/// Returns the key/value metadata stamped into written files.
#[must_use]
pub fn file_metadata() -> HashMap<String, Option<String>> {
    ParquetTableWriter::parquet_options().key_value_metadata
}
