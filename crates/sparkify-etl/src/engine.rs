//! Execution engine handle and its external collaborators.
//!
//! The pipelines never reach for ambient state: everything they need to read
//! raw records, persist tables and report row counts travels in an
//! [`Engine`] value. Swapping the collaborators swaps the environment:
//!
//! - [`Engine::local`]: NDJSON from the filesystem, Parquet to the filesystem
//! - [`Engine::in_memory`]: record batches in, record batches out (tests)

use std::sync::Arc;

use async_trait::async_trait;
use datafusion::prelude::{DataFrame, SessionConfig, SessionContext};

use sparkify_core::StarTable;

use crate::error::Result;
use crate::local::{JsonRecordReader, ParquetTableWriter};
use crate::memory::{MemoryRecordReader, MemoryTableWriter};
use crate::metrics;
use crate::observer::{TableSummary, WriteObserver};
use crate::schema::RecordKind;

/// Materializes raw records into a tabular view.
#[async_trait]
pub trait RecordReader: Send + Sync + 'static {
    /// Reads every record at `location` with the fixed schema for `kind`.
    ///
    /// `location` may be a single file, a directory, or a glob that expands
    /// to many files read as one logical source.
    ///
    /// Returns `EtlError::SourceUnreadable` if the location cannot be opened
    /// or matches nothing.
    async fn read(
        &self,
        ctx: &SessionContext,
        location: &str,
        kind: RecordKind,
    ) -> Result<DataFrame>;
}

/// Persists tables, optionally partitioned, and reads them back.
#[async_trait]
pub trait TableWriter: Send + Sync + 'static {
    /// Persists `table` under `destination`, replacing whatever was there.
    ///
    /// Non-empty `partition_by` splits the output into `col=value`
    /// subdirectories. Returns the number of rows written.
    ///
    /// Returns `EtlError::WriteFailure` if the destination cannot be cleared
    /// or written.
    async fn write(&self, table: DataFrame, destination: &str, partition_by: &[&str])
    -> Result<u64>;

    /// Reads a table previously persisted at `destination`.
    ///
    /// Partition columns are restored from the directory layout as strings.
    async fn read_back(
        &self,
        ctx: &SessionContext,
        destination: &str,
        partition_by: &[&str],
    ) -> Result<DataFrame>;
}

/// Builds a session context with the given parallelism.
#[must_use]
pub fn session_context(target_partitions: Option<usize>) -> SessionContext {
    let mut config = SessionConfig::new();
    if let Some(partitions) = target_partitions {
        config = config.with_target_partitions(partitions);
    }
    SessionContext::new_with_config(config)
}

/// Explicit engine handle passed into both pipelines.
pub struct Engine {
    ctx: SessionContext,
    reader: Arc<dyn RecordReader>,
    writer: Arc<dyn TableWriter>,
    observer: Option<Arc<dyn WriteObserver>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("session_id", &self.ctx.session_id())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine from explicit collaborators.
    #[must_use]
    pub fn new(
        ctx: SessionContext,
        reader: Arc<dyn RecordReader>,
        writer: Arc<dyn TableWriter>,
    ) -> Self {
        Self {
            ctx,
            reader,
            writer,
            observer: None,
        }
    }

    /// Creates an engine that reads NDJSON and writes Parquet on the local filesystem.
    #[must_use]
    pub fn local(target_partitions: Option<usize>) -> Self {
        Self::new(
            session_context(target_partitions),
            Arc::new(JsonRecordReader::default()),
            Arc::new(ParquetTableWriter::default()),
        )
    }

    /// Creates an engine backed by in-memory collaborators.
    #[must_use]
    pub fn in_memory(reader: Arc<MemoryRecordReader>, writer: Arc<MemoryTableWriter>) -> Self {
        Self::new(session_context(Some(1)), reader, writer)
    }

    /// Attaches an observer notified after every table write.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn WriteObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the underlying session context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Reads raw records through the configured [`RecordReader`].
    ///
    /// # Errors
    ///
    /// Returns `EtlError::SourceUnreadable` if the location cannot be read.
    pub async fn read_records(&self, location: &str, kind: RecordKind) -> Result<DataFrame> {
        tracing::debug!(location, kind = kind.as_str(), "reading records");
        self.reader.read(&self.ctx, location, kind).await
    }

    /// Writes `table` to its canonical location under `output_root`.
    ///
    /// # Errors
    ///
    /// Returns `EtlError::WriteFailure` if the writer cannot persist the table.
    pub async fn write_table(
        &self,
        table: StarTable,
        frame: DataFrame,
        output_root: &str,
    ) -> Result<TableSummary> {
        let location = table.location(output_root);
        let partition_by = table.partition_columns();

        let rows = self.writer.write(frame, &location, partition_by).await?;

        let summary = TableSummary {
            table,
            rows,
            location,
            partition_by: partition_by.iter().map(ToString::to_string).collect(),
        };
        metrics::record_table_written(table, rows);
        if let Some(observer) = &self.observer {
            observer.on_table_written(&summary);
        }
        Ok(summary)
    }

    /// Reads a table persisted by an earlier [`Engine::write_table`] call.
    ///
    /// # Errors
    ///
    /// Returns `EtlError::SourceUnreadable` if the table has not been written.
    pub async fn read_table(&self, table: StarTable, output_root: &str) -> Result<DataFrame> {
        let location = table.location(output_root);
        self.writer
            .read_back(&self.ctx, &location, table.partition_columns())
            .await
    }
}
