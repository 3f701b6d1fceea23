//! In-memory collaborators for tests and dry runs.
//!
//! Thread-safe via `RwLock`. Not suitable for production datasets: every
//! written table is fully collected into memory.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::MemTable;
use datafusion::prelude::{DataFrame, SessionContext};

use crate::engine::{RecordReader, TableWriter};
use crate::error::{EtlError, Result};
use crate::schema::RecordKind;

fn poisoned() -> EtlError {
    EtlError::Internal {
        message: "lock poisoned".into(),
    }
}

/// Serves pre-registered record batches by location.
#[derive(Debug, Default)]
pub struct MemoryRecordReader {
    sources: RwLock<HashMap<String, Vec<RecordBatch>>>,
}

impl MemoryRecordReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `batches` under `location`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn insert(&self, location: impl Into<String>, batches: Vec<RecordBatch>) -> Result<()> {
        self.sources
            .write()
            .map_err(|_| poisoned())?
            .insert(location.into(), batches);
        Ok(())
    }
}

#[async_trait]
impl RecordReader for MemoryRecordReader {
    async fn read(
        &self,
        ctx: &SessionContext,
        location: &str,
        kind: RecordKind,
    ) -> Result<DataFrame> {
        let batches = self
            .sources
            .read()
            .map_err(|_| poisoned())?
            .get(location)
            .cloned()
            .ok_or_else(|| EtlError::source_unreadable(location, "no such source"))?;

        let schema = kind.schema();
        if let Some(batch) = batches
            .iter()
            .find(|batch| batch.schema().fields() != schema.fields())
        {
            return Err(EtlError::Schema {
                message: format!(
                    "{location}: expected {} record columns, got {:?}",
                    kind.as_str(),
                    batch
                        .schema()
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                ),
            });
        }

        let table = MemTable::try_new(schema, vec![batches])
            .map_err(|e| EtlError::source_unreadable(location, e))?;
        Ok(ctx.read_table(Arc::new(table))?)
    }
}

/// A table captured by [`MemoryTableWriter`].
#[derive(Debug, Clone)]
pub struct StoredTable {
    /// Schema of the written rows.
    pub schema: SchemaRef,
    /// The written rows.
    pub batches: Vec<RecordBatch>,
    /// Columns the table was partitioned by.
    pub partition_by: Vec<String>,
}

impl StoredTable {
    /// Returns the number of stored rows.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }
}

/// Captures written tables in memory, keyed by destination.
#[derive(Debug, Default)]
pub struct MemoryTableWriter {
    tables: RwLock<HashMap<String, StoredTable>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryTableWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write to `destination` fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn fail_writes_to(&self, destination: impl Into<String>) -> Result<()> {
        self.failing
            .write()
            .map_err(|_| poisoned())?
            .insert(destination.into());
        Ok(())
    }

    /// Returns the table written at `destination`, if any.
    #[must_use]
    pub fn table(&self, destination: &str) -> Option<StoredTable> {
        self.tables.read().ok()?.get(destination).cloned()
    }

    /// Returns every destination written so far, sorted.
    #[must_use]
    pub fn destinations(&self) -> Vec<String> {
        let mut destinations: Vec<String> = self
            .tables
            .read()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        destinations.sort();
        destinations
    }
}

#[async_trait]
impl TableWriter for MemoryTableWriter {
    async fn write(
        &self,
        table: DataFrame,
        destination: &str,
        partition_by: &[&str],
    ) -> Result<u64> {
        if self
            .failing
            .read()
            .map_err(|_| poisoned())?
            .contains(destination)
        {
            return Err(EtlError::write_failure(destination, "injected failure"));
        }

        let declared: SchemaRef = Arc::new(table.schema().as_arrow().clone());
        let batches = table
            .collect()
            .await
            .map_err(|e| EtlError::write_failure(destination, e))?;
        let schema = batches.first().map_or(declared, RecordBatch::schema);

        let stored = StoredTable {
            schema,
            batches,
            partition_by: partition_by.iter().map(ToString::to_string).collect(),
        };
        let rows = stored.num_rows() as u64;

        self.tables
            .write()
            .map_err(|_| poisoned())?
            .insert(destination.to_string(), stored);
        Ok(rows)
    }

    async fn read_back(
        &self,
        ctx: &SessionContext,
        destination: &str,
        _partition_by: &[&str],
    ) -> Result<DataFrame> {
        let stored = self.table(destination).ok_or_else(|| {
            EtlError::source_unreadable(destination, "table has not been written")
        })?;

        let table = MemTable::try_new(stored.schema, vec![stored.batches])
            .map_err(|e| EtlError::source_unreadable(destination, e))?;
        Ok(ctx.read_table(Arc::new(table))?)
    }
}
