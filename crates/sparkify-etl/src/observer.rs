//! Row-count reporting after each table write.
//!
//! Reporting is a side channel: pipelines hand a [`TableSummary`] to whatever
//! [`WriteObserver`] the engine carries and never print anything themselves.

use std::sync::Mutex;

use sparkify_core::StarTable;

/// What was written for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// The table that was written.
    pub table: StarTable,
    /// Number of rows persisted.
    pub rows: u64,
    /// Destination directory.
    pub location: String,
    /// Columns the output was partitioned by.
    pub partition_by: Vec<String>,
}

/// Receives a summary after every successful table write.
pub trait WriteObserver: Send + Sync {
    /// Called once per written table, in write order.
    fn on_table_written(&self, summary: &TableSummary);
}

/// Logs each summary at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl WriteObserver for LoggingObserver {
    fn on_table_written(&self, summary: &TableSummary) {
        tracing::info!(
            table = summary.table.as_str(),
            rows = summary.rows,
            location = %summary.location,
            partition_by = ?summary.partition_by,
            "{} with {} rows processed and stored",
            summary.table,
            summary.rows,
        );
    }
}

/// Keeps every summary it sees.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    summaries: Mutex<Vec<TableSummary>>,
}

impl RecordingObserver {
    /// Creates an empty observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summaries seen so far, in write order.
    #[must_use]
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.summaries
            .lock()
            .map(|summaries| summaries.clone())
            .unwrap_or_default()
    }
}

impl WriteObserver for RecordingObserver {
    fn on_table_written(&self, summary: &TableSummary) {
        if let Ok(mut summaries) = self.summaries.lock() {
            summaries.push(summary.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(table: StarTable, rows: u64) -> TableSummary {
        TableSummary {
            table,
            rows,
            location: table.location("out"),
            partition_by: vec![],
        }
    }

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_table_written(&summary(StarTable::Songs, 3));
        observer.on_table_written(&summary(StarTable::Artists, 2));

        let tables: Vec<_> = observer.summaries().iter().map(|s| s.table).collect();
        assert_eq!(tables, vec![StarTable::Songs, StarTable::Artists]);
    }

    #[test]
    fn test_logging_observer_does_not_panic() {
        LoggingObserver.on_table_written(&summary(StarTable::Time, 0));
    }
}
