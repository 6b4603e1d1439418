use super::Consolidator;
use super::result::OperationError;
use crate::datamodel::TidyDateTime;
use crate::exporters::{BackupRecord, ExportError};
use crate::storage::{RowQuery, StoreError};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackupError {
    #[error("reading rows failed: {0}")]
    Query(#[from] StoreError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("system clock unavailable: {0}")]
    Clock(String),
}

impl Consolidator {
    /// Export every row of `measurement` to the snapshot sink.
    ///
    /// Returns the number of rows exported. Has no effect on the store.
    pub async fn backup(&self, measurement: &str) -> Result<u64, BackupError> {
        let rows = self.store.query_rows(&RowQuery::all(measurement)).await?;
        let backup_time = TidyDateTime::now().map_err(|err| BackupError::Clock(err.to_string()))?;
        let record = BackupRecord::new(measurement, backup_time, rows);
        self.sink.write_snapshot(&record).await?;
        info!(
            "Backed up {} points from {} to {}",
            record.data_points,
            measurement,
            record.file_name()
        );
        Ok(record.data_points as u64)
    }

    /// [`Consolidator::backup`] as the gate in front of a destructive step.
    pub(super) async fn backup_before_destroy(
        &self,
        measurement: &str,
    ) -> Result<u64, OperationError> {
        self.backup(measurement).await.map_err(|source| {
            error!("Failed to backup measurement {}: {}", measurement, source);
            OperationError::BackupFailed {
                measurement: measurement.to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemorySink, MemoryStore, StoreCall};
    use std::sync::Arc;

    const LINES: &str = "\
power,tag_phase=1 watts=120.5 1704067200000000000
power,tag_phase=2 watts=98.0 1704067200000000000
power,tag_phase=1 watts=121.0 1704067260000000000";

    #[tokio::test]
    async fn test_backup_captures_all_rows() {
        let store = Arc::new(MemoryStore::from_line_protocol(LINES).unwrap());
        let sink = Arc::new(MemorySink::new());
        let consolidator = Consolidator::new(store.clone(), sink.clone());

        assert_eq!(consolidator.backup("power").await.unwrap(), 3);
        let records = sink.records_for("power");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data_points, 3);
        assert_eq!(records[0].data.len(), 3);
        // No side effect on the store
        assert_eq!(store.point_count("power"), 3);
        assert!(store.journal().entries().is_empty());
    }

    #[tokio::test]
    async fn test_backup_of_empty_measurement() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(MemorySink::new());
        let consolidator = Consolidator::new(store, sink.clone());
        assert_eq!(consolidator.backup("nothing").await.unwrap(), 0);
        assert_eq!(sink.records()[0].data_points, 0);
    }

    #[tokio::test]
    async fn test_backup_failures() {
        let store = Arc::new(MemoryStore::from_line_protocol(LINES).unwrap());
        let sink = Arc::new(MemorySink::new());
        let consolidator = Consolidator::new(store.clone(), sink.clone());

        sink.set_failing(true);
        assert!(matches!(
            consolidator.backup("power").await,
            Err(BackupError::Export(_))
        ));

        sink.set_failing(false);
        store.fail(StoreCall::QueryRows, Some("power"));
        assert!(matches!(
            consolidator.backup("power").await,
            Err(BackupError::Query(_))
        ));
        assert!(sink.records().is_empty());
    }
}
