use super::Journal;
use crate::exporters::{BackupRecord, ExportError, SnapshotSink};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Keeps every backup it is given. Journals `BACKUP "m" <n>` per record.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<BackupRecord>>,
    failing: AtomicBool,
    journal: Journal,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Refuse every following write while `failing` is set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<BackupRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn records_for(&self, measurement: &str) -> Vec<BackupRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.measurement == measurement)
            .collect()
    }
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn write_snapshot(&self, record: &BackupRecord) -> Result<(), ExportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ExportError::Write {
                measurement: record.measurement.clone(),
                details: "sink is failing".to_string(),
            });
        }
        // Records must serialise like a file-backed sink would write them
        record.to_json_pretty()?;
        self.records
            .lock()
            .map_err(|_| ExportError::Write {
                measurement: record.measurement.clone(),
                details: "sink lock poisoned".to_string(),
            })?
            .push(record.clone());
        self.journal.record(format!(
            "BACKUP \"{}\" {}",
            record.measurement, record.data_points
        ));
        Ok(())
    }
}
