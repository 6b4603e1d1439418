use crate::datamodel::{Row, TidyDateTime, tidy_datetime::serialize_rfc3339};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("Failed to serialize backup of {measurement}: {details}")]
    Serialization {
        measurement: String,
        details: String,
    },

    /// The sink refused or failed to persist the record
    #[error("Failed to write backup of {measurement}: {details}")]
    Write {
        measurement: String,
        details: String,
    },
}

/// Everything a measurement held at capture time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupRecord {
    pub measurement: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub backup_time: TidyDateTime,
    pub data_points: usize,
    pub data: Vec<Row>,
}

impl BackupRecord {
    pub fn new(measurement: impl Into<String>, backup_time: TidyDateTime, data: Vec<Row>) -> Self {
        Self {
            measurement: measurement.into(),
            backup_time,
            data_points: data.len(),
            data,
        }
    }

    /// `<measurement>_backup_<YYYYmmdd_HHMMSS>.json`
    pub fn file_name(&self) -> String {
        let (year, month, day, hour, minute, second, _) = self.backup_time.to_gregorian_utc();
        format!(
            "{}_backup_{:04}{:02}{:02}_{:02}{:02}{:02}.json",
            self.measurement, year, month, day, hour, minute, second
        )
    }

    /// Indented JSON document with the keys `measurement`, `backup_time`,
    /// `data_points` and `data`.
    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        serde_json::to_string_pretty(self).map_err(|err| ExportError::Serialization {
            measurement: self.measurement.clone(),
            details: err.to_string(),
        })
    }
}

/// Destination for backups. Where records end up (files, object storage,
/// another database) is up to the implementation.
#[async_trait]
pub trait SnapshotSink: Send + Sync + Debug {
    async fn write_snapshot(&self, record: &BackupRecord) -> Result<(), ExportError>;
}
