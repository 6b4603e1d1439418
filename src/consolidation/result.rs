use super::backup::BackupError;
use crate::storage::StoreError;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The store interaction an operation was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    Count,
    Query,
    ListFields,
    ListTagValues,
    Write,
    Drop,
    Delete,
    Aggregate,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Count => "counting rows",
            Step::Query => "reading rows",
            Step::ListFields => "listing fields",
            Step::ListTagValues => "listing tag values",
            Step::Write => "writing points",
            Step::Drop => "dropping measurement",
            Step::Delete => "deleting rows",
            Step::Aggregate => "aggregating",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("Deleting {measurement} requires confirmation")]
    ConfirmationRequired { measurement: String },

    #[error("No source measurements provided")]
    NoSources,

    #[error("Merging needs at least two source measurements, got {count}")]
    TooFewSources { count: usize },

    #[error("No measurements found matching pattern: {pattern}")]
    NoMatchingMeasurements { pattern: String },

    #[error("No data found in {measurement}")]
    NoData { measurement: String },

    #[error("Cannot rename {measurement} to itself")]
    SameName { measurement: String },

    /// Destructive steps are skipped when this happens
    #[error("Backup of {measurement} failed: {source}")]
    BackupFailed {
        measurement: String,
        #[source]
        source: BackupError,
    },

    #[error("No fields known for {measurement}")]
    NoFields { measurement: String },

    #[error("Unknown granularity: {0} (expected hourly, daily, weekly or monthly)")]
    UnknownGranularity(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Aggregating {measurement} into {target} produced no data, original rows kept")]
    EmptyAggregation { measurement: String, target: String },

    #[error("Listing measurements failed: {0}")]
    Listing(#[source] StoreError),

    #[error("{step} failed for {measurement}: {source}")]
    Store {
        step: Step,
        measurement: String,
        #[source]
        source: StoreError,
    },

    /// The copy exists under the new name but the old measurement survived.
    #[error("{measurement} was copied to {target} but not removed: {source}")]
    RenameIncomplete {
        measurement: String,
        target: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error("System clock unavailable: {0}")]
    Clock(String),
}

impl OperationError {
    pub fn store(step: Step, measurement: &str, source: StoreError) -> Self {
        OperationError::Store {
            step,
            measurement: measurement.to_string(),
            source,
        }
    }
}

/// What a successful item did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemOutcome {
    /// Dropped or trimmed after backing up `backed_up` points.
    Deleted { backed_up: u64 },
    BackedUp { points: u64 },
    Written { points: u64 },
    Renamed { target: String, points: u64 },
    Aggregated { target: String, points: u64 },
    /// Nothing matched, nothing changed.
    NothingToDo,
}

pub type ItemResult = Result<ItemOutcome, OperationError>;

/// Per-item outcomes of a batch operation, keyed by the measurement the item
/// concerns. Failed items keep their error so callers can report partial
/// success precisely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationResult {
    items: BTreeMap<String, ItemResult>,
}

impl ConsolidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, result: ItemResult) {
        self.items.insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<&ItemResult> {
        self.items.get(name)
    }

    pub fn is_success(&self, name: &str) -> Option<bool> {
        self.items.get(name).map(Result::is_ok)
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|(_, result)| result.is_ok())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &OperationError)> {
        self.items
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|err| (name.as_str(), err)))
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.values().all(Result::is_ok)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ItemResult)> {
        self.items.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Name to success flag.
    pub fn to_success_map(&self) -> BTreeMap<String, bool> {
        self.items
            .iter()
            .map(|(name, result)| (name.clone(), result.is_ok()))
            .collect()
    }

    pub fn to_json(&self) -> JsonValue {
        let items: BTreeMap<&str, JsonValue> = self
            .items
            .iter()
            .map(|(name, result)| {
                let value = match result {
                    Ok(outcome) => json!({ "success": true, "outcome": outcome }),
                    Err(err) => json!({ "success": false, "error": err.to_string() }),
                };
                (name.as_str(), value)
            })
            .collect();
        json!(items)
    }
}
