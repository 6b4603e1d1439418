use super::{Row, TidyDateTime, tidy_datetime::serialize_rfc3339};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Most recent sample timestamp of a measurement, as shown to operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastEntry {
    /// `%Y-%m-%d %H:%M:%S`, which orders lexicographically.
    At(String),
    NoData,
    /// The measurement could not be inspected.
    Error,
}

impl LastEntry {
    pub fn timestamp(&self) -> Option<&str> {
        match self {
            LastEntry::At(timestamp) => Some(timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for LastEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastEntry::At(timestamp) => write!(f, "{}", timestamp),
            LastEntry::NoData => write!(f, "No data"),
            LastEntry::Error => write!(f, "error"),
        }
    }
}

impl Serialize for LastEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    #[serde(serialize_with = "serialize_rfc3339")]
    pub start: TidyDateTime,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub end: TidyDateTime,
}

/// Snapshot of one measurement, read fresh on every inventory pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub name: String,
    pub total_points: u64,
    pub fields: BTreeSet<String>,
    pub tags: BTreeMap<String, BTreeSet<String>>,
    pub time_range: Option<TimeRange>,
    pub last_entry: LastEntry,
    pub sample_data: Vec<Row>,
}

impl Measurement {
    /// A measurement that exists but holds no data.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total_points: 0,
            fields: BTreeSet::new(),
            tags: BTreeMap::new(),
            time_range: None,
            last_entry: LastEntry::NoData,
            sample_data: Vec::new(),
        }
    }

    /// Sentinel snapshot for a measurement whose inspection failed.
    pub fn failed(name: impl Into<String>) -> Self {
        Self {
            last_entry: LastEntry::Error,
            ..Self::empty(name)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.last_entry == LastEntry::Error
    }

    pub fn tag_key_count(&self) -> usize {
        self.tags.len()
    }
}
