use super::{TidyDateTime, Value};
use std::collections::BTreeMap;

/// Unit of writing: one timestamped set of fields under a tag set.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub time: TidyDateTime,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, Value>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, time: TidyDateTime) -> Self {
        Self {
            measurement: measurement.into(),
            time,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}
