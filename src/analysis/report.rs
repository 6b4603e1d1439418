use super::classifier::{Classification, ClassifierThresholds, Problems, classify};
use super::hierarchy::{self, HierarchyNode};
use super::topics::TopicTable;
use crate::datamodel::Measurement;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::fmt;

/// Single status shown per measurement. When several problems apply, the
/// first of Low Data, Mixed Topics, Potential Duplicate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeasurementStatus {
    Ok,
    LowData,
    MixedTopics,
    PotentialDuplicate,
}

impl fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeasurementStatus::Ok => "OK",
            MeasurementStatus::LowData => "Low Data",
            MeasurementStatus::MixedTopics => "Mixed Topics",
            MeasurementStatus::PotentialDuplicate => "Potential Duplicate",
        };
        write!(f, "{}", s)
    }
}

impl From<Classification> for MeasurementStatus {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::LowData => MeasurementStatus::LowData,
            Classification::MixedTopic => MeasurementStatus::MixedTopics,
            Classification::Duplicate => MeasurementStatus::PotentialDuplicate,
        }
    }
}

/// Result of one inventory pass plus classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub measurements: BTreeMap<String, Measurement>,
    pub problems: Problems,
}

impl AnalysisReport {
    pub fn from_snapshots(
        measurements: BTreeMap<String, Measurement>,
        thresholds: &ClassifierThresholds,
    ) -> Self {
        let problems = classify(&measurements, thresholds);
        Self {
            measurements,
            problems,
        }
    }

    pub fn classifications(&self, name: &str) -> Vec<Classification> {
        self.problems.classifications(name)
    }

    /// `None` for names absent from the report.
    pub fn status(&self, name: &str) -> Option<MeasurementStatus> {
        if !self.measurements.contains_key(name) {
            return None;
        }
        // classifications() yields in priority order
        Some(
            self.classifications(name)
                .into_iter()
                .next()
                .map(MeasurementStatus::from)
                .unwrap_or(MeasurementStatus::Ok),
        )
    }

    pub fn problem_count(&self) -> usize {
        self.measurements
            .keys()
            .filter(|name| !self.classifications(name).is_empty())
            .count()
    }

    pub fn hierarchy(&self, table: &TopicTable) -> HierarchyNode {
        hierarchy::build(&self.measurements, table)
    }

    /// The three problem lists, keyed `low_data`, `mixed_topics` and
    /// `duplicates`.
    pub fn problems_json(&self) -> JsonValue {
        json!({
            "low_data": self.problems.low_data,
            "mixed_topics": self.problems.mixed_topic,
            "duplicates": self.problems.duplicate_named,
        })
    }

    pub fn to_json(&self) -> JsonValue {
        let measurements: BTreeMap<&str, JsonValue> = self
            .measurements
            .iter()
            .map(|(name, measurement)| {
                let mut value = serde_json::to_value(measurement).unwrap_or(JsonValue::Null);
                if let (JsonValue::Object(map), Some(status)) = (&mut value, self.status(name)) {
                    map.insert("status".to_string(), json!(status.to_string()));
                }
                (name.as_str(), value)
            })
            .collect();
        json!({
            "measurements": measurements,
            "problems": self.problems_json(),
        })
    }
}
