//! Problem classification over inventory snapshots.
//!
//! All classifiers are pure functions of the snapshots; they never touch the
//! store. Mixed-topic and duplicate-name detection are heuristics, not ground
//! truth.

use super::similarity::{DEFAULT_SIMILARITY_THRESHOLD, duplicate_named};
use crate::config::FluxTidyConfig;
use crate::datamodel::Measurement;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Classification {
    LowData,
    MixedTopic,
    Duplicate,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::LowData => "Low Data",
            Classification::MixedTopic => "Mixed Topics",
            Classification::Duplicate => "Potential Duplicate",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierThresholds {
    pub min_points: u64,
    /// Strictly more tag keys than this...
    pub mixed_topic_min_tag_keys: usize,
    /// ...and strictly more points than this make a measurement "mixed topic".
    pub mixed_topic_min_points: u64,
    pub similarity_threshold: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_points: 10,
            mixed_topic_min_tag_keys: 3,
            mixed_topic_min_points: 100,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl From<&FluxTidyConfig> for ClassifierThresholds {
    fn from(config: &FluxTidyConfig) -> Self {
        Self {
            min_points: config.min_points,
            mixed_topic_min_tag_keys: config.mixed_topic_min_tag_keys,
            mixed_topic_min_points: config.mixed_topic_min_points,
            similarity_threshold: config.similarity_threshold,
        }
    }
}

pub fn is_low_data(measurement: &Measurement, thresholds: &ClassifierThresholds) -> bool {
    measurement.total_points < thresholds.min_points
}

/// Many tag keys on a busy measurement suggest several topics were written
/// into it. Coarse on purpose.
pub fn is_mixed_topic(measurement: &Measurement, thresholds: &ClassifierThresholds) -> bool {
    measurement.tag_key_count() > thresholds.mixed_topic_min_tag_keys
        && measurement.total_points > thresholds.mixed_topic_min_points
}

/// The three problem sets. A measurement may appear in several of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Problems {
    pub low_data: BTreeSet<String>,
    pub mixed_topic: BTreeSet<String>,
    pub duplicate_named: BTreeSet<String>,
}

impl Problems {
    pub fn classifications(&self, name: &str) -> Vec<Classification> {
        let mut classifications = Vec::new();
        if self.low_data.contains(name) {
            classifications.push(Classification::LowData);
        }
        if self.mixed_topic.contains(name) {
            classifications.push(Classification::MixedTopic);
        }
        if self.duplicate_named.contains(name) {
            classifications.push(Classification::Duplicate);
        }
        classifications
    }

    pub fn is_empty(&self) -> bool {
        self.low_data.is_empty() && self.mixed_topic.is_empty() && self.duplicate_named.is_empty()
    }
}

pub fn classify(
    snapshots: &BTreeMap<String, Measurement>,
    thresholds: &ClassifierThresholds,
) -> Problems {
    let low_data = snapshots
        .values()
        .filter(|m| is_low_data(m, thresholds))
        .map(|m| m.name.clone())
        .collect();
    let mixed_topic = snapshots
        .values()
        .filter(|m| is_mixed_topic(m, thresholds))
        .map(|m| m.name.clone())
        .collect();
    let duplicate_named = duplicate_named(
        snapshots.keys().map(String::as_str),
        thresholds.similarity_threshold,
    );

    Problems {
        low_data,
        mixed_topic,
        duplicate_named,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str, points: u64, tag_keys: usize) -> Measurement {
        let mut measurement = Measurement::empty(name);
        measurement.total_points = points;
        for i in 0..tag_keys {
            measurement
                .tags
                .insert(format!("tag_{}", i), BTreeSet::new());
        }
        measurement
    }

    fn snapshots(list: Vec<Measurement>) -> BTreeMap<String, Measurement> {
        list.into_iter().map(|m| (m.name.clone(), m)).collect()
    }

    #[test]
    fn test_kitchen_scenario() {
        let problems = classify(
            &snapshots(vec![
                snapshot("temp_kitchen", 12, 0),
                snapshot("temp_kitchen_old", 3, 0),
            ]),
            &ClassifierThresholds::default(),
        );

        assert_eq!(
            problems.low_data.iter().cloned().collect::<Vec<_>>(),
            vec!["temp_kitchen_old"]
        );
        assert_eq!(
            problems.duplicate_named.iter().cloned().collect::<Vec<_>>(),
            vec!["temp_kitchen", "temp_kitchen_old"]
        );
        assert!(problems.mixed_topic.is_empty());
    }

    #[test]
    fn test_mixed_topic_needs_both_conditions() {
        let thresholds = ClassifierThresholds::default();
        assert!(is_mixed_topic(&snapshot("a", 101, 4), &thresholds));
        assert!(!is_mixed_topic(&snapshot("a", 100, 4), &thresholds));
        assert!(!is_mixed_topic(&snapshot("a", 5000, 3), &thresholds));
    }

    #[test]
    fn test_low_data_threshold_is_strict() {
        let thresholds = ClassifierThresholds::default();
        assert!(is_low_data(&snapshot("a", 9, 0), &thresholds));
        assert!(!is_low_data(&snapshot("a", 10, 0), &thresholds));
    }

    #[test]
    fn test_classifications_are_independent() {
        let problems = classify(
            &snapshots(vec![
                snapshot("energy_meter", 5000, 5),
                snapshot("energy_meter_2", 2, 0),
            ]),
            &ClassifierThresholds::default(),
        );
        assert_eq!(
            problems.classifications("energy_meter"),
            vec![Classification::MixedTopic, Classification::Duplicate]
        );
        assert_eq!(
            problems.classifications("energy_meter_2"),
            vec![Classification::LowData, Classification::Duplicate]
        );
    }

    #[test]
    fn test_empty_input() {
        let problems = classify(&BTreeMap::new(), &ClassifierThresholds::default());
        assert!(problems.is_empty());
    }
}
