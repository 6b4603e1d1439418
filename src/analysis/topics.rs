//! Keyword-based topic detection.
//!
//! A measurement belongs to every topic one of whose keywords appears in its
//! lower-cased name, and to [`OTHER_TOPIC`] when it matches none.

use std::collections::{BTreeMap, BTreeSet};

pub const OTHER_TOPIC: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    topics: BTreeMap<String, BTreeSet<String>>,
}

impl Default for TopicTable {
    fn default() -> Self {
        let table: [(&str, &[&str]); 7] = [
            (
                "sensor",
                &["sensor", "temp", "humidity", "pressure", "moisture", "lux"],
            ),
            (
                "system",
                &["cpu", "mem", "disk", "net", "load", "process", "swap", "system"],
            ),
            (
                "power",
                &["power", "energy", "voltage", "current", "watt", "battery", "solar"],
            ),
            ("weather", &["weather", "wind", "rain", "forecast", "outdoor"]),
            (
                "home",
                &["home", "room", "kitchen", "living", "bedroom", "door", "light"],
            ),
            ("vehicle", &["vehicle", "car", "gps", "speed", "fuel", "odometer"]),
            (
                "industrial",
                &["industrial", "machine", "plc", "motor", "pump", "valve"],
            ),
        ];

        let mut topics = TopicTable::empty();
        for (topic, keywords) in table {
            for keyword in keywords {
                topics.add_keyword(topic, *keyword);
            }
        }
        topics
    }
}

impl TopicTable {
    pub fn empty() -> Self {
        Self {
            topics: BTreeMap::new(),
        }
    }

    /// Keywords are matched lower-cased.
    pub fn add_keyword(&mut self, topic: impl Into<String>, keyword: impl AsRef<str>) {
        self.topics
            .entry(topic.into())
            .or_default()
            .insert(keyword.as_ref().to_lowercase());
    }

    pub fn with_keyword(mut self, topic: impl Into<String>, keyword: impl AsRef<str>) -> Self {
        self.add_keyword(topic, keyword);
        self
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Topics matched by a measurement name, or `[OTHER_TOPIC]`.
    pub fn topics_for(&self, name: &str) -> Vec<&str> {
        let name = name.to_lowercase();
        let matched: Vec<&str> = self
            .topics
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| name.contains(k.as_str())))
            .map(|(topic, _)| topic.as_str())
            .collect();
        if matched.is_empty() {
            vec![OTHER_TOPIC]
        } else {
            matched
        }
    }
}
