//! Organisational hierarchies derived from inventory snapshots.
//!
//! Three groupings are computed independently from the same snapshots:
//! by name segments (a trie), by tag (`key -> value -> measurements`) and by
//! topic. The tag and topic groupings hang off the name root as two extra
//! branches. Trees own their children and are traversed root-down only.

use super::topics::TopicTable;
use crate::datamodel::Measurement;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

pub const ROOT_LABEL: &str = "measurements";
pub const TAG_BRANCH: &str = "By Tag";
pub const TOPIC_BRANCH: &str = "By Topic";

static CASE_SEGMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]*|[a-z]+|[0-9]+").expect("valid segment pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub count: usize,
    pub total_points: u64,
    /// Greatest `last_entry` timestamp below this node.
    pub latest: Option<String>,
}

impl NodeStats {
    fn absorb(&mut self, measurement: &Measurement) {
        self.count += 1;
        self.total_points += measurement.total_points;
        if let Some(timestamp) = measurement.last_entry.timestamp() {
            // "%Y-%m-%d %H:%M:%S" strings order like the instants they denote
            if self.latest.as_deref().is_none_or(|latest| timestamp > latest) {
                self.latest = Some(timestamp.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub label: String,
    pub stats: NodeStats,
    pub children: BTreeMap<String, HierarchyNode>,
    /// Names of the measurements attached directly to this node.
    pub measurements: Vec<String>,
}

impl HierarchyNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stats: NodeStats::default(),
            children: BTreeMap::new(),
            measurements: Vec::new(),
        }
    }

    fn child_mut(&mut self, label: &str) -> &mut HierarchyNode {
        self.children
            .entry(label.to_string())
            .or_insert_with(|| HierarchyNode::new(label))
    }

    /// Descend through children by label.
    pub fn get(&self, path: &[&str]) -> Option<&HierarchyNode> {
        let mut node = self;
        for label in path {
            node = node.children.get(*label)?;
        }
        Some(node)
    }

    /// Measurements attached anywhere under this node, deduplicated.
    pub fn all_measurements(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.measurements.iter().map(String::as_str).collect();
        for child in self.children.values() {
            names.extend(child.all_measurements());
        }
        names
    }
}

/// Split a measurement name into hierarchy segments.
///
/// `.`, `_`, `-` and `/` all act as separators. A name without separators is
/// split on case and digit boundaries (`CpuTemp2` -> `Cpu`, `Temp`, `2`);
/// failing that the whole name is the single segment.
pub fn name_segments(name: &str) -> Vec<String> {
    let segments: Vec<String> = name
        .split(&['.', '_', '-', '/'][..])
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    if segments.len() > 1 {
        return segments;
    }

    let segments: Vec<String> = CASE_SEGMENTS
        .find_iter(name)
        .map(|m| m.as_str().to_string())
        .collect();
    if segments.len() > 1 {
        return segments;
    }

    vec![name.to_string()]
}

pub fn by_name_segments<'a>(snapshots: impl IntoIterator<Item = &'a Measurement>) -> HierarchyNode {
    let mut root = HierarchyNode::new(ROOT_LABEL);
    for measurement in snapshots {
        root.stats.absorb(measurement);
        let mut node = &mut root;
        for segment in name_segments(&measurement.name) {
            node = node.child_mut(&segment);
            node.stats.absorb(measurement);
        }
        node.measurements.push(measurement.name.clone());
    }
    root
}

pub fn by_tag<'a>(snapshots: impl IntoIterator<Item = &'a Measurement>) -> HierarchyNode {
    let mut root = HierarchyNode::new(TAG_BRANCH);
    for measurement in snapshots {
        if measurement.tags.is_empty() {
            continue;
        }
        root.stats.absorb(measurement);
        for (key, values) in &measurement.tags {
            let key_node = root.child_mut(key);
            key_node.stats.absorb(measurement);
            for value in values {
                let value_node = key_node.child_mut(value);
                value_node.stats.absorb(measurement);
                value_node.measurements.push(measurement.name.clone());
            }
        }
    }
    root
}

pub fn by_topic<'a>(
    snapshots: impl IntoIterator<Item = &'a Measurement>,
    table: &TopicTable,
) -> HierarchyNode {
    let mut root = HierarchyNode::new(TOPIC_BRANCH);
    for measurement in snapshots {
        root.stats.absorb(measurement);
        for topic in table.topics_for(&measurement.name) {
            let node = root.child_mut(topic);
            node.stats.absorb(measurement);
            node.measurements.push(measurement.name.clone());
        }
    }
    root
}

/// The name trie, with the tag and topic groupings added as two named
/// branches of its root.
pub fn build(snapshots: &BTreeMap<String, Measurement>, table: &TopicTable) -> HierarchyNode {
    let mut root = by_name_segments(snapshots.values());
    let tags = by_tag(snapshots.values());
    let topics = by_topic(snapshots.values(), table);
    root.children.insert(TAG_BRANCH.to_string(), tags);
    root.children.insert(TOPIC_BRANCH.to_string(), topics);
    root
}
