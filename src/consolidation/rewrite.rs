//! Turning result rows back into points.
//!
//! Query results do not say which columns were tags. The engine relies on a
//! naming convention instead: columns starting with the tag prefix (and the
//! provenance tag) are tags, `time` is the timestamp, everything else is a
//! field. Data written by other tools must follow the same convention to
//! round-trip with its tags intact.

use crate::config::FluxTidyConfig;
use crate::datamodel::{Point, Row, TIME_COLUMN, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Tag added to merged and split points, naming the measurement they came
/// from.
pub const PROVENANCE_TAG: &str = "source_measurement";

pub const DEFAULT_TAG_PREFIX: &str = "tag_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPartition {
    pub tag_prefix: String,
}

impl Default for ColumnPartition {
    fn default() -> Self {
        Self {
            tag_prefix: DEFAULT_TAG_PREFIX.to_string(),
        }
    }
}

impl From<&FluxTidyConfig> for ColumnPartition {
    fn from(config: &FluxTidyConfig) -> Self {
        Self {
            tag_prefix: config.tag_prefix.clone(),
        }
    }
}

impl ColumnPartition {
    pub fn is_tag(&self, column: &str) -> bool {
        column == PROVENANCE_TAG || column.starts_with(&self.tag_prefix)
    }

    /// Rebuild a point for `target`. `None` when the row has no time.
    pub fn to_point(&self, row: &Row, target: &str) -> Option<Point> {
        let mut point = Point::new(target, row.time()?);
        for (column, value) in row.iter() {
            if column == TIME_COLUMN {
                continue;
            }
            if self.is_tag(column) {
                point.tags.insert(column.to_string(), tag_value(value));
            } else {
                point.fields.insert(column.to_string(), value.clone());
            }
        }
        Some(point)
    }
}

fn tag_value(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Per-row rewrite applied by merge, split and rename.
#[derive(Debug, Clone, Default)]
pub struct RowRewrite<'a> {
    /// Old column name to new tag name.
    ///
    /// When set, the mapped columns are the only tags kept, whether the
    /// partition classed them as tags or fields. Without a mapping, tags keep
    /// their name.
    pub tag_mapping: Option<&'a BTreeMap<String, String>>,
    /// Tag removed from every point.
    pub drop_tag: Option<&'a str>,
    /// Value of the provenance tag to set, if any.
    pub provenance: Option<&'a str>,
}

impl RowRewrite<'_> {
    pub fn apply(&self, partition: &ColumnPartition, row: &Row, target: &str) -> Option<Point> {
        let mut point = partition.to_point(row, target)?;
        if let Some(drop_tag) = self.drop_tag {
            point.tags.remove(drop_tag);
            point.fields.remove(drop_tag);
        }
        if let Some(mapping) = self.tag_mapping {
            let mut tags = BTreeMap::new();
            for (old, new) in mapping {
                let value = match point.tags.remove(old) {
                    Some(value) => Some(value),
                    None => point.fields.remove(old).map(|value| tag_value(&value)),
                };
                if let Some(value) = value {
                    tags.insert(new.clone(), value);
                }
            }
            point.tags = tags;
        }
        if let Some(source) = self.provenance {
            point
                .tags
                .insert(PROVENANCE_TAG.to_string(), source.to_string());
        }
        Some(point)
    }

    /// Rewrite all rows, skipping rows without a time and points left
    /// without any field.
    pub fn apply_all(&self, partition: &ColumnPartition, rows: &[Row], target: &str) -> Vec<Point> {
        let points: Vec<Point> = rows
            .iter()
            .filter_map(|row| self.apply(partition, row, target))
            .filter(|point| !point.fields.is_empty())
            .collect();
        let dropped = rows.len() - points.len();
        if dropped > 0 {
            warn!(
                "Dropped {} of {} rows for {}: no time or no field left",
                dropped,
                rows.len(),
                target
            );
        }
        points
    }
}
