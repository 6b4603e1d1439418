use super::Consolidator;
use super::result::{OperationError, Step};
use super::rewrite::RowRewrite;
use crate::storage::RowQuery;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub sources: Vec<String>,
    pub target: String,
    /// Source column to target tag. When given, the mapped columns and the
    /// provenance tag are the only tags written. When `None`, tags are kept
    /// as the partition finds them.
    pub tag_mapping: Option<BTreeMap<String, String>>,
}

impl MergeOptions {
    pub fn new(sources: Vec<String>, target: impl Into<String>) -> Self {
        Self {
            sources,
            target: target.into(),
            tag_mapping: None,
        }
    }

    pub fn with_tag_mapping(mut self, tag_mapping: BTreeMap<String, String>) -> Self {
        self.tag_mapping = Some(tag_mapping);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub target: String,
    pub total_points: u64,
    /// Points written per source, for sources that had data.
    pub per_source: BTreeMap<String, u64>,
    pub skipped_empty: Vec<String>,
    /// Sources whose read or write failed. The others were still merged.
    #[serde(skip)]
    pub failed: BTreeMap<String, OperationError>,
}

impl MergeOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Consolidator {
    /// Copy every row of every source into `target`, tagging each point
    /// with the source it came from. Sources are left untouched.
    ///
    /// Needs at least two sources. Empty sources are skipped; a source that
    /// fails is recorded in [`MergeOutcome::failed`] and the merge carries on.
    pub async fn merge(&self, options: &MergeOptions) -> Result<MergeOutcome, OperationError> {
        match options.sources.len() {
            0 => {
                warn!("No source measurements provided");
                return Err(OperationError::NoSources);
            }
            1 => return Err(OperationError::TooFewSources { count: 1 }),
            _ => {}
        }
        Ok(self.merge_sources(options).await)
    }

    /// Merge every measurement whose name contains `pattern`, ignoring case.
    ///
    /// A single match is merged on its own.
    pub async fn consolidate_by_pattern(
        &self,
        pattern: &str,
        target: &str,
    ) -> Result<MergeOutcome, OperationError> {
        let names = self
            .store
            .list_measurement_names()
            .await
            .map_err(OperationError::Listing)?;
        let needle = pattern.to_lowercase();
        let matching: Vec<String> = names
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();

        if matching.is_empty() {
            warn!("No measurements found matching pattern: {}", pattern);
            return Err(OperationError::NoMatchingMeasurements {
                pattern: pattern.to_string(),
            });
        }
        info!(
            "Found {} measurements matching pattern '{}': {:?}",
            matching.len(),
            pattern,
            matching
        );

        Ok(self
            .merge_sources(&MergeOptions::new(matching, target))
            .await)
    }

    async fn merge_sources(&self, options: &MergeOptions) -> MergeOutcome {
        let mut outcome = MergeOutcome {
            target: options.target.clone(),
            ..MergeOutcome::default()
        };

        for source in &options.sources {
            match self.merge_one(source, options).await {
                Ok(0) => {
                    warn!("No data found in measurement {}", source);
                    outcome.skipped_empty.push(source.clone());
                }
                Ok(points) => {
                    info!(
                        "Merged {} points from {} to {}",
                        points, source, options.target
                    );
                    outcome.total_points += points;
                    outcome.per_source.insert(source.clone(), points);
                }
                Err(err) => {
                    error!("Failed to merge {} into {}: {}", source, options.target, err);
                    outcome.failed.insert(source.clone(), err);
                }
            }
        }

        info!(
            "Merged {} total points into {}",
            outcome.total_points, options.target
        );
        outcome
    }

    async fn merge_one(&self, source: &str, options: &MergeOptions) -> Result<u64, OperationError> {
        let rows = self
            .store
            .query_rows(&RowQuery::all(source))
            .await
            .map_err(|err| OperationError::store(Step::Query, source, err))?;
        let rewrite = RowRewrite {
            tag_mapping: options.tag_mapping.as_ref(),
            drop_tag: None,
            provenance: Some(source),
        };
        let points = rewrite.apply_all(&self.partition, &rows, &options.target);
        if points.is_empty() {
            return Ok(0);
        }
        self.store
            .write_points(&points)
            .await
            .map_err(|err| OperationError::store(Step::Write, &options.target, err))?;
        Ok(points.len() as u64)
    }
}
