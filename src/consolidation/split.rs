use super::Consolidator;
use super::result::{ConsolidationResult, ItemOutcome, ItemResult, OperationError, Step};
use super::rewrite::RowRewrite;
use crate::storage::{Filter, RowQuery};
use tracing::{info, warn};

impl Consolidator {
    /// Split `measurement` into one `<measurement>_<value>` per value of
    /// `tag_key`. The split tag is removed and each point is tagged with the
    /// original measurement. The original is left untouched.
    ///
    /// The result is keyed by new measurement name. A value with no rows
    /// fails its own item only.
    pub async fn split_by_tag(
        &self,
        measurement: &str,
        tag_key: &str,
    ) -> Result<ConsolidationResult, OperationError> {
        let values = self
            .store
            .list_tag_values(measurement, tag_key)
            .await
            .map_err(|err| OperationError::store(Step::ListTagValues, measurement, err))?;

        let mut result = ConsolidationResult::new();
        if values.is_empty() {
            warn!("No tag values found for {} in {}", tag_key, measurement);
            return Ok(result);
        }
        info!(
            "Splitting {} by {} into {} measurements",
            measurement,
            tag_key,
            values.len()
        );

        for value in values {
            let target = format!("{}_{}", measurement, value);
            let item = self.split_one(measurement, tag_key, &value, &target).await;
            result.insert(target, item);
        }
        Ok(result)
    }

    async fn split_one(
        &self,
        measurement: &str,
        tag_key: &str,
        value: &str,
        target: &str,
    ) -> ItemResult {
        let query = RowQuery::all(measurement).filter(Filter::tag_eq(tag_key, value));
        let rows = self
            .store
            .query_rows(&query)
            .await
            .map_err(|err| OperationError::store(Step::Query, measurement, err))?;

        let rewrite = RowRewrite {
            tag_mapping: None,
            drop_tag: Some(tag_key),
            provenance: Some(measurement),
        };
        let points = rewrite.apply_all(&self.partition, &rows, target);
        if points.is_empty() {
            warn!("No data found for {}={}", tag_key, value);
            return Err(OperationError::NoData {
                measurement: target.to_string(),
            });
        }

        self.store
            .write_points(&points)
            .await
            .map_err(|err| OperationError::store(Step::Write, target, err))?;
        info!("Created {} with {} points", target, points.len());
        Ok(ItemOutcome::Written {
            points: points.len() as u64,
        })
    }
}
