use super::error::StoreError;
use super::filter::Filter;
use super::influxql::{AggregationQuery, RowQuery};
use crate::datamodel::{Point, Row};
use async_trait::async_trait;
use std::fmt::Debug;

/// The time-series store capability the engine runs against.
///
/// Rows come back with a `time` column plus one column per tag and field;
/// which columns are tags is decided by the caller's naming convention
/// (see `consolidation::ColumnPartition`).
#[async_trait]
pub trait TimeSeriesStore: Send + Sync + Debug {
    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// `SHOW MEASUREMENTS`. An empty store yields an empty list.
    async fn list_measurement_names(&self) -> Result<Vec<String>, StoreError>;

    async fn query_rows(&self, query: &RowQuery) -> Result<Vec<Row>, StoreError>;

    /// The raw `SELECT COUNT(*)` result row, `None` when nothing matches.
    async fn count_row(
        &self,
        measurement: &str,
        filter: Option<&Filter>,
    ) -> Result<Option<Row>, StoreError>;

    /// Number of points, summed over the numeric columns of the `COUNT(*)` row.
    async fn count_rows(
        &self,
        measurement: &str,
        filter: Option<&Filter>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .count_row(measurement, filter)
            .await?
            .map(|row| row.numeric_total())
            .unwrap_or(0))
    }

    /// Number of rows, from the densest column of the `COUNT(*)` row.
    async fn count_points(
        &self,
        measurement: &str,
        filter: Option<&Filter>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .count_row(measurement, filter)
            .await?
            .map(|row| row.numeric_max())
            .unwrap_or(0))
    }

    async fn write_points(&self, points: &[Point]) -> Result<(), StoreError>;

    async fn drop_measurement(&self, measurement: &str) -> Result<(), StoreError>;

    /// `DELETE FROM <measurement> WHERE <filter>`
    async fn delete_rows(&self, measurement: &str, filter: &Filter) -> Result<(), StoreError>;

    async fn list_field_keys(&self, measurement: &str) -> Result<Vec<String>, StoreError>;

    async fn list_tag_keys(&self, measurement: &str) -> Result<Vec<String>, StoreError>;

    async fn list_tag_values(
        &self,
        measurement: &str,
        tag_key: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Run a `SELECT .. INTO` and return the `written` count InfluxDB reports
    /// for it: the points this statement wrote, not what the target holds.
    async fn run_aggregation_write(&self, query: &AggregationQuery) -> Result<u64, StoreError>;
}
