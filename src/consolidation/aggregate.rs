use super::Consolidator;
use super::result::{ItemOutcome, OperationError, Step};
use crate::datamodel::TidyDateTime;
use crate::storage::{AggregationQuery, Filter, Reducer};
use hifitime::{Duration, Unit};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info, warn};

/// Bucket width of a downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    /// Fixed 30 day buckets, not calendar months.
    Monthly,
}

impl Granularity {
    pub fn name(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            Granularity::Hourly => 1_i64 * Unit::Hour,
            Granularity::Daily => 1_i64 * Unit::Day,
            Granularity::Weekly => 1_i64 * Unit::Week,
            Granularity::Monthly => 30_i64 * Unit::Day,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Granularity {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Granularity::Hourly),
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(OperationError::UnknownGranularity(other.to_string())),
        }
    }
}

const SUM_KEYWORDS: [&str; 3] = ["count", "total", "sum"];
const MAX_KEYWORDS: [&str; 3] = ["max", "peak", "highest"];
const MIN_KEYWORDS: [&str; 2] = ["min", "lowest"];

/// Reducer for a field, from keywords in its name.
///
/// Checked in order: sum, max, min. `MEAN` otherwise.
pub fn choose_reducer(field: &str) -> Reducer {
    let field = field.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| field.contains(k));
    if has_any(&SUM_KEYWORDS) {
        Reducer::Sum
    } else if has_any(&MAX_KEYWORDS) {
        Reducer::Max
    } else if has_any(&MIN_KEYWORDS) {
        Reducer::Min
    } else {
        Reducer::Mean
    }
}

/// Name of the measurement receiving the downsampled data.
pub fn aggregate_target(measurement: &str, granularity: Granularity) -> String {
    format!("{}_agg_{}", measurement, granularity)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub measurement: String,
    /// Only rows strictly older than this are aggregated, then deleted.
    pub cutoff: TidyDateTime,
    pub granularity: Granularity,
    /// Fields to aggregate. Discovered from the store when `None`.
    pub fields: Option<Vec<String>>,
}

impl AggregateOptions {
    pub fn new(measurement: impl Into<String>, cutoff: TidyDateTime, granularity: Granularity) -> Self {
        Self {
            measurement: measurement.into(),
            cutoff,
            granularity,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

impl Consolidator {
    /// Downsample rows older than the cutoff into
    /// `<measurement>_agg_<granularity>`, then delete them from the source.
    ///
    /// The originals are only deleted once the backup succeeded and the
    /// aggregate holds data.
    pub async fn aggregate_old_data(
        &self,
        options: &AggregateOptions,
    ) -> Result<ItemOutcome, OperationError> {
        let measurement = options.measurement.as_str();
        self.backup_before_destroy(measurement).await?;

        let fields = match &options.fields {
            Some(fields) => fields.clone(),
            None => self
                .store
                .list_field_keys(measurement)
                .await
                .map_err(|err| OperationError::store(Step::ListFields, measurement, err))?,
        };
        if fields.is_empty() {
            warn!("No fields found for {}", measurement);
            return Err(OperationError::NoFields {
                measurement: measurement.to_string(),
            });
        }

        let target = aggregate_target(measurement, options.granularity);
        let query = AggregationQuery {
            source: measurement.to_string(),
            target: target.clone(),
            cutoff: options.cutoff,
            interval: options.granularity.interval(),
            fields: fields
                .into_iter()
                .map(|field| {
                    let reducer = choose_reducer(&field);
                    (field, reducer)
                })
                .collect(),
        };
        info!("Aggregating {}: {}", measurement, query);
        // Rows left in the target by an earlier run must not count here
        let points = self
            .store
            .run_aggregation_write(&query)
            .await
            .map_err(|err| OperationError::store(Step::Aggregate, measurement, err))?;
        if points == 0 {
            error!(
                "Aggregation of {} into {} produced no data, keeping original rows",
                measurement, target
            );
            return Err(OperationError::EmptyAggregation {
                measurement: measurement.to_string(),
                target,
            });
        }

        let older = Filter::older_than(options.cutoff);
        self.store
            .delete_rows(measurement, &older)
            .await
            .map_err(|err| OperationError::store(Step::Delete, measurement, err))?;
        info!(
            "Aggregated old data of {} into {} ({} points)",
            measurement, target, points
        );
        Ok(ItemOutcome::Aggregated { target, points })
    }
}
