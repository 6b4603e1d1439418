use super::Consolidator;
use super::aggregate::{AggregateOptions, Granularity};
use super::result::{ConsolidationResult, ItemOutcome, ItemResult, OperationError, Step};
use crate::datamodel::{TidyDateTime, TidyDateTimeExt};
use crate::storage::Filter;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeAction {
    /// Downsample old rows, then delete them.
    Aggregate,
    /// Back up, then delete old rows.
    Delete,
}

impl FromStr for AgeAction {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggregate" => Ok(AgeAction::Aggregate),
            "delete" => Ok(AgeAction::Delete),
            other => Err(OperationError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for AgeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeAction::Aggregate => write!(f, "aggregate"),
            AgeAction::Delete => write!(f, "delete"),
        }
    }
}

/// Coarser buckets for denser history.
pub fn plan_granularity(old_rows: u64) -> Granularity {
    match old_rows {
        n if n > 50_000 => Granularity::Monthly,
        n if n > 10_000 => Granularity::Weekly,
        n if n > 1_000 => Granularity::Daily,
        _ => Granularity::Hourly,
    }
}

impl Consolidator {
    /// Clean every row older than `older_than_years` (of 365 days) in each
    /// measurement.
    pub async fn age_based_clean(
        &self,
        measurements: &[String],
        older_than_years: u32,
        action: AgeAction,
    ) -> Result<ConsolidationResult, OperationError> {
        let now = TidyDateTime::now().map_err(|err| OperationError::Clock(err.to_string()))?;
        let cutoff = now.years_before(older_than_years);
        Ok(self
            .age_based_clean_before(measurements, cutoff, action)
            .await)
    }

    /// [`Consolidator::age_based_clean`] with an explicit cutoff.
    pub async fn age_based_clean_before(
        &self,
        measurements: &[String],
        cutoff: TidyDateTime,
        action: AgeAction,
    ) -> ConsolidationResult {
        info!(
            "Cleaning data older than {} in {} measurements ({})",
            cutoff,
            measurements.len(),
            action
        );
        let mut result = ConsolidationResult::new();
        for measurement in measurements {
            let item = self.clean_old(measurement, cutoff, action).await;
            if let Err(err) = &item {
                error!("Age-based clean of {} failed: {}", measurement, err);
            }
            result.insert(measurement.clone(), item);
        }
        result
    }

    async fn clean_old(
        &self,
        measurement: &str,
        cutoff: TidyDateTime,
        action: AgeAction,
    ) -> ItemResult {
        let older = Filter::older_than(cutoff);
        let old_rows = self
            .store
            .count_points(measurement, Some(&older))
            .await
            .map_err(|err| OperationError::store(Step::Count, measurement, err))?;
        if old_rows == 0 {
            info!("No data older than {} in {}", cutoff, measurement);
            return Ok(ItemOutcome::NothingToDo);
        }

        match action {
            AgeAction::Aggregate => {
                let granularity = plan_granularity(old_rows);
                info!(
                    "{} has {} old rows, aggregating {}",
                    measurement, old_rows, granularity
                );
                self.aggregate_old_data(&AggregateOptions::new(measurement, cutoff, granularity))
                    .await
            }
            AgeAction::Delete => {
                let backed_up = self.backup_before_destroy(measurement).await?;
                self.store
                    .delete_rows(measurement, &older)
                    .await
                    .map_err(|err| OperationError::store(Step::Delete, measurement, err))?;
                info!("Deleted {} old rows from {}", old_rows, measurement);
                Ok(ItemOutcome::Deleted { backed_up })
            }
        }
    }
}
