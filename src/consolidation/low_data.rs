use super::Consolidator;
use super::result::{ConsolidationResult, ItemOutcome, ItemResult, OperationError, Step};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanAction {
    /// Back up, then drop.
    Delete,
    BackupOnly,
}

impl FromStr for CleanAction {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete" => Ok(CleanAction::Delete),
            "backup_only" => Ok(CleanAction::BackupOnly),
            other => Err(OperationError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for CleanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanAction::Delete => write!(f, "delete"),
            CleanAction::BackupOnly => write!(f, "backup_only"),
        }
    }
}

impl Consolidator {
    /// Apply `action` to every measurement holding fewer than `min_points`
    /// points. Measurements at or above the threshold are not in the result.
    pub async fn clean_low_data(
        &self,
        min_points: u64,
        action: CleanAction,
    ) -> Result<ConsolidationResult, OperationError> {
        let names = self
            .store
            .list_measurement_names()
            .await
            .map_err(OperationError::Listing)?;

        let mut result = ConsolidationResult::new();
        for name in names {
            let total_points = match self.store.count_rows(&name, None).await {
                Ok(total_points) => total_points,
                Err(err) => {
                    error!("Failed to count points of {}: {}", name, err);
                    result.insert(name.clone(), Err(OperationError::store(Step::Count, &name, err)));
                    continue;
                }
            };
            if total_points >= min_points {
                continue;
            }

            info!("Measurement {} has only {} points", name, total_points);
            let item = self.clean_one(&name, action).await;
            if let Err(err) = &item {
                error!("Skipping {} of {}: {}", action, name, err);
            }
            result.insert(name, item);
        }
        Ok(result)
    }

    async fn clean_one(&self, measurement: &str, action: CleanAction) -> ItemResult {
        match action {
            CleanAction::Delete => self.delete(measurement, true).await,
            CleanAction::BackupOnly => {
                let points = self.backup_before_destroy(measurement).await?;
                Ok(ItemOutcome::BackedUp { points })
            }
        }
    }
}
