use super::Consolidator;
use super::result::{ItemOutcome, OperationError, Step};
use super::rewrite::RowRewrite;
use crate::storage::RowQuery;
use tracing::{error, info, warn};

impl Consolidator {
    /// Copy `old_name` to `new_name`, then drop `old_name`.
    ///
    /// Backs up first and aborts before writing when the backup fails or
    /// there is nothing to copy. When the final drop fails the data exists
    /// under both names and [`OperationError::RenameIncomplete`] is returned.
    pub async fn rename(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> Result<ItemOutcome, OperationError> {
        if old_name == new_name {
            return Err(OperationError::SameName {
                measurement: old_name.to_string(),
            });
        }

        self.backup_before_destroy(old_name).await.inspect_err(|_| {
            error!("Failed to backup {}, aborting rename", old_name);
        })?;

        let rows = self
            .store
            .query_rows(&RowQuery::all(old_name))
            .await
            .map_err(|err| OperationError::store(Step::Query, old_name, err))?;
        let points = RowRewrite::default().apply_all(&self.partition, &rows, new_name);
        if points.is_empty() {
            warn!("No data found in {}", old_name);
            return Err(OperationError::NoData {
                measurement: old_name.to_string(),
            });
        }

        self.store
            .write_points(&points)
            .await
            .map_err(|err| OperationError::store(Step::Write, new_name, err))?;
        info!(
            "Created new measurement {} with {} points",
            new_name,
            points.len()
        );

        self.drop_measurement(old_name).await.map_err(|err| {
            error!("Failed to delete old measurement {}", old_name);
            OperationError::RenameIncomplete {
                measurement: old_name.to_string(),
                target: new_name.to_string(),
                source: Box::new(err),
            }
        })?;

        info!("Successfully renamed {} to {}", old_name, new_name);
        Ok(ItemOutcome::Renamed {
            target: new_name.to_string(),
            points: points.len() as u64,
        })
    }
}
