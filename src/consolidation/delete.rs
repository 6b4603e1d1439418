use super::Consolidator;
use super::result::{ItemOutcome, OperationError, Step};
use tracing::{error, info, warn};

impl Consolidator {
    /// Back up then drop a whole measurement.
    ///
    /// Refuses without `confirm`, before touching the store.
    pub async fn delete(
        &self,
        measurement: &str,
        confirm: bool,
    ) -> Result<ItemOutcome, OperationError> {
        if !confirm {
            warn!("Delete operation requires confirmation");
            return Err(OperationError::ConfirmationRequired {
                measurement: measurement.to_string(),
            });
        }
        let backed_up = self.backup_before_destroy(measurement).await?;
        self.drop_measurement(measurement).await?;
        Ok(ItemOutcome::Deleted { backed_up })
    }

    /// The bare drop. Callers are responsible for the backup.
    pub(super) async fn drop_measurement(&self, measurement: &str) -> Result<(), OperationError> {
        match self.store.drop_measurement(measurement).await {
            Ok(()) => {
                info!("Deleted measurement: {}", measurement);
                Ok(())
            }
            Err(err) => {
                error!("Failed to delete measurement {}: {}", measurement, err);
                Err(OperationError::store(Step::Drop, measurement, err))
            }
        }
    }
}
