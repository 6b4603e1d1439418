pub mod classifier;
pub mod hierarchy;
pub mod inventory;
pub mod report;
pub mod scheduler;
pub mod similarity;
pub mod topics;

pub use classifier::{Classification, ClassifierThresholds, Problems, classify};
pub use hierarchy::HierarchyNode;
pub use inventory::{InventoryLimits, InventoryMode, inspect, list_measurements};
pub use report::{AnalysisReport, MeasurementStatus};
pub use scheduler::{SchedulerOptions, inspect_all};
pub use topics::TopicTable;

use crate::config::FluxTidyConfig;
use crate::storage::{StoreError, TimeSeriesStore};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalysisOptions {
    pub scheduler: SchedulerOptions,
    pub thresholds: ClassifierThresholds,
}

impl From<&FluxTidyConfig> for AnalysisOptions {
    fn from(config: &FluxTidyConfig) -> Self {
        Self {
            scheduler: SchedulerOptions::from(config),
            thresholds: ClassifierThresholds::from(config),
        }
    }
}

/// Parallel fast-mode inventory followed by classification.
///
/// Only listing the measurements can fail; per-measurement failures show up
/// as failed snapshots in the report.
pub async fn analyze(
    store: Arc<dyn TimeSeriesStore>,
    options: &AnalysisOptions,
) -> Result<AnalysisReport, StoreError> {
    let names = list_measurements(store.as_ref()).await?;
    let snapshots = inspect_all(store, names, options.scheduler).await;
    let report = AnalysisReport::from_snapshots(snapshots, &options.thresholds);
    info!(
        "Analyzed {} measurements, {} with problems",
        report.measurements.len(),
        report.problem_count()
    );
    Ok(report)
}

/// One measurement at a time, in thorough mode.
pub async fn analyze_sequential(
    store: &dyn TimeSeriesStore,
    thresholds: &ClassifierThresholds,
    limits: &InventoryLimits,
) -> Result<AnalysisReport, StoreError> {
    let names = list_measurements(store).await?;
    let mut snapshots = BTreeMap::new();
    for name in names {
        let measurement = inspect(store, &name, InventoryMode::Thorough, limits).await;
        snapshots.insert(name, measurement);
    }
    Ok(AnalysisReport::from_snapshots(snapshots, thresholds))
}
