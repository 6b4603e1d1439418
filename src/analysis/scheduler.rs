//! Bounded-concurrency inventory over many measurements.

use super::inventory::{InventoryLimits, InventoryMode, inspect};
use crate::config::FluxTidyConfig;
use crate::datamodel::Measurement;
use crate::storage::TimeSeriesStore;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Upper bound on in-flight inspections. Zero is treated as one.
    pub concurrency: usize,
    pub limits: InventoryLimits,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            limits: InventoryLimits::default(),
        }
    }
}

impl From<&FluxTidyConfig> for SchedulerOptions {
    fn from(config: &FluxTidyConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            limits: InventoryLimits::from(config),
        }
    }
}

/// Inspect every name in fast mode, at most `concurrency` at a time.
///
/// The result holds exactly one snapshot per distinct input name. A task
/// that fails or panics leaves a [`Measurement::failed`] entry in its place.
pub async fn inspect_all(
    store: Arc<dyn TimeSeriesStore>,
    names: Vec<String>,
    options: SchedulerOptions,
) -> BTreeMap<String, Measurement> {
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut join_set = JoinSet::new();
    let mut task_names = HashMap::new();
    let mut seen = HashSet::new();

    for name in names {
        if !seen.insert(name.clone()) {
            continue;
        }
        let store = store.clone();
        let semaphore = semaphore.clone();
        let limits = options.limits;
        let task_name = name.clone();
        let handle = join_set.spawn(async move {
            // The semaphore is never closed
            let _permit = semaphore.acquire_owned().await;
            inspect(store.as_ref(), &task_name, InventoryMode::Fast, &limits).await
        });
        task_names.insert(handle.id(), name);
    }

    debug!("Inspecting {} measurements", task_names.len());

    let mut results = BTreeMap::new();
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((_, measurement)) => {
                results.insert(measurement.name.clone(), measurement);
            }
            Err(err) => {
                let Some(name) = task_names.get(&err.id()) else {
                    error!("Inventory task failed: {}", err);
                    continue;
                };
                error!("Inventory task for {} failed: {}", name, err);
                results.insert(name.clone(), Measurement::failed(name.clone()));
            }
        }
    }

    results
}
