use crate::config::FluxTidyConfig;
use crate::datamodel::{LastEntry, Measurement, TidyDateTimeExt, TimeRange};
use crate::storage::{RowQuery, StoreError, TimeSeriesStore};
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info};

/// How much work an inventory pass spends per measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryMode {
    /// Enumerates every tag value of every tag key.
    Thorough,
    /// Skips tag value enumeration on measurements with many tag keys and
    /// fetches a smaller sample.
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryLimits {
    /// Above this many tag keys, fast mode reports keys with empty value sets.
    pub fast_tag_key_limit: usize,
    pub thorough_sample_limit: usize,
    pub fast_sample_limit: usize,
    /// Rows kept in the snapshot out of the fetched sample.
    pub sample_keep: usize,
}

impl Default for InventoryLimits {
    fn default() -> Self {
        Self {
            fast_tag_key_limit: 5,
            thorough_sample_limit: 10,
            fast_sample_limit: 5,
            sample_keep: 5,
        }
    }
}

impl From<&FluxTidyConfig> for InventoryLimits {
    fn from(config: &FluxTidyConfig) -> Self {
        Self {
            fast_tag_key_limit: config.fast_tag_key_limit,
            thorough_sample_limit: config.thorough_sample_limit,
            fast_sample_limit: config.fast_sample_limit,
            sample_keep: config.sample_keep,
        }
    }
}

pub async fn list_measurements(store: &dyn TimeSeriesStore) -> Result<Vec<String>, StoreError> {
    let names = store.list_measurement_names().await?;
    info!("Found {} measurements", names.len());
    Ok(names)
}

/// Snapshot one measurement.
///
/// Never fails: a store error yields [`Measurement::failed`] for this
/// measurement so a pass over many measurements can carry on.
pub async fn inspect(
    store: &dyn TimeSeriesStore,
    name: &str,
    mode: InventoryMode,
    limits: &InventoryLimits,
) -> Measurement {
    match try_inspect(store, name, mode, limits).await {
        Ok(measurement) => measurement,
        Err(err) => {
            error!("Failed to analyze measurement {}: {}", name, err);
            Measurement::failed(name)
        }
    }
}

async fn try_inspect(
    store: &dyn TimeSeriesStore,
    name: &str,
    mode: InventoryMode,
    limits: &InventoryLimits,
) -> Result<Measurement, StoreError> {
    let total_points = store.count_rows(name, None).await?;

    let fields: BTreeSet<String> = store.list_field_keys(name).await?.into_iter().collect();

    let tag_keys = store.list_tag_keys(name).await?;
    let tags: BTreeMap<String, BTreeSet<String>> =
        if mode == InventoryMode::Fast && tag_keys.len() > limits.fast_tag_key_limit {
            debug!(
                "Skipping tag values of {}: {} tag keys",
                name,
                tag_keys.len()
            );
            tag_keys
                .into_iter()
                .map(|key| (key, BTreeSet::new()))
                .collect()
        } else {
            let values = try_join_all(
                tag_keys
                    .iter()
                    .map(|key| store.list_tag_values(name, key)),
            )
            .await?;
            tag_keys
                .into_iter()
                .zip(values)
                .map(|(key, values)| (key, values.into_iter().collect()))
                .collect()
        };

    let sample_limit = match mode {
        InventoryMode::Thorough => limits.thorough_sample_limit,
        InventoryMode::Fast => limits.fast_sample_limit,
    };
    let sample = store
        .query_rows(&RowQuery::all(name).newest_first().limit(sample_limit))
        .await?;

    let times: Vec<_> = sample.iter().filter_map(|row| row.time()).collect();
    let time_range = match (times.iter().min(), times.iter().max()) {
        (Some(start), Some(end)) => Some(TimeRange {
            start: *start,
            end: *end,
        }),
        _ => None,
    };
    let last_entry = match time_range {
        Some(range) => LastEntry::At(range.end.to_last_entry_string()),
        None => LastEntry::NoData,
    };

    Ok(Measurement {
        name: name.to_string(),
        total_points,
        fields,
        tags,
        time_range,
        last_entry,
        sample_data: sample.into_iter().take(limits.sample_keep).collect(),
    })
}
