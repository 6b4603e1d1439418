//! Mutating operations on measurements.
//!
//! Every operation that destroys data first exports it through the
//! [`SnapshotSink`]; when that export fails the destructive step is skipped
//! and the failure reported. Operations are short linear sequences with no
//! rollback: the store has no transactions, so a failure part way leaves the
//! store in the post-partial-step state, and the returned error names the
//! step that failed.

pub mod aggregate;
pub mod age;
pub mod backup;
pub mod delete;
pub mod low_data;
pub mod merge;
pub mod rename;
pub mod result;
pub mod rewrite;
pub mod split;

pub use aggregate::{AggregateOptions, Granularity, choose_reducer};
pub use age::{AgeAction, plan_granularity};
pub use backup::BackupError;
pub use low_data::CleanAction;
pub use merge::{MergeOptions, MergeOutcome};
pub use result::{ConsolidationResult, ItemOutcome, ItemResult, OperationError, Step};
pub use rewrite::{ColumnPartition, PROVENANCE_TAG};

use crate::exporters::SnapshotSink;
use crate::storage::TimeSeriesStore;
use std::sync::Arc;

/// Runs consolidation operations against one store, backing up to one sink.
///
/// Operations on the same measurement must not run concurrently; nothing
/// here guards against concurrent writers.
#[derive(Debug, Clone)]
pub struct Consolidator {
    store: Arc<dyn TimeSeriesStore>,
    sink: Arc<dyn SnapshotSink>,
    partition: ColumnPartition,
}

impl Consolidator {
    pub fn new(store: Arc<dyn TimeSeriesStore>, sink: Arc<dyn SnapshotSink>) -> Self {
        Self {
            store,
            sink,
            partition: ColumnPartition::default(),
        }
    }

    pub fn with_partition(mut self, partition: ColumnPartition) -> Self {
        self.partition = partition;
        self
    }

    pub fn partition(&self) -> &ColumnPartition {
        &self.partition
    }
}
