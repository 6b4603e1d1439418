#![allow(dead_code)]

use fluxtidy::consolidation::Consolidator;
use fluxtidy::datamodel::Row;
use fluxtidy::test_utils::{Journal, MemorySink, MemoryStore};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

pub mod fixtures;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An in-memory store and sink sharing one journal.
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub sink: Arc<MemorySink>,
    pub journal: Journal,
    pub consolidator: Consolidator,
}

impl TestEnv {
    pub fn new(lines: &str) -> Self {
        init_tracing();
        let journal = Journal::new();
        let store = Arc::new(MemoryStore::with_journal(journal.clone()));
        if !lines.trim().is_empty() {
            store
                .insert_line_protocol(lines)
                .expect("fixture should be valid line protocol");
        }
        let sink = Arc::new(MemorySink::with_journal(journal.clone()));
        let consolidator = Consolidator::new(store.clone(), sink.clone());
        Self {
            store,
            sink,
            journal,
            consolidator,
        }
    }

    pub fn empty() -> Self {
        Self::new("")
    }

    /// Index of the journal entry for a backup of `measurement`.
    pub fn backup_position(&self, measurement: &str) -> Option<usize> {
        self.journal
            .position(&format!("BACKUP \"{}\"", measurement))
    }
}

/// A row rendered as sorted `column=value` pairs without the listed columns,
/// for comparing content regardless of row order.
pub fn row_content(row: &Row, ignored: &[&str]) -> String {
    let mut cells: Vec<String> = row
        .iter()
        .filter(|(column, _)| !ignored.contains(column))
        .map(|(column, value)| format!("{}={}", column, value))
        .collect();
    cells.sort();
    cells.join(",")
}

/// Sorted row contents of a measurement, `time` included.
pub fn content(store: &MemoryStore, measurement: &str, ignored: &[&str]) -> Vec<String> {
    let mut rows: Vec<String> = store
        .rows(measurement)
        .iter()
        .map(|row| row_content(row, ignored))
        .collect();
    rows.sort();
    rows
}
