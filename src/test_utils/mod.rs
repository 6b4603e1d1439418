//! Test utilities for fluxtidy tests
//!
//! In-memory implementations of the store gateway and the snapshot sink,
//! sharing a journal of every mutating call so tests can assert ordering.

use anyhow::Result;
use std::sync::{Arc, Mutex};

pub mod memory_sink;
pub mod memory_store;

pub use memory_sink::MemorySink;
pub use memory_store::{MemoryStore, StoreCall};

static TEST_CONFIG_INIT: Mutex<()> = Mutex::new(());

/// Load the configuration exactly once per test run.
pub fn load_configuration_for_tests() -> Result<()> {
    let _guard = TEST_CONFIG_INIT
        .lock()
        .map_err(|_| anyhow::anyhow!("test configuration lock poisoned"))?;

    crate::config::load_configuration()
}

/// Ordered log of mutating calls, shared between a store and a sink.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        // A poisoned journal only happens after a test already panicked
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries()
            .iter()
            .position(|entry| entry.starts_with(prefix))
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
