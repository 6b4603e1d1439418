pub mod snapshot;

pub use snapshot::{BackupRecord, ExportError, SnapshotSink};
