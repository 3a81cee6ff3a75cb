use std::time::Duration;

use serde::Serialize;

/// Per-file progress event, delivered synchronously in discovery order.
///
/// Exactly one event is emitted per file, with `index` running from 0 to
/// `total - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexProgress {
    /// 0-based position in the discovery order.
    pub index: usize,
    /// Count of files in this batch.
    pub total: usize,
    pub file: String,
    /// Whether this file was served from the cache.
    pub cached: bool,
}

/// A per-file failure captured into the batch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Aggregate outcome of one `index()` call.
///
/// Invariant: `parsed_files + cached_files + failed_files == total_files`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexResult {
    pub total_files: usize,
    pub parsed_files: usize,
    pub cached_files: usize,
    pub failed_files: usize,
    pub total_entities: usize,
    pub total_relationships: usize,
    pub total_time: Duration,
    pub errors: Vec<FileError>,
}
