//! Content-addressed persistent cache for per-file graph fragments.
//!
//! Each indexed path owns one record on disk holding the digest of the
//! content it was parsed from plus the extracted fragment. A record is valid
//! for given content if and only if the stored digest matches the freshly
//! computed one; a mismatch is a full miss, never a partial update.
//!
//! Storage layout: one JSON file per cache key under the root directory, the
//! file name derived from the digest of the path string. Writes go through a
//! temp file in the same directory and are renamed into place, so a reader
//! never observes a half-written record.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{IndexerError, Result};
use crate::graph::{Entity, GraphFragment, Relationship};
use crate::hash;

/// On-disk record for one cached path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub path: String,
    pub content_digest: String,
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

/// Persistent key-value store keyed by file path.
///
/// The root is an explicit handle, never process-global state; multiple
/// caches with distinct roots coexist in one process. Concurrent writers to
/// the same root are not coordinated here — callers serialize at a higher
/// layer or use separate roots.
pub struct GraphCache {
    root: PathBuf,
}

impl GraphCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the backing directory if absent. Idempotent; must be called
    /// once before `read`/`write`.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| IndexerError::Cache(format!("failed to create {}: {e}", self.root.display())))
    }

    /// Exposes the content digest for callers that compare digests without
    /// touching storage.
    pub fn hash_content(&self, content: &str) -> String {
        hash::digest(content.as_bytes())
    }

    /// Looks up the stored fragment for `path`, valid only if the stored
    /// digest matches `content`.
    ///
    /// Absence and staleness are both `Ok(None)`; only storage failures are
    /// errors. A record that exists but no longer decodes is logged and
    /// treated as a miss, since the next write replaces it.
    pub fn read(&self, path: &str, content: &str) -> Result<Option<GraphFragment>> {
        let record_path = self.record_path(path);

        let bytes = match std::fs::read(&record_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IndexerError::Cache(format!(
                    "failed to read record for {path}: {e}"
                )))
            }
        };

        let record: CacheRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("discarding undecodable cache record for {path}: {e}");
                return Ok(None);
            }
        };

        if record.content_digest != hash::digest(content.as_bytes()) {
            return Ok(None);
        }

        Ok(Some(GraphFragment::new(record.entities, record.relationships)))
    }

    /// Persists `fragment` for `path`, keyed by the digest of `content`,
    /// atomically replacing any prior record.
    pub fn write(&self, path: &str, content: &str, fragment: &GraphFragment) -> Result<()> {
        let record = CacheRecord {
            path: path.to_string(),
            content_digest: hash::digest(content.as_bytes()),
            entities: fragment.entities.clone(),
            relationships: fragment.relationships.clone(),
        };

        let bytes = serde_json::to_vec(&record)
            .map_err(|e| IndexerError::Cache(format!("failed to encode record for {path}: {e}")))?;

        // Temp file lives in the cache root so the rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(&self.root)
            .map_err(|e| IndexerError::Cache(format!("failed to stage record for {path}: {e}")))?;
        tmp.write_all(&bytes)
            .map_err(|e| IndexerError::Cache(format!("failed to stage record for {path}: {e}")))?;
        tmp.persist(self.record_path(path))
            .map_err(|e| IndexerError::Cache(format!("failed to persist record for {path}: {e}")))?;

        Ok(())
    }

    fn record_path(&self, path: &str) -> PathBuf {
        self.root.join(format!("{}.json", hash::digest(path.as_bytes())))
    }
}
