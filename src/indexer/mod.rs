//! Indexing pipeline: discovery, per-file hash-and-lookup, parser
//! delegation, aggregation, and progress reporting.
//!
//! Processing is strictly sequential in discovery order; the ordering of
//! progress events is part of the observable contract. Per-file failures
//! (unreadable file, parser rejection) are recovered into the result, while
//! systemic failures (cache storage, malformed pattern) fail the whole call.

pub mod progress;

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use crate::cache::GraphCache;
use crate::error::{IndexerError, Result};
use crate::parse::Parser;

pub use progress::{FileError, IndexProgress, IndexResult};

/// Options for one indexing call.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Glob patterns resolved relative to `cwd`, in order.
    pub patterns: Vec<String>,
    pub cwd: PathBuf,
}

impl IndexOptions {
    pub fn new(patterns: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            patterns,
            cwd: cwd.into(),
        }
    }
}

/// Orchestrates the pipeline over an explicit cache handle and a parser
/// collaborator.
pub struct CodeIndexer {
    cache: GraphCache,
    parser: Box<dyn Parser>,
}

impl CodeIndexer {
    /// The cache must already be initialized (or `init` called before the
    /// first `index`).
    pub fn new(cache: GraphCache, parser: Box<dyn Parser>) -> Self {
        Self { cache, parser }
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    /// Indexes the files matched by `options`, without progress reporting.
    pub fn index(&self, options: &IndexOptions) -> Result<IndexResult> {
        self.index_with_progress(options, |_| {})
    }

    /// Indexes the files matched by `options`, invoking `on_progress` once
    /// per file in discovery order.
    ///
    /// The callback runs synchronously on the indexing thread; a panic in it
    /// unwinds through this call and aborts the batch.
    pub fn index_with_progress(
        &self,
        options: &IndexOptions,
        mut on_progress: impl FnMut(&IndexProgress),
    ) -> Result<IndexResult> {
        let started = Instant::now();

        let files = self.discover(options)?;
        let total = files.len();
        tracing::debug!("indexing {total} files under {}", options.cwd.display());

        let mut result = IndexResult::default();

        for (index, file) in files.iter().enumerate() {
            let path = file.to_string_lossy().to_string();
            let mut cached = false;

            match std::fs::read_to_string(file) {
                Err(e) => {
                    result.failed_files += 1;
                    result.errors.push(FileError {
                        file: path.clone(),
                        error: e.to_string(),
                    });
                }
                Ok(content) => match self.cache.read(&path, &content)? {
                    Some(fragment) => {
                        cached = true;
                        result.cached_files += 1;
                        result.total_entities += fragment.entities.len();
                        result.total_relationships += fragment.relationships.len();
                    }
                    None => match self.parser.parse(file, &content) {
                        Ok(fragment) => {
                            self.cache.write(&path, &content, &fragment)?;
                            result.parsed_files += 1;
                            result.total_entities += fragment.entities.len();
                            result.total_relationships += fragment.relationships.len();
                        }
                        Err(e) => {
                            result.failed_files += 1;
                            result.errors.push(FileError {
                                file: path.clone(),
                                error: e.to_string(),
                            });
                        }
                    },
                },
            }

            on_progress(&IndexProgress {
                index,
                total,
                file: path,
                cached,
            });
        }

        result.total_files = total;
        result.total_time = started.elapsed();
        tracing::debug!(
            "indexed {} files in {:?}: {} parsed, {} cached, {} failed",
            result.total_files,
            result.total_time,
            result.parsed_files,
            result.cached_files,
            result.failed_files,
        );
        Ok(result)
    }

    /// Resolves all patterns against `cwd`, concatenating matches in pattern
    /// order and deduplicating by absolute path, first match wins.
    ///
    /// A pattern without glob metacharacters is kept as a literal path entry
    /// even when the file does not exist, so a missing explicit path surfaces
    /// as a per-file read failure instead of silently matching nothing.
    fn discover(&self, options: &IndexOptions) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        let mut push = |path: PathBuf, files: &mut Vec<PathBuf>| {
            let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(key) {
                files.push(path);
            }
        };

        for pattern in &options.patterns {
            let full = options.cwd.join(pattern);

            if is_literal(pattern) {
                push(full, &mut files);
                continue;
            }

            let matches =
                glob::glob(&full.to_string_lossy()).map_err(|source| IndexerError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;

            for path in matches.filter_map(|entry| entry.ok()) {
                if path.is_file() {
                    push(path, &mut files);
                }
            }
        }

        Ok(files)
    }
}

fn is_literal(pattern: &str) -> bool {
    !pattern.chars().any(|c| matches!(c, '*' | '?' | '['))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::graph::GraphFragment;
    use crate::parse::TreeSitterParser;

    fn create_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn create_indexer(dir: &TempDir) -> CodeIndexer {
        let cache = GraphCache::new(dir.path().join(".graph-cache"));
        cache.init().unwrap();
        CodeIndexer::new(cache, Box::new(TreeSitterParser::default()))
    }

    /// Parser stub that counts invocations, for cache behavior assertions.
    struct CountingParser {
        calls: Arc<AtomicUsize>,
    }

    impl Parser for CountingParser {
        fn parse(&self, _path: &Path, _content: &str) -> Result<GraphFragment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GraphFragment::default())
        }
    }

    #[test]
    fn test_empty_patterns_yield_zero_result() {
        let dir = TempDir::new().unwrap();
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(vec![], dir.path()))
            .unwrap();

        assert_eq!(result.total_files, 0);
        assert_eq!(result.parsed_files, 0);
        assert_eq!(result.cached_files, 0);
        assert_eq!(result.failed_files, 0);
        assert_eq!(result.total_entities, 0);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_glob_discovery_parses_matched_files() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.ts", "export function foo() {}\n");
        create_file(dir.path(), "b.ts", "export function bar() {}\n");
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(vec!["*.ts".into()], dir.path()))
            .unwrap();

        assert_eq!(result.total_files, 2);
        assert_eq!(result.parsed_files, 2);
        assert_eq!(result.cached_files, 0);
        assert_eq!(result.failed_files, 0);
        assert!(result.total_entities >= 2);
    }

    #[test]
    fn test_duplicate_matches_processed_once() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "dup.ts", "export function once() {}\n");
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(
                vec!["*.ts".into(), "dup.ts".into()],
                dir.path(),
            ))
            .unwrap();

        assert_eq!(result.total_files, 1);
        assert_eq!(result.parsed_files, 1);
    }

    #[test]
    fn test_recursive_glob() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "src/a.ts", "export function a() {}\n");
        create_file(dir.path(), "src/nested/b.ts", "export function b() {}\n");
        create_file(dir.path(), "top.ts", "export function t() {}\n");
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(vec!["**/*.ts".into()], dir.path()))
            .unwrap();

        assert_eq!(result.total_files, 3);
    }

    #[test]
    fn test_missing_literal_path_records_failure_without_aborting() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "good.ts", "export function ok() {}\n");
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(
                vec!["good.ts".into(), "missing.ts".into()],
                dir.path(),
            ))
            .unwrap();

        assert_eq!(result.total_files, 2);
        assert_eq!(result.parsed_files, 1);
        assert_eq!(result.failed_files, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].file.ends_with("missing.ts"));
    }

    #[test]
    fn test_malformed_pattern_fails_whole_call() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.ts", "export function a() {}\n");
        let indexer = create_indexer(&dir);

        let err = indexer
            .index(&IndexOptions::new(
                vec!["a.ts".into(), "[".into()],
                dir.path(),
            ))
            .unwrap_err();

        assert!(matches!(err, IndexerError::Pattern { .. }));
    }

    #[test]
    fn test_second_run_is_fully_cached() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.ts", "export function foo() {}\n");
        create_file(dir.path(), "b.ts", "export function bar() {}\n");
        let indexer = create_indexer(&dir);
        let options = IndexOptions::new(vec!["*.ts".into()], dir.path());

        let first = indexer.index(&options).unwrap();
        let second = indexer.index(&options).unwrap();

        assert_eq!(second.parsed_files, 0);
        assert_eq!(second.cached_files, second.total_files);
        assert_eq!(second.total_entities, first.total_entities);
        assert_eq!(second.total_relationships, first.total_relationships);
    }

    #[test]
    fn test_changed_file_reparses_exactly_that_file() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.ts", "export function foo() {}\n");
        create_file(dir.path(), "b.ts", "export function bar() {}\n");
        let calls = Arc::new(AtomicUsize::new(0));

        let cache = GraphCache::new(dir.path().join(".graph-cache"));
        cache.init().unwrap();
        let indexer = CodeIndexer::new(cache, Box::new(CountingParser { calls: calls.clone() }));
        let options = IndexOptions::new(vec!["*.ts".into()], dir.path());

        indexer.index(&options).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        create_file(dir.path(), "b.ts", "export function baz() {}\n");
        let result = indexer.index(&options).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.parsed_files, 1);
        assert_eq!(result.cached_files, 1);
    }

    #[test]
    fn test_parse_failure_recorded_and_not_cached() {
        let dir = TempDir::new().unwrap();
        // No grammar claims .txt, so parsing fails on every run.
        create_file(dir.path(), "notes.txt", "not source code");
        let indexer = create_indexer(&dir);
        let options = IndexOptions::new(vec!["notes.txt".into()], dir.path());

        let first = indexer.index(&options).unwrap();
        assert_eq!(first.failed_files, 1);
        assert_eq!(first.errors.len(), 1);

        let second = indexer.index(&options).unwrap();
        assert_eq!(second.failed_files, 1);
        assert_eq!(second.cached_files, 0);
    }

    #[test]
    fn test_progress_events_in_order() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a.ts", "export function foo() {}\n");
        create_file(dir.path(), "b.ts", "export function bar() {}\n");
        let indexer = create_indexer(&dir);
        let options = IndexOptions::new(vec!["*.ts".into()], dir.path());

        let mut events = Vec::new();
        indexer
            .index_with_progress(&options, |p| events.push(p.clone()))
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].index, 0);
        assert_eq!(events[1].index, 1);
        assert!(events.iter().all(|e| e.total == 2));
        assert!(events.iter().all(|e| !e.cached));

        let mut events = Vec::new();
        indexer
            .index_with_progress(&options, |p| events.push(p.clone()))
            .unwrap();
        assert!(events.iter().all(|e| e.cached));
    }

    #[test]
    fn test_progress_cached_false_for_failed_file() {
        let dir = TempDir::new().unwrap();
        let indexer = create_indexer(&dir);
        let options = IndexOptions::new(vec!["missing.ts".into()], dir.path());

        let mut events = Vec::new();
        indexer
            .index_with_progress(&options, |p| events.push(p.clone()))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert!(!events[0].cached);
    }

    #[test]
    fn test_count_invariant_holds_with_mixed_outcomes() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "ok.ts", "export function ok() {}\n");
        create_file(dir.path(), "bad.txt", "plain text");
        let indexer = create_indexer(&dir);

        let result = indexer
            .index(&IndexOptions::new(
                vec!["ok.ts".into(), "bad.txt".into(), "gone.ts".into()],
                dir.path(),
            ))
            .unwrap();

        assert_eq!(
            result.parsed_files + result.cached_files + result.failed_files,
            result.total_files
        );
        assert_eq!(result.total_files, 3);
        assert_eq!(result.failed_files, 2);
    }

    #[test]
    fn test_pattern_order_drives_discovery_order() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "z.ts", "export function z() {}\n");
        create_file(dir.path(), "a.ts", "export function a() {}\n");
        let indexer = create_indexer(&dir);
        let options = IndexOptions::new(vec!["z.ts".into(), "a.ts".into()], dir.path());

        let mut order = Vec::new();
        indexer
            .index_with_progress(&options, |p| order.push(p.file.clone()))
            .unwrap();

        assert!(order[0].ends_with("z.ts"));
        assert!(order[1].ends_with("a.ts"));
    }

    #[test]
    fn test_is_literal() {
        assert!(is_literal("src/app.ts"));
        assert!(!is_literal("*.ts"));
        assert!(!is_literal("src/**/*.ts"));
        assert!(!is_literal("file?.ts"));
        assert!(!is_literal("[ab].ts"));
    }
}
