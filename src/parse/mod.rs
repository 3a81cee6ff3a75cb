//! Parser collaborator contract and the built-in tree-sitter implementation.
//!
//! The indexer only depends on the [`Parser`] trait: a pure function of
//! `(path, content)` producing a [`GraphFragment`]. Any implementation with
//! that shape can drive the pipeline; `TreeSitterParser` is the default.

pub mod extractor;

use std::path::Path;
use std::sync::Arc;

use crate::error::{IndexerError, Result};
use crate::graph::GraphFragment;
use crate::languages::{LanguageGrammar, LanguageRegistry};

/// Maps source text to the entities and relationships it declares.
///
/// Implementations must be pure with respect to `(path, content)`: no side
/// effects visible to the indexer, and equal inputs produce equal fragments.
pub trait Parser: Send + Sync {
    fn parse(&self, path: &Path, content: &str) -> Result<GraphFragment>;
}

/// Source parsed into a tree, bundled with its grammar for query execution.
pub struct ParsedFile {
    pub tree: tree_sitter::Tree,
    pub source: String,
    pub grammar: Arc<dyn LanguageGrammar>,
}

impl ParsedFile {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn source_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn node_text(&self, node: &tree_sitter::Node) -> &str {
        node.utf8_text(self.source_bytes()).unwrap_or("")
    }
}

/// Default [`Parser`] backed by tree-sitter grammars.
pub struct TreeSitterParser {
    registry: LanguageRegistry,
    extractor: extractor::Extractor,
}

impl TreeSitterParser {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            extractor: extractor::Extractor::new(),
        }
    }

    fn parse_source(&self, source: &str, grammar: Arc<dyn LanguageGrammar>) -> Result<ParsedFile> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.language())
            .map_err(|e| IndexerError::Parse(e.to_string()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| IndexerError::Parse("failed to parse source".to_string()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_string(),
            grammar,
        })
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new(LanguageRegistry::new())
    }
}

impl Parser for TreeSitterParser {
    fn parse(&self, path: &Path, content: &str) -> Result<GraphFragment> {
        let grammar = self
            .registry
            .get_for_file(path)
            .ok_or_else(|| IndexerError::Parse(format!("unsupported file type: {}", path.display())))?;

        let parsed = self.parse_source(content, grammar)?;
        self.extractor.extract(&parsed, &path.to_string_lossy())
    }
}
