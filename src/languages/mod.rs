pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::Query;

/// Grammar hooks for one language: tree-sitter language handle plus the
/// queries the extractor runs over a parsed tree.
///
/// Entity query captures pair a `@name` capture with a kind capture
/// (`@function`, `@class`, ...) on the declaration node. Relation query
/// captures pair a target capture (`@callee`, `@extends_type`,
/// `@implements_type`, `@import_source`) with an anchor capture on the
/// syntactic occurrence.
pub trait LanguageGrammar: Send + Sync {
    fn name(&self) -> &'static str;
    fn file_extensions(&self) -> &[&'static str];
    fn language(&self) -> tree_sitter::Language;
    fn entities_query(&self) -> &str;
    fn relations_query(&self) -> &str;

    /// Node kinds that count as enclosing declarations when attributing the
    /// `from` side of a relationship.
    fn declaration_kinds(&self) -> &[&'static str];

    /// Cached compiled entities query (compiled once per process).
    fn cached_entities_query(&self) -> Option<&'static Query> {
        None
    }

    /// Cached compiled relations query (compiled once per process).
    fn cached_relations_query(&self) -> Option<&'static Query> {
        None
    }
}

pub struct LanguageRegistry {
    languages: HashMap<String, Arc<dyn LanguageGrammar>>,
    extension_map: HashMap<String, String>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            languages: HashMap::new(),
            extension_map: HashMap::new(),
        };

        registry.register(Arc::new(typescript::TypeScriptGrammar));
        registry.register(Arc::new(rust::RustGrammar));

        registry
    }

    pub fn register(&mut self, grammar: Arc<dyn LanguageGrammar>) {
        let name = grammar.name().to_string();
        for ext in grammar.file_extensions() {
            self.extension_map.insert(ext.to_string(), name.clone());
        }
        self.languages.insert(name, grammar);
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.languages.get(name).cloned()
    }

    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn LanguageGrammar>> {
        self.extension_map
            .get(ext)
            .and_then(|name| self.languages.get(name))
            .cloned()
    }

    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn LanguageGrammar>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_by_extension(ext))
    }

    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extension_map.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
