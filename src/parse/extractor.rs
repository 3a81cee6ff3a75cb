//! Query-driven extraction of entities and relationships from a parsed tree.

use std::path::Path;

use tree_sitter::{Query, QueryCursor, StreamingIterator};

use crate::error::{IndexerError, Result};
use crate::graph::{Entity, EntityKind, EntityRef, GraphFragment, Location, RelationKind, Relationship};
use crate::parse::ParsedFile;

pub struct Extractor;

impl Extractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the graph fragment for one file, in query match order.
    ///
    /// Every file gets a synthetic module entity (named after the file stem,
    /// line 1) that anchors file-level relationships such as imports.
    pub fn extract(&self, parsed: &ParsedFile, file_path: &str) -> Result<GraphFragment> {
        let module_name = module_name(file_path);

        let mut entities = vec![Entity::new(
            module_name.clone(),
            EntityKind::Module,
            Location::new(file_path, 1),
        )];
        let mut relationships = Vec::new();

        self.extract_entities(parsed, file_path, &mut entities)?;
        self.extract_relationships(parsed, file_path, &module_name, &mut relationships)?;

        Ok(GraphFragment::new(entities, relationships))
    }

    fn extract_entities(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        entities: &mut Vec<Entity>,
    ) -> Result<()> {
        let compiled;
        let query = match parsed.grammar.cached_entities_query() {
            Some(query) => query,
            None => {
                compiled = Query::new(&parsed.grammar.language(), parsed.grammar.entities_query())
                    .map_err(|e| {
                        IndexerError::Parse(format!(
                            "invalid entities query for {}: {e}",
                            parsed.grammar.name()
                        ))
                    })?;
                &compiled
            }
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut name: Option<&str> = None;
            let mut kind: Option<EntityKind> = None;
            let mut node: Option<tree_sitter::Node> = None;

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                if capture_name == "name" {
                    name = Some(parsed.node_text(&capture.node));
                } else if let Some(k) = entity_kind_for_capture(capture_name) {
                    kind = Some(k);
                    node = Some(capture.node);
                }
            }

            if let (Some(name), Some(kind), Some(node)) = (name, kind, node) {
                entities.push(Entity::new(
                    name,
                    kind,
                    Location::new(file_path, node.start_position().row as u32 + 1),
                ));
            }
        }

        Ok(())
    }

    fn extract_relationships(
        &self,
        parsed: &ParsedFile,
        file_path: &str,
        module_name: &str,
        relationships: &mut Vec<Relationship>,
    ) -> Result<()> {
        let compiled;
        let query = match parsed.grammar.cached_relations_query() {
            Some(query) => query,
            None => {
                compiled = Query::new(&parsed.grammar.language(), parsed.grammar.relations_query())
                    .map_err(|e| {
                        IndexerError::Parse(format!(
                            "invalid relations query for {}: {e}",
                            parsed.grammar.name()
                        ))
                    })?;
                &compiled
            }
        };

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, parsed.root_node(), parsed.source_bytes());

        while let Some(m) = matches.next() {
            let mut target: Option<(String, RelationKind)> = None;
            let mut anchor: Option<tree_sitter::Node> = None;

            for capture in m.captures {
                let capture_name = query.capture_names()[capture.index as usize];
                let text = parsed.node_text(&capture.node);

                match capture_name {
                    "callee" => target = Some((text.to_string(), RelationKind::Calls)),
                    "extends_type" => target = Some((text.to_string(), RelationKind::Extends)),
                    "implements_type" => {
                        target = Some((text.to_string(), RelationKind::Implements));
                    }
                    "import_source" => {
                        let source = text.trim_matches(|c| c == '"' || c == '\'' || c == '`');
                        target = Some((source.to_string(), RelationKind::Imports));
                    }
                    "call" | "import" | "extends" | "implements" => anchor = Some(capture.node),
                    _ => {}
                }
            }

            if let (Some((to_name, kind)), Some(anchor)) = (target, anchor) {
                let from_name = self
                    .enclosing_declaration(parsed, anchor)
                    .unwrap_or_else(|| module_name.to_string());

                let mut relationship = Relationship::new(
                    kind,
                    EntityRef::in_file(from_name, file_path),
                    EntityRef::new(to_name.clone()),
                );
                if kind == RelationKind::Imports {
                    relationship = relationship.with_metadata("source", to_name);
                }
                relationships.push(relationship);
            }
        }

        Ok(())
    }

    /// Walks up from the occurrence to the nearest named declaration the
    /// grammar recognizes. Falls back to the module entity when the
    /// occurrence is at top level.
    fn enclosing_declaration(
        &self,
        parsed: &ParsedFile,
        node: tree_sitter::Node,
    ) -> Option<String> {
        let declaration_kinds = parsed.grammar.declaration_kinds();

        let mut current = node.parent();
        while let Some(ancestor) = current {
            if declaration_kinds.contains(&ancestor.kind()) {
                // impl blocks name their subject via the `type` field.
                let name_node = ancestor
                    .child_by_field_name("name")
                    .or_else(|| ancestor.child_by_field_name("type"));
                if let Some(name_node) = name_node {
                    return Some(parsed.node_text(&name_node).to_string());
                }
            }
            current = ancestor.parent();
        }

        None
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

fn entity_kind_for_capture(capture_name: &str) -> Option<EntityKind> {
    match capture_name {
        "function" => Some(EntityKind::Function),
        "method" => Some(EntityKind::Method),
        "class" => Some(EntityKind::Class),
        "interface" => Some(EntityKind::Interface),
        "struct" => Some(EntityKind::Struct),
        "enum" => Some(EntityKind::Enum),
        "type_alias" => Some(EntityKind::TypeAlias),
        "variable" => Some(EntityKind::Variable),
        "constant" => Some(EntityKind::Constant),
        "module" => Some(EntityKind::Module),
        _ => None,
    }
}

fn module_name(file_path: &str) -> String {
    Path::new(file_path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string())
}
