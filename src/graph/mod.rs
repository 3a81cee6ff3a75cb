//! Data model for the code graph: entities, relationships, and the per-file
//! fragments that flow between the parser, the cache, and the indexer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Kind of a declared entity.
///
/// The set is additive: parsers may emit new kinds over time, so consumers
/// deserialize unknown kinds as [`EntityKind::Other`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Function,
    Method,
    Class,
    Interface,
    Struct,
    Enum,
    TypeAlias,
    Variable,
    Constant,
    Module,
    Other,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Class => "class",
            EntityKind::Interface => "interface",
            EntityKind::Struct => "struct",
            EntityKind::Enum => "enum",
            EntityKind::TypeAlias => "type_alias",
            EntityKind::Variable => "variable",
            EntityKind::Constant => "constant",
            EntityKind::Module => "module",
            EntityKind::Other => "other",
        }
    }

    /// Unknown kind strings map to `Other` so fragments written by newer
    /// parsers still load.
    pub fn from_str(s: &str) -> Self {
        match s {
            "function" => EntityKind::Function,
            "method" => EntityKind::Method,
            "class" => EntityKind::Class,
            "interface" => EntityKind::Interface,
            "struct" => EntityKind::Struct,
            "enum" => EntityKind::Enum,
            "type_alias" => EntityKind::TypeAlias,
            "variable" => EntityKind::Variable,
            "constant" => EntityKind::Constant,
            "module" => EntityKind::Module,
            _ => EntityKind::Other,
        }
    }
}

impl Serialize for EntityKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EntityKind::from_str(&s))
    }
}

/// Where an entity is declared: file path plus 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// A named, located declaration extracted from source.
///
/// Identity within a file is `(name, kind, line)`. Uniqueness across the
/// whole index is not enforced; two files may both declare `foo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub location: Location,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind, location: Location) -> Self {
        Self {
            name: name.into(),
            kind,
            location,
        }
    }
}

/// Kind of a directed edge between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Imports,
    Calls,
    Extends,
    Implements,
    Other,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Imports => "imports",
            RelationKind::Calls => "calls",
            RelationKind::Extends => "extends",
            RelationKind::Implements => "implements",
            RelationKind::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "imports" => RelationKind::Imports,
            "calls" => RelationKind::Calls,
            "extends" => RelationKind::Extends,
            "implements" => RelationKind::Implements,
            _ => RelationKind::Other,
        }
    }
}

impl Serialize for RelationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RelationKind::from_str(&s))
    }
}

/// Reference to an entity by name, with the declaring file when known.
///
/// The `to` side of a relationship often points at a symbol that lives in
/// another file (or outside the indexed tree entirely), so the file is
/// optional there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl EntityRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
        }
    }

    pub fn in_file(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
        }
    }
}

/// A directed, typed edge between two entities.
///
/// No uniqueness constraint: repeated syntactic occurrences produce repeated
/// edges, and all of them are counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationKind,
    pub from: EntityRef,
    pub to: EntityRef,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Relationship {
    pub fn new(kind: RelationKind, from: EntityRef, to: EntityRef) -> Self {
        Self {
            kind,
            from,
            to,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Parser output for one file: the entities it declares and the
/// relationships rooted in it, in parser output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFragment {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl GraphFragment {
    pub fn new(entities: Vec<Entity>, relationships: Vec<Relationship>) -> Self {
        Self {
            entities,
            relationships,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_snake_case_roundtrip() {
        let json = serde_json::to_string(&EntityKind::TypeAlias).unwrap();
        assert_eq!(json, "\"type_alias\"");
        let back: EntityKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityKind::TypeAlias);
    }

    #[test]
    fn test_unknown_entity_kind_deserializes_as_other() {
        let kind: EntityKind = serde_json::from_str("\"decorator\"").unwrap();
        assert_eq!(kind, EntityKind::Other);
    }

    #[test]
    fn test_unknown_relation_kind_deserializes_as_other() {
        let kind: RelationKind = serde_json::from_str("\"overrides\"").unwrap();
        assert_eq!(kind, RelationKind::Other);
    }

    #[test]
    fn test_relationship_metadata_roundtrip() {
        let rel = Relationship::new(
            RelationKind::Imports,
            EntityRef::in_file("app", "src/app.ts"),
            EntityRef::new("./util"),
        )
        .with_metadata("source", "./util");

        let json = serde_json::to_string(&rel).unwrap();
        let back: Relationship = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rel);
        assert_eq!(back.metadata.get("source").map(String::as_str), Some("./util"));
    }

    #[test]
    fn test_fragment_default_is_empty() {
        let fragment = GraphFragment::default();
        assert!(fragment.entities.is_empty());
        assert!(fragment.relationships.is_empty());
    }
}
