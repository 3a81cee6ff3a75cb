pub mod cache;
pub mod error;
pub mod graph;
pub mod hash;
pub mod indexer;
pub mod languages;
pub mod parse;

pub use cache::{CacheRecord, GraphCache};
pub use error::{IndexerError, Result};
pub use graph::{
    Entity, EntityKind, EntityRef, GraphFragment, Location, RelationKind, Relationship,
};
pub use indexer::{CodeIndexer, FileError, IndexOptions, IndexProgress, IndexResult};
pub use languages::{LanguageGrammar, LanguageRegistry};
pub use parse::{Parser, TreeSitterParser};
