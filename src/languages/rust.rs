use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct RustGrammar;

static RUST_ENTITIES_QUERY: OnceCell<Query> = OnceCell::new();
static RUST_RELATIONS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for RustGrammar {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["rs"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn entities_query(&self) -> &str {
        r#"
        (function_item
            name: (identifier) @name
        ) @function

        (struct_item
            name: (type_identifier) @name
        ) @struct

        (enum_item
            name: (type_identifier) @name
        ) @enum

        (trait_item
            name: (type_identifier) @name
        ) @interface

        (type_item
            name: (type_identifier) @name
        ) @type_alias

        (const_item
            name: (identifier) @name
        ) @constant

        (mod_item
            name: (identifier) @name
        ) @module
        "#
    }

    fn relations_query(&self) -> &str {
        r#"
        ; Function calls
        (call_expression
            function: (identifier) @callee
        ) @call

        ; Path-qualified calls
        (call_expression
            function: (scoped_identifier
                name: (identifier) @callee
            )
        ) @call

        ; Method calls
        (call_expression
            function: (field_expression
                field: (field_identifier) @callee
            )
        ) @call

        ; Imports
        (use_declaration
            argument: (_) @import_source
        ) @import

        ; Trait implementations
        (impl_item
            trait: (type_identifier) @implements_type
        ) @implements
        "#
    }

    fn declaration_kinds(&self) -> &[&'static str] {
        &[
            "function_item",
            "struct_item",
            "enum_item",
            "trait_item",
            "impl_item",
            "mod_item",
        ]
    }

    fn cached_entities_query(&self) -> Option<&'static Query> {
        RUST_ENTITIES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.entities_query()))
            .ok()
    }

    fn cached_relations_query(&self) -> Option<&'static Query> {
        RUST_RELATIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.relations_query()))
            .ok()
    }
}
