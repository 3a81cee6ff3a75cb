use once_cell::sync::OnceCell;
use tree_sitter::Query;

use super::LanguageGrammar;

pub struct TypeScriptGrammar;

static TS_ENTITIES_QUERY: OnceCell<Query> = OnceCell::new();
static TS_RELATIONS_QUERY: OnceCell<Query> = OnceCell::new();

impl LanguageGrammar for TypeScriptGrammar {
    fn name(&self) -> &'static str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&'static str] {
        &["ts", "tsx", "js", "jsx"]
    }

    fn language(&self) -> tree_sitter::Language {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }

    fn entities_query(&self) -> &str {
        r#"
        (function_declaration
            name: (identifier) @name
        ) @function

        (method_definition
            name: (property_identifier) @name
        ) @method

        (variable_declarator
            name: (identifier) @name
            value: (arrow_function)
        ) @function

        (class_declaration
            name: (type_identifier) @name
        ) @class

        (interface_declaration
            name: (type_identifier) @name
        ) @interface

        (type_alias_declaration
            name: (type_identifier) @name
        ) @type_alias

        (enum_declaration
            name: (identifier) @name
        ) @enum
        "#
    }

    fn relations_query(&self) -> &str {
        r#"
        ; Function calls
        (call_expression
            function: (identifier) @callee
        ) @call

        ; Method calls
        (call_expression
            function: (member_expression
                property: (property_identifier) @callee
            )
        ) @call

        ; Constructor calls
        (new_expression
            constructor: (identifier) @callee
        ) @call

        ; Imports
        (import_statement
            source: (string) @import_source
        ) @import

        ; Class extension
        (class_heritage
            (extends_clause
                (identifier) @extends_type
            )
        ) @extends

        ; Interface implementation
        (class_heritage
            (implements_clause
                (type_identifier) @implements_type
            )
        ) @implements
        "#
    }

    fn declaration_kinds(&self) -> &[&'static str] {
        &[
            "function_declaration",
            "method_definition",
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
        ]
    }

    fn cached_entities_query(&self) -> Option<&'static Query> {
        TS_ENTITIES_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.entities_query()))
            .ok()
    }

    fn cached_relations_query(&self) -> Option<&'static Query> {
        TS_RELATIONS_QUERY
            .get_or_try_init(|| Query::new(&self.language(), self.relations_query()))
            .ok()
    }
}
