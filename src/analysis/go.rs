//! Go fact extraction using tree-sitter.
//!
//! Extracts, per file:
//! - The package clause
//! - Struct type declarations with their directly declared fields,
//!   regardless of declaration grouping syntax
//! - Function declarations with a receiver, unwrapping pointer
//!   indirection to find the receiver's named type

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use super::facts::{Field, FileFacts, Method, Span, TypeFact};

/// Tree-sitter query for struct type declarations. Matches once per
/// type_spec, so grouped declarations yield one match each.
const STRUCT_QUERY: &str = r#"
(type_declaration
  (type_spec
    name: (type_identifier) @type_name
    type: (struct_type) @struct_body
  ) @type_spec
)
"#;

/// Tree-sitter query for method declarations (with receiver).
const METHOD_QUERY: &str = r#"
(method_declaration
  receiver: (parameter_list
    (parameter_declaration
      type: [
        (pointer_type (type_identifier) @receiver_type)
        (type_identifier) @receiver_type
      ]
    )
  )
  name: (field_identifier) @method_name
  parameters: (parameter_list) @params
) @method
"#;

/// Tree-sitter query for the package clause.
const PACKAGE_QUERY: &str = r#"
(package_clause
  (package_identifier) @package_name
)
"#;

/// Go struct and method extractor.
///
/// Queries are compiled once at construction; a fresh parser is created
/// per file and dropped when extraction finishes.
pub struct GoExtractor {
    language: Language,
    struct_query: Query,
    method_query: Query,
    package_query: Query,
}

impl GoExtractor {
    /// Compile the extraction queries against the Go grammar.
    pub fn new() -> anyhow::Result<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        Ok(Self {
            struct_query: Query::new(&language, STRUCT_QUERY)?,
            method_query: Query::new(&language, METHOD_QUERY)?,
            package_query: Query::new(&language, PACKAGE_QUERY)?,
            language,
        })
    }

    /// Extract all facts from one file.
    ///
    /// A file that does not parse as valid Go contributes no facts; the
    /// condition is recorded on the returned value, not raised.
    pub fn extract(&self, rel_path: &str, source: &[u8]) -> FileFacts {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            return FileFacts::failed(rel_path, e.to_string());
        }
        let tree = match parser.parse(source, None) {
            Some(t) => t,
            None => return FileFacts::failed(rel_path, "failed to parse source"),
        };

        let root = tree.root_node();
        if root.has_error() {
            return FileFacts::failed(rel_path, "source contains syntax errors");
        }

        let package = match self.extract_package(root, source) {
            Some(p) => p,
            None => return FileFacts::failed(rel_path, "missing package clause"),
        };

        let types = self.extract_structs(root, source, rel_path, &package);
        let methods = self.extract_methods(root, source);

        FileFacts {
            path: rel_path.to_string(),
            package,
            types,
            methods,
            parse_error: None,
        }
    }

    /// Extract the package name from the package clause.
    fn extract_package(&self, root: Node, source: &[u8]) -> Option<String> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.package_query, root, source);

        if let Some(m) = matches.next() {
            for capture in m.captures {
                let name = self.package_query.capture_names()[capture.index as usize];
                if name == "package_name" {
                    return Some(node_text(capture.node, source).to_string());
                }
            }
        }
        None
    }

    /// Extract every struct type declaration with its fields.
    fn extract_structs(
        &self,
        root: Node,
        source: &[u8],
        rel_path: &str,
        package: &str,
    ) -> Vec<TypeFact> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.struct_query, root, source);

        let mut types = Vec::new();

        while let Some(m) = matches.next() {
            let mut name = String::new();
            let mut spec_node = None;
            let mut body_node = None;

            for capture in m.captures {
                let capture_name = self.struct_query.capture_names()[capture.index as usize];
                match capture_name {
                    "type_name" => name = node_text(capture.node, source).to_string(),
                    "type_spec" => spec_node = Some(capture.node),
                    "struct_body" => body_node = Some(capture.node),
                    _ => {}
                }
            }

            if name.is_empty() {
                continue;
            }
            if let (Some(spec), Some(body)) = (spec_node, body_node) {
                types.push(TypeFact {
                    name,
                    package: package.to_string(),
                    path: rel_path.to_string(),
                    fields: extract_fields(body, source),
                    methods: Vec::new(),
                    span: Span::from_node(spec),
                });
            }
        }

        types.sort_by_key(|t| t.span.start_byte);
        types
    }

    /// Extract every function declaration that has a receiver.
    fn extract_methods(&self, root: Node, source: &[u8]) -> Vec<Method> {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.method_query, root, source);

        let mut methods = Vec::new();

        while let Some(m) = matches.next() {
            let mut name = String::new();
            let mut receiver = String::new();
            let mut pointer_receiver = false;
            let mut params = String::new();
            let mut decl_node = None;

            for capture in m.captures {
                let capture_name = self.method_query.capture_names()[capture.index as usize];
                match capture_name {
                    "method_name" => name = node_text(capture.node, source).to_string(),
                    "receiver_type" => {
                        receiver = node_text(capture.node, source).to_string();
                        pointer_receiver = capture
                            .node
                            .parent()
                            .is_some_and(|p| p.kind() == "pointer_type");
                    }
                    "params" => params = node_text(capture.node, source).to_string(),
                    "method" => decl_node = Some(capture.node),
                    _ => {}
                }
            }

            let decl_node = match decl_node {
                Some(n) => n,
                None => continue,
            };
            if name.is_empty() || receiver.is_empty() {
                continue;
            }

            let signature = match decl_node.child_by_field_name("result") {
                Some(result) => format!("{} {}", params, node_text(result, source)),
                None => params,
            };

            methods.push(Method {
                name,
                receiver,
                pointer_receiver,
                signature,
                span: Span::from_node(decl_node),
            });
        }

        methods.sort_by_key(|m| m.span.start_byte);
        methods
    }
}

/// Collect the directly declared fields of a struct body.
///
/// A multi-name declaration (`X, Y int`) yields one field per name. An
/// embedded field yields a single descriptor named after the embedded
/// type's base identifier.
fn extract_fields(struct_node: Node, source: &[u8]) -> Vec<Field> {
    let mut fields = Vec::new();

    let list = match struct_node
        .children(&mut struct_node.walk())
        .find(|n| n.kind() == "field_declaration_list")
    {
        Some(l) => l,
        None => return fields,
    };

    let mut list_cursor = list.walk();
    for decl in list
        .children(&mut list_cursor)
        .filter(|n| n.kind() == "field_declaration")
    {
        let type_text = decl
            .child_by_field_name("type")
            .map(|t| node_text(t, source).to_string())
            .unwrap_or_default();

        let mut name_cursor = decl.walk();
        let names: Vec<String> = decl
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| node_text(n, source).to_string())
            .collect();

        if names.is_empty() {
            // Embedded field: the declaration carries only a type.
            fields.push(Field {
                name: embedded_name(&type_text),
                type_text,
                embedded: true,
            });
        } else {
            for name in names {
                fields.push(Field {
                    name,
                    type_text: type_text.clone(),
                    embedded: false,
                });
            }
        }
    }

    fields
}

/// Base identifier of an embedded field's type: strips pointer, package
/// qualifier, and type arguments (`*pkg.Foo[T]` becomes `Foo`).
fn embedded_name(type_text: &str) -> String {
    let base = type_text.trim_start_matches('*');
    let base = base.split('[').next().unwrap_or(base);
    let base = base.rsplit('.').next().unwrap_or(base);
    base.to_string()
}

/// Get text for a tree-sitter node.
fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> FileFacts {
        let extractor = GoExtractor::new().unwrap();
        extractor.extract("test.go", source.as_bytes())
    }

    #[test]
    fn test_extract_package() {
        let facts = extract("package store\n");
        assert_eq!(facts.package, "store");
        assert!(facts.parse_error.is_none());
    }

    #[test]
    fn test_extract_struct_fields() {
        let source = r#"
package main

type Config struct {
    Name    string
    Timeout int
}
"#;
        let facts = extract(source);

        assert_eq!(facts.types.len(), 1);
        let config = &facts.types[0];
        assert_eq!(config.name, "Config");
        assert_eq!(config.package, "main");
        assert_eq!(config.path, "test.go");
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[0].name, "Name");
        assert_eq!(config.fields[0].type_text, "string");
        assert_eq!(config.fields[1].name, "Timeout");
        assert_eq!(config.fields[1].type_text, "int");
    }

    #[test]
    fn test_multi_name_field_declaration() {
        let source = r#"
package main

type Point struct {
    X, Y int
}
"#;
        let facts = extract(source);

        let point = &facts.types[0];
        assert_eq!(point.fields.len(), 2);
        assert_eq!(point.fields[0].name, "X");
        assert_eq!(point.fields[1].name, "Y");
        assert!(point.fields.iter().all(|f| f.type_text == "int"));
    }

    #[test]
    fn test_embedded_fields() {
        let source = r#"
package main

import "sync"

type Registry struct {
    sync.Mutex
    entries map[string]int
}
"#;
        let facts = extract(source);

        let registry = &facts.types[0];
        assert_eq!(registry.fields.len(), 2);

        let embedded = &registry.fields[0];
        assert_eq!(embedded.name, "Mutex");
        assert_eq!(embedded.type_text, "sync.Mutex");
        assert!(embedded.embedded);

        assert_eq!(registry.fields[1].name, "entries");
        assert!(!registry.fields[1].embedded);
    }

    #[test]
    fn test_grouped_type_declarations() {
        let source = r#"
package main

type (
    First struct {
        A int
    }
    Second struct {
        B string
    }
)
"#;
        let facts = extract(source);

        assert_eq!(facts.types.len(), 2);
        assert_eq!(facts.types[0].name, "First");
        assert_eq!(facts.types[1].name, "Second");
    }

    #[test]
    fn test_non_struct_types_are_ignored() {
        let source = r#"
package main

type Service interface {
    Run() error
}

type Alias = string

type Code int
"#;
        let facts = extract(source);
        assert!(facts.types.is_empty());
    }

    #[test]
    fn test_extract_methods_with_receivers() {
        let source = r#"
package main

type Config struct {
    Name string
}

func (c *Config) Validate() error {
    return nil
}

func (c Config) String() string {
    return c.Name
}

func standalone() {}
"#;
        let facts = extract(source);

        assert_eq!(facts.methods.len(), 2);

        let validate = &facts.methods[0];
        assert_eq!(validate.name, "Validate");
        assert_eq!(validate.receiver, "Config");
        assert!(validate.pointer_receiver);
        assert_eq!(validate.signature, "() error");

        let string_method = &facts.methods[1];
        assert_eq!(string_method.name, "String");
        assert_eq!(string_method.receiver, "Config");
        assert!(!string_method.pointer_receiver);
        assert_eq!(string_method.signature, "() string");
    }

    #[test]
    fn test_method_signature_with_parameters() {
        let source = r#"
package main

type Store struct{}

func (s *Store) Put(key string, value []byte) (int, error) {
    return 0, nil
}
"#;
        let facts = extract(source);

        let put = &facts.methods[0];
        assert_eq!(put.signature, "(key string, value []byte) (int, error)");
    }

    #[test]
    fn test_syntax_error_is_recoverable() {
        let facts = extract("package main\n\nfunc broken( {\n");

        assert!(facts.parse_error.is_some());
        assert!(facts.types.is_empty());
        assert!(facts.methods.is_empty());
    }

    #[test]
    fn test_missing_package_clause() {
        let facts = extract("type T struct{}\n");
        assert!(facts.parse_error.is_some());
    }

    #[test]
    fn test_file_without_types_is_not_an_error() {
        let facts = extract("package main\n\nfunc main() {}\n");

        assert!(facts.parse_error.is_none());
        assert!(facts.types.is_empty());
    }

    #[test]
    fn test_embedded_name_forms() {
        assert_eq!(embedded_name("Base"), "Base");
        assert_eq!(embedded_name("*Base"), "Base");
        assert_eq!(embedded_name("pkg.Base"), "Base");
        assert_eq!(embedded_name("*pkg.Base"), "Base");
        assert_eq!(embedded_name("List[T]"), "List");
    }
}
