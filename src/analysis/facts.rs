//! Fact records extracted from Go source trees.

use std::collections::BTreeMap;
use std::fmt;

/// Line span of a declaration, 1-indexed. `start_byte` is kept for
/// deterministic in-file ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// End line (1-indexed).
    pub end_line: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            start_line: node.start_position().row + 1, // tree-sitter is 0-indexed
            end_line: node.end_position().row + 1,
        }
    }

    /// Lines spanned beyond the first; zero for a one-line declaration.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_line, self.end_line)
    }
}

/// One declared struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name; for embedded fields, the base identifier of the
    /// embedded type.
    pub name: String,
    /// Declared type text, verbatim from the source.
    pub type_text: String,
    /// Whether this is an embedded (anonymous) field. The embedded type's
    /// own fields are never flattened into the embedding type.
    pub embedded: bool,
}

/// One method associated with a struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    /// Receiver's named type, with any pointer indirection unwrapped.
    pub receiver: String,
    /// Whether the receiver was declared as `*T` rather than `T`.
    pub pointer_receiver: bool,
    /// Parameter and result text, verbatim from the source.
    pub signature: String,
    pub span: Span,
}

/// Identity of a type fact within one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FactKey {
    pub package: String,
    pub name: String,
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// One record per discovered struct type declaration.
///
/// Facts are created during the analysis pass and never change afterwards;
/// methods are attached in the association phase of that same pass.
#[derive(Debug, Clone)]
pub struct TypeFact {
    pub name: String,
    pub package: String,
    /// Declaring file's path relative to the analysis root, forward-slash
    /// normalized.
    pub path: String,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub span: Span,
}

impl TypeFact {
    pub fn key(&self) -> FactKey {
        FactKey {
            package: self.package.clone(),
            name: self.name.clone(),
        }
    }
}

/// All type facts from one run, keyed by (package, type name).
///
/// A BTreeMap keeps iteration order deterministic for the model builder.
pub type FactTable = BTreeMap<FactKey, TypeFact>;

/// Raw facts from a single file, before cross-file method association.
#[derive(Debug)]
pub struct FileFacts {
    pub path: String,
    pub package: String,
    pub types: Vec<TypeFact>,
    pub methods: Vec<Method>,
    /// Set when the file could not be analyzed; types and methods are
    /// empty in that case.
    pub parse_error: Option<String>,
}

impl FileFacts {
    /// Facts for a file that failed to parse.
    pub fn failed(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            package: String::new(),
            types: Vec::new(),
            methods: Vec::new(),
            parse_error: Some(message.into()),
        }
    }
}

/// A duplicate (package, type name) declaration. The first declaration in
/// walk order is kept; the duplicate is reported, never silently merged.
#[derive(Debug, Clone)]
pub struct TypeConflict {
    pub key: FactKey,
    pub kept_path: String,
    pub duplicate_path: String,
    pub duplicate_line: usize,
}

/// A file skipped because it could not be analyzed.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub path: String,
    pub message: String,
}

/// Result of analyzing a source tree.
///
/// Recoverable degradation (parse failures, duplicate keys) is carried
/// here alongside the facts so callers can inspect it; a run with only
/// recoverable errors still yields a complete table.
#[derive(Debug, Default)]
pub struct Analysis {
    pub facts: FactTable,
    pub conflicts: Vec<TypeConflict>,
    pub parse_failures: Vec<ParseFailure>,
}

impl Analysis {
    /// Whether the run completed without any recoverable errors.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.parse_failures.is_empty()
    }
}
