//! Source tree analysis.
//!
//! The analyzer walks the root directory, consults the path filter,
//! extracts facts from each included Go file, and accumulates them into a
//! single fact table keyed by (package, type name).
//!
//! # Two-phase association
//!
//! A Go method may be declared in a different file than its receiver
//! type, so methods cannot be attached while streaming files. The walk
//! first collects every struct declaration and buffers every method
//! record; a second pass then associates each method with the fact
//! matching (package, receiver type).
//!
//! # Error handling
//!
//! Parse failures and path-computation failures are absorbed here and
//! surfaced on the [`Analysis`] result; only tree enumeration errors
//! escape to the caller, since they mean the root is not safely
//! enumerable.

mod facts;
mod go;

pub use facts::{
    Analysis, FactKey, FactTable, Field, FileFacts, Method, ParseFailure, Span, TypeConflict,
    TypeFact,
};
pub use go::GoExtractor;

use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use crate::filter::PathFilter;

/// Unrecoverable analysis errors.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("failed to enumerate source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Walks a source tree and produces the fact table.
pub struct Analyzer {
    root: PathBuf,
    filter: PathFilter,
    extractor: GoExtractor,
}

impl Analyzer {
    /// Create an analyzer for the given root. Pattern normalization and
    /// query compilation happen here, so configuration errors surface
    /// before any file is touched.
    pub fn new<P: AsRef<Path>>(root: P, ignore_patterns: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            filter: PathFilter::new(ignore_patterns)?,
            extractor: GoExtractor::new()?,
        })
    }

    /// Analyze the whole tree.
    ///
    /// Traversal order is lexical by file name within each directory,
    /// which keeps the result reproducible for a given filesystem
    /// snapshot.
    pub fn analyze(&self) -> Result<Analysis, AnalyzeError> {
        let mut analysis = Analysis::default();
        let mut pending_methods: Vec<(String, Method)> = Vec::new();

        for entry in
            WalkDir::new(&self.root).sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            if entry.file_type().is_dir() || !is_go_file(entry.path()) {
                continue;
            }
            // Filtered paths are skipped without being opened.
            if self.filter.is_excluded(&self.root, entry.path()) {
                continue;
            }

            let rel_path = self.relative_path(entry.path());
            let source = match std::fs::read(entry.path()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(file = %rel_path, error = %e, "skipping unreadable file");
                    analysis.parse_failures.push(ParseFailure {
                        path: rel_path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let FileFacts {
                path,
                package,
                types,
                methods,
                parse_error,
            } = self.extractor.extract(&rel_path, &source);

            if let Some(message) = parse_error {
                warn!(file = %path, "{message}");
                analysis.parse_failures.push(ParseFailure { path, message });
                continue;
            }

            for fact in types {
                match analysis.facts.entry(fact.key()) {
                    Entry::Vacant(slot) => {
                        slot.insert(fact);
                    }
                    Entry::Occupied(slot) => {
                        let conflict = TypeConflict {
                            key: slot.key().clone(),
                            kept_path: slot.get().path.clone(),
                            duplicate_path: fact.path,
                            duplicate_line: fact.span.start_line,
                        };
                        warn!(
                            type_name = %conflict.key,
                            kept = %conflict.kept_path,
                            duplicate = %conflict.duplicate_path,
                            "duplicate type declaration"
                        );
                        analysis.conflicts.push(conflict);
                    }
                }
            }
            for method in methods {
                pending_methods.push((package.clone(), method));
            }
        }

        for (package, method) in pending_methods {
            let key = FactKey {
                package,
                name: method.receiver.clone(),
            };
            // Methods on named non-struct types have no building to attach to.
            if let Some(fact) = analysis.facts.get_mut(&key) {
                fact.methods.push(method);
            }
        }

        Ok(analysis)
    }

    /// Root-relative, forward-slash path for an entry. Falls back to the
    /// path as given when relative derivation fails.
    fn relative_path(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => {
                warn!(path = %path.display(), "could not compute path relative to root");
                path.to_string_lossy().replace('\\', "/")
            }
        }
    }
}

fn is_go_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("go")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn analyze(dir: &TempDir, patterns: &[String]) -> Analysis {
        Analyzer::new(dir.path(), patterns)
            .unwrap()
            .analyze()
            .unwrap()
    }

    #[test]
    fn test_extraction_completeness() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp,
            "main.go",
            r#"
package main

type T struct {
    A int
    B string
}

func (t T) One() {}
func (t *T) Two() {}
func (t T) Three() {}
"#,
        );

        let analysis = analyze(&temp, &[]);

        assert_eq!(analysis.facts.len(), 1);
        let fact = analysis.facts.values().next().unwrap();
        assert_eq!(fact.name, "T");
        assert_eq!(fact.fields.len(), 2);
        assert_eq!(fact.methods.len(), 3);
        assert!(analysis.is_clean());
    }

    #[test]
    fn test_methods_associate_across_files() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp,
            "types.go",
            "package store\n\ntype Store struct {\n\tname string\n}\n",
        );
        write_file(
            &temp,
            "methods.go",
            "package store\n\nfunc (s *Store) Get(key string) string {\n\treturn s.name\n}\n",
        );

        let analysis = analyze(&temp, &[]);

        let fact = analysis.facts.values().next().unwrap();
        assert_eq!(fact.name, "Store");
        assert_eq!(fact.methods.len(), 1);
        assert_eq!(fact.methods[0].name, "Get");
    }

    #[test]
    fn test_same_type_name_in_different_packages() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "a/config.go", "package a\n\ntype Config struct{}\n");
        write_file(&temp, "b/config.go", "package b\n\ntype Config struct{}\n");

        let analysis = analyze(&temp, &[]);

        assert_eq!(analysis.facts.len(), 2);
        assert!(analysis.conflicts.is_empty());
    }

    #[test]
    fn test_duplicate_type_is_a_conflict() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp,
            "first.go",
            "package main\n\ntype Widget struct {\n\tA int\n}\n",
        );
        write_file(&temp, "second.go", "package main\n\ntype Widget struct{}\n");

        let analysis = analyze(&temp, &[]);

        assert_eq!(analysis.facts.len(), 1);
        assert_eq!(analysis.conflicts.len(), 1);

        // First declaration in walk order wins.
        let fact = analysis.facts.values().next().unwrap();
        assert_eq!(fact.path, "first.go");
        assert_eq!(fact.fields.len(), 1);

        let conflict = &analysis.conflicts[0];
        assert_eq!(conflict.kept_path, "first.go");
        assert_eq!(conflict.duplicate_path, "second.go");
    }

    #[test]
    fn test_invalid_file_is_recoverable() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "bad.go", "package main\n\nfunc broken( {\n");
        write_file(&temp, "good.go", "package main\n\ntype Ok struct{}\n");

        let analysis = analyze(&temp, &[]);

        assert_eq!(analysis.facts.len(), 1);
        assert_eq!(analysis.facts.values().next().unwrap().name, "Ok");
        assert_eq!(analysis.parse_failures.len(), 1);
        assert_eq!(analysis.parse_failures[0].path, "bad.go");
    }

    #[test]
    fn test_excluded_paths_are_skipped() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "keep/a.go", "package keep\n\ntype A struct{}\n");
        write_file(&temp, "skip/b.go", "package skip\n\ntype B struct{}\n");
        write_file(&temp, "vendor/dep/c.go", "package dep\n\ntype C struct{}\n");

        let analysis = analyze(&temp, &["/skip/".to_string()]);

        assert_eq!(analysis.facts.len(), 1);
        assert_eq!(analysis.facts.values().next().unwrap().name, "A");
    }

    #[test]
    fn test_non_go_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        write_file(&temp, "notes.txt", "type T struct{}");
        write_file(&temp, "a.go", "package main\n\ntype T struct{}\n");

        let analysis = analyze(&temp, &[]);

        assert_eq!(analysis.facts.len(), 1);
        assert!(analysis.parse_failures.is_empty());
    }
}
