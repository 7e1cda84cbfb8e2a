//! Exclusion of paths from analysis via glob-style ignore patterns.
//!
//! Patterns are normalized once when the filter is built:
//! - a pattern starting with `/` is anchored with a leading `**` so it
//!   matches at any depth
//! - a pattern ending with `/` names a directory and gets a trailing `**`
//!   so everything beneath it matches
//! - a pattern containing a `/` but no wildcard is a path prefix and gets
//!   a trailing `/**`
//!
//! Matching runs against the candidate's path relative to the analysis
//! root, with forward-slash separators on every platform.

use std::path::Path;

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Vendored dependencies are never part of the city.
const VENDOR_PATTERN: &str = "/vendor/";

/// Compiled ignore-pattern set.
pub struct PathFilter {
    patterns: GlobSet,
}

impl PathFilter {
    /// Normalize and compile the given patterns, plus the implicit vendor
    /// exclusion. Invalid glob syntax is a configuration error.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for raw in patterns
            .iter()
            .map(|p| p.as_ref())
            .chain(std::iter::once(VENDOR_PATTERN))
        {
            let normalized = match normalize(raw) {
                Some(n) => n,
                None => continue,
            };
            let glob = GlobBuilder::new(&normalized)
                // `*` stays within one path segment; `**` crosses segments
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid exclusion pattern {:?}", raw))?;
            builder.add(glob);
        }

        Ok(Self {
            patterns: builder.build()?,
        })
    }

    /// Whether `candidate` is excluded relative to `root`.
    ///
    /// A candidate that is not under the root cannot be meaningfully
    /// matched, so it is treated as not excluded rather than failing the
    /// run.
    pub fn is_excluded(&self, root: &Path, candidate: &Path) -> bool {
        let rel = match candidate.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => return false,
        };
        let rel = rel.to_string_lossy().replace('\\', "/");
        self.patterns.is_match(&rel)
    }
}

/// Apply the normalization rules to one raw pattern.
///
/// Returns None for empty (or whitespace-only) patterns, which are
/// ignored.
fn normalize(pattern: &str) -> Option<String> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut clean = trimmed.to_string();
    if clean.starts_with('/') {
        clean = format!("**{}", clean);
    }
    if clean.ends_with('/') {
        clean.push_str("**");
    } else if !clean.contains('*') && clean.contains('/') {
        clean.push_str("/**");
    }
    Some(clean)
}
