//! Codecity - Go source tree to city metrics model.
//!
//! Codecity turns a Go project into a hierarchical "city" suitable for 3D
//! visualization: packages become districts, files become lots, and struct
//! types become buildings whose geometry encodes code metrics (method
//! count, field count, declaration size).
//!
//! # Architecture
//!
//! The pipeline is a single-threaded, stateless transformation:
//!
//! - `filter`: glob-style ignore patterns, normalized once per run
//! - `analysis`: tree walk, per-file tree-sitter extraction, and the
//!   package-scoped method association pass, producing a fact table
//! - `model`: grouping and metric aggregation into the city tree
//! - `flatten`: deterministic serialization of the tree
//! - `cli`: the thin shell supplying paths and sinks
//!
//! Recoverable conditions (a file that fails to parse, a duplicate type
//! key) degrade the result without aborting it; only tree enumeration
//! errors fail a run.

pub mod analysis;
pub mod cli;
pub mod filter;
pub mod flatten;
pub mod model;

pub use analysis::{Analysis, AnalyzeError, Analyzer, FactKey, FactTable, TypeFact};
pub use filter::PathFilter;
pub use flatten::{flatten, render_json};
pub use model::{build, CityNode};

use std::path::Path;

/// Run the whole pipeline and return the flattened output string.
///
/// This is the library boundary for callers that do not need to inspect
/// conflicts or parse failures; the CLI uses the pieces directly.
pub fn generate<P: AsRef<Path>>(
    root: P,
    ignore_patterns: &[String],
    project_name: &str,
) -> anyhow::Result<String> {
    let analyzer = Analyzer::new(root, ignore_patterns)?;
    let analysis = analyzer.analyze()?;
    let city = model::build(&analysis.facts, project_name);
    Ok(flatten::flatten(&city))
}
