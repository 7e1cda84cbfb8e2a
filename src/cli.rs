//! Command-line interface for codecity.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::analysis::Analyzer;
use crate::flatten;
use crate::model;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ANALYSIS_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Generate a city metrics model from a Go source tree.
///
/// Packages become districts, files become lots, and struct types become
/// buildings whose metrics encode method count (height), field count
/// (footprint), and declaration span (size). Diagnostics go to stderr;
/// the model goes to stdout unless --output is given.
#[derive(Parser)]
#[command(name = "codecity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory of the Go project to analyze
    pub path: PathBuf,

    /// Project name used as the root node label (default: directory name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Glob-style exclusion pattern, relative to the root (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Write the model to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format: flat or json
    #[arg(short, long, default_value = "flat")]
    pub format: String,
}

/// Run the analysis.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    if cli.format != "flat" && cli.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'flat' or 'json'",
            cli.format
        );
        return Ok(EXIT_ERROR);
    }

    let root = match cli.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", cli.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: not a directory: {}", root.display());
        return Ok(EXIT_ERROR);
    }

    let project_name = match &cli.name {
        Some(name) => name.clone(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string()),
    };

    // Invalid exclusion patterns are configuration errors, caught before
    // any file is touched.
    let analyzer = match Analyzer::new(&root, &cli.exclude) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    info!(project = %project_name, root = %root.display(), "analyzing");
    let analysis = match analyzer.analyze() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ANALYSIS_FAILED);
        }
    };

    if !analysis.parse_failures.is_empty() {
        warn!(
            count = analysis.parse_failures.len(),
            "files skipped due to parse failures"
        );
    }
    if !analysis.conflicts.is_empty() {
        warn!(
            count = analysis.conflicts.len(),
            "duplicate type declarations ignored"
        );
    }

    let city = model::build(&analysis.facts, &project_name);
    let output = match cli.format.as_str() {
        "json" => flatten::render_json(&city)?,
        _ => flatten::flatten(&city),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &output)?;
            info!(file = %path.display(), types = analysis.facts.len(), "analysis complete");
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(EXIT_SUCCESS)
}
