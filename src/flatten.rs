//! Deterministic serialization of the city model.
//!
//! The flat format emits one tab-separated record per node in pre-order:
//!
//! ```text
//! kind <TAB> path <TAB> height <TAB> footprint <TAB> size
//! ```
//!
//! Paths are the project name for the root, the package name for
//! packages, the file's root-relative path for files, and the file path
//! plus the type name for types. Output is byte-identical across runs on
//! an unchanged tree; the model builder's sibling ordering guarantees it.

use std::fmt::Write;

use crate::model::CityNode;

/// Flatten the city tree into the flat text representation.
///
/// Every node reachable from the root is emitted exactly once.
pub fn flatten(root: &CityNode) -> String {
    let mut out = String::new();
    emit(root, "", &mut out);
    out
}

/// Render the city tree as pretty-printed JSON.
pub fn render_json(root: &CityNode) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(root)?)
}

fn emit(node: &CityNode, parent_path: &str, out: &mut String) {
    match node {
        CityNode::Project {
            name,
            height,
            footprint,
            size,
            packages,
        } => {
            record(out, "project", name, *height, *footprint, *size);
            for package in packages {
                emit(package, "", out);
            }
        }
        CityNode::Package {
            name,
            height,
            footprint,
            size,
            files,
        } => {
            record(out, "package", name, *height, *footprint, *size);
            for file in files {
                emit(file, "", out);
            }
        }
        CityNode::File {
            path,
            height,
            footprint,
            size,
            types,
        } => {
            record(out, "file", path, *height, *footprint, *size);
            for ty in types {
                emit(ty, path, out);
            }
        }
        CityNode::Type {
            name,
            height,
            footprint,
            size,
            ..
        } => {
            let path = format!("{}/{}", parent_path, name);
            record(out, "type", &path, *height, *footprint, *size);
        }
    }
}

fn record(out: &mut String, kind: &str, path: &str, height: usize, footprint: usize, size: usize) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}\t{}\t{}\t{}\t{}", kind, path, height, footprint, size);
}
