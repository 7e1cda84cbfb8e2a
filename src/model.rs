//! Hierarchical city model built from the fact table.
//!
//! Packages become districts, files become lots, struct types become
//! buildings. Metrics per type: height = method count, footprint = field
//! count, size = line span of the declaration. Container aggregation is
//! fixed per metric: height is the max of the children, footprint and
//! size are sums.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::{FactTable, TypeFact};

/// A node in the city hierarchy.
///
/// A pure value tree: parents own their children, and the tree is
/// immutable once flattening begins.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CityNode {
    Project {
        name: String,
        height: usize,
        footprint: usize,
        size: usize,
        packages: Vec<CityNode>,
    },
    Package {
        name: String,
        height: usize,
        footprint: usize,
        size: usize,
        files: Vec<CityNode>,
    },
    File {
        path: String,
        height: usize,
        footprint: usize,
        size: usize,
        types: Vec<CityNode>,
    },
    Type {
        name: String,
        height: usize,
        footprint: usize,
        size: usize,
        line: usize,
    },
}

impl CityNode {
    pub fn height(&self) -> usize {
        match self {
            CityNode::Project { height, .. }
            | CityNode::Package { height, .. }
            | CityNode::File { height, .. }
            | CityNode::Type { height, .. } => *height,
        }
    }

    pub fn footprint(&self) -> usize {
        match self {
            CityNode::Project { footprint, .. }
            | CityNode::Package { footprint, .. }
            | CityNode::File { footprint, .. }
            | CityNode::Type { footprint, .. } => *footprint,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            CityNode::Project { size, .. }
            | CityNode::Package { size, .. }
            | CityNode::File { size, .. }
            | CityNode::Type { size, .. } => *size,
        }
    }
}

/// Build the city tree from a completed fact table.
///
/// Siblings are deterministically ordered: packages by name, files by
/// relative path, types by name. The flattener's byte-identical output
/// guarantee rests on this ordering.
pub fn build(facts: &FactTable, project_name: &str) -> CityNode {
    let mut packages: BTreeMap<&str, BTreeMap<&str, Vec<&TypeFact>>> = BTreeMap::new();
    for fact in facts.values() {
        packages
            .entry(&fact.package)
            .or_default()
            .entry(&fact.path)
            .or_default()
            .push(fact);
    }

    let mut package_nodes = Vec::new();
    for (package, files) in packages {
        let mut file_nodes = Vec::new();
        for (path, mut types) in files {
            types.sort_by(|a, b| a.name.cmp(&b.name));
            let type_nodes: Vec<CityNode> = types.into_iter().map(type_node).collect();

            let (height, footprint, size) = aggregate(&type_nodes);
            file_nodes.push(CityNode::File {
                path: path.to_string(),
                height,
                footprint,
                size,
                types: type_nodes,
            });
        }

        let (height, footprint, size) = aggregate(&file_nodes);
        package_nodes.push(CityNode::Package {
            name: package.to_string(),
            height,
            footprint,
            size,
            files: file_nodes,
        });
    }

    let (height, footprint, size) = aggregate(&package_nodes);
    CityNode::Project {
        name: project_name.to_string(),
        height,
        footprint,
        size,
        packages: package_nodes,
    }
}

fn type_node(fact: &TypeFact) -> CityNode {
    CityNode::Type {
        name: fact.name.clone(),
        height: fact.methods.len(),
        footprint: fact.fields.len(),
        size: fact.span.line_count(),
        line: fact.span.start_line,
    }
}

/// Height is the max of the children (the tallest building dominates the
/// district); footprint and size are sums.
fn aggregate(children: &[CityNode]) -> (usize, usize, usize) {
    let height = children.iter().map(CityNode::height).max().unwrap_or(0);
    let footprint = children.iter().map(CityNode::footprint).sum();
    let size = children.iter().map(CityNode::size).sum();
    (height, footprint, size)
}
