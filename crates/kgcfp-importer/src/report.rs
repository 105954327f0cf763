//! Counts collected during an import run

use kgcfp_domain::{NodeLabel, RelationType};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

/// What an import run wrote
///
/// Node counts are upserts performed, not distinct nodes: importing the same
/// file twice doubles the report but not the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Result files imported
    pub files: usize,
    /// Node upserts per label
    pub nodes: BTreeMap<NodeLabel, usize>,
    /// Edge merges per relationship type
    pub edges: BTreeMap<String, usize>,
    /// Edges not written because an endpoint was missing
    pub edges_skipped: usize,
}

impl ImportReport {
    pub(crate) fn record_node(&mut self, label: NodeLabel) {
        *self.nodes.entry(label).or_default() += 1;
    }

    pub(crate) fn record_edge(&mut self, relation: &RelationType) {
        *self.edges.entry(relation.as_str().to_string()).or_default() += 1;
    }

    /// Upserts for one label
    pub fn nodes_of(&self, label: NodeLabel) -> usize {
        self.nodes.get(&label).copied().unwrap_or(0)
    }

    /// Merges for one relationship type
    pub fn edges_of(&self, relation: &str) -> usize {
        self.edges.get(relation).copied().unwrap_or(0)
    }

    /// All node upserts
    pub fn total_nodes(&self) -> usize {
        self.nodes.values().sum()
    }

    /// All edge merges
    pub fn total_edges(&self) -> usize {
        self.edges.values().sum()
    }
}

impl AddAssign for ImportReport {
    fn add_assign(&mut self, rhs: Self) {
        self.files += rhs.files;
        for (label, count) in rhs.nodes {
            *self.nodes.entry(label).or_default() += count;
        }
        for (relation, count) in rhs.edges {
            *self.edges.entry(relation).or_default() += count;
        }
        self.edges_skipped += rhs.edges_skipped;
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {} edges skipped",
            self.total_nodes(),
            self.total_edges(),
            self.edges_skipped
        )
    }
}
