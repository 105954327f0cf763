//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::graph::{
    GraphStats, MergeOutcome, NodeLabel, NodeRef, Properties, RelationType, StoredEdge,
    StoredNode,
};
use std::future::Future;

/// A two-part chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System instructions
    pub system: String,

    /// User message
    pub user: String,
}

/// Trait for completion-service operations
///
/// Implemented by the infrastructure layer (kgcfp-llm). One call is one attempt;
/// retrying is the caller's business.
pub trait CompletionProvider {
    /// Error type for completion operations
    type Error;

    /// Return the free-form completion text for a prompt
    fn complete(
        &self,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Trait for a property-graph store
///
/// Implemented by the infrastructure layer (kgcfp-store)
pub trait GraphStore {
    /// Error type for store operations
    type Error;

    /// Delete every node and edge
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Declare identifier uniqueness for a label; declaring twice is a no-op
    fn ensure_unique_id(&mut self, label: NodeLabel) -> Result<(), Self::Error>;

    /// Match-or-create the node by (label, id), then replace its properties
    fn upsert_node(
        &mut self,
        label: NodeLabel,
        id: &str,
        properties: &Properties,
    ) -> Result<(), Self::Error>;

    /// Match both endpoints, then merge the edge keyed by (source, target, type)
    ///
    /// A missing endpoint is not an error: the edge is skipped.
    fn merge_edge(
        &mut self,
        source: NodeRef<'_>,
        relation: &RelationType,
        target: NodeRef<'_>,
        properties: &Properties,
    ) -> Result<MergeOutcome, Self::Error>;

    /// Read a node
    fn get_node(&self, label: NodeLabel, id: &str) -> Result<Option<StoredNode>, Self::Error>;

    /// Outgoing edges of one node, identified by label and id
    fn outgoing_edges(&self, node: NodeRef<'_>) -> Result<Vec<StoredEdge>, Self::Error>;

    /// Counts per label and per relationship type
    fn stats(&self) -> Result<GraphStats, Self::Error>;
}
