//! KGCFP Domain Layer
//!
//! Core data model for the knowledge graph of Chinese figure painting.
//! Every other crate in the workspace depends on this one.
//!
//! ## Key Concepts
//!
//! - **Entities**: eight record kinds extracted from historical texts
//!   (periods, locations, iconographies, persons, CV records, social relations,
//!   works, literature), each with a string id and a provenance label
//! - **Soft foreign keys**: `*_ref` fields may point at ids that are not (yet) known
//! - **Extraction result**: per-chunk or per-document bundle of records, also the
//!   persisted file format between extraction and import
//! - **Graph vocabulary**: node labels, relationship types, scalar properties
//!
//! ## Architecture
//!
//! Trait definitions for all external interactions (completion service, graph
//! store) live in [`traits`]; implementations live in other crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod graph;
pub mod result;
pub mod traits;

// Re-exports for convenience
pub use entity::{
    CvRecord, Entity, HistoricalName, Iconography, Literature, Location, Period, Person,
    SocialRelation, Work, YearRange,
};
pub use graph::{
    GraphStats, MergeOutcome, NodeLabel, NodeRef, Properties, PropertyValue, RelationToken,
    RelationType, StoredEdge, StoredNode, FALLBACK_RELATION,
};
pub use result::{dedupe_by_id, CombinedExtraction, EntityCounts, ExtractionResult};
pub use traits::{CompletionProvider, GraphStore, Prompt};
