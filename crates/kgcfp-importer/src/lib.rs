//! KGCFP Graph Importer
//!
//! Loads persisted extraction results into any [`GraphStore`].
//!
//! # Import order
//!
//! For every result: Period, Location, Iconography, Person, Work and
//! Literature nodes first, then career and social relationships, then work
//! relationships, then literature relationships. References are soft: an edge
//! whose endpoint is missing is skipped and counted, never an error.
//!
//! Every write is an upsert, so importing the same results twice leaves the
//! graph unchanged.
//!
//! # Examples
//!
//! ```no_run
//! use kgcfp_importer::{GraphImporter, ImportOptions};
//! use kgcfp_store::SqliteGraphStore;
//! use std::path::Path;
//!
//! let store = SqliteGraphStore::open("kgcfp.db").unwrap();
//! let mut importer = GraphImporter::new(store);
//! let report = importer
//!     .import_directory(Path::new("output"), ImportOptions { clear: true })
//!     .unwrap();
//! println!("{}", report);
//! ```

#![warn(missing_docs)]

mod error;
mod report;

pub use error::ImporterError;
pub use report::ImportReport;

use kgcfp_domain::graph::{scalar_property, to_properties};
use kgcfp_domain::{
    CvRecord, Entity, ExtractionResult, GraphStats, GraphStore, Literature, MergeOutcome,
    NodeLabel, NodeRef, Properties, PropertyValue, RelationType, SocialRelation, Work,
};
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the per-document files the importer picks up
pub const EXTRACTED_FILE_SUFFIX: &str = "_extracted.json";

/// Options for a directory import
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Delete every node and edge before importing
    pub clear: bool,
}

/// Imports extraction results into a graph store it owns
pub struct GraphImporter<S> {
    store: S,
}

impl<S> GraphImporter<S>
where
    S: GraphStore,
    S::Error: Display,
{
    /// Create an importer around a store handle
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Give the store handle back
    pub fn into_inner(self) -> S {
        self.store
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Delete every node and edge
    pub fn clear(&mut self) -> Result<(), ImporterError> {
        self.store.clear().map_err(store_error)?;
        info!("Database cleared.");
        Ok(())
    }

    /// Declare identifier uniqueness for every node label
    pub fn create_constraints(&mut self) -> Result<(), ImporterError> {
        for label in NodeLabel::ALL {
            self.store.ensure_unique_id(label).map_err(store_error)?;
        }
        Ok(())
    }

    /// Current node and edge counts
    pub fn stats(&self) -> Result<GraphStats, ImporterError> {
        self.store.stats().map_err(store_error)
    }

    /// Import one extraction result
    pub fn import_result(&mut self, result: &ExtractionResult) -> Result<ImportReport, ImporterError> {
        let mut report = ImportReport::default();

        self.upsert_all(NodeLabel::Period, &result.periods, &mut report)?;
        self.upsert_all(NodeLabel::Location, &result.locations, &mut report)?;
        self.upsert_all(NodeLabel::Iconography, &result.iconographies, &mut report)?;
        self.upsert_all(NodeLabel::Person, &result.persons, &mut report)?;
        self.upsert_all(NodeLabel::Work, &result.works, &mut report)?;
        self.upsert_all(NodeLabel::Literature, &result.literature, &mut report)?;

        for cv in &result.cv_records {
            self.import_cv_record(cv, &mut report)?;
        }
        for relation in &result.social_relations {
            self.import_social_relation(relation, &mut report)?;
        }
        for work in &result.works {
            self.import_work_relationships(work, &mut report)?;
        }
        for lit in &result.literature {
            self.import_literature_relationships(lit, &mut report)?;
        }

        report.files = 1;
        info!("Imported {}: {}", result.source_file, report);
        Ok(report)
    }

    /// Read and import one `*_extracted.json` file
    pub fn import_file(&mut self, path: &Path) -> Result<ImportReport, ImporterError> {
        let raw = fs::read_to_string(path).map_err(|source| ImporterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let result: ExtractionResult =
            serde_json::from_str(&raw).map_err(|source| ImporterError::InvalidFile {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Importing: {}", path.display());
        self.import_result(&result)
    }

    /// Import every `*_extracted.json` file in `dir`, in sorted order
    pub fn import_directory(
        &mut self,
        dir: &Path,
        options: ImportOptions,
    ) -> Result<ImportReport, ImporterError> {
        let files = list_extracted_files(dir)?;
        info!("Found {} extraction files to import", files.len());

        if options.clear {
            self.clear()?;
        }
        self.create_constraints()?;

        let mut report = ImportReport::default();
        for path in &files {
            report += self.import_file(path)?;
        }

        let stats = self.stats()?;
        info!("\n{}", stats.summary());
        info!("Import complete: {}", report);
        Ok(report)
    }

    fn upsert_all<T: Entity + Serialize>(
        &mut self,
        label: NodeLabel,
        records: &[T],
        report: &mut ImportReport,
    ) -> Result<(), ImporterError> {
        for record in records {
            let properties = to_properties(record)?;
            self.store
                .upsert_node(label, record.id(), &properties)
                .map_err(store_error)?;
            report.record_node(label);
        }
        Ok(())
    }

    fn merge(
        &mut self,
        source: NodeRef<'_>,
        relation: RelationType,
        target: NodeRef<'_>,
        properties: &Properties,
        report: &mut ImportReport,
    ) -> Result<(), ImporterError> {
        let outcome = self
            .store
            .merge_edge(source, &relation, target, properties)
            .map_err(store_error)?;

        match outcome {
            MergeOutcome::Merged => report.record_edge(&relation),
            MergeOutcome::Skipped => {
                debug!(
                    "Skipped {} {}:{} -> {}:{}",
                    relation, source.label, source.id, target.label, target.id
                );
                report.edges_skipped += 1;
            }
        }
        Ok(())
    }

    fn import_cv_record(&mut self, cv: &CvRecord, report: &mut ImportReport) -> Result<(), ImporterError> {
        let person = NodeRef::new(NodeLabel::Person, &cv.person_ref);

        if let Some(location) = present(&cv.location_ref) {
            let mut properties = Properties::new();
            put_text(&mut properties, "official_title", &cv.official_title);
            put_text(&mut properties, "rank", &cv.rank);
            put_json(&mut properties, "tenure", &cv.tenure)?;
            put_text(&mut properties, "event_type", &cv.event_type);

            self.merge(
                person,
                RelationType::WorkedAt,
                NodeRef::new(NodeLabel::Location, location),
                &properties,
                report,
            )?;
        }

        if let Some(period) = present(&cv.time_ref) {
            self.merge(
                person,
                RelationType::ActiveIn,
                NodeRef::new(NodeLabel::Period, period),
                &Properties::new(),
                report,
            )?;
        }
        Ok(())
    }

    fn import_social_relation(
        &mut self,
        relation: &SocialRelation,
        report: &mut ImportReport,
    ) -> Result<(), ImporterError> {
        let mut properties = Properties::new();
        put_text(&mut properties, "formal_name", &relation.formal_name);
        put_text(&mut properties, "source_book", &relation.source_book);

        self.merge(
            NodeRef::new(NodeLabel::Person, &relation.source_id),
            RelationType::social(&relation.relation_type),
            NodeRef::new(NodeLabel::Person, &relation.target_id),
            &properties,
            report,
        )
    }

    fn import_work_relationships(&mut self, work: &Work, report: &mut ImportReport) -> Result<(), ImporterError> {
        let node = NodeRef::new(NodeLabel::Work, &work.id);
        let none = Properties::new();

        if let Some(creator) = present(&work.creator_ref) {
            self.merge(
                NodeRef::new(NodeLabel::Person, creator),
                RelationType::Created,
                node,
                &none,
                report,
            )?;
        }
        if let Some(period) = present(&work.period_ref) {
            self.merge(
                node,
                RelationType::DatedTo,
                NodeRef::new(NodeLabel::Period, period),
                &none,
                report,
            )?;
        }
        if let Some(icon) = present(&work.icon_ref) {
            self.merge(
                node,
                RelationType::Depicts,
                NodeRef::new(NodeLabel::Iconography, icon),
                &none,
                report,
            )?;
        }
        Ok(())
    }

    fn import_literature_relationships(
        &mut self,
        lit: &Literature,
        report: &mut ImportReport,
    ) -> Result<(), ImporterError> {
        let node = NodeRef::new(NodeLabel::Literature, &lit.id);
        let none = Properties::new();

        // The target may be a person or a work; whichever exists gets the edge.
        if !lit.target_ref.trim().is_empty() {
            self.merge(
                node,
                RelationType::Critiques,
                NodeRef::new(NodeLabel::Person, &lit.target_ref),
                &none,
                report,
            )?;
            self.merge(
                node,
                RelationType::Records,
                NodeRef::new(NodeLabel::Work, &lit.target_ref),
                &none,
                report,
            )?;
        }

        if let Some(author) = present(&lit.author_ref) {
            self.merge(
                NodeRef::new(NodeLabel::Person, author),
                RelationType::Wrote,
                node,
                &none,
                report,
            )?;
        }
        Ok(())
    }
}

/// All `*_extracted.json` files directly inside `dir`, sorted
pub fn list_extracted_files(dir: &Path) -> Result<Vec<PathBuf>, ImporterError> {
    if !dir.is_dir() {
        return Err(ImporterError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| ImporterError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| ImporterError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(EXTRACTED_FILE_SUFFIX));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn store_error<E: Display>(e: E) -> ImporterError {
    ImporterError::Store(e.to_string())
}

/// A reference that is set and not blank
fn present(reference: &Option<String>) -> Option<&str> {
    reference.as_deref().filter(|r| !r.trim().is_empty())
}

fn put_text(properties: &mut Properties, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        properties.insert(key.to_string(), PropertyValue::Text(value.clone()));
    }
}

fn put_json<T: Serialize>(
    properties: &mut Properties,
    key: &str,
    value: &T,
) -> Result<(), ImporterError> {
    if let Some(value) = scalar_property(&serde_json::to_value(value)?) {
        properties.insert(key.to_string(), value);
    }
    Ok(())
}
