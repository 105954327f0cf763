//! Document-level and directory-level extraction drivers

use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::segmenter::Segmenter;
use kgcfp_domain::{CombinedExtraction, CompletionProvider, EntityCounts, ExtractionResult};
use std::fmt::Display;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name of the combined summary document
pub const COMBINED_FILE_NAME: &str = "combined_extraction.json";

/// Suffix of per-document result files
pub const RESULT_FILE_SUFFIX: &str = "_extracted.json";

/// Drives the Extractor over every chunk of every section of a document
pub struct Aggregator<P> {
    extractor: Extractor<P>,
    segmenter: Segmenter,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<P> Aggregator<P>
where
    P: CompletionProvider + Sync,
    P::Error: Display,
{
    /// Create an aggregator; segmentation follows the extractor's configuration
    pub fn new(extractor: Extractor<P>) -> Self {
        let segmenter = Segmenter::new(extractor.config());
        Self {
            extractor,
            segmenter,
            shutdown: None,
        }
    }

    /// Stop at the next chunk boundary once `shutdown` turns true
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The wrapped extractor
    pub fn extractor(&self) -> &Extractor<P> {
        &self.extractor
    }

    fn is_cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Extract and deduplicate all entities of one document
    ///
    /// `source_file` names the document; its stem prefixes every provenance
    /// label as `<stem>-<heading>`.
    pub async fn process_document(&self, source_file: &str, text: &str) -> ExtractionResult {
        let stem = document_stem(source_file);
        let mut total = ExtractionResult::empty(source_file);

        'sections: for section in self.segmenter.sections(text) {
            let label = format!("{}-{}", stem, section.heading);

            for (index, chunk) in self.segmenter.chunks(section.body).enumerate() {
                if self.is_cancelled() {
                    let note = format!(
                        "Extraction cancelled before chunk {} of section '{}'",
                        index + 1,
                        section.heading
                    );
                    warn!("{}: {}", source_file, note);
                    total.extraction_notes.push(note);
                    break 'sections;
                }

                debug!(
                    "{}: chunk {} [{}..{}]",
                    label,
                    index + 1,
                    chunk.start,
                    chunk.end
                );
                total.absorb(self.extractor.extract(chunk.text, &label).await);
            }
        }

        total.dedupe();
        total
    }

    /// Read and process one Markdown file, named by its file name
    pub async fn process_file(&self, path: &Path) -> Result<ExtractionResult, ExtractorError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.process_path(path, &name).await
    }

    async fn process_path(
        &self,
        path: &Path,
        name: &str,
    ) -> Result<ExtractionResult, ExtractorError> {
        info!("Processing: {}", path.display());

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractorError::io(path, e))?;

        Ok(self.process_document(name, &text).await)
    }

    /// Process every `*.md` file under `dir`, in sorted path order
    ///
    /// Each result is named by its path relative to `dir` with `/` separators,
    /// so same-named documents in different subdirectories stay distinct.
    pub async fn process_directory(
        &self,
        dir: &Path,
    ) -> Result<Vec<ExtractionResult>, ExtractorError> {
        let files = list_markdown_files(dir)?;
        info!("Found {} Markdown files to process", files.len());

        let mut results = Vec::with_capacity(files.len());
        for path in files {
            if self.is_cancelled() {
                warn!("Extraction cancelled; {} files processed", results.len());
                break;
            }

            let name = relative_name(dir, &path);
            let result = self.process_path(&path, &name).await?;
            info!(
                "  - {}: {} persons, {} works",
                result.source_file,
                result.persons.len(),
                result.works.len()
            );
            results.push(result);
        }

        Ok(results)
    }
}

fn relative_name(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// File stem of a document name, or the name itself
fn document_stem(source_file: &str) -> &str {
    Path::new(source_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_file)
}

/// Result file name for a document: the extensionless path with its
/// components joined by `_`, e.g. `卷一/序.md` -> `卷一_序_extracted.json`
pub fn result_file_name(source_file: &str) -> String {
    let stem = Path::new(source_file).with_extension("");
    let parts: Vec<_> = stem
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("{}{}", parts.join("_"), RESULT_FILE_SUFFIX)
}

/// All `*.md` files under `dir`, recursively, sorted
pub fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
    if !dir.is_dir() {
        return Err(ExtractorError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        let is_markdown = entry.path().extension().is_some_and(|ext| ext == "md");
        if entry.file_type().is_file() && is_markdown {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Write one result file per document plus the combined summary
///
/// Nothing is written when two documents map to the same result file.
/// Returns the paths written, combined summary last.
pub fn save_results(
    results: &[ExtractionResult],
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractorError> {
    let mut seen = HashSet::with_capacity(results.len());
    let mut paths = Vec::with_capacity(results.len());
    for result in results {
        let path = out_dir.join(result_file_name(&result.source_file));
        if !seen.insert(path.clone()) {
            return Err(ExtractorError::DuplicateOutput(path));
        }
        paths.push(path);
    }

    fs::create_dir_all(out_dir).map_err(|e| ExtractorError::io(out_dir, e))?;

    let mut written = Vec::with_capacity(results.len() + 1);
    for (result, path) in results.iter().zip(paths) {
        write_json(&path, result)?;
        written.push(path);
    }

    let combined = CombinedExtraction::from_results(results.to_vec());
    let path = out_dir.join(COMBINED_FILE_NAME);
    write_json(&path, &combined)?;
    written.push(path);

    let mut totals = EntityCounts::default();
    for result in results {
        totals += result.counts();
    }
    info!("Saved results to {}", out_dir.display());
    info!("Total: {}", totals);

    Ok(written)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ExtractorError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| ExtractorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractorConfig;
    use kgcfp_llm::MockProvider;

    fn aggregator(provider: MockProvider) -> Aggregator<MockProvider> {
        let config = ExtractorConfig {
            min_section_chars: 1,
            max_attempts: 1,
            ..Default::default()
        };
        Aggregator::new(Extractor::new(provider, config))
    }

    #[test]
    fn test_document_stem() {
        assert_eq!(document_stem("历代名画记.md"), "历代名画记");
        assert_eq!(document_stem("notes"), "notes");
    }

    #[test]
    fn test_result_file_name_keeps_directories() {
        assert_eq!(result_file_name("a.md"), "a_extracted.json");
        assert_eq!(result_file_name("卷一/序.md"), "卷一_序_extracted.json");
        assert_eq!(result_file_name("画史"), "画史_extracted.json");
    }

    #[test]
    fn test_relative_name_uses_forward_slashes() {
        let dir = Path::new("/books");
        assert_eq!(relative_name(dir, &dir.join("卷一").join("序.md")), "卷一/序.md");
        assert_eq!(relative_name(dir, &dir.join("a.md")), "a.md");
    }

    #[tokio::test]
    async fn test_labels_use_stem_and_heading() {
        let agg = aggregator(MockProvider::default());
        agg.process_document("画史.md", "# 卷一\n内容一\n# 卷二\n内容二").await;

        let prompts = agg.extractor().provider().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].user.contains("\"画史-卷一\""));
        assert!(prompts[1].user.contains("\"画史-卷二\""));
    }

    #[tokio::test]
    async fn test_dedupe_keeps_first_occurrence() {
        let mut provider = MockProvider::default();
        provider.add_response("内容一", r#"{"persons": [{"id": "p1", "name": "顾恺之"}]}"#);
        provider.add_response(
            "内容二",
            r#"{"persons": [{"id": "p1", "name": "顾长康"}, {"id": "p2", "name": "陆探微"}]}"#,
        );
        let agg = aggregator(provider);

        let result = agg.process_document("画史.md", "# 卷一\n内容一\n# 卷二\n内容二").await;
        assert_eq!(result.source_file, "画史.md");
        assert_eq!(result.persons.len(), 2);
        assert_eq!(result.persons[0].name, "顾恺之");
        assert_eq!(result.persons[0].source_book.as_deref(), Some("画史-卷一"));
    }

    #[tokio::test]
    async fn test_notes_are_concatenated() {
        let agg = aggregator(MockProvider::new("not json"));
        let result = agg.process_document("a.md", "# 一\n甲\n# 二\n乙").await;
        assert_eq!(result.extraction_notes.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_chunk() {
        let (tx, rx) = watch::channel(false);
        let agg = aggregator(MockProvider::default()).with_shutdown(rx);
        tx.send(true).unwrap();

        let result = agg.process_document("a.md", "# 一\n甲\n# 二\n乙").await;
        assert_eq!(agg.extractor().provider().call_count(), 0);
        assert_eq!(result.extraction_notes.len(), 1);
        assert!(result.extraction_notes[0].contains("cancelled"));
    }

    #[tokio::test]
    async fn test_nested_document_label_uses_file_stem() {
        let agg = aggregator(MockProvider::default());
        agg.process_document("卷一/序.md", "# 总论\n内容").await;

        let prompts = agg.extractor().provider().prompts();
        assert!(prompts[0].user.contains("\"序-总论\""));
    }

    #[test]
    fn test_colliding_result_names_write_nothing() {
        let output = tempfile::tempdir().unwrap();
        let results = [
            ExtractionResult::empty("卷一/序.md"),
            ExtractionResult::empty("卷一_序.md"),
        ];

        let err = save_results(&results, output.path()).unwrap_err();
        assert!(matches!(err, ExtractorError::DuplicateOutput(_)));
        assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let agg = aggregator(MockProvider::default());
        let result = agg.process_file(Path::new("/definitely/not/here.md")).await;
        assert!(matches!(result, Err(ExtractorError::Io { .. })));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let result = list_markdown_files(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ExtractorError::DirectoryNotFound(_))));
    }
}
