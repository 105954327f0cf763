//! Error types for the Extractor

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Chunk-level failures never surface here; they become extraction notes.
/// These are the failures that stop a run: bad configuration and unreadable
/// inputs or outputs.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Completion provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Completion call exceeded its time budget
    #[error("Completion timed out after {0} seconds")]
    Timeout(u64),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source or output path could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Input directory does not exist
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// Directory traversal failed
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// Two documents would be saved to the same result file
    #[error("Result file would be written twice: {0}")]
    DuplicateOutput(PathBuf),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractorError::Io {
            path: path.into(),
            source,
        }
    }
}
