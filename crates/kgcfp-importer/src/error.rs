//! Error types for the Graph Importer

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop an import run
#[derive(Error, Debug)]
pub enum ImporterError {
    /// Graph store error
    #[error("Store error: {0}")]
    Store(String),

    /// Input directory does not exist
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// A result file could not be read
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A result file is not a valid extraction result
    #[error("Invalid extraction file {path}: {source}")]
    InvalidFile {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be flattened into properties
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
