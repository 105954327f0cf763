//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Completion provider could not be set up
    #[error("LLM error: {0}")]
    Llm(#[from] kgcfp_llm::LlmError),

    /// Extraction run failed
    #[error("Extraction error: {0}")]
    Extractor(#[from] kgcfp_extractor::ExtractorError),

    /// Graph store error
    #[error("Store error: {0}")]
    Store(#[from] kgcfp_store::StoreError),

    /// Import run failed
    #[error("Import error: {0}")]
    Importer(#[from] kgcfp_importer::ImporterError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
