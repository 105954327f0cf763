//! KGCFP Extractor
//!
//! Turns Markdown histories of Chinese figure painting into typed entity
//! records using a completion service.
//!
//! # Architecture
//!
//! ```text
//! Document → Segmenter → sections → chunks → Extractor → model
//!                                                  ↓
//!                      Aggregator ← ExtractionResult (per chunk)
//!                          ↓
//!              <stem>_extracted.json + combined_extraction.json
//! ```
//!
//! # Key Features
//!
//! - **Heading segmentation** with a configurable policy for text under no heading
//! - **Overlapping chunks** that end on paragraph boundaries when possible
//! - **Tolerant JSON recovery** from free-form model output
//! - **Retry with backoff** for transient completion failures
//! - **First-seen deduplication** of every entity kind per document
//!
//! # Example Usage
//!
//! ```no_run
//! use kgcfp_extractor::{save_results, Aggregator, Extractor, ExtractorConfig};
//! use kgcfp_llm::MockProvider;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(MockProvider::default(), ExtractorConfig::default());
//! let aggregator = Aggregator::new(extractor);
//!
//! let results = aggregator.process_directory(Path::new("data/books")).await?;
//! save_results(&results, Path::new("output"))?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod segmenter;


pub use aggregator::{
    list_markdown_files, result_file_name, save_results, Aggregator, COMBINED_FILE_NAME,
    RESULT_FILE_SUFFIX,
};
pub use config::{ExtractorConfig, HeadlessPolicy};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use parser::{find_json_object, json_object_spans, parse_response};
pub use prompt::{truncate_input, PromptBuilder, TRUNCATION_MARKER};
pub use segmenter::{parse_heading, Chunks, Section, Sections, Segmenter, TextChunk};
