//! Core Extractor implementation: one chunk in, one typed result out

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_response;
use crate::prompt::{truncate_input, PromptBuilder};
use kgcfp_domain::{CompletionProvider, ExtractionResult, Prompt};
use std::fmt::Display;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// The Extractor turns one chunk of text into typed entity records
pub struct Extractor<P> {
    provider: P,
    config: ExtractorConfig,
}

impl<P> Extractor<P>
where
    P: CompletionProvider + Sync,
    P::Error: Display,
{
    /// Create a new Extractor
    pub fn new(provider: P, config: ExtractorConfig) -> Self {
        Self { provider, config }
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Provider in use
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Extract entities from a chunk, labelling every record with `source_label`
    ///
    /// Never fails; provider errors that survive all retries and unusable
    /// responses are reported as extraction notes.
    pub async fn extract(&self, text: &str, source_label: &str) -> ExtractionResult {
        let input = truncate_input(text, self.config.max_input_chars);
        let prompt = PromptBuilder::new(&input, source_label).build();

        debug!(
            "Extracting from '{}' ({} chars)",
            source_label,
            input.chars().count()
        );

        match self.complete_with_retry(&prompt).await {
            Ok(response) => parse_response(&response, source_label),
            Err(e) => {
                warn!("Extraction failed for '{}': {}", source_label, e);
                ExtractionResult::with_note(source_label, format!("Extraction error: {}", e))
            }
        }
    }

    /// Call the provider, retrying failures with exponential backoff
    async fn complete_with_retry(&self, prompt: &Prompt) -> Result<String, ExtractorError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let outcome = match timeout(self.config.call_timeout(), self.provider.complete(prompt)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => ExtractorError::Llm(e.to_string()),
                Err(_) => ExtractorError::Timeout(self.config.call_timeout_secs),
            };

            if attempt >= max_attempts {
                return Err(outcome);
            }

            let delay = self.config.backoff(attempt);
            warn!(
                "Completion attempt {}/{} failed: {}; retrying in {:?}",
                attempt, max_attempts, outcome, delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}
