//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with text that sits under no heading
///
/// That is the text before the first heading, or a whole document without
/// headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadlessPolicy {
    /// Discard it as front matter noise
    Drop,
    /// Treat it as a section with the given heading
    DefaultSection(String),
}

impl Default for HeadlessPolicy {
    fn default() -> Self {
        HeadlessPolicy::Drop
    }
}

/// Configuration for segmentation and extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Sections with fewer characters than this are skipped
    pub min_section_chars: usize,

    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Maximum characters of a chunk sent to the model
    pub max_input_chars: usize,

    /// Completion attempts per chunk
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds), doubled per attempt
    pub backoff_base_ms: u64,

    /// Upper bound on the retry delay (milliseconds)
    pub backoff_max_ms: u64,

    /// Maximum time for a single completion call (seconds)
    pub call_timeout_secs: u64,

    /// Handling of text outside any heading
    pub headless: HeadlessPolicy,
}

impl ExtractorConfig {
    /// Get the completion timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let delay = self.backoff_base_ms.saturating_mul(factor).min(self.backoff_max_ms);
        Duration::from_millis(delay)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        let fail = |msg: &str| Err(ExtractorError::Config(msg.to_string()));

        if self.chunk_size == 0 {
            return fail("chunk_size must be greater than 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            return fail("chunk_overlap must be smaller than chunk_size");
        }
        if self.max_input_chars == 0 {
            return fail("max_input_chars must be greater than 0");
        }
        if self.max_attempts == 0 {
            return fail("max_attempts must be greater than 0");
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return fail("backoff_base_ms cannot exceed backoff_max_ms");
        }
        if self.call_timeout_secs == 0 {
            return fail("call_timeout_secs must be greater than 0");
        }
        if let HeadlessPolicy::DefaultSection(heading) = &self.headless {
            if heading.trim().is_empty() {
                return fail("default section heading cannot be empty");
            }
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_section_chars: 100,
            chunk_size: 3000,
            chunk_overlap: 200,
            max_input_chars: 6000,
            max_attempts: 3,
            backoff_base_ms: 2000,
            backoff_max_ms: 10_000,
            call_timeout_secs: 120,
            headless: HeadlessPolicy::Drop,
        }
    }
}

impl ExtractorConfig {
    /// Fast preset: one attempt, short timeout, no waiting between calls
    pub fn fast() -> Self {
        Self {
            max_attempts: 1,
            backoff_base_ms: 0,
            backoff_max_ms: 0,
            call_timeout_secs: 30,
            ..Self::default()
        }
    }

    /// Thorough preset: keeps short sections and retries harder
    pub fn thorough() -> Self {
        Self {
            min_section_chars: 20,
            max_attempts: 5,
            call_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.headless, HeadlessPolicy::Drop);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::fast().validate().is_ok());
        assert!(ExtractorConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let config = ExtractorConfig {
            chunk_size: 200,
            chunk_overlap: 200,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = ExtractorConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ExtractorConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(2000));
        assert_eq!(config.backoff(2), Duration::from_millis(4000));
        assert_eq!(config.backoff(3), Duration::from_millis(8000));
        assert_eq!(config.backoff(4), Duration::from_millis(10_000));
        assert_eq!(config.backoff(80), Duration::from_millis(10_000));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("chunk_size = 1000\nchunk_overlap = 50\n").unwrap();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.min_section_chars, 100);
    }

    #[test]
    fn test_headless_policy_from_toml() {
        let config = ExtractorConfig::from_toml("headless = \"drop\"\n").unwrap();
        assert_eq!(config.headless, HeadlessPolicy::Drop);

        let config = ExtractorConfig::from_toml("[headless]\ndefault_section = \"序\"\n").unwrap();
        assert_eq!(config.headless, HeadlessPolicy::DefaultSection("序".to_string()));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig {
            headless: HeadlessPolicy::DefaultSection("正文".to_string()),
            ..Default::default()
        };
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
