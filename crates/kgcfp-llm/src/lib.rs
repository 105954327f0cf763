//! KGCFP Completion Provider Layer
//!
//! Implementations of the `CompletionProvider` trait from `kgcfp-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scripted provider for testing
//! - `OpenAiProvider`: Any OpenAI-compatible chat-completions endpoint
//!
//! Providers make exactly one attempt per call. Retry and backoff belong to
//! the extraction engine.
//!
//! # Examples
//!
//! ```
//! use kgcfp_llm::MockProvider;
//! use kgcfp_domain::{CompletionProvider, Prompt};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new(r#"{"persons": []}"#);
//! let prompt = Prompt { system: "schema".into(), user: "text".into() };
//! assert_eq!(provider.complete(&prompt).await.unwrap(), r#"{"persons": []}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod openai;

use kgcfp_domain::{CompletionProvider, Prompt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during completion calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The service answered, but not in the expected envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider could not be configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<(String, MockReply)>,
    fail_next: usize,
    call_count: usize,
    prompts: Vec<Prompt>,
}

/// Mock completion provider for deterministic testing
///
/// Returns pre-configured responses without any network calls. A response can
/// be bound to a fragment of the user message, which lets tests give each
/// chunk of a document its own answer.
///
/// # Examples
///
/// ```
/// use kgcfp_llm::MockProvider;
/// use kgcfp_domain::{CompletionProvider, Prompt};
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("顾恺之", r#"{"persons": [{"id": "person_gu", "name": "顾恺之"}]}"#);
///
/// let prompt = Prompt { system: String::new(), user: "顾恺之，字长康".into() };
/// assert!(provider.complete(&prompt).await.unwrap().contains("person_gu"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer with `response` whenever the user message contains `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail whenever the user message contains `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        self.state().rules.push((fragment.into(), MockReply::Error));
    }

    /// Fail the next `count` calls regardless of prompt
    pub fn fail_next(&self, count: usize) {
        self.state().fail_next = count;
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().call_count
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.state().call_count = 0;
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<Prompt> {
        self.state().prompts.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    async fn complete(&self, prompt: &Prompt) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.call_count += 1;
        state.prompts.push(prompt.clone());

        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(LlmError::Communication("Mock transient failure".to_string()));
        }

        let reply = state
            .rules
            .iter()
            .find(|(fragment, _)| prompt.user.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(user: &str) -> Prompt {
        Prompt {
            system: "system".to_string(),
            user: user.to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete(&prompt("any prompt")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_fragment_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.complete(&prompt("say hello")).await.unwrap(), "world");
        assert_eq!(provider.complete(&prompt("foo!")).await.unwrap(), "bar");
        assert_eq!(provider.complete(&prompt("unknown")).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.complete(&prompt("one")).await.unwrap();
        provider.complete(&prompt("two")).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts()[1].user, "two");

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad");

        let result = provider.complete(&prompt("bad prompt")).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_fail_next() {
        let provider = MockProvider::new("ok");
        provider.fail_next(2);

        assert!(provider.complete(&prompt("a")).await.is_err());
        assert!(provider.complete(&prompt("a")).await.is_err());
        assert_eq!(provider.complete(&prompt("a")).await.unwrap(), "ok");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&prompt("test")).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
