//! OpenAI-compatible Provider Implementation
//!
//! Talks to any endpoint implementing the `/chat/completions` API (OpenAI,
//! vLLM, Ollama's `/v1`, Qwen gateways and so on).
//!
//! # Examples
//!
//! ```no_run
//! use kgcfp_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("http://localhost:8000/v1", "qwen2.5-14b")
//!     .unwrap()
//!     .with_api_key("sk-...");
//! ```

use crate::LlmError;
use kgcfp_domain::{CompletionProvider, Prompt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default timeout for a single request (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default completion budget
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Provider for OpenAI-compatible chat-completions endpoints
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Request body for the chat-completions API
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Response from the chat-completions API
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider with the default request timeout
    ///
    /// # Parameters
    ///
    /// - `base_url`: API root, e.g. `https://api.openai.com/v1`
    /// - `model`: Model to use
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(base_url, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new provider with an explicit request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
        })
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl CompletionProvider for OpenAiProvider {
    type Error = LlmError;

    async fn complete(&self, prompt: &Prompt) -> Result<String, Self::Error> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))?;

        debug!("Completion returned {} chars", content.chars().count());
        Ok(content)
    }
}
