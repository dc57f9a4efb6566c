//! OpenAI Provider Implementation
//!
//! Chat completions against the OpenAI API or any compatible endpoint.
//!
//! # Features
//!
//! - One user message per request, first choice returned verbatim
//! - Configurable base URL and HTTP timeout
//! - Optional retry with exponential backoff for rate limits and server errors
//!
//! # Examples
//!
//! ```no_run
//! use riskmine_llm::OpenAiProvider;
//!
//! let provider = OpenAiProvider::new("sk-...").unwrap();
//! ```

use crate::{CompletionRequest, LlmError, LlmProvider};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default OpenAI API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default HTTP timeout for one request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per call; 1 means no retry
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// OpenAI chat completions provider
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider against the public API with the default timeout
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom HTTP timeout
    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Unauthorized("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set a custom base URL (proxies, compatible servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the maximum number of attempts per call
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(match status {
                reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
                reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(request.model.clone()),
                reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                    LlmError::Unauthorized(format!("HTTP {}", status))
                }
                _ => LlmError::Communication(format!("HTTP {}: {}", status, error_text)),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))
    }
}

fn is_retryable(error: &LlmError) -> bool {
    matches!(error, LlmError::RateLimitExceeded | LlmError::Communication(_))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.send_once(request).await {
                Ok(content) => {
                    tracing::debug!(
                        model = %request.model,
                        attempts,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "chat completion"
                    );
                    return Ok(content);
                }
                Err(e) if attempts < self.max_retries && is_retryable(&e) => {
                    // Exponential backoff: 1s, 2s, 4s, etc.
                    let delay = Duration::from_secs(2u64.pow(attempts - 1));
                    tracing::warn!(error = %e, attempts, ?delay, "chat completion failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(model = %request.model, error = %e, "chat completion failed");
                    return Err(e);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}
