//! Riskmine LLM Provider Layer
//!
//! Pluggable text-completion backends for the enrichment step.
//!
//! # Architecture
//!
//! `LlmProvider` is the seam between the enricher and the network. A provider
//! takes one prompt and returns the raw completion text; finding and decoding
//! JSON inside that text is the enricher's job.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//!
//! # Examples
//!
//! ```
//! use riskmine_llm::{CompletionRequest, LlmProvider, MockProvider};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = CompletionRequest::new("test-model", "test prompt");
//! let result = rt.block_on(provider.complete(&request)).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Credentials missing or rejected
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token ceiling
    pub max_tokens: u32,

    /// Full prompt, sent as a single user message
    pub prompt: String,
}

impl CompletionRequest {
    /// Request with temperature 0.2 and a 1500-token ceiling
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: 1500,
            prompt: prompt.into(),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token ceiling
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A text-completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion and return the raw response text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
    Panic,
}

#[derive(Debug, Default)]
struct MockState {
    // (prompt substring, reply), first match wins
    rules: Vec<(String, MockReply)>,
    requests: Vec<CompletionRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. Rules
/// match on a substring of the prompt; the first matching rule wins, otherwise
/// the default response is returned.
///
/// # Examples
///
/// ```
/// use riskmine_llm::{CompletionRequest, LlmProvider, MockProvider};
///
/// let provider = MockProvider::default();
/// provider.add_response("Risk Factors", "[]");
/// provider.add_error("mitigation");
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let reply = rt.block_on(provider.complete(&CompletionRequest::new("m", "Risk Factors text")));
/// assert_eq!(reply.unwrap(), "[]");
/// assert_eq!(provider.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer prompts containing `key` with `response`
    pub fn add_response(&self, key: impl Into<String>, response: impl Into<String>) {
        self.state()
            .rules
            .push((key.into(), MockReply::Text(response.into())));
    }

    /// Fail prompts containing `key`
    pub fn add_error(&self, key: impl Into<String>) {
        self.state().rules.push((key.into(), MockReply::Error));
    }

    /// Panic on prompts containing `key`
    pub fn add_panic(&self, key: impl Into<String>) {
        self.state().rules.push((key.into(), MockReply::Panic));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Every request received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.state().requests.clone()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.state().requests.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking rule must not poison the mock for later calls
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let reply = {
            let mut state = self.state();
            state.requests.push(request.clone());
            state
                .rules
                .iter()
                .find(|(key, _)| request.prompt.contains(key.as_str()))
                .map(|(_, reply)| reply.clone())
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error) => Err(LlmError::Other("Mock error".to_string())),
            Some(MockReply::Panic) => panic!("mock provider panic"),
            None => Ok(self.default_response.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
