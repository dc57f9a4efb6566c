//! Core Enricher implementation

use crate::config::EnricherConfig;
use crate::decode::{decode_mitigation, decode_statements};
use crate::error::EnrichError;
use crate::prompt::{classification_prompt, mitigation_prompt};
use crate::types::ClassifiedStatement;
use riskmine_domain::Mitigation;
use riskmine_llm::{CompletionRequest, LlmProvider};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Classifies risk sections and suggests mitigations through an LLM
///
/// Every call makes at most one request. Failures come back as `EnrichError`
/// so callers can tell "nothing found" apart from "could not ask".
pub struct Enricher<P> {
    provider: Option<P>,
    config: EnricherConfig,
}

impl<P: LlmProvider> Enricher<P> {
    /// Create an Enricher that calls `provider`
    pub fn new(provider: P, config: EnricherConfig) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// Create an Enricher that never calls out and always returns `Disabled`
    pub fn disabled(config: EnricherConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    /// Whether calls reach a provider
    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Active configuration
    pub fn config(&self) -> &EnricherConfig {
        &self.config
    }

    /// Split a risk section into classified statements
    ///
    /// An `Ok` result may be empty when the model returned an empty array.
    pub async fn classify(&self, section: &str) -> Result<Vec<ClassifiedStatement>, EnrichError> {
        let prompt = classification_prompt(section, self.config.max_input_chars);
        let response = self.call(prompt, self.config.classify_max_tokens).await?;
        let statements = decode_statements(&response)?;
        debug!(count = statements.len(), "classification decoded");
        Ok(statements)
    }

    /// Suggest a mitigation for one statement
    ///
    /// Fields the model leaves out come back as `None`.
    pub async fn suggest_mitigation(&self, statement: &str) -> Result<Mitigation, EnrichError> {
        let prompt = mitigation_prompt(statement, self.config.max_input_chars);
        let response = self.call(prompt, self.config.mitigation_max_tokens).await?;
        Ok(decode_mitigation(&response)?)
    }

    async fn call(&self, prompt: String, max_tokens: u32) -> Result<String, EnrichError> {
        let provider = self.provider.as_ref().ok_or(EnrichError::Disabled)?;

        let request = CompletionRequest::new(self.config.model.clone(), prompt)
            .with_temperature(self.config.temperature)
            .with_max_tokens(max_tokens);

        let start = Instant::now();
        let response = timeout(self.config.call_timeout(), provider.complete(&request))
            .await
            .map_err(|_| {
                warn!(provider = provider.name(), timeout = ?self.config.call_timeout(), "enrichment call timed out");
                EnrichError::Timeout
            })??;

        debug!(
            provider = provider.name(),
            prompt_chars = request.prompt.len(),
            response_chars = response.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "enrichment call complete"
        );
        Ok(response)
    }
}
