//! Error types for the Enricher

use riskmine_llm::LlmError;
use thiserror::Error;

/// Why a completion could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No opening bracket of the expected kind in the response
    #[error("no JSON {0} in response")]
    NoMatch(&'static str),

    /// Brackets unbalanced or the located text is not valid JSON
    #[error("malformed JSON: {0}")]
    Malformed(String),

    /// Valid JSON with the wrong shape
    #[error("unexpected JSON shape: {0}")]
    SchemaMismatch(String),
}

/// Errors that can occur during enrichment
#[derive(Error, Debug)]
pub enum EnrichError {
    /// No credentials configured; no call was made
    #[error("enrichment disabled")]
    Disabled,

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The call exceeded its time limit
    #[error("enrichment call timed out")]
    Timeout,

    /// The response could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl EnrichError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichError::Disabled => "disabled",
            EnrichError::Llm(_) => "llm",
            EnrichError::Timeout => "timeout",
            EnrichError::Decode(DecodeError::NoMatch(_)) => "no_match",
            EnrichError::Decode(DecodeError::Malformed(_)) => "malformed",
            EnrichError::Decode(DecodeError::SchemaMismatch(_)) => "schema_mismatch",
        }
    }
}
