//! Riskmine Enricher
//!
//! Turns extracted risk sections into classified statements, and statements
//! into mitigation suggestions, with one LLM call each.
//!
//! # Architecture
//!
//! ```text
//! section ─▶ prompt (summary skipped, input capped) ─▶ LLM ─▶ locate JSON ─▶ typed decode
//! ```
//!
//! Decoding never guesses: a response without the expected JSON, with broken
//! JSON, or with JSON of the wrong shape is reported as a distinct
//! `DecodeError`. Callers treat every error as an empty result and fall back.
//!
//! # Example Usage
//!
//! ```no_run
//! use riskmine_enricher::{Enricher, EnricherConfig};
//! use riskmine_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"[{"risk_text": "Rates may rise.", "summary": "Rate risk", "category": "Financial"}]"#);
//! let enricher = Enricher::new(llm, EnricherConfig::default());
//!
//! let statements = enricher.classify("Item 1A. Risk Factors\nRates may rise.").await?;
//! println!("Classified: {} statements", statements.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod decode;
mod enricher;
mod error;
mod prompt;
mod types;


pub use config::EnricherConfig;
pub use decode::{decode_mitigation, decode_statements, locate_json};
pub use enricher::Enricher;
pub use error::{DecodeError, EnrichError};
pub use prompt::{
    classification_prompt, mitigation_prompt, skip_summary_block, truncate_chars, RISK_CATEGORIES,
};
pub use types::ClassifiedStatement;
