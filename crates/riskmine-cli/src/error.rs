//! Error types for the CLI application.

use riskmine_coordinator::CoordinatorError;
use riskmine_llm::LlmError;
use riskmine_store::StoreError;
use riskmine_worker::WorkerError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Worker pool error
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// Coordinator error
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    /// Completion provider could not be built
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A background task could not be joined
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}
