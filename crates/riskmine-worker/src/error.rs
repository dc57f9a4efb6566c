//! Error types for Worker Pool operations

use riskmine_store::StoreError;
use thiserror::Error;

/// Errors that can occur while driving a pool
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A blocking or spawned task could not be joined
    #[error("Task error: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        WorkerError::Task(err.to_string())
    }
}
