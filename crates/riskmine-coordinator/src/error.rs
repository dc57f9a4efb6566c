//! Error types for Coordinator operations

use riskmine_store::StoreError;
use riskmine_worker::WorkerError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while coordinating a run
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Worker pool error
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The manifest could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A background task could not be joined
    #[error("Task error: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for CoordinatorError {
    fn from(err: tokio::task::JoinError) -> Self {
        CoordinatorError::Task(err.to_string())
    }
}
