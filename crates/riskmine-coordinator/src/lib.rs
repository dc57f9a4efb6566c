//! Riskmine Coordinator
//!
//! Top-level control for a full run: ingestion, the document enrichment
//! loop and the statement mitigation loop, converging on one exit condition.
//!
//! # Architecture
//!
//! ```text
//!            ┌────────────── CancellationToken ──────────────┐
//!            ▼                                               ▼
//!   document loop (cycle, sleep)              mitigation loop (cycle, sleep)
//!            ▲                                               ▲
//!            └──────────── store (SQLite, WAL) ──────────────┘
//!                               ▲      ▲
//!                     ingestion ┘      └ convergence poll (every poll_interval)
//! ```
//!
//! Ingestion runs once, to completion, before the first poll. The run ends
//! when a single poll sees no pending Documents and no unmitigated
//! Statements, or on Ctrl-C. Either way both loops are cancelled and their
//! in-flight batches finish before `run` returns.
//!
//! # Configuration
//!
//! ```toml
//! [coordinator]
//! enrichment_interval_ms = 10000
//! poll_interval_ms = 30000
//!
//! [ingest]
//! forms = ["10-K", "10-Q"]
//! since = "2024-01-01"
//! manifest = "filings/manifest.toml"
//! ```

#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
mod ingest;

pub use config::{CoordinatorConfig, IngestConfig};
pub use coordinator::{Coordinator, CoordinatorReport, ShutdownReason};
pub use error::CoordinatorError;
pub use ingest::{select_filings, IngestReport, Ingestor, ManifestEntry, ManifestIngestor};
