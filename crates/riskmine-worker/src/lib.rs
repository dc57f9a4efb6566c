//! Riskmine Worker
//!
//! Bounded-concurrency Worker Pools that advance leased Documents and
//! Statements through enrichment, and the periodic loop that drives them.
//!
//! # Overview
//!
//! Each pool cycle:
//! - **Leases** up to `limit` pending units, oldest first
//! - **Submits** them one at a time, `submit_delay` apart, under a cap of `max_workers`
//! - **Awaits** every submitted unit before the cycle ends
//!
//! Per unit, a [`UnitHandler`] calls the Enricher and persists the result on
//! its own store connection. The two handlers differ in what "no result" means:
//!
//! | Handler | Enrichment result | Unit becomes |
//! |---------|-------------------|--------------|
//! | [`DocumentHandler`] | statements | `done` |
//! | [`DocumentHandler`] | empty or error | segmenter output stored, `done` |
//! | [`DocumentHandler`] | unexpected failure or panic | `error` |
//! | [`MitigationHandler`] | idea and rank | mitigation-complete |
//! | [`MitigationHandler`] | partial, empty or error | still pending, attempt counted |
//! | [`MitigationHandler`] | panic | still pending, attempt counted |
//!
//! # Usage
//!
//! ## One Cycle
//!
//! ```no_run
//! use riskmine_enricher::{Enricher, EnricherConfig};
//! use riskmine_llm::MockProvider;
//! use riskmine_store::StoreConfig;
//! use riskmine_worker::{DocumentHandler, PoolConfig, WorkerPool};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let enricher = Arc::new(Enricher::new(MockProvider::new("[]"), EnricherConfig::default()));
//! let handler = DocumentHandler::new(StoreConfig::at("edgar_filings.db"), enricher);
//! let mut pool = WorkerPool::new(handler, PoolConfig::documents())?;
//!
//! let report = pool.run_cycle().await?;
//! println!("leased {} documents", report.leased);
//! println!("{}", pool.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [documents]
//! limit = 20
//! max_workers = 4
//! submit_delay_secs = 1.0
//!
//! [mitigations]
//! limit = 40
//! max_workers = 10
//! submit_delay_secs = 1.0
//! attempt_warning_threshold = 5
//! ```

#![warn(missing_docs)]

mod config;
mod documents;
mod error;
mod handler;
mod metrics;
mod mitigations;
mod pool;
mod worker;

pub use config::{PoolConfig, PoolOverrides};
pub use documents::DocumentHandler;
pub use error::WorkerError;
pub use handler::UnitHandler;
pub use metrics::{CycleReport, PoolMetrics, UnitOutcome};
pub use mitigations::MitigationHandler;
pub use pool::WorkerPool;
pub use worker::PeriodicWorker;
