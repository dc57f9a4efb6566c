//! Periodic driver for a Worker Pool

use crate::handler::UnitHandler;
use crate::{PoolMetrics, WorkerError, WorkerPool};
use riskmine_domain::QueueUnit;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Runs `cycle, sleep(interval)` until cancelled
///
/// Cancellation is checked between cycles only, so a batch that has started
/// always runs to completion.
///
/// # Examples
///
/// ```no_run
/// use riskmine_enricher::{Enricher, EnricherConfig};
/// use riskmine_llm::MockProvider;
/// use riskmine_store::StoreConfig;
/// use riskmine_worker::{MitigationHandler, PeriodicWorker, PoolConfig, WorkerPool};
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let enricher = Arc::new(Enricher::new(MockProvider::new("{}"), EnricherConfig::default()));
///     let handler = MitigationHandler::new(StoreConfig::at("edgar_filings.db"), enricher, 5);
///     let pool = WorkerPool::new(handler, PoolConfig::mitigations())?;
///
///     let cancel = CancellationToken::new();
///     let mut worker = PeriodicWorker::new(pool, Duration::from_secs(10), cancel.clone());
///
///     tokio::spawn(async move {
///         let _ = tokio::signal::ctrl_c().await;
///         cancel.cancel();
///     });
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct PeriodicWorker<H> {
    pool: WorkerPool<H>,
    interval: Duration,
    cancel: CancellationToken,
}

impl<H: UnitHandler> PeriodicWorker<H> {
    /// Wrap `pool`, sleeping `interval` between cycles
    pub fn new(pool: WorkerPool<H>, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            pool,
            interval,
            cancel,
        }
    }

    /// Token that stops this worker
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until the token is cancelled
    ///
    /// A failed cycle is logged and the loop carries on.
    pub async fn run(&mut self) -> Result<(), WorkerError> {
        let kind = H::Unit::KIND;
        tracing::info!(
            kind,
            interval_ms = self.interval.as_millis() as u64,
            "worker started"
        );

        while !self.cancel.is_cancelled() {
            if let Err(e) = self.pool.run_cycle().await {
                tracing::error!(kind, error = %e, "pool cycle failed");
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        tracing::info!(kind, "worker stopped. Final metrics:\n{}", self.pool.metrics().summary());
        Ok(())
    }

    /// Run exactly `cycles` cycles, sleeping between them
    ///
    /// Unlike `run`, a failed cycle stops the loop.
    pub async fn run_cycles(&mut self, cycles: usize) -> Result<(), WorkerError> {
        for cycle in 0..cycles {
            if cycle > 0 {
                sleep(self.interval).await;
            }
            let report = self.pool.run_cycle().await?;
            tracing::debug!(
                kind = H::Unit::KIND,
                cycle = cycle + 1,
                cycles,
                leased = report.leased,
                "cycle complete"
            );
        }
        Ok(())
    }

    /// Metrics of the wrapped pool
    pub fn metrics(&self) -> &PoolMetrics {
        self.pool.metrics()
    }
}
