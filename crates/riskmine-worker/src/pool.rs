//! Bounded-concurrency execution of one leased batch

use crate::handler::UnitHandler;
use crate::{CycleReport, PoolConfig, PoolMetrics, UnitOutcome, WorkerError};
use riskmine_domain::QueueUnit;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Drives batches of units through a `UnitHandler`
///
/// One cycle leases up to `limit` units, submits them one by one with
/// `submit_delay` between submissions, runs at most `max_workers` at once,
/// and waits for every submitted unit before returning.
///
/// # Examples
///
/// ```no_run
/// use riskmine_enricher::{Enricher, EnricherConfig};
/// use riskmine_llm::MockProvider;
/// use riskmine_store::StoreConfig;
/// use riskmine_worker::{DocumentHandler, PoolConfig, WorkerPool};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let enricher = Arc::new(Enricher::new(MockProvider::new("[]"), EnricherConfig::default()));
/// let handler = DocumentHandler::new(StoreConfig::at("edgar_filings.db"), enricher);
/// let mut pool = WorkerPool::new(handler, PoolConfig::documents())?;
///
/// let report = pool.run_cycle().await?;
/// println!("leased {}, fell back {}", report.leased, report.fallbacks);
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<H> {
    handler: Arc<H>,
    config: PoolConfig,
    metrics: PoolMetrics,
}

impl<H: UnitHandler> WorkerPool<H> {
    /// Create a pool around `handler`
    ///
    /// Fails on a configuration that could never finish a cycle, such as zero
    /// workers or a non-finite submission delay.
    pub fn new(handler: H, config: PoolConfig) -> Result<Self, WorkerError> {
        config
            .validate()
            .map_err(|e| WorkerError::Config(format!("{} pool: {}", H::Unit::KIND, e)))?;
        Ok(Self {
            handler: Arc::new(handler),
            config,
            metrics: PoolMetrics::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Totals across every cycle run so far
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Run one cycle
    ///
    /// An empty lease returns immediately with an idle report. Unit failures
    /// are counted, never returned; only a failed lease is an error.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, WorkerError> {
        let kind = H::Unit::KIND;
        let start = Instant::now();

        let lease = self.handler.lease(self.config.limit).await?;
        let mut report = CycleReport {
            leased: lease.len(),
            ..Default::default()
        };

        if lease.is_empty() {
            debug!(kind, "nothing pending");
            report.elapsed = start.elapsed();
            self.metrics.record_cycle(&report);
            return Ok(report);
        }

        info!(kind, leased = report.leased, token = %lease.token, "pool cycle started");

        let semaphore = Arc::new(Semaphore::new(self.config.max_workers));
        let delay = self.config.submit_delay();
        let mut tasks = JoinSet::new();

        for (idx, unit) in lease.units.into_iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::Task(e.to_string()))?;
            let handler = Arc::clone(&self.handler);
            tasks.spawn(async move {
                let _permit = permit;
                run_unit(handler, unit).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(kind, error = %e, "unit task lost");
                    report.record(UnitOutcome::Failed);
                }
            }
        }

        report.elapsed = start.elapsed();
        self.metrics.record_cycle(&report);

        info!(
            kind,
            leased = report.leased,
            enriched = report.enriched,
            fallbacks = report.fallbacks,
            requeued = report.requeued,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "pool cycle finished"
        );
        Ok(report)
    }
}

/// Process one unit, abandoning it on error or panic
async fn run_unit<H: UnitHandler>(handler: Arc<H>, unit: H::Unit) -> UnitOutcome {
    let kind = H::Unit::KIND;
    let unit_id = unit.unit_id();

    // A separate task, so a panic surfaces as a JoinError while `unit` is still ours
    let attempt = tokio::spawn({
        let handler = Arc::clone(&handler);
        let unit = unit.clone();
        async move { handler.process(unit).await }
    });

    let reason = match attempt.await {
        Ok(Ok(outcome)) => {
            debug!(kind, unit_id, ?outcome, "unit processed");
            return outcome;
        }
        Ok(Err(e)) => e.to_string(),
        Err(e) if e.is_panic() => "panicked during processing".to_string(),
        Err(e) => e.to_string(),
    };

    error!(kind, unit_id, reason = %reason, "unit failed");
    if let Err(e) = handler.abandon(unit, reason).await {
        error!(kind, unit_id, error = %e, "could not release failed unit");
    }
    UnitOutcome::Failed
}
