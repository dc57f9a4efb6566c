//! Enrich and mitigate command implementations.

use super::build_enricher;
use crate::cli::PoolArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use riskmine_worker::{
    DocumentHandler, MitigationHandler, PeriodicWorker, UnitHandler, WorkerPool,
};
use tokio_util::sync::CancellationToken;

/// Execute the enrich command.
pub async fn execute_enrich(args: PoolArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let pool_config = args.overrides().apply(config.documents());

    let enricher = build_enricher(config)?;
    let pool = WorkerPool::new(DocumentHandler::new(config.store.clone(), enricher), pool_config)?;
    drive(pool, "documents", args.continuous, config, formatter).await
}

/// Execute the mitigate command.
pub async fn execute_mitigate(args: PoolArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let pool_config = args.overrides().apply(config.mitigations());

    let enricher = build_enricher(config)?;
    if !enricher.is_enabled() {
        println!("{}", formatter.warning("Enrichment is offline; no mitigations requested"));
        return Ok(());
    }

    let handler = MitigationHandler::new(
        config.store.clone(),
        enricher,
        pool_config.attempt_warning_threshold,
    );
    let pool = WorkerPool::new(handler, pool_config)?;
    drive(pool, "statements", args.continuous, config, formatter).await
}

/// One cycle, or cycles until Ctrl-C when `continuous`.
async fn drive<H: UnitHandler>(
    mut pool: WorkerPool<H>,
    label: &str,
    continuous: bool,
    config: &AppConfig,
    formatter: &Formatter,
) -> Result<()> {
    let settings = pool.config();
    tracing::debug!(
        pool = label,
        limit = settings.limit,
        max_workers = settings.max_workers,
        submit_delay_secs = settings.submit_delay_secs,
        continuous,
        "pool configured"
    );

    if !continuous {
        let report = pool.run_cycle().await?;
        println!("{}", formatter.cycle(label, &report)?);
        return Ok(());
    }

    let mut worker = PeriodicWorker::new(
        pool,
        config.coordinator.enrichment_interval(),
        CancellationToken::new(),
    );
    let on_interrupt = worker.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; finishing the current cycle");
            on_interrupt.cancel();
        }
    });

    worker.run().await?;
    println!("{}", formatter.pool_metrics(label, worker.metrics())?);
    Ok(())
}
