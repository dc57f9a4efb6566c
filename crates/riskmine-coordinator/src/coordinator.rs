//! The top-level run: ingest, enrich in the background, stop on convergence

use crate::{CoordinatorConfig, CoordinatorError, IngestReport, Ingestor};
use riskmine_domain::{FilingStore, WorkRemaining};
use riskmine_enricher::Enricher;
use riskmine_llm::LlmProvider;
use riskmine_store::{SqliteStore, StoreConfig};
use riskmine_worker::{
    DocumentHandler, MitigationHandler, PeriodicWorker, PoolConfig, PoolMetrics, UnitHandler,
    WorkerError, WorkerPool,
};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// All outstanding work drained at one observation
    Converged,

    /// Ctrl-C or an external shutdown request
    Interrupted,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Converged => write!(f, "converged"),
            ShutdownReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// What a run did
#[derive(Debug, Clone)]
pub struct CoordinatorReport {
    /// Ingestion counts; zeroed when ingestion failed
    pub ingest: IngestReport,

    /// Convergence polls taken
    pub polls: usize,

    /// Outstanding work at the last successful poll
    pub remaining: WorkRemaining,

    /// Document pool totals
    pub documents: PoolMetrics,

    /// Mitigation pool totals; `None` in offline mode
    pub mitigations: Option<PoolMetrics>,

    /// Why the run ended
    pub shutdown: ShutdownReason,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CoordinatorReport {
    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Run {} after {:.1}s ({} polls)", self.shutdown, self.elapsed.as_secs_f64(), self.polls),
            format!(
                "Ingested: {} listed, {} selected, {} pending, {} ineligible, {} existing, {} unreadable",
                self.ingest.listed,
                self.ingest.selected,
                self.ingest.created,
                self.ingest.ineligible,
                self.ingest.existing,
                self.ingest.unreadable
            ),
            format!(
                "Remaining: {} documents, {} statements",
                self.remaining.documents, self.remaining.statements
            ),
            String::new(),
            "Documents".to_string(),
            self.documents.summary(),
        ];
        if let Some(mitigations) = &self.mitigations {
            lines.push(String::new());
            lines.push("Mitigations".to_string());
            lines.push(mitigations.summary());
        }
        lines.join("\n")
    }
}

/// Sequences ingestion and the two enrichment loops
///
/// Both loops start before ingestion and run until the Coordinator observes
/// no pending Documents and no unmitigated Statements in the same poll. With
/// a disabled Enricher only Documents are awaited, since mitigations cannot
/// make progress.
///
/// # Examples
///
/// ```no_run
/// use riskmine_coordinator::{Coordinator, IngestConfig, ManifestIngestor};
/// use riskmine_enricher::{Enricher, EnricherConfig};
/// use riskmine_llm::OpenAiProvider;
/// use riskmine_store::StoreConfig;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = OpenAiProvider::new(std::env::var("OPENAI_API_KEY")?)?;
///     let enricher = Arc::new(Enricher::new(provider, EnricherConfig::default()));
///     let coordinator = Coordinator::new(StoreConfig::default(), enricher);
///
///     let ingestor = ManifestIngestor::new("filings/manifest.toml", IngestConfig::default());
///     let report = coordinator.run(ingestor).await?;
///     println!("{}", report.summary());
///     Ok(())
/// }
/// ```
pub struct Coordinator<P> {
    store: StoreConfig,
    enricher: Arc<Enricher<P>>,
    documents: PoolConfig,
    mitigations: PoolConfig,
    config: CoordinatorConfig,
    shutdown: CancellationToken,
}

impl<P: LlmProvider + 'static> Coordinator<P> {
    /// Create a Coordinator with default pools and timings
    pub fn new(store: StoreConfig, enricher: Arc<Enricher<P>>) -> Self {
        Self {
            store,
            enricher,
            documents: PoolConfig::documents(),
            mitigations: PoolConfig::mitigations(),
            config: CoordinatorConfig::default(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace both pool configurations
    pub fn with_pools(mut self, documents: PoolConfig, mitigations: PoolConfig) -> Self {
        self.documents = documents;
        self.mitigations = mitigations;
        self
    }

    /// Replace the loop timings
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Token that ends the run as if Ctrl-C had been pressed
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run to convergence or interruption
    ///
    /// Ingestion failure is logged and the run carries on with whatever is
    /// already stored. Errors are returned only for an unusable pool
    /// configuration or a failed join of a loop.
    pub async fn run<I: Ingestor>(&self, ingestor: I) -> Result<CoordinatorReport, CoordinatorError> {
        let start = Instant::now();
        let offline = !self.enricher.is_enabled();
        let loops = CancellationToken::new();

        // Build both pools before either loop starts
        let documents = WorkerPool::new(
            DocumentHandler::new(self.store.clone(), Arc::clone(&self.enricher)),
            self.documents.clone(),
        )?;
        let mitigations = if offline {
            warn!("enrichment is offline; statements will not be mitigated");
            None
        } else {
            Some(WorkerPool::new(
                MitigationHandler::new(
                    self.store.clone(),
                    Arc::clone(&self.enricher),
                    self.mitigations.attempt_warning_threshold,
                ),
                self.mitigations.clone(),
            )?)
        };

        let interval = self.config.enrichment_interval();
        let document_loop = spawn_loop(documents, interval, loops.child_token());
        let mitigation_loop = mitigations.map(|pool| spawn_loop(pool, interval, loops.child_token()));

        let ingest = match ingestor.ingest(&self.store).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "ingestion failed; enriching what is already stored");
                IngestReport::default()
            }
        };

        let mut polls = 0;
        let mut remaining = WorkRemaining::default();
        let shutdown = loop {
            polls += 1;
            match self.remaining().await {
                Ok(observed) => {
                    remaining = observed;
                    info!(
                        documents = observed.documents,
                        statements = observed.statements,
                        "work remaining"
                    );
                    let converged = if offline {
                        observed.documents == 0
                    } else {
                        observed.is_converged()
                    };
                    if converged {
                        break ShutdownReason::Converged;
                    }
                }
                Err(e) => warn!(error = %e, "could not read remaining work"),
            }

            tokio::select! {
                _ = tokio::signal::ctrl_c() => break ShutdownReason::Interrupted,
                _ = self.shutdown.cancelled() => break ShutdownReason::Interrupted,
                _ = sleep(self.config.poll_interval()) => {}
            }
        };

        info!(reason = %shutdown, "stopping enrichment loops");
        loops.cancel();

        let documents = join_loop(document_loop).await?;
        let mitigations = match mitigation_loop {
            Some(handle) => Some(join_loop(handle).await?),
            None => None,
        };

        let report = CoordinatorReport {
            ingest,
            polls,
            remaining,
            documents,
            mitigations,
            shutdown,
            elapsed: start.elapsed(),
        };
        info!("coordinator finished\n{}", report.summary());
        Ok(report)
    }

    async fn remaining(&self) -> Result<WorkRemaining, CoordinatorError> {
        let store = self.store.clone();
        let remaining = tokio::task::spawn_blocking(move || {
            let store = SqliteStore::connect(&store)?;
            store.remaining()
        })
        .await??;
        Ok(remaining)
    }
}

type LoopHandle = JoinHandle<(PoolMetrics, Result<(), WorkerError>)>;

fn spawn_loop<H: UnitHandler>(
    pool: WorkerPool<H>,
    interval: Duration,
    cancel: CancellationToken,
) -> LoopHandle {
    let mut worker = PeriodicWorker::new(pool, interval, cancel);
    tokio::spawn(async move {
        let result = worker.run().await;
        (worker.metrics().clone(), result)
    })
}

async fn join_loop(handle: LoopHandle) -> Result<PoolMetrics, CoordinatorError> {
    let (metrics, result) = handle.await?;
    if let Err(e) = result {
        error!(error = %e, "enrichment loop ended with an error");
    }
    Ok(metrics)
}
