//! Statement mitigation: ask for an idea and a rank, keep whatever comes back

use crate::handler::{with_store, UnitHandler};
use crate::{UnitOutcome, WorkerError};
use async_trait::async_trait;
use riskmine_domain::{Lease, Mitigation, Statement, WorkQueue};
use riskmine_enricher::Enricher;
use riskmine_llm::LlmProvider;
use riskmine_store::{SqliteStore, StoreConfig};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives Statements towards a complete mitigation
///
/// There is no failure state. A statement missing either field after the
/// call stays pending and is leased again; each attempt is counted.
pub struct MitigationHandler<P> {
    store: StoreConfig,
    enricher: Arc<Enricher<P>>,
    warn_every: u32,
}

impl<P: LlmProvider + 'static> MitigationHandler<P> {
    /// Create a handler that warns every `warn_every` attempts on one statement
    pub fn new(store: StoreConfig, enricher: Arc<Enricher<P>>, warn_every: u32) -> Self {
        Self {
            store,
            enricher,
            warn_every: warn_every.max(1),
        }
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> UnitHandler for MitigationHandler<P> {
    type Unit = Statement;

    async fn lease(&self, batch: usize) -> Result<Lease<Statement>, WorkerError> {
        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Statement>>::lease(store, batch)
        })
        .await
    }

    async fn process(&self, statement: Statement) -> Result<UnitOutcome, WorkerError> {
        let mitigation = match self.enricher.suggest_mitigation(&statement.raw_text).await {
            Ok(mitigation) => mitigation,
            Err(e) => {
                debug!(statement_id = %statement.id, reason = e.kind(), error = %e, "mitigation unavailable");
                Mitigation::default()
            }
        };

        // Fields already stored are never overwritten
        let complete = (statement.mitigation_idea.is_some() || mitigation.idea.is_some())
            && (statement.mitigation_rank.is_some() || mitigation.rank.is_some());
        let attempts = statement.mitigation_attempts + 1;
        let statement_id = statement.id;

        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Statement>>::complete(store, &statement, mitigation)
        })
        .await?;

        if complete {
            debug!(statement_id = %statement_id, attempts, "mitigation complete");
            return Ok(UnitOutcome::Enriched);
        }

        if attempts % self.warn_every == 0 {
            warn!(statement_id = %statement_id, attempts, "statement still has no complete mitigation");
        } else {
            debug!(statement_id = %statement_id, attempts, "mitigation requeued");
        }
        Ok(UnitOutcome::Requeued)
    }

    async fn abandon(&self, statement: Statement, _reason: String) -> Result<(), WorkerError> {
        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Statement>>::requeue(store, &statement)
        })
        .await
    }
}
