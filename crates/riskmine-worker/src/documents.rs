//! Document enrichment: classify the risk section, or fall back to the segmenter

use crate::handler::{with_store, UnitHandler};
use crate::{UnitOutcome, WorkerError};
use async_trait::async_trait;
use riskmine_domain::{Document, DocumentOutcome, Lease, NewStatement, WorkQueue};
use riskmine_enricher::Enricher;
use riskmine_extractor::StatementSegmenter;
use riskmine_llm::LlmProvider;
use riskmine_store::{SqliteStore, StoreConfig};
use std::sync::Arc;
use tracing::{debug, info};

/// Drives pending Documents to `done`
///
/// A Document is `done` whether its Statements came from the model or from
/// the segmenter, even when the segmenter finds nothing. Only an unexpected
/// failure marks it `error`.
pub struct DocumentHandler<P> {
    store: StoreConfig,
    enricher: Arc<Enricher<P>>,
    segmenter: StatementSegmenter,
}

impl<P: LlmProvider + 'static> DocumentHandler<P> {
    /// Create a handler using the default segmenter
    pub fn new(store: StoreConfig, enricher: Arc<Enricher<P>>) -> Self {
        Self {
            store,
            enricher,
            segmenter: StatementSegmenter::default(),
        }
    }

    /// Replace the fallback segmenter
    pub fn with_segmenter(mut self, segmenter: StatementSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Statements for a section, and whether they came from the fallback
    pub async fn derive_statements(&self, section: &str) -> (Vec<NewStatement>, UnitOutcome) {
        match self.enricher.classify(section).await {
            Ok(classified) if !classified.is_empty() => (
                classified.into_iter().map(NewStatement::from).collect(),
                UnitOutcome::Enriched,
            ),
            Ok(_) => {
                debug!("classification returned no statements");
                (self.segment(section), UnitOutcome::Fallback)
            }
            Err(e) => {
                debug!(reason = e.kind(), error = %e, "classification unavailable");
                (self.segment(section), UnitOutcome::Fallback)
            }
        }
    }

    fn segment(&self, section: &str) -> Vec<NewStatement> {
        self.segmenter
            .segment(section)
            .into_iter()
            .map(NewStatement::plain)
            .collect()
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> UnitHandler for DocumentHandler<P> {
    type Unit = Document;

    async fn lease(&self, batch: usize) -> Result<Lease<Document>, WorkerError> {
        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Document>>::lease(store, batch)
        })
        .await
    }

    async fn process(&self, document: Document) -> Result<UnitOutcome, WorkerError> {
        let section = document.section.clone().unwrap_or_default();
        let (statements, outcome) = self.derive_statements(&section).await;
        let count = statements.len();

        if outcome == UnitOutcome::Fallback {
            info!(document_id = %document.id, statements = count, "fell back to segmenter");
        }

        let document_id = document.id;
        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Document>>::complete(store, &document, DocumentOutcome::Done(statements))
        })
        .await?;

        debug!(document_id = %document_id, statements = count, ?outcome, "document done");
        Ok(outcome)
    }

    async fn abandon(&self, document: Document, reason: String) -> Result<(), WorkerError> {
        with_store(&self.store, move |store| {
            <SqliteStore as WorkQueue<Document>>::complete(store, &document, DocumentOutcome::Error(reason))
        })
        .await
    }
}
