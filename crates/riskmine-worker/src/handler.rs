//! The per-unit seam between a pool and the work it drives

use crate::{UnitOutcome, WorkerError};
use async_trait::async_trait;
use riskmine_domain::{Lease, QueueUnit};
use riskmine_store::{SqliteStore, StoreConfig, StoreError};

/// How a pool leases, processes and gives up on one kind of unit
///
/// Implementations hold no connection. Every store touch opens its own
/// connection on a blocking thread, so units share nothing but the database.
#[async_trait]
pub trait UnitHandler: Send + Sync + 'static {
    /// Unit type this handler drives
    type Unit: QueueUnit + Clone + Send + 'static;

    /// Lease up to `batch` units, oldest first
    async fn lease(&self, batch: usize) -> Result<Lease<Self::Unit>, WorkerError>;

    /// Enrich one unit and persist the result
    async fn process(&self, unit: Self::Unit) -> Result<UnitOutcome, WorkerError>;

    /// Release a unit whose processing failed unexpectedly
    async fn abandon(&self, unit: Self::Unit, reason: String) -> Result<(), WorkerError>;
}

/// Run `f` against a fresh connection on the blocking pool
pub(crate) async fn with_store<T, F>(config: &StoreConfig, f: F) -> Result<T, WorkerError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteStore) -> Result<T, StoreError> + Send + 'static,
{
    let config = config.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut store = SqliteStore::connect(&config)?;
        f(&mut store)
    })
    .await?;
    Ok(result?)
}
