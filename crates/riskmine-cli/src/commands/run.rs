//! Run command implementation.

use super::{build_enricher, resolve_manifest};
use crate::cli::ManifestArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use riskmine_coordinator::{Coordinator, ManifestIngestor};

/// Execute the run command.
pub async fn execute_run(args: ManifestArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let manifest = resolve_manifest(args.manifest, config)?;
    let enricher = build_enricher(config)?;

    let coordinator = Coordinator::new(config.store.clone(), enricher)
        .with_pools(config.documents(), config.mitigations())
        .with_config(config.coordinator.clone());
    let report = coordinator
        .run(ManifestIngestor::new(manifest, config.ingest.clone()))
        .await?;

    println!("{}", formatter.run(&report)?);
    Ok(())
}
