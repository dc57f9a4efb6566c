//! Ingest command implementation.

use super::resolve_manifest;
use crate::cli::ManifestArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use riskmine_coordinator::{Ingestor, ManifestIngestor};

/// Execute the ingest command.
pub async fn execute_ingest(args: ManifestArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let manifest = resolve_manifest(args.manifest, config)?;
    let report = ManifestIngestor::new(manifest, config.ingest.clone())
        .ingest(&config.store)
        .await?;

    println!("{}", formatter.ingest(&report)?);
    Ok(())
}
