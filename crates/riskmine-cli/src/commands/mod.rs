//! Command implementations.

pub mod enrich;
pub mod ingest;
pub mod migrate;
pub mod names;
pub mod run;
pub mod status;

pub use self::enrich::{execute_enrich, execute_mitigate};
pub use self::ingest::execute_ingest;
pub use self::migrate::execute_migrate;
pub use self::names::execute_names;
pub use self::run::execute_run;
pub use self::status::execute_status;

use crate::config::AppConfig;
use crate::error::{CliError, Result};
use riskmine_enricher::Enricher;
use riskmine_llm::OpenAiProvider;
use std::path::PathBuf;
use std::sync::Arc;

/// Build the Enricher the configuration asks for.
///
/// Offline configurations get a disabled Enricher that never touches the network.
pub fn build_enricher(config: &AppConfig) -> Result<Arc<Enricher<OpenAiProvider>>> {
    let settings = config.enrichment.clone();
    let enricher = match config.credential()? {
        Some(key) => {
            let mut provider = OpenAiProvider::with_timeout(key, settings.call_timeout())?;
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url.clone());
            }
            tracing::debug!(model = %settings.model, base_url = provider.base_url(), "enrichment client ready");
            Enricher::new(provider, settings)
        }
        None => Enricher::disabled(settings),
    };
    Ok(Arc::new(enricher))
}

/// Manifest from the command line, else from `ingest.manifest`.
pub(crate) fn resolve_manifest(arg: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    arg.or_else(|| config.ingest.manifest.clone()).ok_or_else(|| {
        CliError::InvalidInput("No manifest given; pass --manifest or set ingest.manifest".to_string())
    })
}
