//! Status command implementation.

use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use riskmine_store::SqliteStore;

/// Execute the status command.
pub async fn execute_status(config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let store = config.store.clone();
    let summary = tokio::task::spawn_blocking(move || SqliteStore::connect(&store)?.status_summary()).await??;

    println!("{}", formatter.status(&summary)?);
    Ok(())
}
