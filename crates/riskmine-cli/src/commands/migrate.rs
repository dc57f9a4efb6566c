//! Migrate command implementation.

use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use riskmine_store::SqliteStore;

/// Execute the migrate command.
pub async fn execute_migrate(config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let store = config.store.clone();
    let report = tokio::task::spawn_blocking(move || {
        SqliteStore::open_with_report(&store).map(|(_, report)| report)
    })
    .await??;

    println!("{}", formatter.migration(&report)?);
    Ok(())
}
