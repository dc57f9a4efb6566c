//! Names command implementation.

use crate::cli::NamesArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use riskmine_domain::FilingStore;
use riskmine_store::SqliteStore;
use std::collections::HashMap;
use std::path::Path;

/// Execute the names command.
pub async fn execute_names(args: NamesArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let names = read_name_map(&args.map).await?;
    tracing::info!(entries = names.len(), map = %args.map.display(), "assigning company names");

    let store = config.store.clone();
    let (updated, unnamed) = tokio::task::spawn_blocking(move || {
        let mut store = SqliteStore::connect(&store)?;
        let updated = store.assign_entity_names(&names)?;
        let unnamed = store.unnamed_entities()?;
        Ok::<_, CliError>((updated, unnamed))
    })
    .await??;

    println!("{}", formatter.names(updated, &unnamed)?);
    Ok(())
}

/// Read a JSON object of entity key to company name.
///
/// Keys are trimmed; blank names are dropped.
pub async fn read_name_map(path: &Path) -> Result<HashMap<String, String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_name_map(&contents)
}

fn parse_name_map(contents: &str) -> Result<HashMap<String, String>> {
    let raw: HashMap<String, String> = serde_json::from_str(contents)?;
    let names: HashMap<String, String> = raw
        .into_iter()
        .filter(|(_, name)| !name.trim().is_empty())
        .map(|(key, name)| (key.trim().to_string(), name.trim().to_string()))
        .collect();

    if names.is_empty() {
        return Err(CliError::InvalidInput("Name map has no entries".to_string()));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_map() {
        let names = parse_name_map(r#"{" 320193 ": "Apple Inc.", "789019": "  "}"#).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names["320193"], "Apple Inc.");
    }

    #[test]
    fn test_empty_map_rejected() {
        assert!(matches!(parse_name_map("{}"), Err(CliError::InvalidInput(_))));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(parse_name_map("[1, 2]"), Err(CliError::Serialization(_))));
    }
}
