//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use riskmine_coordinator::{CoordinatorConfig, IngestConfig};
use riskmine_enricher::EnricherConfig;
use riskmine_store::StoreConfig;
use riskmine_worker::{PoolConfig, PoolOverrides};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the enrichment service key.
pub const CREDENTIAL_VAR: &str = "OPENAI_API_KEY";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "riskmine.toml";

/// Application configuration, one section per component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database location and connection behavior
    pub store: StoreConfig,

    /// Enrichment service settings
    pub enrichment: EnricherConfig,

    /// Document pool settings over the document preset
    pub documents: PoolOverrides,

    /// Mitigation pool settings over the mitigation preset
    pub mitigations: PoolOverrides,

    /// Loop timings
    pub coordinator: CoordinatorConfig,

    /// Filing selection rules
    pub ingest: IngestConfig,

    /// Terminal output
    pub output: OutputSettings,
}

/// Terminal output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

impl AppConfig {
    /// Path of the per-user configuration file.
    pub fn user_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".riskmine").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./riskmine.toml` is tried, then
    /// the per-user file, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Ok(user) = Self::user_path() {
            if user.exists() {
                return Self::from_file(&user);
            }
        }

        Ok(Self::default())
    }

    /// Parse one configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: AppConfig = toml::from_str(&contents)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Document pool settings.
    pub fn documents(&self) -> PoolConfig {
        self.documents.apply(PoolConfig::documents())
    }

    /// Mitigation pool settings.
    pub fn mitigations(&self) -> PoolConfig {
        self.mitigations.apply(PoolConfig::mitigations())
    }

    /// Check every section before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.store.validate().map_err(CliError::Config)?;
        self.enrichment.validate().map_err(CliError::Config)?;
        self.documents()
            .validate()
            .map_err(|e| CliError::Config(format!("documents: {}", e)))?;
        self.mitigations()
            .validate()
            .map_err(|e| CliError::Config(format!("mitigations: {}", e)))?;
        self.coordinator.validate().map_err(CliError::Config)?;
        self.ingest.validate().map_err(CliError::Config)?;
        Ok(())
    }

    /// The enrichment credential.
    ///
    /// Missing credentials are an error unless `enrichment.offline` is set, in
    /// which case `None` comes back and a single warning is logged.
    pub fn credential(&self) -> Result<Option<String>> {
        self.credential_from(std::env::var(CREDENTIAL_VAR).ok())
    }

    fn credential_from(&self, value: Option<String>) -> Result<Option<String>> {
        let key = value.filter(|v| !v.trim().is_empty());
        if self.enrichment.offline {
            if key.is_some() {
                tracing::debug!("offline mode set; ignoring {}", CREDENTIAL_VAR);
            }
            tracing::warn!("enrichment is offline: documents fall back to segmentation and no mitigations are requested");
            return Ok(None);
        }
        match key {
            Some(key) => Ok(Some(key)),
            None => Err(CliError::Config(format!(
                "{} is not set; export it or set enrichment.offline = true",
                CREDENTIAL_VAR
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.output.color);
        assert_eq!(config.output.format, OutputFormat::Table);
        assert_eq!(config.documents().limit, 20);
        assert_eq!(config.mitigations().max_workers, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_presets() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            path = "filings.db"

            [mitigations]
            limit = 80

            [output]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("filings.db"));
        assert_eq!(config.mitigations().limit, 80);
        assert_eq!(config.mitigations().max_workers, 10);
        assert_eq!(config.documents().limit, 20);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.color);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = AppConfig::default();
        config.documents.max_workers = Some(0);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("documents"));

        let mut config = AppConfig::default();
        config.enrichment.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.coordinator.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AppConfig::load(Some(missing.as_path())).is_err());

        let present = dir.path().join("riskmine.toml");
        fs::write(&present, "[coordinator]\npoll_interval_ms = 1000\n").unwrap();
        let config = AppConfig::load(Some(present.as_path())).unwrap();
        assert_eq!(config.coordinator.poll_interval_ms, 1000);
    }

    #[test]
    fn test_credential_required_unless_offline() {
        let config = AppConfig::default();
        assert!(config.credential_from(None).is_err());
        assert!(config.credential_from(Some("  ".to_string())).is_err());
        assert_eq!(
            config.credential_from(Some("sk-test".to_string())).unwrap(),
            Some("sk-test".to_string())
        );

        let mut offline = AppConfig::default();
        offline.enrichment.offline = true;
        assert_eq!(offline.credential_from(None).unwrap(), None);
        assert_eq!(offline.credential_from(Some("sk-test".to_string())).unwrap(), None);
    }
}
