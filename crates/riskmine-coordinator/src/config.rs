//! Configuration for the Coordinator and for manifest ingestion

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Loop timings for the Coordinator
///
/// # Examples
///
/// ```
/// use riskmine_coordinator::CoordinatorConfig;
/// use std::time::Duration;
///
/// let config = CoordinatorConfig::default();
/// assert_eq!(config.enrichment_interval(), Duration::from_secs(10));
/// assert_eq!(config.poll_interval(), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Sleep between enrichment cycles (milliseconds)
    pub enrichment_interval_ms: u64,

    /// Sleep between convergence polls (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            enrichment_interval_ms: 10_000,
            poll_interval_ms: 30_000,
        }
    }
}

impl CoordinatorConfig {
    /// Get the enrichment interval as Duration
    pub fn enrichment_interval(&self) -> Duration {
        Duration::from_millis(self.enrichment_interval_ms)
    }

    /// Get the poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.enrichment_interval_ms == 0 {
            return Err("coordinator.enrichment_interval_ms must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("coordinator.poll_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Which manifest entries become Documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Form types to keep; amendments (`/A`) are always skipped
    pub forms: Vec<String>,

    /// Skip filings before this date
    pub since: Option<NaiveDate>,

    /// Default manifest when none is given on the command line
    pub manifest: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            forms: vec!["10-K".to_string(), "10-Q".to_string()],
            since: None,
            manifest: None,
        }
    }
}

impl IngestConfig {
    /// Whether a form type passes the allowlist
    pub fn accepts_form(&self, form: &str) -> bool {
        !form.ends_with("/A") && self.forms.iter().any(|allowed| allowed == form)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.forms.is_empty() {
            return Err("ingest.forms must list at least one form type".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_intervals() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.enrichment_interval_ms, 10_000);
        assert_eq!(config.poll_interval_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = CoordinatorConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_form_allowlist() {
        let config = IngestConfig::default();
        assert!(config.accepts_form("10-K"));
        assert!(config.accepts_form("10-Q"));
        assert!(!config.accepts_form("10-K/A"));
        assert!(!config.accepts_form("8-K"));

        let amendments = IngestConfig {
            forms: vec!["10-K/A".to_string()],
            ..Default::default()
        };
        assert!(!amendments.accepts_form("10-K/A"), "Amendments are skipped even when listed");
    }

    #[test]
    fn test_ingest_config_from_toml() {
        let config: IngestConfig = toml::from_str("forms = [\"10-K\"]\nsince = \"2024-01-01\"").unwrap();
        assert_eq!(config.forms, vec!["10-K"]);
        assert_eq!(config.since, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(config.manifest.is_none());
    }
}
