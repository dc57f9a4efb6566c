//! Configuration for Worker Pools
//!
//! One `PoolConfig` per unit type; the two presets carry the historical
//! defaults for document enrichment and statement mitigation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one Worker Pool
///
/// # Examples
///
/// ```
/// use riskmine_worker::PoolConfig;
///
/// let documents = PoolConfig::documents();
/// assert_eq!(documents.limit, 20);
///
/// let mitigations = PoolConfig::mitigations();
/// assert_eq!(mitigations.max_workers, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum units leased per cycle
    pub limit: usize,

    /// Maximum units processed concurrently
    pub max_workers: usize,

    /// Delay between successive submissions, in seconds
    pub submit_delay_secs: f64,

    /// Warn each time a unit's attempt count reaches a multiple of this
    pub attempt_warning_threshold: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::documents()
    }
}

impl PoolConfig {
    /// Document enrichment preset: 20 per cycle, 4 workers, 1s pacing
    pub fn documents() -> Self {
        Self {
            limit: 20,
            max_workers: 4,
            submit_delay_secs: 1.0,
            attempt_warning_threshold: 5,
        }
    }

    /// Mitigation preset: 40 per cycle, 10 workers, 1s pacing
    pub fn mitigations() -> Self {
        Self {
            limit: 40,
            max_workers: 10,
            submit_delay_secs: 1.0,
            attempt_warning_threshold: 5,
        }
    }

    /// Submission pacing as Duration
    pub fn submit_delay(&self) -> Duration {
        Duration::from_secs_f64(self.submit_delay_secs.max(0.0))
    }

    /// Check the tunables before a pool is built
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be at least 1".to_string());
        }
        if self.max_workers == 0 {
            return Err("max_workers must be at least 1".to_string());
        }
        if !self.submit_delay_secs.is_finite() || self.submit_delay_secs < 0.0 {
            return Err(format!(
                "submit_delay_secs must be a non-negative number, got {}",
                self.submit_delay_secs
            ));
        }
        if self.attempt_warning_threshold == 0 {
            return Err("attempt_warning_threshold must be at least 1".to_string());
        }
        Ok(())
    }

    /// Parse from TOML, filling missing keys from the document preset
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

/// Partial pool settings layered over a preset
///
/// Config file sections and command-line flags both produce one of these, so
/// a file that only sets `limit` keeps the preset's other values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolOverrides {
    /// Replaces `limit`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Replaces `max_workers`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    /// Replaces `submit_delay_secs`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_delay_secs: Option<f64>,

    /// Replaces `attempt_warning_threshold`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_warning_threshold: Option<u32>,
}

impl PoolOverrides {
    /// Apply over `base`
    pub fn apply(&self, base: PoolConfig) -> PoolConfig {
        PoolConfig {
            limit: self.limit.unwrap_or(base.limit),
            max_workers: self.max_workers.unwrap_or(base.max_workers),
            submit_delay_secs: self.submit_delay_secs.unwrap_or(base.submit_delay_secs),
            attempt_warning_threshold: self
                .attempt_warning_threshold
                .unwrap_or(base.attempt_warning_threshold),
        }
    }

    /// Layer `other` on top; its set fields win
    pub fn merge(&self, other: &PoolOverrides) -> PoolOverrides {
        PoolOverrides {
            limit: other.limit.or(self.limit),
            max_workers: other.max_workers.or(self.max_workers),
            submit_delay_secs: other.submit_delay_secs.or(self.submit_delay_secs),
            attempt_warning_threshold: other
                .attempt_warning_threshold
                .or(self.attempt_warning_threshold),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let documents = PoolConfig::documents();
        assert_eq!(documents.limit, 20);
        assert_eq!(documents.max_workers, 4);
        assert_eq!(documents.submit_delay(), Duration::from_secs(1));

        let mitigations = PoolConfig::mitigations();
        assert_eq!(mitigations.limit, 40);
        assert_eq!(mitigations.max_workers, 10);
        assert!(mitigations.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = PoolConfig::documents();
        config.limit = 0;
        assert!(config.validate().is_err());

        let mut config = PoolConfig::documents();
        config.max_workers = 0;
        assert!(config.validate().is_err());

        let mut config = PoolConfig::documents();
        config.submit_delay_secs = -0.5;
        assert!(config.validate().is_err());

        config.submit_delay_secs = f64::NAN;
        assert!(config.validate().is_err());

        config.submit_delay_secs = 0.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.submit_delay(), Duration::ZERO);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = PoolConfig::from_toml("limit = 5\nsubmit_delay_secs = 0.25").unwrap();
        assert_eq!(config.limit, 5);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.submit_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_overrides_keep_preset_values() {
        let overrides: PoolOverrides = toml::from_str("limit = 50").unwrap();
        let config = overrides.apply(PoolConfig::mitigations());
        assert_eq!(config.limit, 50);
        assert_eq!(config.max_workers, 10, "Unset keys come from the preset");
    }

    #[test]
    fn test_overrides_merge() {
        let file = PoolOverrides {
            limit: Some(5),
            max_workers: Some(2),
            ..Default::default()
        };
        let flags = PoolOverrides {
            max_workers: Some(8),
            ..Default::default()
        };
        let merged = file.merge(&flags);
        assert_eq!(merged.limit, Some(5));
        assert_eq!(merged.max_workers, Some(8));
    }
}
