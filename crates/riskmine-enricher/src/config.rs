//! Configuration for the Enricher

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Enricher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnricherConfig {
    /// Model identifier sent with every call
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token ceiling for classification
    pub classify_max_tokens: u32,

    /// Completion token ceiling for mitigation suggestions
    pub mitigation_max_tokens: u32,

    /// Input characters kept before the prompt is built
    pub max_input_chars: usize,

    /// Maximum time for a single call, including the HTTP round trip (seconds)
    pub call_timeout_secs: u64,

    /// Override for the API base URL
    pub base_url: Option<String>,

    /// Run without credentials: classification falls back to segmentation and
    /// mitigations are not attempted
    pub offline: bool,
}

impl EnricherConfig {
    /// Get the call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("enrichment.model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("enrichment.temperature must be between 0.0 and 2.0".to_string());
        }
        if self.classify_max_tokens == 0 || self.mitigation_max_tokens == 0 {
            return Err("enrichment token ceilings must be greater than 0".to_string());
        }
        if self.max_input_chars == 0 {
            return Err("enrichment.max_input_chars must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("enrichment.call_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EnricherConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-1106".to_string(),
            temperature: 0.2,
            classify_max_tokens: 1500,
            mitigation_max_tokens: 300,
            max_input_chars: 6000,
            call_timeout_secs: 60,
            base_url: None,
            offline: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EnricherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.call_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_empty_model_rejected() {
        let mut config = EnricherConfig::default();
        config.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let mut config = EnricherConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_input_cap_rejected() {
        let mut config = EnricherConfig::default();
        config.max_input_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EnricherConfig::from_toml("model = \"gpt-4o-mini\"\noffline = true").unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.offline);
        assert_eq!(config.classify_max_tokens, 1500);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EnricherConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = EnricherConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
