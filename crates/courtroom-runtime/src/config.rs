//! Runtime configuration.
//!
//! Loaded from YAML; every section is optional and falls back to the
//! defaults shown here:
//!
//! ```yaml
//! provider:
//!   type: groq
//!   settings:
//!     base_url: https://api.groq.com/openai/v1
//! completion:
//!   model: llama-3.3-70b-versatile
//!   temperature: 0.7
//!   max_tokens: 1024
//!   timeout: 60s
//! retry:
//!   max_retries: 0
//!   min_delay: 500ms
//!   max_delay: 8s
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::RetryPolicy;

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Which provider to build, and its provider-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registered factory name
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Passed verbatim to the factory
    #[serde(default = "empty_settings")]
    pub settings: JsonValue,
}

fn empty_settings() -> JsonValue {
    JsonValue::Object(Default::default())
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: "groq".to_string(),
            settings: empty_settings(),
        }
    }
}

impl ProviderConfig {
    /// Set a string setting, e.g. an `api_key` given on the command line.
    pub fn set_setting(&mut self, key: &str, value: impl Into<String>) {
        if !self.settings.is_object() {
            self.settings = empty_settings();
        }
        if let Some(map) = self.settings.as_object_mut() {
            map.insert(key.to_string(), JsonValue::String(value.into()));
        }
    }
}

/// Full runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub provider: ProviderConfig,
    pub completion: CompletionConfig,
    pub retry: RetryPolicy,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.provider_type.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.type is empty".into()));
        }

        let completion = &self.completion;
        if completion.model.trim().is_empty() {
            return Err(ConfigError::Invalid("completion.model is empty".into()));
        }
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(ConfigError::Invalid(format!(
                "completion.temperature {} outside [0, 2]",
                completion.temperature
            )));
        }
        if completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be positive".into(),
            ));
        }
        if completion.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "completion.timeout must be non-zero".into(),
            ));
        }

        if self.retry.min_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid(format!(
                "retry.min_delay {:?} exceeds retry.max_delay {:?}",
                self.retry.min_delay, self.retry.max_delay
            )));
        }

        Ok(())
    }
}

/// Serde adapter for `humantime` durations ("60s", "500ms", "2m").
pub(crate) mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = RuntimeConfig::default();
        assert_eq!(config.provider.provider_type, "groq");
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.completion.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
provider:
  type: groq
  settings:
    base_url: https://proxy.internal/v1
completion:
  model: llama-3.1-8b-instant
  temperature: 0.2
  max_tokens: 512
  timeout: 15s
retry:
  max_retries: 3
  min_delay: 250ms
  max_delay: 4s
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.provider.settings["base_url"], "https://proxy.internal/v1");
        assert_eq!(config.completion.model, "llama-3.1-8b-instant");
        assert_eq!(config.completion.max_tokens, 512);
        assert_eq!(config.completion.timeout, Duration::from_secs(15));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.min_delay, Duration::from_millis(250));
        assert_eq!(config.retry.max_delay, Duration::from_secs(4));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RuntimeConfig::from_yaml("completion:\n  model: other-model\n").unwrap();
        assert_eq!(config.completion.model, "other-model");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.provider.provider_type, "groq");
        assert!(config.provider.settings.is_object());
    }

    #[test]
    fn test_invalid_temperature() {
        let result = RuntimeConfig::from_yaml("completion:\n  temperature: 3.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("temperature")));
    }

    #[test]
    fn test_zero_max_tokens() {
        let result = RuntimeConfig::from_yaml("completion:\n  max_tokens: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timeout() {
        let result = RuntimeConfig::from_yaml("completion:\n  timeout: 0s\n");
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("timeout")));
    }

    #[test]
    fn test_min_delay_above_max_delay() {
        let result = RuntimeConfig::from_yaml("retry:\n  min_delay: 10s\n  max_delay: 1s\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_duration_is_yaml_error() {
        let result = RuntimeConfig::from_yaml("completion:\n  timeout: soon\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            RuntimeConfig::from_yaml_file("/nonexistent/courtroom.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_set_setting() {
        let mut provider = ProviderConfig::default();
        provider.set_setting("api_key", "gsk_cli");
        assert_eq!(provider.settings["api_key"], "gsk_cli");

        provider.settings = JsonValue::Null;
        provider.set_setting("api_key", "gsk_again");
        assert_eq!(provider.settings["api_key"], "gsk_again");
    }

    #[test]
    fn test_duration_round_trips_through_yaml() {
        let config = RuntimeConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("timeout: 1m"));
        assert_eq!(RuntimeConfig::from_yaml(&yaml).unwrap(), config);
    }
}
