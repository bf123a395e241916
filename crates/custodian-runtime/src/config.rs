//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//! Durations are written in human-readable form (`"15s"`, `"1m 30s"`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use custodian_core::{GuardrailPolicy, MAX_EVIDENCE_ITEMS};

use crate::providers::CompletionConfig;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the verification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Model used for both query optimization and verdicts
    pub model: String,

    /// Maximum tokens per LLM call
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic)
    pub temperature: f32,

    /// Number of search results requested and kept as evidence
    pub max_results: usize,

    pub guardrail: GuardrailPolicy,

    pub timeouts: StageTimeouts,

    pub llm: LlmSettings,

    pub search: SearchSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 2048,
            temperature: 0.0,
            max_results: MAX_EVIDENCE_ITEMS,
            guardrail: GuardrailPolicy::default(),
            timeouts: StageTimeouts::default(),
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

/// Per-stage bounds on external calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    #[serde(with = "human_duration")]
    pub optimizer: Duration,

    #[serde(with = "human_duration")]
    pub search: Duration,

    #[serde(with = "human_duration")]
    pub synthesis: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            optimizer: Duration::from_secs(15),
            search: Duration::from_secs(10),
            synthesis: Duration::from_secs(30),
        }
    }
}

/// LLM provider selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Registered provider type
    pub provider: String,

    /// Override for the provider's API root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: None,
        }
    }
}

/// Search provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub user_agent: String,

    /// Region code, e.g. "us-en"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: concat!("custodian/", env!("CARGO_PKG_VERSION")).to_string(),
            region: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }

        if self.max_results == 0 || self.max_results > MAX_EVIDENCE_ITEMS {
            return Err(ConfigError::Invalid(format!(
                "max_results must be between 1 and {}, got {}",
                MAX_EVIDENCE_ITEMS, self.max_results
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        for (stage, timeout) in [
            ("optimizer", self.timeouts.optimizer),
            ("search", self.timeouts.search),
            ("synthesis", self.timeouts.synthesis),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "timeouts.{} must be greater than zero",
                    stage
                )));
            }
        }

        Ok(())
    }

    /// Completion settings for an LLM call bounded by `timeout`.
    pub fn completion_config(&self, timeout: Duration) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout,
        }
    }

    /// JSON config handed to the provider factory.
    pub fn llm_provider_config(&self) -> serde_json::Value {
        match &self.llm.base_url {
            Some(url) => serde_json::json!({ "base_url": url }),
            None => serde_json::json!({}),
        }
    }
}

mod human_duration {
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
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = RuntimeConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.guardrail.min_tokens, 10);
        assert_eq!(config.timeouts.synthesis, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = RuntimeConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let config = RuntimeConfig::from_yaml(
            r#"
model: gemini-2.5-pro
max_results: 3
guardrail:
  min_tokens: 6
timeouts:
  search: 2s
  synthesis: 1m 30s
search:
  region: us-en
"#,
        )
        .unwrap();

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.max_results, 3);
        assert_eq!(config.guardrail.min_tokens, 6);
        assert!(config.guardrail.reject_questions);
        assert_eq!(config.timeouts.search, Duration::from_secs(2));
        assert_eq!(config.timeouts.synthesis, Duration::from_secs(90));
        assert_eq!(config.timeouts.optimizer, Duration::from_secs(15));
        assert_eq!(config.search.region.as_deref(), Some("us-en"));
    }

    #[test]
    fn test_invalid_duration() {
        let result = RuntimeConfig::from_yaml("timeouts:\n  search: soon\n");
        assert!(matches!(result, Err(ConfigError::YamlError(_))));
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        for yaml in [
            "max_results: 0",
            "max_results: 6",
            "temperature: 3.5",
            "model: ''",
            "timeouts:\n  optimizer: 0s",
        ] {
            assert!(
                matches!(RuntimeConfig::from_yaml(yaml), Err(ConfigError::Invalid(_))),
                "{}",
                yaml
            );
        }
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = RuntimeConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("synthesis: 30s"));
        assert_eq!(RuntimeConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_completion_config() {
        let config = RuntimeConfig::default();
        let completion = config.completion_config(Duration::from_secs(7));
        assert_eq!(completion.model, "gemini-2.5-flash");
        assert_eq!(completion.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_llm_provider_config() {
        let mut config = RuntimeConfig::default();
        assert_eq!(config.llm_provider_config(), serde_json::json!({}));

        config.llm.base_url = Some("http://127.0.0.1:9000".to_string());
        assert_eq!(config.llm_provider_config()["base_url"], "http://127.0.0.1:9000");
    }
}
