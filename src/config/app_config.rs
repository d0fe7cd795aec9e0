//! Typed application configuration with TOML loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file.
const CONFIG_ENV_VAR: &str = "ADPILOT_CONFIG";
/// Default config file name in the working directory.
const CONFIG_FILE: &str = "adpilot.toml";
/// Environment variable overriding the search API key.
const SEARCH_KEY_ENV_VAR: &str = "ADPILOT_SEARCH_API_KEY";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub abtest: AbTestConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the API server.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Historical dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the historical campaign CSV.
    pub csv_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_path: "data/campaign.csv".to_string(),
        }
    }
}

/// Search provider settings (Tavily-style JSON API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// API key; `ADPILOT_SEARCH_API_KEY` overrides the file value.
    pub api_key: String,
    /// Per-query deadline. A timed-out query counts as "no result".
    pub query_timeout_secs: u64,
    /// Attempts per query before the search capability is declared
    /// unavailable (transport errors only — an empty result list is
    /// a valid answer, not a retry trigger).
    pub max_attempts: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: String::new(),
            query_timeout_secs: 10,
            max_attempts: 2,
        }
    }
}

/// Generative backend settings (OpenAI-style completion API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Token budget for the budget-split prediction completion.
    pub max_tokens: usize,
    /// Token budget for the insights completion.
    pub insights_max_tokens: usize,
    pub temperature: f64,
    /// Serialize all generations through a single in-flight request.
    /// Required for backends that share one loaded model instance.
    pub exclusive: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "falcon-7b-instruct".to_string(),
            max_tokens: 150,
            insights_max_tokens: 250,
            temperature: 0.7,
            exclusive: true,
        }
    }
}

/// A/B-test candidate sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AbTestConfig {
    /// Number of candidate variations offered to the selector.
    pub candidate_count: usize,
    /// Optional RNG seed for reproducible candidate sampling. Leave unset
    /// in production for genuine variety.
    pub seed: Option<u64>,
}

impl Default for AbTestConfig {
    fn default() -> Self {
        Self {
            candidate_count: 3,
            seed: None,
        }
    }
}

impl AppConfig {
    /// Load configuration using the documented loading order, falling back
    /// to defaults when no file is present. Parse errors in an explicitly
    /// requested file are fatal; a missing default file is not.
    pub fn load() -> Self {
        let mut config = match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => match Self::load_from_file(Path::new(&path)) {
                Ok(c) => {
                    tracing::info!(path = %path, "Loaded config from {}", CONFIG_ENV_VAR);
                    c
                }
                Err(e) => {
                    tracing::error!("Config error: {e} — using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    match Self::load_from_file(default_path) {
                        Ok(c) => {
                            tracing::info!("Loaded config from ./{CONFIG_FILE}");
                            c
                        }
                        Err(e) => {
                            tracing::error!("Config error: {e} — using defaults");
                            Self::default()
                        }
                    }
                } else {
                    tracing::info!("No config file found — using built-in defaults");
                    Self::default()
                }
            }
        };

        if let Ok(key) = std::env::var(SEARCH_KEY_ENV_VAR) {
            config.search.api_key = key;
        }
        config
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.abtest.candidate_count == 0 {
            return Err(ConfigError::Invalid(
                "abtest.candidate_count must be at least 1".to_string(),
            ));
        }
        if self.search.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "search.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.search.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search.query_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature {} outside [0.0, 2.0]",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            addr = "127.0.0.1:9090"

            [abtest]
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9090");
        assert_eq!(config.abtest.seed, Some(42));
        assert_eq!(config.abtest.candidate_count, 3);
        assert_eq!(config.search.query_timeout_secs, 10);
    }

    #[test]
    fn test_zero_candidate_count_rejected() {
        let config: AppConfig = toml::from_str("[abtest]\ncandidate_count = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let config: AppConfig = toml::from_str("[llm]\ntemperature = 3.5\n").unwrap();
        assert!(config.validate().is_err());
    }
}
