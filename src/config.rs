//! Configuration for taxmemo.
//!
//! Layered lookup: explicit `--config` path, then `.taxmemo.yml` in the
//! current directory, then `~/.config/taxmemo/taxmemo.yml`, then defaults.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default LLM model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// User agent sent with guidance site requests.
pub const DEFAULT_USER_AGENT: &str = "taxmemo (tax compliance research tool)";

/// Global configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Sanitizer settings.
    pub sanitizer: SanitizerConfig,

    /// LLM provider settings.
    pub llm: LlmConfig,

    /// Guidance site scrape settings.
    pub scrape: ScrapeConfig,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .taxmemo.yml in current directory
    /// 3. ~/.config/taxmemo/taxmemo.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".taxmemo.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .taxmemo.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .taxmemo.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taxmemo").join("taxmemo.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.is_empty() {
            eyre::bail!("llm.model cannot be empty");
        }
        if self.llm.timeout_ms == 0 {
            eyre::bail!("llm.timeout-ms must be > 0");
        }
        if self.scrape.timeout_secs == 0 {
            eyre::bail!("scrape.timeout-secs must be > 0");
        }
        Ok(())
    }
}

/// Sanitizer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Keep labeled placeholders like `[Amount]` instead of `[REDACTED]`.
    #[serde(rename = "preserve-structure")]
    pub preserve_structure: bool,

    /// The organization's own name prefix (empty = no own-side entities).
    #[serde(rename = "self-identifier")]
    pub self_identifier: String,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self { preserve_structure: true, self_identifier: String::new() }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model name.
    pub model: String,

    /// Timeout per LLM call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Environment variable holding the API key.
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: 300_000, // 5 minutes
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

/// Guidance site scrape settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Request timeout in seconds.
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// User agent for guidance site requests.
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Polite delay between successive requests, in milliseconds.
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self { timeout_secs: 10, user_agent: DEFAULT_USER_AGENT.to_string(), delay_ms: 500 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobalConfig::default();
        assert!(config.sanitizer.preserve_structure);
        assert!(config.sanitizer.self_identifier.is_empty());
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.timeout_ms, 300_000);
        assert_eq!(config.scrape.timeout_secs, 10);
        assert_eq!(config.scrape.delay_ms, 500);
    }

    #[test]
    fn test_defaults_validate() {
        assert!(GlobalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_empty_model() {
        let mut config = GlobalConfig::default();
        config.llm.model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_zero_timeout() {
        let mut config = GlobalConfig::default();
        config.scrape.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxmemo.yml");
        std::fs::write(
            &path,
            "sanitizer:\n  self-identifier: Orchard\nllm:\n  model: claude-3-haiku-20240307\nscrape:\n  timeout-secs: 30\n",
        )
        .unwrap();

        let config = GlobalConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sanitizer.self_identifier, "Orchard");
        assert_eq!(config.llm.model, "claude-3-haiku-20240307");
        assert_eq!(config.scrape.timeout_secs, 30);
        // Untouched sections keep defaults
        assert_eq!(config.llm.timeout_ms, 300_000);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let path = PathBuf::from("/nonexistent/taxmemo.yml");
        assert!(GlobalConfig::load(Some(&path)).is_err());
    }
}
