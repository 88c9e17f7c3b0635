//! Engine configuration
//!
//! Tuning knobs for the audit engine: fetch timeouts, batch size, the
//! bounded worker pool, and the crawler's user-agent identity. A config can
//! be loaded from a TOML file or built from `EngineConfig::default()`.

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default number of pages processed per Continue call
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// Default number of concurrent fetches within one batch
pub const DEFAULT_MAX_CONCURRENT_FETCHES: u32 = 5;

/// Default per-request timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;

/// Default crawl limit applied when an Init request does not specify one
pub const DEFAULT_CRAWL_LIMIT: u32 = 25;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum pages processed per Continue call
    pub batch_size: u32,

    /// Maximum concurrent fetches within one batch
    pub max_concurrent_fetches: u32,

    /// Hard per-request timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Crawl limit used when an Init request omits one
    pub default_crawl_limit: u32,

    /// User agent identity
    pub user_agent: UserAgentConfig,
}

/// User agent identification
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the auditor
    pub name: String,

    /// Version string reported in the user agent
    pub version: String,

    /// URL with information about the auditor
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            name: "Sitegauge".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://sitegauge.dev/bot".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            default_crawl_limit: DEFAULT_CRAWL_LIMIT,
            user_agent: UserAgentConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates an engine configuration from a TOML file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent_fetches must be greater than zero".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.default_crawl_limit == 0 {
            return Err(ConfigError::Validation(
                "default_crawl_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The per-request timeout as a `Duration`
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Formats the user agent string sent with every request
    ///
    /// Format: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.user_agent.name, self.user_agent.version, self.user_agent.contact_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.default_crawl_limit, DEFAULT_CRAWL_LIMIT);
    }

    #[test]
    fn test_user_agent_format() {
        let config = EngineConfig::default();
        let ua = config.user_agent_string();
        assert!(ua.starts_with("Sitegauge/"));
        assert!(ua.contains("(+https://"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = EngineConfig {
            batch_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: EngineConfig = toml::from_str("batch_size = 4").unwrap();
        assert_eq!(config.batch_size, 4);
        assert_eq!(
            config.max_concurrent_fetches,
            DEFAULT_MAX_CONCURRENT_FETCHES
        );
    }

    #[test]
    fn test_parse_user_agent_section() {
        let toml_src = r#"
            fetch_timeout_secs = 5

            [user_agent]
            name = "TestGauge"
            version = "9.9"
            contact_url = "https://example.com/bot"
        "#;
        let config: EngineConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.user_agent_string(),
            "TestGauge/9.9 (+https://example.com/bot)"
        );
    }
}
