//! Sitegauge: a progressive website visibility audit engine
//!
//! Sitegauge crawls a bounded sample of a site's pages, extracts structural
//! signals, evaluates a fixed catalog of rule-based checks across six
//! categories, and aggregates them into a weighted visibility score with a
//! prioritized fix list. Crawling is batch-resumable: all traversal state is
//! persisted after every batch, so an audit can progress across separate
//! process invocations.

pub mod audit;
pub mod checks;
pub mod config;
pub mod crawler;
pub mod robots;
pub mod score;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sitegauge operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audit {audit_id} not found")]
    AuditNotFound { audit_id: i64 },

    #[error("Crawl state for audit {audit_id} not found; a fresh init is required")]
    StateNotFound { audit_id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("State snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are the only errors rejected synchronously before an audit is
/// created (invalid domain, nonsensical crawl limit, unreadable config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Invalid crawl limit: {0} (must be greater than zero)")]
    InvalidCrawlLimit(i64),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sitegauge operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{continue_audit, init_audit, score_audit, InitRequest};
pub use checks::{CheckResult, CheckStatus};
pub use config::EngineConfig;
pub use crawler::{CrawlState, CrawlStatus, PageRecord};
pub use url::{normalize_url, url_fingerprint};
