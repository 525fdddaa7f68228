//! Reach-Probe: an adaptive HTTP reachability prober
//!
//! This crate probes a list of domains for HTTP reachability through optional
//! per-domain proxies, adapting each retry to the failure it just saw.

pub mod config;
pub mod output;
pub mod probe;
pub mod schedule;
pub mod sheets;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Reach-Probe operations
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Sheet service error: {0}")]
    Sheets(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Reach-Probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use probe::{BatchScheduler, Prober, Runner};
pub use state::{ProbeOutcome, ProbeTarget, TransportErrorKind, Verdict};
pub use url::{build_candidate_urls, parse_proxy};
