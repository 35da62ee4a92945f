//! Catalog-Harvest: a concurrent catalog crawler
//!
//! This crate crawls category and product pages of commerce sites, extracts
//! structured product records and their images, and writes grouped report
//! artifacts for each run. Per-item failures are counted and logged, never
//! fatal to the batch.

pub mod codec;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod parser;
pub mod progress;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Image fetch failed for {url}: {message}")]
    ImageFetch { url: String, message: String },

    #[error("Packaging failed: {0}")]
    Packaging(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Task(String),

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

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector for {field}: {selector}")]
    InvalidSelector { field: String, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Pipeline, RunContext};
pub use model::{ImageResult, ImageStatus, ProductRecord, SeriesGroup};
pub use output::{ArchiveStatus, RunReport};
pub use url::{CrawlTarget, UrlKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_names_url() {
        let err = HarvestError::HttpStatus {
            url: "https://shop.example.com/a".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 for https://shop.example.com/a");
    }

    #[test]
    fn test_config_error_converts() {
        let err: HarvestError = ConfigError::Validation("max-workers must be >= 1".into()).into();
        assert!(matches!(err, HarvestError::Config(_)));
        assert!(err.to_string().contains("max-workers"));
    }
}
