//! URL handling module for Catalog-Harvest
//!
//! This module provides seed parsing, the crawl target model, page URL
//! synthesis for paginated listings and file-name helpers derived from URLs.

mod naming;
mod pagination;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use naming::{category_name_from_url, code_from_url, sanitize_component, standardize_code};
pub use pagination::make_page_url;

/// What a seed URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlKind {
    /// Listing page whose products should be collected
    Category,
    /// Single product detail page
    Product,
    /// Neither; skipped and reported
    Invalid,
}

impl UrlKind {
    /// Returns true if the URL should be crawled
    pub fn is_crawlable(&self) -> bool {
        matches!(self, Self::Category | Self::Product)
    }
}

/// A classified seed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: String,
    pub kind: UrlKind,
}

impl CrawlTarget {
    pub fn new(url: impl Into<String>, kind: UrlKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// Parses a newline-delimited seed list
///
/// Blank lines and lines starting with `#` are skipped; surrounding
/// whitespace is trimmed. Order is preserved and duplicates are kept so the
/// caller can count every submitted line.
///
/// # Examples
///
/// ```
/// use catalog_harvest::url::parse_seed_list;
///
/// let seeds = parse_seed_list("https://a.example/c\n\n# note\n  https://a.example/p  \n");
/// assert_eq!(seeds, vec!["https://a.example/c", "https://a.example/p"]);
/// ```
pub fn parse_seed_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Parses a URL and requires an HTTP(S) scheme and a host
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}
