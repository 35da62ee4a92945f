//! HTTP fetcher implementation
//!
//! This module handles the HTTP side of page retrieval:
//! - Building the shared client with the configured user agent and timeouts
//! - GET requests for listing and product pages
//! - Error classification into network and status failures

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::HarvestError;
use reqwest::{redirect::Policy, Client};

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - Supplies request and connect timeouts
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use catalog_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use catalog_harvest::crawler::build_http_client;
///
/// let user_agent = UserAgentConfig {
///     crawler_name: "CatalogHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "ops@example.com".to_string(),
/// };
///
/// let client = build_http_client(&user_agent, &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body as text
///
/// Pages get a single attempt. Transport failures become
/// `HarvestError::Network` and non-2xx responses `HarvestError::HttpStatus`.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_html(client: &Client, url: &str) -> Result<String, HarvestError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| classify_error(url, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|source| classify_error(url, source))
}

fn classify_error(url: &str, source: reqwest::Error) -> HarvestError {
    if source.is_timeout() {
        tracing::debug!("Request timeout for {}", url);
    } else if source.is_connect() {
        tracing::debug!("Connection failed for {}", url);
    }

    HarvestError::Network {
        url: url.to_string(),
        source,
    }
}
