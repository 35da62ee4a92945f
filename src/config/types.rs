use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub site: SiteConfig,
}

/// Pool widths, retry policy and network timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Width of the detail-extraction and image-fetch pools
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: usize,

    /// Width of the listing-page pool used by the collector
    #[serde(rename = "page-workers", default = "default_page_workers")]
    pub page_workers: usize,

    /// Number of listing pages submitted to the pool at once
    #[serde(rename = "page-batch-size", default = "default_page_batch_size")]
    pub page_batch_size: usize,

    /// Upper bound on listing pages read per category URL
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum attempts per image
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delays between image attempts (milliseconds); the last entry caps the schedule
    #[serde(rename = "backoff-schedule-ms", default = "default_backoff_schedule")]
    pub backoff_schedule_ms: Vec<u64>,

    /// Total timeout for a single request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout for a single request (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl CrawlerConfig {
    /// Returns the delay to wait after the given failed attempt (1-based)
    ///
    /// Attempts past the end of the schedule reuse its last entry.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let idx = (attempt.max(1) - 1) as usize;
        let ms = self
            .backoff_schedule_ms
            .get(idx)
            .or_else(|| self.backoff_schedule_ms.last())
            .copied()
            .unwrap_or(0);
        Duration::from_millis(ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            page_workers: default_page_workers(),
            page_batch_size: default_page_batch_size(),
            max_pages: default_max_pages(),
            max_retries: default_max_retries(),
            backoff_schedule_ms: default_backoff_schedule(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory under which each run gets its own `run_<timestamp>` folder
    #[serde(rename = "output-root", default = "default_output_root")]
    pub output_root: String,

    /// Encoding for downloaded images: "webp", "png" or "jpeg"
    #[serde(rename = "image-format", default = "default_image_format")]
    pub image_format: String,

    /// Whether to package the run into a zip archive
    #[serde(default = "default_archive")]
    pub archive: bool,

    /// Series name for products whose series cannot be determined
    #[serde(rename = "fallback-series", default = "default_fallback_series")]
    pub fallback_series: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            image_format: default_image_format(),
            archive: default_archive(),
            fallback_series: default_fallback_series(),
        }
    }
}

/// Per-site URL patterns and CSS selectors
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Regular expressions; a URL matching any of them is a category listing
    #[serde(rename = "category-patterns")]
    pub category_patterns: Vec<String>,

    /// Regular expressions; a URL matching any of them is a product page
    #[serde(rename = "product-patterns")]
    pub product_patterns: Vec<String>,

    /// Anchors on a listing page that point at products
    #[serde(rename = "product-link-selector")]
    pub product_link_selector: String,

    /// Links inside the pagination control
    #[serde(rename = "pagination-selector")]
    pub pagination_selector: String,

    /// Query parameter carrying the page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    #[serde(rename = "name-selector")]
    pub name_selector: String,

    #[serde(rename = "code-selector", default)]
    pub code_selector: Option<String>,

    #[serde(rename = "price-selector", default)]
    pub price_selector: Option<String>,

    #[serde(rename = "spec-selector", default)]
    pub spec_selector: Option<String>,

    #[serde(rename = "image-selector", default)]
    pub image_selector: Option<String>,

    #[serde(rename = "series-selector", default)]
    pub series_selector: Option<String>,

    /// Rows appended to every normalized spec table
    #[serde(rename = "spec-footer", default)]
    pub spec_footer: Vec<(String, String)>,
}

fn default_max_workers() -> usize {
    8
}

fn default_page_workers() -> usize {
    10
}

fn default_page_batch_size() -> usize {
    10
}

fn default_max_pages() -> u32 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_schedule() -> Vec<u64> {
    vec![500, 1000, 2000, 3000, 5000]
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_output_root() -> String {
    "./output".to_string()
}

fn default_image_format() -> String {
    "webp".to_string()
}

fn default_archive() -> bool {
    true
}

fn default_fallback_series() -> String {
    "Unknown".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}
