//! Page parsing
//!
//! Site-specific knowledge lives behind the [`PageParser`] trait. The crawl
//! stages only call these five operations; [`HtmlPageParser`] implements them
//! with configured URL patterns and CSS selectors.

mod html;
mod spec;

use crate::url::UrlKind;
use crate::HarvestError;
use async_trait::async_trait;

pub use html::HtmlPageParser;
pub use spec::normalize_spec;

/// Fields read from a product detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDetail {
    /// Product code as shown on the page, if any
    pub code: Option<String>,
    pub name: String,
    pub price: Option<String>,
    /// Raw specification markup
    pub spec: String,
    /// Absolute image URL
    pub image_url: Option<String>,
}

/// Site-specific page understanding
///
/// Implementations must be shareable across worker tasks. Every method is
/// called independently per URL; none may assume call order.
#[async_trait]
pub trait PageParser: Send + Sync {
    /// Decides whether a seed points at a category listing or a product
    fn classify(&self, url: &str) -> UrlKind;

    /// Returns the number of listing pages for a category URL
    async fn page_count(&self, category_url: &str) -> Result<u32, HarvestError>;

    /// Returns product URLs found on one listing page
    async fn extract_product_urls(&self, page_url: &str) -> Result<Vec<String>, HarvestError>;

    /// Reads the product fields of a detail page
    async fn extract_product_detail(&self, product_url: &str)
        -> Result<ProductDetail, HarvestError>;

    /// Reads the series key of a detail page; `None` when the page has none
    async fn extract_series(&self, product_url: &str) -> Result<Option<String>, HarvestError>;
}

/// Joins all whitespace runs into single spaces and trims
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
