//! Selector-driven page parser
//!
//! Listing and detail pages are fetched with the shared HTTP client and read
//! with `scraper`. Documents are parsed and dropped inside synchronous
//! helpers, so no parsed tree is held across an await point.

use super::{collapse_whitespace, PageParser, ProductDetail};
use crate::config::SiteConfig;
use crate::crawler::fetch_html;
use crate::url::{parse_http_url, UrlKind};
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Compiled CSS selectors for one site
#[derive(Debug, Clone)]
struct SiteSelectors {
    product_link: Selector,
    pagination: Selector,
    name: Selector,
    code: Option<Selector>,
    price: Option<Selector>,
    spec: Option<Selector>,
    image: Option<Selector>,
    series: Option<Selector>,
}

impl SiteSelectors {
    fn compile(site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            product_link: compile_selector("product-link-selector", &site.product_link_selector)?,
            pagination: compile_selector("pagination-selector", &site.pagination_selector)?,
            name: compile_selector("name-selector", &site.name_selector)?,
            code: compile_optional("code-selector", &site.code_selector)?,
            price: compile_optional("price-selector", &site.price_selector)?,
            spec: compile_optional("spec-selector", &site.spec_selector)?,
            image: compile_optional("image-selector", &site.image_selector)?,
            series: compile_optional("series-selector", &site.series_selector)?,
        })
    }
}

fn compile_selector(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
    })
}

fn compile_optional(field: &str, selector: &Option<String>) -> Result<Option<Selector>, ConfigError> {
    selector
        .as_deref()
        .map(|s| compile_selector(field, s))
        .transpose()
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", p, e))))
        .collect()
}

/// [`PageParser`] configured from a `[site]` section
pub struct HtmlPageParser {
    client: Client,
    category_patterns: Vec<Regex>,
    product_patterns: Vec<Regex>,
    selectors: SiteSelectors,
}

impl HtmlPageParser {
    /// Compiles the site's patterns and selectors
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client used for every page fetch
    /// * `site` - URL patterns and selectors for the target site
    pub fn new(client: Client, site: &SiteConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            category_patterns: compile_patterns(&site.category_patterns)?,
            product_patterns: compile_patterns(&site.product_patterns)?,
            selectors: SiteSelectors::compile(site)?,
        })
    }

    async fn fetch(&self, url: &str) -> Result<(String, Url), HarvestError> {
        let base = parse_http_url(url)?;
        let body = fetch_html(&self.client, url).await?;
        Ok((body, base))
    }

    fn is_product_url(&self, url: &str) -> bool {
        self.product_patterns.is_empty() || self.product_patterns.iter().any(|re| re.is_match(url))
    }
}

#[async_trait]
impl PageParser for HtmlPageParser {
    fn classify(&self, url: &str) -> UrlKind {
        if parse_http_url(url).is_err() {
            return UrlKind::Invalid;
        }

        if self.category_patterns.iter().any(|re| re.is_match(url)) {
            UrlKind::Category
        } else if self.product_patterns.iter().any(|re| re.is_match(url)) {
            UrlKind::Product
        } else {
            UrlKind::Invalid
        }
    }

    async fn page_count(&self, category_url: &str) -> Result<u32, HarvestError> {
        let (body, _) = self.fetch(category_url).await?;
        let document = Html::parse_document(&body);
        Ok(max_page_number(&document, &self.selectors.pagination).unwrap_or(1))
    }

    async fn extract_product_urls(&self, page_url: &str) -> Result<Vec<String>, HarvestError> {
        let (body, base) = self.fetch(page_url).await?;
        let document = Html::parse_document(&body);
        let links = collect_links(&document, &self.selectors.product_link, &base);

        Ok(links
            .into_iter()
            .filter(|link| self.is_product_url(link))
            .collect())
    }

    async fn extract_product_detail(
        &self,
        product_url: &str,
    ) -> Result<ProductDetail, HarvestError> {
        let (body, base) = self.fetch(product_url).await?;
        let document = Html::parse_document(&body);
        let detail = parse_detail(&document, &self.selectors, &base);

        if detail.name.is_empty() && detail.code.is_none() {
            return Err(HarvestError::Parse {
                url: product_url.to_string(),
                message: "page has neither a product name nor a code".to_string(),
            });
        }

        Ok(detail)
    }

    async fn extract_series(&self, product_url: &str) -> Result<Option<String>, HarvestError> {
        let Some(selector) = &self.selectors.series else {
            return Ok(None);
        };

        let (body, _) = self.fetch(product_url).await?;
        let document = Html::parse_document(&body);
        Ok(first_text(&document, selector))
    }
}

/// Returns the highest page number linked from the pagination control
///
/// Links whose text is not a number ("Next", "»") are ignored. `None` means
/// the page has no numbered pagination links.
fn max_page_number(document: &Html, pagination: &Selector) -> Option<u32> {
    document
        .select(pagination)
        .filter_map(|link| {
            link.text()
                .collect::<String>()
                .trim()
                .parse::<u32>()
                .ok()
        })
        .max()
}

/// Resolves matching anchors to absolute URLs, first occurrence wins
fn collect_links(document: &Html, selector: &Selector, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(absolute) = resolve_link(href, base) {
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute HTTP(S) URL without fragment
///
/// Returns None for `javascript:`, `mailto:`, `tel:` and `data:` links,
/// fragment-only anchors and anything that does not resolve.
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }
    absolute.set_fragment(None);
    Some(absolute.to_string())
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

/// Strips a leading "Label:" from a code field
fn clean_code(text: &str) -> Option<String> {
    let value = match text.rsplit_once(':') {
        Some((_, value)) => value.trim(),
        None => text.trim(),
    };
    (!value.is_empty()).then(|| value.to_string())
}

fn image_source(element: ElementRef<'_>) -> Option<&str> {
    let value = element.value();
    value
        .attr("data-src")
        .or_else(|| value.attr("data-lazy-src"))
        .or_else(|| value.attr("src"))
        .filter(|src| !src.trim().is_empty())
}

/// Reads the raw product fields; spec markup is returned as found
fn parse_detail(document: &Html, selectors: &SiteSelectors, base: &Url) -> ProductDetail {
    let name = first_text(document, &selectors.name).unwrap_or_default();

    let code = selectors
        .code
        .as_ref()
        .and_then(|s| first_text(document, s))
        .and_then(|text| clean_code(&text));

    let price = selectors
        .price
        .as_ref()
        .and_then(|s| first_text(document, s));

    let spec = selectors
        .spec
        .as_ref()
        .and_then(|s| document.select(s).next())
        .map(|el| el.html())
        .unwrap_or_default();

    let image_url = selectors
        .image
        .as_ref()
        .and_then(|s| document.select(s).find_map(image_source))
        .and_then(|src| resolve_link(src, base));

    ProductDetail {
        code,
        name,
        price,
        spec,
        image_url,
    }
}
