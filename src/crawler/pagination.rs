//! Pagination discovery
//!
//! Reads a category's first listing page once and reports how many listing
//! pages it has, capped at the configured `max-pages`. Discovery never fails
//! the caller: any error degrades to a single page and is returned
//! alongside the count for logging.

use crate::parser::PageParser;

/// Page count for one category URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDiscovery {
    /// Always at least 1
    pub pages: u32,
    /// Why discovery fell back to one page, if it did
    pub degraded: Option<String>,
    /// Page count the site reported when it exceeded the cap
    pub capped_from: Option<u32>,
}

/// Discovers the number of listing pages behind a category URL
///
/// # Arguments
///
/// * `parser` - Site parser used to read the pagination control
/// * `category_url` - First listing page of the category
/// * `max_pages` - Upper bound on the returned count
///
/// # Returns
///
/// The highest page number linked from the pagination control, clamped to
/// `1..=max_pages`, or 1 when there is no control or the page cannot be read.
pub async fn discover_pages(
    parser: &dyn PageParser,
    category_url: &str,
    max_pages: u32,
) -> PageDiscovery {
    match parser.page_count(category_url).await {
        Ok(reported) => {
            let pages = reported.clamp(1, max_pages.max(1));
            let capped_from = (reported > pages).then_some(reported);
            if capped_from.is_some() {
                tracing::warn!(
                    "{} reports {} listing pages, reading only the first {}",
                    category_url,
                    reported,
                    pages
                );
            } else {
                tracing::debug!("{} has {} listing page(s)", category_url, pages);
            }
            PageDiscovery {
                pages,
                degraded: None,
                capped_from,
            }
        }
        Err(e) => {
            tracing::warn!(
                "Pagination discovery failed for {}, assuming one page: {}",
                category_url,
                e
            );
            PageDiscovery {
                pages: 1,
                degraded: Some(e.to_string()),
                capped_from: None,
            }
        }
    }
}
