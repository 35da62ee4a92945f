use std::collections::BTreeMap;

/// Name of the job holding product URLs given directly as seeds
pub const SINGLE_PRODUCTS_JOB: &str = "single_products";

/// The unit of work for one category
///
/// Category seeds that map to the same name share one job. The direct
/// product job has no source URLs and starts with its product list filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryJob {
    pub name: String,
    pub source_urls: Vec<String>,
    /// Listing page count per source URL
    pub discovered_pages: BTreeMap<String, u32>,
    /// Unique product URLs in first-seen order
    pub product_urls: Vec<String>,
}

impl CategoryJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a source URL unless the job already has it
    pub fn add_source(&mut self, url: &str) {
        if !self.source_urls.iter().any(|u| u == url) {
            self.source_urls.push(url.to_string());
        }
    }

    /// Total listing pages across all source URLs
    pub fn total_pages(&self) -> u32 {
        self.discovered_pages.values().sum()
    }

    pub fn is_direct(&self) -> bool {
        self.source_urls.is_empty()
    }
}
