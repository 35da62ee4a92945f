//! Crawler module: the concurrent stages of a harvest run
//!
//! This module contains the pipeline logic, including:
//! - HTTP client construction and single-attempt page fetching
//! - A bounded worker pool feeding one aggregating consumer
//! - Pagination discovery and product URL collection
//! - Product detail extraction and image fetching
//! - Overall run coordination

mod collector;
mod context;
mod coordinator;
mod extractor;
mod fetcher;
mod images;
mod pagination;
mod pool;

pub use collector::{collect_product_urls, merge_unique, CollectOutcome};
pub use context::{FailureRecord, ProgressSpan, RunContext, RunStats, Stage};
pub use coordinator::{Pipeline, RunPlan};
pub use extractor::{extract_products, ExtractOutcome};
pub use fetcher::{build_http_client, fetch_html};
pub use images::{image_path, ImageFetcher, ImageOutcome};
pub use pagination::{discover_pages, PageDiscovery};
pub use pool::{Completed, WorkerPool};
