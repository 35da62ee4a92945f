//! Product URL collection
//!
//! Turns a category's source URLs into one deduplicated list of product URLs:
//! discover page counts, expand every source into its listing pages, read
//! the pages through the worker pool in fixed-size batches, then merge the
//! per-page lists in task order. The merged list is built once and handed
//! on as an immutable slice.

use super::context::{FailureRecord, ProgressSpan, RunContext, RunStats, Stage};
use super::pagination::discover_pages;
use super::pool::WorkerPool;
use crate::parser::PageParser;
use crate::url::make_page_url;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Result of collecting one category
#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// Unique product URLs in first-seen order
    pub product_urls: Vec<String>,
    /// Page count per source URL
    pub discovered_pages: BTreeMap<String, u32>,
    /// Listing pages submitted
    pub pages_total: usize,
    /// Listing pages that could not be read
    pub pages_failed: usize,
    pub failures: Vec<FailureRecord>,
}

/// Collects the product URLs of one category job
///
/// # Arguments
///
/// * `parser` - Site parser
/// * `ctx` - Run context; supplies pool widths and receives counters
/// * `category` - Job name, used in logs and failure records
/// * `source_urls` - Category URLs merged into this job
/// * `span` - Progress range for this stage
pub async fn collect_product_urls(
    parser: Arc<dyn PageParser>,
    ctx: &RunContext,
    category: &str,
    source_urls: &[String],
    span: ProgressSpan,
) -> CollectOutcome {
    let crawler = &ctx.config.crawler;
    let page_param = ctx.config.site.page_param.clone();
    let pool = WorkerPool::new(crawler.page_workers);
    let max_pages = crawler.max_pages;
    let mut outcome = CollectOutcome::default();

    // Page counts, kept in source order
    let mut counts = vec![1u32; source_urls.len()];
    let mut rx = pool.run(source_urls.to_vec(), {
        let parser = Arc::clone(&parser);
        move |url: String| {
            let parser = Arc::clone(&parser);
            async move { discover_pages(parser.as_ref(), &url, max_pages).await }
        }
    });
    while let Some(done) = rx.recv().await {
        match done.outcome {
            Ok(found) => {
                if let Some(reported) = found.capped_from {
                    outcome.failures.push(FailureRecord::new(
                        Stage::Pagination,
                        category,
                        done.item.clone(),
                        format!("{} pages reported, capped at {}", reported, found.pages),
                    ));
                }
                if let Some(reason) = found.degraded {
                    outcome.failures.push(FailureRecord::new(
                        Stage::Pagination,
                        category,
                        done.item.clone(),
                        reason,
                    ));
                }
                counts[done.index] = found.pages;
            }
            Err(reason) => outcome.failures.push(FailureRecord::new(
                Stage::Pagination,
                category,
                done.item.clone(),
                reason,
            )),
        }
    }

    let mut tasks = Vec::new();
    for (source, pages) in source_urls.iter().zip(counts) {
        outcome.discovered_pages.insert(source.clone(), pages);
        for page in 1..=pages {
            match make_page_url(source, page, &page_param) {
                Ok(url) => tasks.push(url),
                Err(e) => outcome.failures.push(FailureRecord::new(
                    Stage::Collect,
                    category,
                    source.clone(),
                    format!("cannot build page {} URL: {}", page, e),
                )),
            }
        }
    }

    tracing::info!(
        "{}: {} listing page(s) across {} source URL(s)",
        category,
        tasks.len(),
        source_urls.len()
    );
    outcome.pages_total = tasks.len();
    RunStats::add(&ctx.stats.pages_discovered, tasks.len());

    let batch_size = crawler.page_batch_size.max(1);
    let mut per_task: Vec<Option<Vec<String>>> = vec![None; tasks.len()];

    for (batch_no, batch) in tasks.chunks(batch_size).enumerate() {
        let offset = batch_no * batch_size;
        let mut rx = pool.run(batch.to_vec(), {
            let parser = Arc::clone(&parser);
            move |url: String| {
                let parser = Arc::clone(&parser);
                async move { parser.extract_product_urls(&url).await }
            }
        });

        while let Some(done) = rx.recv().await {
            let message = match done.outcome {
                Ok(Ok(urls)) => {
                    tracing::debug!("{} product link(s) on {}", urls.len(), done.item);
                    per_task[offset + done.index] = Some(urls);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(panic) => panic,
            };
            outcome.pages_failed += 1;
            outcome
                .failures
                .push(FailureRecord::new(Stage::Collect, category, done.item, message));
        }

        let done_pages = (offset + batch.len()).min(tasks.len());
        ctx.progress(
            span.at(done_pages, tasks.len()),
            "Collecting product URLs",
            format!("{}: {}/{} pages", category, done_pages, tasks.len()),
        );
    }

    RunStats::add(&ctx.stats.pages_failed, outcome.pages_failed);
    outcome.product_urls = merge_unique(per_task.into_iter().flatten());

    tracing::info!(
        "{}: {} unique product URL(s), {} page(s) failed",
        category,
        outcome.product_urls.len(),
        outcome.pages_failed
    );

    outcome
}

/// Concatenates lists, keeping only the first occurrence of each URL
pub fn merge_unique<I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for url in lists.into_iter().flatten() {
        if seen.insert(url.clone()) {
            merged.push(url);
        }
    }
    merged
}
