//! Product detail extraction
//!
//! Reads every product URL through the worker pool, calling the parser's
//! detail and series operations concurrently for each URL. The aggregator
//! loop below is the only owner of the record list and keeps one record per
//! (series, standardized code); a colliding record is counted as a
//! duplicate and logged. When an image sink is given, one image task per
//! new (series, code) pair is forwarded as soon as its record is built, so
//! image fetching overlaps extraction.

use super::context::{FailureRecord, ProgressSpan, RunContext, RunStats, Stage};
use super::pool::WorkerPool;
use crate::model::{ImageTask, ProductRecord};
use crate::parser::{normalize_spec, PageParser, ProductDetail};
use crate::url::{code_from_url, standardize_code};
use crate::HarvestError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Result of extracting one category's products
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Successful records sorted by input index, unique per (series, code)
    pub records: Vec<ProductRecord>,
    pub failed: usize,
    pub unpriced: usize,
    /// Records dropped because their code was already taken in their series
    pub duplicates: usize,
    pub failures: Vec<FailureRecord>,
}

/// Extracts product records for a list of unique product URLs
///
/// # Arguments
///
/// * `parser` - Site parser
/// * `ctx` - Run context; supplies the pool width, spec footer and fallback series
/// * `category` - Job name, used in logs and failure records
/// * `product_urls` - Deduplicated product URLs; a record's index is its 1-based position here
/// * `image_sink` - Receives one [`ImageTask`] per distinct (series, code) with an image
/// * `span` - Progress range for this stage
pub async fn extract_products(
    parser: Arc<dyn PageParser>,
    ctx: &RunContext,
    category: &str,
    product_urls: &[String],
    image_sink: Option<mpsc::Sender<ImageTask>>,
    span: ProgressSpan,
) -> ExtractOutcome {
    let pool = WorkerPool::new(ctx.config.crawler.max_workers);
    let fallback_series = ctx.config.output.fallback_series.clone();
    let footer = ctx.config.site.spec_footer.clone();

    let items: Vec<(usize, String)> = product_urls
        .iter()
        .enumerate()
        .map(|(i, url)| (i + 1, url.clone()))
        .collect();
    let total = items.len();

    let mut rx = pool.run(items, move |(_, url): (usize, String)| {
        let parser = Arc::clone(&parser);
        async move {
            let (detail, series) = tokio::join!(
                parser.extract_product_detail(&url),
                parser.extract_series(&url)
            );
            (detail, series)
        }
    });

    let mut outcome = ExtractOutcome::default();
    // (series, standardized code) -> position in `outcome.records`
    let mut kept: HashMap<(String, String), usize> = HashMap::new();
    let mut done_count = 0;

    while let Some(done) = rx.recv().await {
        done_count += 1;
        if done_count % 10 == 0 || done_count == total {
            ctx.progress(
                span.at(done_count, total),
                "Extracting product details",
                format!("{}: {}/{} products", category, done_count, total),
            );
        }

        let (index, url) = done.item;
        let (detail, series) = match done.outcome {
            Ok((Ok(detail), series)) => (detail, series),
            Ok((Err(e), _)) => {
                outcome.failed += 1;
                outcome
                    .failures
                    .push(FailureRecord::new(Stage::Extract, category, url, e.to_string()));
                continue;
            }
            Err(panic) => {
                outcome.failed += 1;
                outcome
                    .failures
                    .push(FailureRecord::new(Stage::Extract, category, url, panic));
                continue;
            }
        };

        let series = resolve_series(series, &url, &fallback_series);
        let record = build_record(index, url, detail, series, &footer);
        let key = (record.series.clone(), standardize_code(&record.code));

        if let Some(&pos) = kept.get(&key) {
            // Completion order is arbitrary; the lowest index wins. The image
            // already queued for this key is kept.
            let dropped = if record.index < outcome.records[pos].index {
                std::mem::replace(&mut outcome.records[pos], record)
            } else {
                record
            };
            outcome.duplicates += 1;
            outcome.failures.push(FailureRecord::new(
                Stage::Extract,
                category,
                dropped.source_url.as_str(),
                format!(
                    "duplicate code {} in series {}, kept {}",
                    key.1, key.0, outcome.records[pos].source_url
                ),
            ));
            continue;
        }

        if let (Some(sink), Some(image_url)) = (&image_sink, &record.image_url) {
            let task = ImageTask {
                code: record.code.clone(),
                url: image_url.clone(),
                series: record.series.clone(),
            };
            if sink.send(task).await.is_err() {
                tracing::warn!("Image stage closed early; {} not queued", record.code);
            }
        }

        tracing::debug!("Extracted {} ({})", record.code, record.series);
        kept.insert(key, outcome.records.len());
        outcome.records.push(record);
    }

    drop(image_sink);
    outcome.records.sort_by_key(|r| r.index);
    outcome.unpriced = outcome.records.iter().filter(|r| !r.is_priced()).count();

    RunStats::add(&ctx.stats.products_processed, outcome.records.len());
    RunStats::add(&ctx.stats.products_failed, outcome.failed);
    RunStats::add(&ctx.stats.products_unpriced, outcome.unpriced);
    RunStats::add(&ctx.stats.products_duplicate, outcome.duplicates);

    tracing::info!(
        "{}: {} product(s) extracted, {} unpriced, {} failed, {} duplicate",
        category,
        outcome.records.len(),
        outcome.unpriced,
        outcome.failed,
        outcome.duplicates
    );

    outcome
}

/// Picks the series key, falling back when it is missing or unreadable
fn resolve_series(
    series: Result<Option<String>, HarvestError>,
    url: &str,
    fallback: &str,
) -> String {
    match series {
        Ok(Some(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => fallback.to_string(),
        Err(e) => {
            tracing::debug!("Series lookup failed for {}, using {}: {}", url, fallback, e);
            fallback.to_string()
        }
    }
}

fn build_record(
    index: usize,
    url: String,
    detail: ProductDetail,
    series: String,
    footer: &[(String, String)],
) -> ProductRecord {
    let code = detail
        .code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| code_from_url(&url));

    let price = detail
        .price
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    ProductRecord {
        index,
        code,
        name: detail.name.trim().to_string(),
        price,
        spec: normalize_spec(&detail.spec, footer),
        image_url: detail.image_url.filter(|u| !u.trim().is_empty()),
        series,
        source_url: url,
    }
}
