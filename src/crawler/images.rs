//! Image fetching with bounded retry
//!
//! One image per product code, stored at
//! `<category>/<series>/images/<CODE>.<ext>`. A non-empty file already at
//! that path is reported as `AlreadyExists` without touching the network.
//! Otherwise the codec gets at most `max_retries` attempts with the capped
//! backoff schedule between them.

use super::context::{FailureRecord, RunContext, RunStats, Stage};
use super::pool::WorkerPool;
use crate::codec::{ImageCodec, ImageFormat};
use crate::config::CrawlerConfig;
use crate::model::{ImageResult, ImageStatus, ImageTask};
use crate::url::{sanitize_component, standardize_code};
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Results of one category's image stage
#[derive(Debug, Default)]
pub struct ImageOutcome {
    /// Sorted by series, then code
    pub results: Vec<ImageResult>,
    pub failures: Vec<FailureRecord>,
}

impl ImageOutcome {
    pub fn count(&self, status: ImageStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Destination of a product image inside a category directory
pub fn image_path(category_dir: &Path, series: &str, code: &str, format: ImageFormat) -> PathBuf {
    category_dir
        .join(sanitize_component(series))
        .join("images")
        .join(format!("{}.{}", standardize_code(code), format.extension()))
}

/// Fetches product images for one category directory
#[derive(Clone)]
pub struct ImageFetcher {
    codec: Arc<dyn ImageCodec>,
    format: ImageFormat,
    crawler: CrawlerConfig,
    category_dir: PathBuf,
}

impl ImageFetcher {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        format: ImageFormat,
        crawler: CrawlerConfig,
        category_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            codec,
            format,
            crawler,
            category_dir: category_dir.into(),
        }
    }

    /// Fetches one image, retrying up to `max_retries` times
    ///
    /// Never returns an error: the outcome is recorded in the result.
    pub async fn fetch_one(&self, task: ImageTask) -> ImageResult {
        let dest = image_path(&self.category_dir, &task.series, &task.code, self.format);
        let max_retries = self.crawler.max_retries.max(1);

        let mut result = ImageResult {
            code: task.code.clone(),
            series: task.series.clone(),
            url: task.url.clone(),
            local_path: dest.clone(),
            status: ImageStatus::Failed,
            attempts: 0,
            bytes: 0,
            error: None,
        };

        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            if meta.is_file() && meta.len() > 0 {
                tracing::debug!("{} already on disk at {}", task.code, dest.display());
                result.status = ImageStatus::AlreadyExists;
                return result;
            }
        }

        for attempt in 1..=max_retries {
            result.attempts = attempt;

            match self.attempt(&task.url, &dest).await {
                Ok(bytes) => {
                    tracing::debug!(
                        "Saved image for {} ({} bytes, attempt {})",
                        task.code,
                        bytes,
                        attempt
                    );
                    result.status = ImageStatus::Success;
                    result.bytes = bytes;
                    result.error = None;
                    return result;
                }
                Err(e) => {
                    tracing::debug!(
                        "Image attempt {}/{} failed for {}: {}",
                        attempt,
                        max_retries,
                        task.code,
                        e
                    );
                    result.error = Some(e.to_string());
                    if attempt < max_retries {
                        tokio::time::sleep(self.crawler.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        result
    }

    async fn attempt(&self, url: &str, dest: &Path) -> Result<u64, HarvestError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        self.codec.fetch_and_encode(url, dest, self.format).await
    }

    /// Fetches images as tasks arrive until the sender side closes
    ///
    /// # Arguments
    ///
    /// * `ctx` - Run context; receives image counters
    /// * `category` - Job name, used in failure records
    /// * `tasks` - Image tasks, typically fed by the extractor
    pub async fn fetch_stream(
        &self,
        ctx: &RunContext,
        category: &str,
        tasks: mpsc::Receiver<ImageTask>,
    ) -> ImageOutcome {
        let pool = WorkerPool::new(ctx.config.crawler.max_workers);
        let fetcher = self.clone();
        let mut rx = pool.run_stream(tasks, move |task: ImageTask| {
            let fetcher = fetcher.clone();
            async move { fetcher.fetch_one(task).await }
        });

        let mut outcome = ImageOutcome::default();
        while let Some(done) = rx.recv().await {
            let result = match done.outcome {
                Ok(result) => result,
                Err(panic) => ImageResult {
                    local_path: image_path(
                        &self.category_dir,
                        &done.item.series,
                        &done.item.code,
                        self.format,
                    ),
                    code: done.item.code,
                    series: done.item.series,
                    url: done.item.url,
                    status: ImageStatus::Failed,
                    attempts: self.crawler.max_retries.max(1),
                    bytes: 0,
                    error: Some(panic),
                },
            };

            match result.status {
                ImageStatus::Success => RunStats::add(&ctx.stats.images_success, 1),
                ImageStatus::AlreadyExists => RunStats::add(&ctx.stats.images_existing, 1),
                ImageStatus::Failed => {
                    RunStats::add(&ctx.stats.images_failed, 1);
                    outcome.failures.push(FailureRecord::new(
                        Stage::Image,
                        category,
                        result.url.clone(),
                        format!(
                            "{} after {} attempt(s): {}",
                            result.code,
                            result.attempts,
                            result.error.as_deref().unwrap_or("unknown error")
                        ),
                    ));
                }
            }
            outcome.results.push(result);
        }

        outcome
            .results
            .sort_by(|a, b| (&a.series, &a.code).cmp(&(&b.series, &b.code)));

        tracing::info!(
            "{}: images {} saved, {} already present, {} failed",
            category,
            outcome.count(ImageStatus::Success),
            outcome.count(ImageStatus::AlreadyExists),
            outcome.count(ImageStatus::Failed)
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::tests_support::{test_context, FakeCodec};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn task(code: &str, series: &str) -> ImageTask {
        ImageTask {
            code: code.to_string(),
            url: format!("https://cdn.shop.test/{}.jpg", code),
            series: series.to_string(),
        }
    }

    fn fetcher(codec: Arc<FakeCodec>, dir: &Path) -> ImageFetcher {
        let ctx = test_context();
        ImageFetcher::new(codec, ImageFormat::Webp, ctx.config.crawler.clone(), dir)
    }

    #[test]
    fn test_image_path_layout() {
        let path = image_path(Path::new("/run/relays"), "MY Series", "ab 12", ImageFormat::Png);
        assert_eq!(path, Path::new("/run/relays/MY Series/images/AB-12.png"));
    }

    #[tokio::test]
    async fn test_existing_file_is_not_refetched() {
        let dir = TempDir::new().unwrap();
        let codec = Arc::new(FakeCodec::succeeding());
        let fetcher = fetcher(Arc::clone(&codec), dir.path());

        let dest = image_path(dir.path(), "E3Z", "E3Z-D61", ImageFormat::Webp);
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, vec![7u8; 12_345]).unwrap();

        let result = fetcher.fetch_one(task("E3Z-D61", "E3Z")).await;

        assert_eq!(result.status, ImageStatus::AlreadyExists);
        assert_eq!(result.attempts, 0);
        assert_eq!(result.bytes, 0);
        assert_eq!(codec.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 12_345);
    }

    #[tokio::test]
    async fn test_empty_file_is_refetched() {
        let dir = TempDir::new().unwrap();
        let codec = Arc::new(FakeCodec::succeeding());
        let fetcher = fetcher(Arc::clone(&codec), dir.path());

        let dest = image_path(dir.path(), "S", "A1", ImageFormat::Webp);
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"").unwrap();

        let result = fetcher.fetch_one(task("A1", "S")).await;
        assert_eq!(result.status, ImageStatus::Success);
        assert_eq!(result.attempts, 1);
    }

    #[tokio::test]
    async fn test_failed_image_uses_exactly_max_retries() {
        let dir = TempDir::new().unwrap();
        let codec = Arc::new(FakeCodec::failing());
        let fetcher = fetcher(Arc::clone(&codec), dir.path());

        let result = fetcher.fetch_one(task("BAD", "S")).await;

        assert_eq!(result.status, ImageStatus::Failed);
        assert_eq!(result.attempts, 3);
        assert_eq!(codec.calls.load(Ordering::SeqCst), 3);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let dir = TempDir::new().unwrap();
        let codec = Arc::new(FakeCodec::flaky(1));
        let fetcher = fetcher(Arc::clone(&codec), dir.path());

        let result = fetcher.fetch_one(task("OK", "S")).await;

        assert_eq!(result.status, ImageStatus::Success);
        assert_eq!(result.attempts, 2);
        assert!(result.bytes > 0);
        assert!(result.local_path.exists());
    }

    #[tokio::test]
    async fn test_stream_accounting() {
        let dir = TempDir::new().unwrap();
        let codec = Arc::new(FakeCodec::failing_for(&["https://cdn.shop.test/B2.jpg"]));
        let fetcher = fetcher(Arc::clone(&codec), dir.path());
        let ctx = test_context();

        let existing = image_path(dir.path(), "S", "C3", ImageFormat::Webp);
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"webp").unwrap();

        let (tx, rx) = mpsc::channel(8);
        for (code, series) in [("A1", "S"), ("B2", "S"), ("C3", "S"), ("D4", "T")] {
            tx.send(task(code, series)).await.unwrap();
        }
        drop(tx);

        let outcome = fetcher.fetch_stream(&ctx, "cat", rx).await;

        let success = outcome.count(ImageStatus::Success);
        let failed = outcome.count(ImageStatus::Failed);
        let existing = outcome.count(ImageStatus::AlreadyExists);
        assert_eq!((success, failed, existing), (2, 1, 1));
        assert_eq!(success + failed + existing, 4);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.results.iter().all(|r| r.attempts <= 3));
        assert_eq!(ctx.stats.images_failed.load(Ordering::Relaxed), 1);
    }
}
