//! Pipeline coordinator - run orchestration
//!
//! One [`Pipeline::run`] call handles one seed list:
//! - Classifying seeds into category jobs and one direct product job
//! - Running each job through collection, extraction and image fetching
//! - Writing per-category artifacts and the run summary
//! - Packaging the run directory into one archive
//!
//! Jobs run one after another; the stages inside a job fan out through
//! their own worker pools. Extraction and image fetching of a job overlap,
//! connected by a bounded channel.

use super::collector::collect_product_urls;
use super::context::{FailureRecord, ProgressSpan, RunContext, RunStats, Stage};
use super::extractor::extract_products;
use super::fetcher::build_http_client;
use super::images::ImageFetcher;
use crate::codec::{HttpImageCodec, ImageCodec, ImageFormat};
use crate::config::Config;
use crate::model::{CategoryJob, SINGLE_PRODUCTS_JOB};
use crate::output::{
    group_by_series, package_run, series_stats, write_category_artifacts, write_summary,
    ArchiveStatus, CategoryResult, ReportWriter, RunReport, XlsxReportWriter, SUMMARY_FILE,
};
use crate::parser::{HtmlPageParser, PageParser};
use crate::progress::ProgressObserver;
use crate::url::{category_name_from_url, parse_http_url, sanitize_component, CrawlTarget, UrlKind};
use crate::HarvestError;
use chrono::Local;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Image tasks buffered between the extractor and the image fetcher
const IMAGE_QUEUE_DEPTH: usize = 64;

/// Seeds sorted into jobs
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    /// Every seed that parsed as an HTTP(S) URL, with its kind
    pub targets: Vec<CrawlTarget>,
    /// Category jobs in first-seen order; same-named categories share a job
    pub jobs: Vec<CategoryJob>,
    /// Product URLs given directly as seeds
    pub direct: Option<CategoryJob>,
    /// Seeds that are neither categories nor products
    pub invalid: Vec<String>,
}

impl RunPlan {
    /// Number of category source URLs
    pub fn category_sources(&self) -> usize {
        self.jobs.iter().map(|j| j.source_urls.len()).sum()
    }

    /// Number of direct product URLs
    pub fn direct_products(&self) -> usize {
        self.direct.as_ref().map_or(0, |j| j.product_urls.len())
    }

    /// All jobs in run order, the direct job last
    pub fn into_jobs(self) -> Vec<CategoryJob> {
        let mut jobs = self.jobs;
        jobs.extend(self.direct);
        jobs
    }
}

/// Runs seed lists through the full harvest pipeline
pub struct Pipeline {
    config: Arc<Config>,
    parser: Arc<dyn PageParser>,
    codec: Arc<dyn ImageCodec>,
    writer: Arc<dyn ReportWriter>,
    observer: Arc<dyn ProgressObserver>,
    image_format: ImageFormat,
    config_hash: Option<String>,
    run_dir: Option<PathBuf>,
}

impl Pipeline {
    /// Creates a pipeline from its collaborators
    ///
    /// Artifacts are written as `.xlsx` unless another writer is set with
    /// [`Pipeline::with_report_writer`].
    pub fn new(
        config: Config,
        parser: Arc<dyn PageParser>,
        codec: Arc<dyn ImageCodec>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        let image_format =
            ImageFormat::from_name(&config.output.image_format).unwrap_or(ImageFormat::Webp);
        Self {
            config: Arc::new(config),
            parser,
            codec,
            writer: Arc::new(XlsxReportWriter),
            observer,
            image_format,
            config_hash: None,
            run_dir: None,
        }
    }

    /// Creates a pipeline with the HTML parser and HTTP image codec
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `observer` - Receives progress milestones
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built or a pattern is invalid
    pub fn from_config(
        config: Config,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<Self, HarvestError> {
        let client = build_http_client(&config.user_agent, &config.crawler)?;
        let parser = HtmlPageParser::new(client.clone(), &config.site)?;
        let codec = HttpImageCodec::new(client);
        Ok(Self::new(config, Arc::new(parser), Arc::new(codec), observer))
    }

    pub fn with_report_writer(mut self, writer: Arc<dyn ReportWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Records the configuration file hash in the run statistics
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Uses `dir` instead of a timestamped directory under the output root
    pub fn with_run_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.run_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classifies seeds and groups them into jobs without any network access
    pub fn plan(&self, seeds: &[String]) -> RunPlan {
        let mut plan = RunPlan::default();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        for seed in seeds {
            let url = match parse_http_url(seed) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    tracing::debug!("Rejecting seed {}: {}", seed, e);
                    plan.invalid.push(seed.clone());
                    continue;
                }
            };

            let kind = self.parser.classify(&url);
            match kind {
                UrlKind::Category => {
                    let name = category_name_from_url(&url);
                    let slot = *by_name.entry(name.clone()).or_insert_with(|| {
                        plan.jobs.push(CategoryJob::new(name));
                        plan.jobs.len() - 1
                    });
                    plan.jobs[slot].add_source(&url);
                }
                UrlKind::Product => {
                    let job = plan
                        .direct
                        .get_or_insert_with(|| CategoryJob::new(SINGLE_PRODUCTS_JOB));
                    if !job.product_urls.contains(&url) {
                        job.product_urls.push(url.clone());
                    }
                }
                UrlKind::Invalid => plan.invalid.push(seed.clone()),
            }

            if kind.is_crawlable() {
                plan.targets.push(CrawlTarget::new(url, kind));
            }
        }

        plan
    }

    /// Runs one seed list to completion
    ///
    /// Per-item failures never abort the run; they are counted and listed
    /// in the summary's errors sheet. A packaging failure is reported in
    /// [`RunReport::archive`] while every other artifact stays on disk.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished
    /// * `Err(HarvestError)` - The run directory could not be created
    pub async fn run(&self, seeds: &[String]) -> Result<RunReport, HarvestError> {
        let ctx = RunContext::new(Arc::clone(&self.config), Arc::clone(&self.observer));
        let started_at = Local::now();
        let run_dir = self.run_dir.clone().unwrap_or_else(|| {
            Path::new(&self.config.output.output_root)
                .join(format!("run_{}", started_at.format("%Y%m%d_%H%M%S")))
        });
        tokio::fs::create_dir_all(&run_dir).await?;

        ctx.progress(0, "Starting run", run_dir.display().to_string());
        tracing::info!("Run directory: {}", run_dir.display());

        let plan = self.plan(seeds);
        let mut failures: Vec<FailureRecord> = plan
            .invalid
            .iter()
            .map(|url| {
                FailureRecord::new(Stage::Classify, "", url.as_str(), "not a category or product URL")
            })
            .collect();

        RunStats::add(&ctx.stats.urls_processed, seeds.len());
        RunStats::add(&ctx.stats.invalid_urls, plan.invalid.len());
        RunStats::add(&ctx.stats.categories, plan.jobs.len());
        RunStats::add(&ctx.stats.single_products, plan.direct_products());

        ctx.progress(
            5,
            "Classified seed URLs",
            format!(
                "{} category job(s) from {} URL(s), {} direct product(s), {} invalid",
                plan.jobs.len(),
                plan.category_sources(),
                plan.direct_products(),
                plan.invalid.len()
            ),
        );

        let jobs = plan.into_jobs();
        let job_count = jobs.len();
        let span = ProgressSpan::new(5, 90);

        let mut categories = Vec::with_capacity(job_count);
        let mut series_rows = Vec::new();
        let mut artifacts = Vec::new();

        for (i, job) in jobs.into_iter().enumerate() {
            let job_span = span.part(i, job_count);
            let (result, job_failures) = self.run_job(&ctx, job, &run_dir, job_span).await;
            failures.extend(job_failures);
            series_rows.extend(series_stats(&result.name, &result.groups, &result.images));

            let shared = Arc::new(result);
            let writer = Arc::clone(&self.writer);
            let category = Arc::clone(&shared);
            let written = tokio::task::spawn_blocking(move || {
                write_category_artifacts(writer.as_ref(), &category)
            })
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| e.to_string()));

            match written {
                Ok(paths) => artifacts.extend(paths),
                Err(message) => failures.push(FailureRecord::new(
                    Stage::Report,
                    &shared.name,
                    shared.dir.display().to_string(),
                    message,
                )),
            }

            ctx.progress(
                job_span.end,
                "Finished category",
                format!("{} ({}/{})", shared.name, i + 1, job_count),
            );
            categories.push(Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone()));
        }

        ctx.progress(95, "Writing summary", SUMMARY_FILE);
        let mut totals = ctx.stats.snapshot(ctx.elapsed(), self.config_hash.clone());
        let summary_path = run_dir.join(SUMMARY_FILE);

        let summary = {
            let writer = Arc::clone(&self.writer);
            let path = summary_path.clone();
            let series = series_rows.clone();
            let totals = totals.clone();
            let logged = failures.clone();
            tokio::task::spawn_blocking(move || {
                write_summary(writer.as_ref(), &path, &categories, &series, &totals, &logged)
            })
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| e.to_string()))
        };

        let summary_path = match summary {
            Ok(()) => {
                artifacts.push(summary_path.clone());
                Some(summary_path)
            }
            Err(message) => {
                failures.push(FailureRecord::new(
                    Stage::Report,
                    "",
                    summary_path.display().to_string(),
                    message,
                ));
                None
            }
        };

        let archive = self.package(&ctx, &run_dir).await;
        totals.elapsed = ctx.elapsed();

        ctx.progress(
            100,
            "Run complete",
            format!(
                "{} product(s), {} image(s) available",
                totals.products_processed,
                totals.images_success + totals.images_existing
            ),
        );
        tracing::info!(
            "Run finished in {:.1}s: {} product(s) processed, {} failure(s) logged",
            totals.elapsed.as_secs_f64(),
            totals.products_processed,
            failures.len()
        );

        Ok(RunReport {
            started_at,
            run_dir,
            totals,
            series: series_rows,
            artifacts,
            summary_path,
            archive,
            failures: failures.len(),
        })
    }

    /// Collects, extracts and fetches images for one job
    async fn run_job(
        &self,
        ctx: &RunContext,
        mut job: CategoryJob,
        run_dir: &Path,
        span: ProgressSpan,
    ) -> (CategoryResult, Vec<FailureRecord>) {
        let mut failures = Vec::new();
        tracing::info!(
            "Starting job {} ({} source URL(s))",
            job.name,
            job.source_urls.len()
        );

        if !job.is_direct() {
            let collected = collect_product_urls(
                Arc::clone(&self.parser),
                ctx,
                &job.name,
                &job.source_urls,
                span.part(0, 2),
            )
            .await;
            job.discovered_pages = collected.discovered_pages;
            job.product_urls = collected.product_urls;
            failures.extend(collected.failures);
            tracing::debug!(
                "{}: {} listing page(s) discovered",
                job.name,
                job.total_pages()
            );
        }
        RunStats::add(&ctx.stats.products_found, job.product_urls.len());

        let category_dir = run_dir.join(sanitize_component(&job.name));
        let fetcher = ImageFetcher::new(
            Arc::clone(&self.codec),
            self.image_format,
            ctx.config.crawler.clone(),
            category_dir.clone(),
        );

        let (image_tx, image_rx) = mpsc::channel(IMAGE_QUEUE_DEPTH);
        let (extracted, images) = tokio::join!(
            extract_products(
                Arc::clone(&self.parser),
                ctx,
                &job.name,
                &job.product_urls,
                Some(image_tx),
                span.part(1, 2),
            ),
            fetcher.fetch_stream(ctx, &job.name, image_rx),
        );

        failures.extend(extracted.failures);
        failures.extend(images.failures);

        let groups = group_by_series(extracted.records);
        RunStats::add(&ctx.stats.series_discovered, groups.len());

        let result = CategoryResult {
            name: job.name,
            dir: category_dir,
            product_urls: job.product_urls,
            groups,
            images: images.results,
        };
        (result, failures)
    }

    async fn package(&self, ctx: &RunContext, run_dir: &Path) -> ArchiveStatus {
        if !self.config.output.archive {
            return ArchiveStatus::Disabled;
        }

        let name = run_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "run".to_string());
        let archive_path = run_dir.with_file_name(format!("{}.zip", name));
        ctx.progress(97, "Packaging run", archive_path.display().to_string());

        let dir = run_dir.to_path_buf();
        let packaged =
            tokio::task::spawn_blocking(move || package_run(&dir, &archive_path)).await;

        let error = match packaged {
            Ok(Ok(path)) => return ArchiveStatus::Created(path),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        tracing::error!(
            "{}",
            HarvestError::Packaging(format!("{}: {}", run_dir.display(), error))
        );
        ArchiveStatus::Failed { error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::tests_support::{detail, test_config, FakeCodec, FakeParser};
    use crate::output::{OutputError, OutputResult, Table};
    use crate::progress::{NoopObserver, ProgressEvent};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn seeds(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn shop() -> FakeParser {
        let cat_a = "https://shop.test/category/sensors_1";
        let cat_b = "https://shop.test/category/sensors_2";
        let mut parser = FakeParser::default()
            .category(cat_a, 2)
            .listing(
                cat_a,
                vec![
                    "https://shop.test/product/a".to_string(),
                    "https://shop.test/product/b".to_string(),
                ],
            )
            .listing(
                &format!("{}?page=2", cat_a),
                vec!["https://shop.test/product/c".to_string()],
            )
            .listing(
                cat_b,
                vec![
                    "https://shop.test/product/c".to_string(),
                    "https://shop.test/product/d".to_string(),
                ],
            );

        for (code, price, series) in [
            ("a", Some("10"), Some("E3Z")),
            ("b", None, Some("E3Z")),
            ("c", Some("12"), None),
            ("d", Some("9"), Some("E2E")),
            ("solo", Some("1"), Some("G2R")),
        ] {
            parser = parser.product(
                &format!("https://shop.test/product/{}", code),
                detail(code, price),
                series,
            );
        }
        parser
    }

    fn pipeline(parser: FakeParser, codec: FakeCodec) -> Pipeline {
        Pipeline::new(
            test_config(),
            Arc::new(parser),
            Arc::new(codec),
            Arc::new(NoopObserver),
        )
    }

    #[test]
    fn test_plan_groups_seeds() {
        let pipeline = pipeline(FakeParser::default(), FakeCodec::succeeding());
        let plan = pipeline.plan(&seeds(&[
            "https://shop.test/category/sensors_1",
            "https://shop.test/category/relays",
            "https://shop.test/category/sensors_2",
            "https://shop.test/product/p1",
            "https://shop.test/product/p1",
            "https://shop.test/about",
            "not a url",
        ]));

        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.jobs[0].name, "sensors");
        assert_eq!(plan.jobs[0].source_urls.len(), 2);
        assert_eq!(plan.jobs[1].name, "relays");
        assert_eq!(plan.direct_products(), 1);
        assert_eq!(plan.invalid.len(), 2);
        assert_eq!(plan.targets.len(), 5);

        let jobs = plan.into_jobs();
        assert_eq!(jobs.last().unwrap().name, SINGLE_PRODUCTS_JOB);
    }

    #[tokio::test]
    async fn test_full_run_with_fakes() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("run_test");

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer: Arc<dyn ProgressObserver> =
            Arc::new(move |e: &ProgressEvent| sink.lock().unwrap().push(e.percent));

        let pipeline = Pipeline::new(
            test_config(),
            Arc::new(shop()),
            Arc::new(FakeCodec::succeeding()),
            observer,
        )
        .with_run_dir(&run_dir)
        .with_config_hash("abc123");

        let report = pipeline
            .run(&seeds(&[
                "https://shop.test/category/sensors_1",
                "https://shop.test/category/sensors_2",
                "https://shop.test/product/solo",
                "https://shop.test/contact",
            ]))
            .await
            .unwrap();

        let t = &report.totals;
        assert_eq!(t.urls_processed, 4);
        assert_eq!(t.invalid_urls, 1);
        assert_eq!(t.categories, 1);
        assert_eq!(t.single_products, 1);
        assert_eq!(t.products_found, 5);
        assert_eq!(t.products_processed, 5);
        assert_eq!(t.products_unpriced, 1);
        assert_eq!(t.images_success, 5);
        assert_eq!(t.config_hash.as_deref(), Some("abc123"));

        let sensors: usize = report
            .series
            .iter()
            .filter(|s| s.category == "sensors")
            .map(|s| s.products)
            .sum();
        assert_eq!(sensors, 4);
        assert!(report
            .series
            .iter()
            .any(|s| s.category == "sensors" && s.series == "Unknown"));

        assert!(run_dir.join("summary.xlsx").is_file());
        assert!(run_dir.join("sensors").join("data.xlsx").is_file());
        assert!(run_dir.join("sensors").join("E3Z_data.xlsx").is_file());
        assert!(run_dir.join("sensors").join("product_urls.txt").is_file());
        assert!(run_dir
            .join("sensors")
            .join("E3Z")
            .join("images")
            .join("A.webp")
            .is_file());
        assert!(run_dir.join(SINGLE_PRODUCTS_JOB).join("G2R_data.xlsx").is_file());

        assert_eq!(
            report.archive,
            ArchiveStatus::Created(dir.path().join("run_test.zip"))
        );
        assert_eq!(report.failures, 1);

        let seen = events.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_second_run_reuses_images() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("run_repeat");
        let seeds = seeds(&["https://shop.test/product/solo"]);

        let first = pipeline(shop(), FakeCodec::succeeding())
            .with_run_dir(&run_dir)
            .run(&seeds)
            .await
            .unwrap();
        assert_eq!(first.totals.images_success, 1);

        let codec = Arc::new(FakeCodec::succeeding());
        let second = Pipeline::new(
            test_config(),
            Arc::new(shop()),
            Arc::clone(&codec) as Arc<dyn ImageCodec>,
            Arc::new(NoopObserver),
        )
        .with_run_dir(&run_dir)
        .run(&seeds)
        .await
        .unwrap();

        assert_eq!(second.totals.images_existing, 1);
        assert_eq!(second.totals.images_success, 0);
        assert_eq!(codec.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_images_and_products_do_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let parser = shop().failing("https://shop.test/product/b");

        let report = pipeline(parser, FakeCodec::failing())
            .with_run_dir(dir.path().join("run_fail"))
            .run(&seeds(&["https://shop.test/category/sensors_1"]))
            .await
            .unwrap();

        assert_eq!(report.totals.products_found, 3);
        assert_eq!(report.totals.products_processed, 2);
        assert_eq!(report.totals.products_failed, 1);
        assert_eq!(report.totals.images_failed, 2);
        assert_eq!(report.failures, 3);
        assert!(report.summary_path.is_some());
        assert!(!report.packaging_failed());
    }

    #[tokio::test]
    async fn test_packaging_failure_keeps_artifacts() {
        let dir = TempDir::new().unwrap();
        let run_dir = dir.path().join("run_blocked");
        // A directory where the archive should go makes the final rename fail
        std::fs::create_dir_all(dir.path().join("run_blocked.zip")).unwrap();

        let report = pipeline(shop(), FakeCodec::succeeding())
            .with_run_dir(&run_dir)
            .run(&seeds(&["https://shop.test/product/solo"]))
            .await
            .unwrap();

        assert!(report.packaging_failed());
        assert!(run_dir.join("summary.xlsx").is_file());
        assert!(run_dir.join(SINGLE_PRODUCTS_JOB).join("data.xlsx").is_file());
        assert_eq!(report.totals.images_success, 1);
        assert!(report.artifacts.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_archive_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config();
        config.output.archive = false;

        let report = Pipeline::new(
            config,
            Arc::new(shop()),
            Arc::new(FakeCodec::succeeding()),
            Arc::new(NoopObserver),
        )
        .with_run_dir(dir.path().join("run_plain"))
        .run(&seeds(&["https://shop.test/product/solo"]))
        .await
        .unwrap();

        assert_eq!(report.archive, ArchiveStatus::Disabled);
        assert!(!dir.path().join("run_plain.zip").exists());
    }

    struct BrokenWriter;

    impl ReportWriter for BrokenWriter {
        fn write_tables(&self, path: &Path, _tables: &[Table]) -> OutputResult<()> {
            Err(OutputError::Write(format!("disk full: {}", path.display())))
        }
    }

    #[tokio::test]
    async fn test_report_write_failures_are_logged_not_fatal() {
        let dir = TempDir::new().unwrap();

        let report = pipeline(shop(), FakeCodec::succeeding())
            .with_report_writer(Arc::new(BrokenWriter))
            .with_run_dir(dir.path().join("run_broken"))
            .run(&seeds(&["https://shop.test/product/solo"]))
            .await
            .unwrap();

        assert_eq!(report.totals.products_processed, 1);
        assert_eq!(report.totals.images_success, 1);
        assert!(report.summary_path.is_none());
        // One for the category artifacts, one for the summary
        assert_eq!(report.failures, 2);
        assert!(!report.packaging_failed());
    }

    #[tokio::test]
    async fn test_processed_count_matches_series_rows() {
        let dir = TempDir::new().unwrap();
        let cat = "https://shop.test/category/relays";
        let mut second = detail("X", Some("7"));
        second.image_url = Some("https://cdn.shop.test/X-v2.jpg".to_string());
        let parser = FakeParser::default()
            .category(cat, 1)
            .listing(
                cat,
                vec![
                    "https://shop.test/product/relay-x".to_string(),
                    "https://shop.test/product/relay-x-v2".to_string(),
                    "https://shop.test/product/relay-y".to_string(),
                ],
            )
            .product("https://shop.test/product/relay-x", detail("X", Some("5")), Some("S"))
            .product("https://shop.test/product/relay-x-v2", second, Some("S"))
            .product("https://shop.test/product/relay-y", detail("Y", None), Some("S"));

        let report = pipeline(parser, FakeCodec::succeeding())
            .with_run_dir(dir.path().join("run_dupes"))
            .run(&seeds(&[cat]))
            .await
            .unwrap();

        let t = &report.totals;
        let series_sum: usize = report.series.iter().map(|s| s.products).sum();
        assert_eq!(t.products_found, 3);
        assert_eq!(t.products_processed, 2);
        assert_eq!(t.products_duplicate, 1);
        assert_eq!(t.products_processed as usize, series_sum);
        assert_eq!(
            t.products_found,
            t.products_processed + t.products_failed + t.products_duplicate
        );
        assert_eq!(t.images_success, 2);
        assert_eq!(report.failures, 1);
    }
}
