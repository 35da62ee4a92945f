//! Run-wide state shared by the pipeline stages
//!
//! A [`RunContext`] is created per run and passed explicitly to each stage.
//! It holds the typed configuration, the atomic run counters and the
//! progress observer. Per-item failures are collected by each stage's
//! aggregator and handed back to the orchestrator as [`FailureRecord`]s.

use crate::config::Config;
use crate::output::RunTotals;
use crate::progress::{ProgressEvent, ProgressObserver, ProgressTracker};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pipeline stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Pagination,
    Collect,
    Extract,
    Image,
    Report,
    Package,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classify => "classify",
            Self::Pagination => "pagination",
            Self::Collect => "collect",
            Self::Extract => "extract",
            Self::Image => "image",
            Self::Report => "report",
            Self::Package => "package",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the structured error log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub stage: Stage,
    /// Category the failure belongs to, empty for run-level failures
    pub category: String,
    pub url: String,
    pub message: String,
}

impl FailureRecord {
    /// Builds a record and logs it at `warn`
    pub fn new(
        stage: Stage,
        category: &str,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let record = Self {
            stage,
            category: category.to_string(),
            url: url.into(),
            message: message.into(),
        };
        tracing::warn!(
            stage = %record.stage,
            category = %record.category,
            "{} failed for {}: {}",
            record.stage,
            record.url,
            record.message
        );
        record
    }
}

/// Live counters for one run
#[derive(Debug, Default)]
pub struct RunStats {
    pub urls_processed: AtomicU64,
    pub invalid_urls: AtomicU64,
    pub categories: AtomicU64,
    pub single_products: AtomicU64,
    pub pages_discovered: AtomicU64,
    pub pages_failed: AtomicU64,
    pub products_found: AtomicU64,
    pub products_processed: AtomicU64,
    pub products_unpriced: AtomicU64,
    pub products_failed: AtomicU64,
    pub products_duplicate: AtomicU64,
    pub series_discovered: AtomicU64,
    pub images_success: AtomicU64,
    pub images_existing: AtomicU64,
    pub images_failed: AtomicU64,
}

impl RunStats {
    /// Adds `n` to a counter
    pub fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    /// Copies the counters into a plain value
    pub fn snapshot(&self, elapsed: Duration, config_hash: Option<String>) -> RunTotals {
        RunTotals {
            urls_processed: Self::get(&self.urls_processed),
            invalid_urls: Self::get(&self.invalid_urls),
            categories: Self::get(&self.categories),
            single_products: Self::get(&self.single_products),
            pages_discovered: Self::get(&self.pages_discovered),
            pages_failed: Self::get(&self.pages_failed),
            products_found: Self::get(&self.products_found),
            products_processed: Self::get(&self.products_processed),
            products_unpriced: Self::get(&self.products_unpriced),
            products_failed: Self::get(&self.products_failed),
            products_duplicate: Self::get(&self.products_duplicate),
            series_discovered: Self::get(&self.series_discovered),
            images_success: Self::get(&self.images_success),
            images_existing: Self::get(&self.images_existing),
            images_failed: Self::get(&self.images_failed),
            elapsed,
            config_hash,
        }
    }
}

/// A slice of the 0–100 progress range assigned to one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    pub start: u8,
    pub end: u8,
}

impl ProgressSpan {
    pub fn new(start: u8, end: u8) -> Self {
        Self {
            start: start.min(100),
            end: end.clamp(start.min(100), 100),
        }
    }

    /// Percent for `done` out of `total` items inside this span
    pub fn at(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.end;
        }
        let width = (self.end - self.start) as usize;
        self.start + (width * done.min(total) / total) as u8
    }

    /// Splits the span into `parts` consecutive sub-spans and returns the `i`th
    pub fn part(&self, i: usize, parts: usize) -> ProgressSpan {
        let parts = parts.max(1);
        let width = (self.end - self.start) as usize;
        let start = self.start as usize + width * i / parts;
        let end = self.start as usize + width * (i + 1) / parts;
        ProgressSpan::new(start as u8, end as u8)
    }
}

/// Explicit per-run state handed to each stage
pub struct RunContext {
    pub config: Arc<Config>,
    pub stats: RunStats,
    observer: Arc<dyn ProgressObserver>,
    tracker: ProgressTracker,
    started: Instant,
}

impl RunContext {
    pub fn new(config: Arc<Config>, observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            config,
            stats: RunStats::default(),
            observer,
            tracker: ProgressTracker::new(),
            started: Instant::now(),
        }
    }

    /// Publishes a milestone; percentages never move backwards
    pub fn progress(&self, percent: u8, message: impl Into<String>, detail: impl Into<String>) {
        let event = ProgressEvent {
            percent: self.tracker.advance(percent),
            message: message.into(),
            detail: detail.into(),
        };
        self.observer.on_progress(&event);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("stats", &self.stats)
            .field("progress", &self.tracker.current())
            .finish()
    }
}
