//! Run statistics and the final report
//!
//! [`RunTotals`] is a frozen copy of the run counters, [`SeriesStats`] one
//! row of the per-series table, and [`RunReport`] the immutable value a run
//! ends with.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Statistics for one series of one category
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub category: String,
    pub series: String,
    /// Number of records in the series
    pub products: usize,
    pub priced: usize,
    pub unpriced: usize,
    /// Images saved or already on disk
    pub images_available: usize,
    pub images_failed: usize,
}

impl SeriesStats {
    /// Share of the series' records with an image available, 0.0–1.0
    pub fn success_ratio(&self) -> f64 {
        ratio(self.images_available as u64, self.products as u64)
    }
}

/// Counter values at the end of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTotals {
    pub urls_processed: u64,
    pub invalid_urls: u64,
    pub categories: u64,
    pub single_products: u64,
    pub pages_discovered: u64,
    pub pages_failed: u64,
    pub products_found: u64,
    pub products_processed: u64,
    pub products_unpriced: u64,
    pub products_failed: u64,
    /// Dropped because their code was already taken in their series
    pub products_duplicate: u64,
    pub series_discovered: u64,
    pub images_success: u64,
    pub images_existing: u64,
    pub images_failed: u64,
    pub elapsed: Duration,
    pub config_hash: Option<String>,
}

impl RunTotals {
    pub fn images_total(&self) -> u64 {
        self.images_success + self.images_existing + self.images_failed
    }

    /// Processed products over found products, as a percentage
    pub fn product_success_rate(&self) -> f64 {
        ratio(self.products_processed, self.products_found) * 100.0
    }

    /// Available images over image tasks, as a percentage
    pub fn image_success_rate(&self) -> f64 {
        ratio(
            self.images_success + self.images_existing,
            self.images_total(),
        ) * 100.0
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// What happened to the run archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    Created(PathBuf),
    /// Packaging failed; every other artifact is still on disk
    Failed { error: String },
    /// Archiving is switched off in the configuration
    Disabled,
}

impl fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => write!(f, "created at {}", path.display()),
            Self::Failed { error } => write!(f, "FAILED: {}", error),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

/// Final outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub run_dir: PathBuf,
    pub totals: RunTotals,
    pub series: Vec<SeriesStats>,
    /// Every file written under the run directory, summary included
    pub artifacts: Vec<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub archive: ArchiveStatus,
    pub failures: usize,
}

impl RunReport {
    pub fn packaging_failed(&self) -> bool {
        matches!(self.archive, ArchiveStatus::Failed { .. })
    }
}

/// Prints the run report to stdout
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_run_report(report: &RunReport) {
    let t = &report.totals;

    println!("=== Harvest Report ===\n");
    println!("Run started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Elapsed: {:.1}s", t.elapsed.as_secs_f64());
    if let Some(hash) = &t.config_hash {
        println!("Config hash: {}", hash);
    }
    println!();

    println!("Input:");
    println!("  URLs processed: {}", t.urls_processed);
    println!("  Invalid URLs: {}", t.invalid_urls);
    println!("  Categories: {}", t.categories);
    println!("  Direct product URLs: {}", t.single_products);
    println!();

    println!("Pages:");
    println!("  Listing pages: {}", t.pages_discovered);
    println!("  Failed pages: {}", t.pages_failed);
    println!();

    println!("Products:");
    println!("  Found: {}", t.products_found);
    println!(
        "  Processed: {} ({:.1}%)",
        t.products_processed,
        t.product_success_rate()
    );
    println!("  Without price: {}", t.products_unpriced);
    println!("  Failed: {}", t.products_failed);
    println!("  Duplicate codes: {}", t.products_duplicate);
    println!("  Series: {}", t.series_discovered);
    println!();

    println!("Images:");
    println!(
        "  Saved: {}, already present: {}, failed: {} ({:.1}% available)",
        t.images_success,
        t.images_existing,
        t.images_failed,
        t.image_success_rate()
    );
    println!();

    if !report.series.is_empty() {
        println!("Series:");
        for row in &report.series {
            println!(
                "  {}/{}: {} product(s), {} unpriced, {:.0}% images",
                row.category,
                row.series,
                row.products,
                row.unpriced,
                row.success_ratio() * 100.0
            );
        }
        println!();
    }

    println!("Output: {}", report.run_dir.display());
    if let Some(summary) = &report.summary_path {
        println!("Summary: {}", summary.display());
    }
    println!("Archive: {}", report.archive);
    if report.failures > 0 {
        println!("Errors logged: {} (see the errors sheet)", report.failures);
    }
}
