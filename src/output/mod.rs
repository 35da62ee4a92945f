//! Output module for run artifacts and reports
//!
//! This module handles:
//! - Grouping records by series and building report tables
//! - Writing per-series, per-category and summary workbooks
//! - Run statistics and the final report
//! - Packaging the run directory into one archive

pub mod aggregate;
mod archive;
pub mod stats;
mod traits;
mod xlsx;

pub use aggregate::{
    group_by_series, series_stats, write_category_artifacts, write_summary, CategoryResult,
    SUMMARY_FILE,
};
pub use archive::package_run;
pub use stats::{print_run_report, ArchiveStatus, RunReport, RunTotals, SeriesStats};
pub use traits::{Cell, OutputError, OutputResult, ReportWriter, Table};
pub use xlsx::XlsxReportWriter;
