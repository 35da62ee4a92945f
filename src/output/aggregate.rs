//! Aggregation of stage results into report artifacts
//!
//! Per category: one workbook per series, one category workbook with a
//! products and an images sheet, and the collected URL list. After all
//! categories: the run summary workbook.

use super::stats::{RunTotals, SeriesStats};
use super::traits::{Cell, OutputResult, ReportWriter, Table};
use crate::crawler::FailureRecord;
use crate::model::{ImageResult, ProductRecord, SeriesGroup};
use crate::url::{sanitize_component, standardize_code};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// File listing a category's collected product URLs
pub const PRODUCT_URLS_FILE: &str = "product_urls.txt";

/// Category workbook name
pub const CATEGORY_DATA_FILE: &str = "data.xlsx";

/// Run summary workbook name
pub const SUMMARY_FILE: &str = "summary.xlsx";

const PRODUCT_HEADERS: &[&str] = &[
    "Category",
    "No.",
    "Code",
    "Name",
    "Price",
    "Series",
    "Specification",
    "Image URL",
    "Image File",
    "Source URL",
];

const IMAGE_HEADERS: &[&str] = &[
    "Category", "Code", "Series", "Status", "Attempts", "Bytes", "Image URL", "File", "Error",
];

/// Everything one category job produced
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub name: String,
    pub dir: PathBuf,
    pub product_urls: Vec<String>,
    /// Sorted by series name; records inside a group sorted by index
    pub groups: Vec<SeriesGroup>,
    pub images: Vec<ImageResult>,
}

impl CategoryResult {
    /// All records of the category ordered by index
    pub fn records(&self) -> Vec<&ProductRecord> {
        let mut records: Vec<&ProductRecord> =
            self.groups.iter().flat_map(|g| g.records.iter()).collect();
        records.sort_by_key(|r| r.index);
        records
    }
}

/// Groups records by series key
///
/// Records arrive unique per (series, standardized code) from the
/// extractor; grouping keeps every one of them, so the group sizes add up
/// to the processed count.
pub fn group_by_series(mut records: Vec<ProductRecord>) -> Vec<SeriesGroup> {
    records.sort_by_key(|r| r.index);

    let mut groups: BTreeMap<String, SeriesGroup> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.series.clone())
            .or_insert_with(|| SeriesGroup::new(record.series.clone()))
            .records
            .push(record);
    }

    groups.into_values().collect()
}

/// Builds the per-series statistics rows of one category
pub fn series_stats(category: &str, groups: &[SeriesGroup], images: &[ImageResult]) -> Vec<SeriesStats> {
    let mut image_counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for image in images {
        let entry = image_counts.entry(image.series.as_str()).or_default();
        if image.status.is_available() {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }

    groups
        .iter()
        .map(|group| {
            let (available, failed) = image_counts
                .get(group.name.as_str())
                .copied()
                .unwrap_or_default();
            SeriesStats {
                category: category.to_string(),
                series: group.name.clone(),
                products: group.records.len(),
                priced: group.priced_count(),
                unpriced: group.unpriced_count(),
                images_available: available,
                images_failed: failed,
            }
        })
        .collect()
}

/// Image results keyed by (series, standardized product code)
fn image_index(images: &[ImageResult]) -> HashMap<(&str, String), &ImageResult> {
    images
        .iter()
        .map(|image| ((image.series.as_str(), standardize_code(&image.code)), image))
        .collect()
}

fn relative_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn push_product_rows<'a>(
    table: &mut Table,
    category: &CategoryResult,
    records: impl IntoIterator<Item = &'a ProductRecord>,
) {
    let images = image_index(&category.images);

    for record in records {
        let image_file = images
            .get(&(record.series.as_str(), standardize_code(&record.code)))
            .filter(|image| image.status.is_available())
            .map(|image| relative_path(&image.local_path, &category.dir));

        table.push_row(vec![
            category.name.as_str().into(),
            record.index.into(),
            record.code.as_str().into(),
            record.name.as_str().into(),
            record.price.clone().into(),
            record.series.as_str().into(),
            record.spec.as_str().into(),
            record.image_url.clone().into(),
            image_file.into(),
            record.source_url.as_str().into(),
        ]);
    }
}

fn push_image_rows(table: &mut Table, category: &CategoryResult) {
    for image in &category.images {
        table.push_row(vec![
            category.name.as_str().into(),
            image.code.as_str().into(),
            image.series.as_str().into(),
            image.status.as_str().into(),
            image.attempts.into(),
            image.bytes.into(),
            image.url.as_str().into(),
            relative_path(&image.local_path, &category.dir).into(),
            image.error.clone().into(),
        ]);
    }
}

/// Table of per-series statistics
pub fn series_stats_table(rows: &[SeriesStats]) -> Table {
    let mut table = Table::new(
        "series_stats",
        &[
            "Category",
            "Series",
            "Products",
            "Priced",
            "Unpriced",
            "Images",
            "Images Failed",
            "Success Ratio",
        ],
    );
    for row in rows {
        table.push_row(vec![
            row.category.as_str().into(),
            row.series.as_str().into(),
            row.products.into(),
            row.priced.into(),
            row.unpriced.into(),
            row.images_available.into(),
            row.images_failed.into(),
            row.success_ratio().into(),
        ]);
    }
    table
}

/// Two-column metric table of the run counters
pub fn run_stats_table(totals: &RunTotals) -> Table {
    let mut table = Table::new("run_stats", &["Metric", "Value"]);
    let counts: [(&str, u64); 15] = [
        ("URLs processed", totals.urls_processed),
        ("Invalid URLs", totals.invalid_urls),
        ("Categories", totals.categories),
        ("Direct product URLs", totals.single_products),
        ("Listing pages", totals.pages_discovered),
        ("Failed listing pages", totals.pages_failed),
        ("Products found", totals.products_found),
        ("Products processed", totals.products_processed),
        ("Products without price", totals.products_unpriced),
        ("Products failed", totals.products_failed),
        ("Duplicate product codes", totals.products_duplicate),
        ("Series discovered", totals.series_discovered),
        ("Images saved", totals.images_success),
        ("Images already present", totals.images_existing),
        ("Images failed", totals.images_failed),
    ];
    for (metric, value) in counts {
        table.push_row(vec![metric.into(), value.into()]);
    }

    table.push_row(vec![
        "Product success rate (%)".into(),
        totals.product_success_rate().into(),
    ]);
    table.push_row(vec![
        "Image success rate (%)".into(),
        totals.image_success_rate().into(),
    ]);
    table.push_row(vec![
        "Elapsed (s)".into(),
        totals.elapsed.as_secs_f64().into(),
    ]);
    table.push_row(vec![
        "Config hash".into(),
        totals.config_hash.clone().into(),
    ]);
    table
}

/// Structured error log table
pub fn failures_table(failures: &[FailureRecord]) -> Table {
    let mut table = Table::new("errors", &["Stage", "Category", "URL", "Message"]);
    for failure in failures {
        table.push_row(vec![
            failure.stage.as_str().into(),
            failure.category.as_str().into(),
            failure.url.as_str().into(),
            failure.message.as_str().into(),
        ]);
    }
    table
}

/// Writes one category's artifacts into its directory
///
/// # Arguments
///
/// * `writer` - Spreadsheet writer
/// * `category` - The category's grouped records and image results
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the files written
/// * `Err(OutputError)` - A file could not be written
pub fn write_category_artifacts(
    writer: &dyn ReportWriter,
    category: &CategoryResult,
) -> OutputResult<Vec<PathBuf>> {
    fs::create_dir_all(&category.dir)?;
    let mut written = Vec::new();

    let urls_path = category.dir.join(PRODUCT_URLS_FILE);
    let mut listing = category.product_urls.join("\n");
    if !listing.is_empty() {
        listing.push('\n');
    }
    fs::write(&urls_path, listing)?;
    written.push(urls_path);

    for group in &category.groups {
        let path = category
            .dir
            .join(format!("{}_data.xlsx", sanitize_component(&group.name)));
        let mut table = Table::new("products", PRODUCT_HEADERS);
        push_product_rows(&mut table, category, &group.records);
        writer.write_tables(&path, &[table])?;
        written.push(path);
    }

    let mut products = Table::new("products", PRODUCT_HEADERS);
    push_product_rows(&mut products, category, category.records());
    let mut images = Table::new("images", IMAGE_HEADERS);
    push_image_rows(&mut images, category);

    let data_path = category.dir.join(CATEGORY_DATA_FILE);
    writer.write_tables(&data_path, &[products, images])?;
    written.push(data_path);

    tracing::info!(
        "{}: wrote {} artifact(s) for {} series",
        category.name,
        written.len(),
        category.groups.len()
    );
    Ok(written)
}

/// Writes the run summary workbook
///
/// Sheets: products, series_stats, run_stats, image_report, errors.
pub fn write_summary(
    writer: &dyn ReportWriter,
    path: &Path,
    categories: &[CategoryResult],
    series: &[SeriesStats],
    totals: &RunTotals,
    failures: &[FailureRecord],
) -> OutputResult<()> {
    let mut products = Table::new("products", PRODUCT_HEADERS);
    let mut images = Table::new("image_report", IMAGE_HEADERS);
    for category in categories {
        push_product_rows(&mut products, category, category.records());
        push_image_rows(&mut images, category);
    }

    let tables = [
        products,
        series_stats_table(series),
        run_stats_table(totals),
        images,
        failures_table(failures),
    ];
    writer.write_tables(path, &tables)?;

    tracing::info!("Summary written to {}", path.display());
    Ok(())
}
