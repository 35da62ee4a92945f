//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the Catalog-Harvest product catalog crawler.

use anyhow::{bail, Context};
use catalog_harvest::config::{load_config_with_hash, Config};
use catalog_harvest::crawler::Pipeline;
use catalog_harvest::output::print_run_report;
use catalog_harvest::progress::TracingObserver;
use catalog_harvest::url::parse_seed_list;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Catalog-Harvest: a concurrent product catalog crawler
///
/// Catalog-Harvest reads a list of category and product URLs, collects every
/// product behind the categories, extracts product details and images, and
/// writes per-series and per-category spreadsheets plus a run summary,
/// packaged into one archive.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent product catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Newline-delimited list of category and product URLs
    #[arg(short, long, value_name = "FILE")]
    urls: PathBuf,

    /// Override the output root from the configuration
    #[arg(short, long, value_name = "DIR")]
    output_root: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the planned jobs without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(root) = &cli.output_root {
        config.output.output_root = root.display().to_string();
    }

    let seed_text = std::fs::read_to_string(&cli.urls)
        .with_context(|| format!("failed to read URL list {}", cli.urls.display()))?;
    let seeds = parse_seed_list(&seed_text);
    tracing::info!("Read {} seed URL(s) from {}", seeds.len(), cli.urls.display());

    let pipeline = Pipeline::from_config(config, Arc::new(TracingObserver))
        .context("failed to set up the pipeline")?
        .with_config_hash(config_hash);

    if cli.dry_run {
        handle_dry_run(&pipeline, &seeds);
        return Ok(());
    }

    if seeds.is_empty() {
        bail!("no URLs found in {}", cli.urls.display());
    }

    let report = pipeline.run(&seeds).await.context("run failed")?;
    print_run_report(&report);

    if report.packaging_failed() {
        bail!("packaging failed; artifacts are in {}", report.run_dir.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows configuration and planned jobs
fn handle_dry_run(pipeline: &Pipeline, seeds: &[String]) {
    let config: &Config = pipeline.config();
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.max_workers);
    println!(
        "  Page workers: {} (batches of {})",
        config.crawler.page_workers, config.crawler.page_batch_size
    );
    println!("  Max listing pages per URL: {}", config.crawler.max_pages);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Backoff (ms): {:?}", config.crawler.backoff_schedule_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Root: {}", config.output.output_root);
    println!("  Image format: {}", config.output.image_format);
    println!("  Archive: {}", config.output.archive);

    let plan = pipeline.plan(seeds);

    println!("\nCategory Jobs ({}):", plan.jobs.len());
    for job in &plan.jobs {
        println!("  - {} ({} source URLs)", job.name, job.source_urls.len());
        for url in &job.source_urls {
            println!("    * {}", url);
        }
    }

    if let Some(direct) = &plan.direct {
        println!("\nDirect Products ({}):", direct.product_urls.len());
        for url in &direct.product_urls {
            println!("  - {}", url);
        }
    }

    if !plan.invalid.is_empty() {
        println!("\nSkipped URLs ({}):", plan.invalid.len());
        for url in &plan.invalid {
            println!("  - {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} category job(s) and {} direct product(s)",
        plan.jobs.len(),
        plan.direct_products()
    );
}
