//! Configuration for harvest runs
//!
//! One TOML file carries the pool and retry settings (`[crawler]`), the
//! user agent, the output layout and the per-site patterns and selectors
//! (`[site]`). Files are validated as they are loaded.
//!
//! # Example
//!
//! ```no_run
//! use catalog_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Detail workers: {}", config.crawler.max_workers);
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
pub use validation::validate;
