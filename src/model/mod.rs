//! Data model shared by the pipeline stages
//!
//! # Components
//!
//! - `ProductRecord`: one extracted product, read-only once built
//! - `SeriesGroup`: a derived view of records sharing a series key
//! - `ImageTask` / `ImageResult`: image work items and their outcomes
//! - `CategoryJob`: the per-category unit of work

mod image;
mod job;
mod product;

// Re-export main types
pub use image::{ImageResult, ImageStatus, ImageTask};
pub use job::{CategoryJob, SINGLE_PRODUCTS_JOB};
pub use product::{ProductRecord, SeriesGroup};
