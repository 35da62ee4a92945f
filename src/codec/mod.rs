//! Image retrieval and transcoding
//!
//! The crawler talks to images only through [`ImageCodec`]: fetch one URL,
//! encode it to the requested format and write it to a destination path.
//! [`HttpImageCodec`] is the default implementation.

mod transcode;

use crate::HarvestError;
use async_trait::async_trait;
use std::path::Path;

pub use transcode::HttpImageCodec;

/// Output encoding for downloaded images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Webp,
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Parses a configuration value
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "webp" => Some(Self::Webp),
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Webp => image::ImageFormat::WebP,
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Fetches an image and stores it encoded at a destination path
///
/// Implementations make one attempt per call; retrying is the caller's job.
/// The destination must only appear once the file is complete.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch_and_encode(
        &self,
        image_url: &str,
        dest: &Path,
        format: ImageFormat,
    ) -> Result<u64, HarvestError>;
}
