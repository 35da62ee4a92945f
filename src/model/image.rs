use std::fmt;
use std::path::PathBuf;

/// Outcome of one image fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageStatus {
    /// Downloaded and encoded during this run
    Success,
    /// A non-empty file was already at the destination; nothing was fetched
    AlreadyExists,
    /// Every attempt failed
    Failed,
}

impl ImageStatus {
    /// Returns true if the image is available on disk after the run
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Success | Self::AlreadyExists)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyExists => "already_exists",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image to fetch, keyed by product code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTask {
    pub code: String,
    pub url: String,
    pub series: String,
}

/// Result of fetching the image for one product code
#[derive(Debug, Clone, PartialEq)]
pub struct ImageResult {
    pub code: String,
    pub series: String,
    pub url: String,
    pub local_path: PathBuf,
    pub status: ImageStatus,
    /// Codec invocations made; zero for `AlreadyExists`
    pub attempts: u32,
    /// Bytes written during this run
    pub bytes: u64,
    pub error: Option<String>,
}
