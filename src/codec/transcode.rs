use super::{ImageCodec, ImageFormat};
use crate::HarvestError;
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Downloads images over HTTP and re-encodes them with the `image` crate
///
/// Decoding and encoding run on the blocking pool so they never stall the
/// async workers.
#[derive(Debug, Clone)]
pub struct HttpImageCodec {
    client: Client,
}

impl HttpImageCodec {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageCodec for HttpImageCodec {
    async fn fetch_and_encode(
        &self,
        image_url: &str,
        dest: &Path,
        format: ImageFormat,
    ) -> Result<u64, HarvestError> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|source| HarvestError::Network {
                url: image_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::HttpStatus {
                url: image_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| HarvestError::Network {
                url: image_url.to_string(),
                source,
            })?;

        if body.is_empty() {
            return Err(HarvestError::ImageFetch {
                url: image_url.to_string(),
                message: "empty response body".to_string(),
            });
        }

        let url = image_url.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || encode_to_file(&body, &dest, format, &url))
            .await
            .map_err(|e| HarvestError::Task(e.to_string()))?
    }
}

/// Decodes `bytes`, encodes them as `format` and writes the result to `dest`
///
/// The file is written under a temporary name and renamed into place.
fn encode_to_file(
    bytes: &[u8],
    dest: &Path,
    format: ImageFormat,
    url: &str,
) -> Result<u64, HarvestError> {
    let decode_error = |message: String| HarvestError::ImageFetch {
        url: url.to_string(),
        message,
    };

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| decode_error(format!("decode failed: {}", e)))?;

    // JPEG has no alpha channel
    let normalized = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        ImageFormat::Webp | ImageFormat::Png => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };

    let mut encoded = Cursor::new(Vec::new());
    normalized
        .write_to(&mut encoded, format.to_image_format())
        .map_err(|e| decode_error(format!("encode failed: {}", e)))?;
    let data = encoded.into_inner();

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let partial = partial_path(dest);
    std::fs::write(&partial, &data)?;
    std::fs::rename(&partial, dest)?;

    Ok(data.len() as u64)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([200, 30, 30]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_encode_to_file_writes_complete_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("series").join("images").join("E3Z.png");

        let written = encode_to_file(&png_bytes(), &dest, ImageFormat::Png, "http://x/img").unwrap();

        let on_disk = std::fs::metadata(&dest).unwrap().len();
        assert_eq!(written, on_disk);
        assert!(!partial_path(&dest).exists());
        assert!(image::open(&dest).is_ok());
    }

    #[test]
    fn test_encode_to_file_jpeg_drops_alpha() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("E3Z.jpg");
        assert!(encode_to_file(&png_bytes(), &dest, ImageFormat::Jpeg, "http://x/img").unwrap() > 0);
    }

    #[test]
    fn test_encode_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("bad.png");
        let err = encode_to_file(b"not an image", &dest, ImageFormat::Png, "http://x/img").unwrap_err();
        assert!(matches!(err, HarvestError::ImageFetch { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_partial_path() {
        let path = partial_path(Path::new("/tmp/a/E3Z.webp"));
        assert_eq!(path, Path::new("/tmp/a/E3Z.webp.part"));
    }
}
