//! Store photo ingestion.
//!
//! Uploaded photos are checked for an `image/*` MIME type, decoded, resized to
//! [`PHOTO_WIDTH`] pixels wide (height follows the aspect ratio) and written
//! once under a random filename in the upload directory.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::instrument;

/// Width every stored photo is resized to.
pub const PHOTO_WIDTH: u32 = 800;

/// Prefix of generated photo filenames.
const FILENAME_PREFIX: &str = "t-";

/// Errors that can occur while ingesting a photo.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload's MIME type is not `image/*`.
    #[error("That filetype isn't allowed!")]
    UnsupportedMediaType(String),

    /// The bytes could not be decoded as an image.
    #[error("could not read image: {0}")]
    Decode(#[source] image::ImageError),

    /// The resized image could not be encoded.
    #[error("could not encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Writing the file failed.
    #[error("could not store image: {0}")]
    Io(#[from] std::io::Error),

    /// The resize task panicked or was cancelled.
    #[error("resize task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Writes resized store photos to the upload directory.
#[derive(Debug, Clone)]
pub struct ImageIngestor {
    upload_dir: PathBuf,
}

impl ImageIngestor {
    /// Create an ingestor writing into `upload_dir`. The directory is created on first use.
    #[must_use]
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Directory photos are written to.
    #[must_use]
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate, resize and store a photo, returning the generated filename.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::UnsupportedMediaType` before touching the bytes if
    /// `mime` is not an image type, `IngestError::Decode` if the bytes are not
    /// a readable image, and `IngestError::Io` if the file cannot be written.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest(&self, bytes: Bytes, mime: &str) -> Result<String, IngestError> {
        let filename = generate_filename(mime)?;
        let format = ImageFormat::from_extension(extension_for(mime).unwrap_or_default());

        let encoded = tokio::task::spawn_blocking(move || resize_and_encode(&bytes, format)).await??;

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let path = self.upload_dir.join(&filename);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&encoded).await?;
        file.flush().await?;

        tracing::info!(filename = %filename, "Stored store photo");
        Ok(filename)
    }

    /// Remove a stored photo that ended up unreferenced.
    ///
    /// A missing file is not an error. Other failures are logged and swallowed.
    pub async fn discard(&self, filename: &str) {
        match tokio::fs::remove_file(self.upload_dir.join(filename)).await {
            Ok(()) => tracing::info!(filename, "Discarded store photo"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(filename, error = %e, "Failed to discard store photo"),
        }
    }
}

/// File extension implied by an `image/*` MIME type.
///
/// Parameters after `;` and structured-syntax suffixes (`+xml`) are dropped.
/// Returns `None` for non-image types.
#[must_use]
pub fn extension_for(mime: &str) -> Option<&str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    let subtype = essence.strip_prefix("image/")?;
    let ext = subtype.split('+').next().unwrap_or_default();
    (!ext.is_empty()).then_some(ext)
}

/// A fresh, collision-free filename for an upload of type `mime`.
///
/// # Errors
///
/// Returns `IngestError::UnsupportedMediaType` if `mime` is not an image type.
pub fn generate_filename(mime: &str) -> Result<String, IngestError> {
    let ext = extension_for(mime)
        .ok_or_else(|| IngestError::UnsupportedMediaType(mime.to_owned()))?
        .to_ascii_lowercase();
    Ok(format!("{FILENAME_PREFIX}{}.{ext}", uuid::Uuid::new_v4()))
}

/// Height that keeps the aspect ratio at [`PHOTO_WIDTH`].
fn scaled_height(width: u32, height: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    let scaled = (u64::from(height) * u64::from(PHOTO_WIDTH) + u64::from(width) / 2) / u64::from(width);
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}

fn resize_and_encode(bytes: &[u8], format: Option<ImageFormat>) -> Result<Vec<u8>, IngestError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(IngestError::Io)?;
    let detected = reader.format();
    let img = reader.decode().map_err(IngestError::Decode)?;

    let resized = img.resize_exact(
        PHOTO_WIDTH,
        scaled_height(img.width(), img.height()),
        FilterType::Triangle,
    );

    let format = format.or(detected).unwrap_or(ImageFormat::Png);
    let resized = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(resized.to_rgb8())
    } else {
        resized
    };

    let mut out = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut out), format)
        .map_err(IngestError::Encode)?;
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        Bytes::from(out)
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg; charset=binary"), Some("jpeg"));
        assert_eq!(extension_for("image/svg+xml"), Some("svg"));
        assert_eq!(extension_for("text/plain"), None);
        assert_eq!(extension_for("image/"), None);
    }

    #[test]
    fn test_generate_filename_is_unique() {
        let a = generate_filename("image/png").unwrap();
        let b = generate_filename("image/png").unwrap();
        assert!(a.starts_with("t-"));
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_filename_rejects_non_image() {
        assert!(matches!(
            generate_filename("application/pdf"),
            Err(IngestError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_scaled_height() {
        assert_eq!(scaled_height(1600, 400), 200);
        assert_eq!(scaled_height(400, 300), 600);
        assert_eq!(scaled_height(8000, 1), 1);
    }

    #[tokio::test]
    async fn test_ingest_rejects_text_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path().join("uploads"));

        let result = ingestor.ingest(Bytes::from_static(b"hello"), "text/plain").await;

        assert!(matches!(result, Err(IngestError::UnsupportedMediaType(_))));
        assert!(!ingestor.upload_dir().exists());
    }

    #[tokio::test]
    async fn test_discard_removes_stored_photo() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path());
        let filename = ingestor.ingest(png_bytes(10, 10), "image/png").await.unwrap();

        ingestor.discard(&filename).await;
        assert!(!dir.path().join(&filename).exists());

        // Discarding again is a no-op.
        ingestor.discard(&filename).await;
    }

    #[tokio::test]
    async fn test_ingest_resizes_to_fixed_width() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path());

        let filename = ingestor.ingest(png_bytes(1600, 400), "image/png").await.unwrap();

        assert!(filename.ends_with(".png"));
        let (width, height) = image::image_dimensions(dir.path().join(&filename)).unwrap();
        assert_eq!((width, height), (PHOTO_WIDTH, 200));
    }

    #[tokio::test]
    async fn test_ingest_generates_distinct_filenames() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path());

        let first = ingestor.ingest(png_bytes(10, 10), "image/png").await.unwrap();
        let second = ingestor.ingest(png_bytes(10, 10), "image/png").await.unwrap();

        assert_ne!(first, second);
        assert!(dir.path().join(&first).exists());
        assert!(dir.path().join(&second).exists());
    }

    #[tokio::test]
    async fn test_ingest_converts_to_declared_format() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path());

        let filename = ingestor.ingest(png_bytes(20, 10), "image/jpeg").await.unwrap();

        assert!(filename.ends_with(".jpeg"));
        let bytes = std::fs::read(dir.path().join(&filename)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_ingest_rejects_garbage_image() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = ImageIngestor::new(dir.path());

        let result = ingestor
            .ingest(Bytes::from_static(b"not really a png"), "image/png")
            .await;

        assert!(matches!(result, Err(IngestError::Decode(_))));
    }
}
