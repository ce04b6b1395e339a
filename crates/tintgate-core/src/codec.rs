//! Decode and render capabilities.
//!
//! The wire and tint code never depend on an image-format library; callers
//! hand in a [`Decode`] or [`Render`] implementation. [`ImageCodec`] is the
//! `image`-crate backed implementation used by the CLI.
//!
//! Paths may carry an explicit format prefix, e.g. `png:icon.gif` writes PNG
//! data to a file named `icon.gif`.

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use crate::error::CodecError;
use crate::types::{Bounds, PixelBuffer};

/// Turns an encoded image into raw RGBA.
pub trait Decode {
    /// Decode the file at `path` (which may carry a `format:` prefix).
    fn decode(&self, path: &Path) -> Result<PixelBuffer, CodecError>;

    /// Decode an in-memory file, optionally forcing its format.
    fn decode_bytes(&self, bytes: &[u8], format: Option<&str>) -> Result<PixelBuffer, CodecError>;
}

/// Writes raw RGBA out as an encoded image file.
pub trait Render {
    /// Encode `image` to `target` (which may carry a `format:` prefix).
    fn render(&self, image: &PixelBuffer, target: &Path) -> Result<(), CodecError>;
}

/// Split an optional `format:` prefix off a path.
///
/// The prefix is only honoured when it names a format the codec knows.
pub fn split_format_prefix(target: &Path) -> (Option<ImageFormat>, PathBuf) {
    let text = target.to_string_lossy();
    if let Some((prefix, rest)) = text.split_once(':') {
        if !rest.is_empty() && prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            if let Some(format) = ImageFormat::from_extension(prefix) {
                return (Some(format), PathBuf::from(rest));
            }
        }
    }
    (None, target.to_path_buf())
}

/// Convert an ImageFormat to a short name for logs.
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Pnm => "pnm",
        ImageFormat::Avif => "avif",
        _ => "unknown",
    }
}

/// Decode from bytes on the blocking pool, giving up after `limit`.
pub async fn decode_bytes_with_timeout<D>(
    decoder: D,
    bytes: Vec<u8>,
    format: Option<String>,
    limit: Duration,
) -> Result<PixelBuffer, CodecError>
where
    D: Decode + Send + 'static,
{
    let decode_result = timeout(limit, async move {
        tokio::task::spawn_blocking(move || decoder.decode_bytes(&bytes, format.as_deref()))
            .await
    })
    .await;

    match decode_result {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(CodecError::Decode {
            path: PathBuf::from("-"),
            message: format!("Task join error: {}", e),
        }),
        Err(_) => Err(CodecError::Timeout {
            stage: "decode".to_string(),
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}

/// `image`-crate backed codec.
///
/// With bounds set, the decoder refuses images whose declared dimensions
/// exceed them; the conversion side decodes untrusted files this way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    bounds: Option<Bounds>,
}

impl ImageCodec {
    /// Create a codec with no decode limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap decoded dimensions at `bounds`.
    pub fn with_bounds(bounds: Bounds) -> Self {
        Self {
            bounds: Some(bounds),
        }
    }

    fn decode_reader(
        &self,
        bytes: &[u8],
        format: Option<ImageFormat>,
        path: &Path,
    ) -> Result<PixelBuffer, CodecError> {
        let decode_err = |message: String| CodecError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = ImageReader::new(Cursor::new(bytes));
        match format {
            Some(f) => reader.set_format(f),
            None => {
                reader = reader
                    .with_guessed_format()
                    .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
            }
        }
        let detected = reader.format().ok_or_else(|| CodecError::UnsupportedFormat {
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        })?;

        if let Some(bounds) = self.bounds {
            let mut limits = image::Limits::default();
            limits.max_image_width = Some(bounds.max_width);
            limits.max_image_height = Some(bounds.max_height);
            reader.limits(limits);
        }

        let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!(
            path = %path.display(),
            format = format_name(detected),
            width,
            height,
            "Decoded image"
        );
        PixelBuffer::from_rgba(width, height, rgba.into_raw())
            .map_err(|e| decode_err(e.to_string()))
    }
}

impl Decode for ImageCodec {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
        let (format, file) = split_format_prefix(path);
        let bytes = std::fs::read(&file).map_err(|e| CodecError::Decode {
            path: file.clone(),
            message: format!("Cannot read file: {}", e),
        })?;
        self.decode_reader(&bytes, format, &file)
    }

    fn decode_bytes(&self, bytes: &[u8], format: Option<&str>) -> Result<PixelBuffer, CodecError> {
        let format = match format {
            Some(name) => Some(ImageFormat::from_extension(name).ok_or_else(|| {
                CodecError::UnsupportedFormat {
                    format: name.to_string(),
                }
            })?),
            None => None,
        };
        self.decode_reader(bytes, format, Path::new("-"))
    }
}

impl Render for ImageCodec {
    fn render(&self, image: &PixelBuffer, target: &Path) -> Result<(), CodecError> {
        let (format, file) = split_format_prefix(target);
        let format = match format {
            Some(f) => f,
            None => ImageFormat::from_path(&file).map_err(|_| CodecError::UnsupportedFormat {
                format: file
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };

        let encode_err = |message: String| CodecError::Encode {
            path: file.clone(),
            message,
        };
        let rgba = RgbaImage::from_raw(image.width(), image.height(), image.data().to_vec())
            .ok_or_else(|| encode_err("pixel buffer does not match its dimensions".into()))?;
        let dynamic = match format {
            // JPEG has no alpha channel
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8()),
            _ => DynamicImage::ImageRgba8(rgba),
        };

        dynamic
            .save_with_format(&file, format)
            .map_err(|e| encode_err(e.to_string()))?;
        tracing::debug!(path = %file.display(), format = format_name(format), "Rendered image");
        Ok(())
    }
}

/// In-memory decoder keyed by path, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryCodec {
    images: std::collections::HashMap<PathBuf, PixelBuffer>,
}

#[cfg(test)]
impl MemoryCodec {
    pub fn with_image(mut self, path: &str, image: PixelBuffer) -> Self {
        self.images.insert(PathBuf::from(path), image);
        self
    }
}

#[cfg(test)]
impl Decode for MemoryCodec {
    fn decode(&self, path: &Path) -> Result<PixelBuffer, CodecError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| CodecError::Decode {
                path: path.to_path_buf(),
                message: "no such image".to_string(),
            })
    }

    fn decode_bytes(&self, bytes: &[u8], _format: Option<&str>) -> Result<PixelBuffer, CodecError> {
        // Test fixtures name the image by its contents.
        let key = String::from_utf8_lossy(bytes).into_owned();
        self.decode(Path::new(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> PixelBuffer {
        PixelBuffer::from_rgba(
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 128, //
                0, 0, 255, 0, 255, 255, 255, 255,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_format_name() {
        assert_eq!(format_name(ImageFormat::Jpeg), "jpeg");
        assert_eq!(format_name(ImageFormat::Png), "png");
        assert_eq!(format_name(ImageFormat::WebP), "webp");
    }

    #[test]
    fn test_split_format_prefix() {
        let (format, path) = split_format_prefix(Path::new("png:icon.gif"));
        assert_eq!(format, Some(ImageFormat::Png));
        assert_eq!(path, PathBuf::from("icon.gif"));

        let (format, path) = split_format_prefix(Path::new("icon.gif"));
        assert_eq!(format, None);
        assert_eq!(path, PathBuf::from("icon.gif"));

        // Unknown prefixes are part of the file name
        let (format, path) = split_format_prefix(Path::new("notaformat:x.png"));
        assert_eq!(format, None);
        assert_eq!(path, PathBuf::from("notaformat:x.png"));
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        let codec = ImageCodec::new();

        codec.render(&checker(), &path).unwrap();
        let back = codec.decode(&path).unwrap();
        assert_eq!(back, checker());
    }

    #[test]
    fn test_format_detected_by_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("misnamed.jpg");
        let target = PathBuf::from(format!("png:{}", path.display()));
        ImageCodec::new().render(&checker(), &target).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let back = ImageCodec::new().decode(&path).unwrap();
        assert_eq!(back, checker());
    }

    #[test]
    fn test_decode_bytes_respects_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        ImageCodec::new().render(&checker(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();

        assert!(ImageCodec::with_bounds(Bounds::new(2, 2))
            .decode_bytes(&bytes, Some("png"))
            .is_ok());
        assert!(matches!(
            ImageCodec::with_bounds(Bounds::new(1, 1)).decode_bytes(&bytes, None),
            Err(CodecError::Decode { .. })
        ));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageCodec::new()
            .decode_bytes(b"definitely not an image", None)
            .unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnsupportedFormat { .. } | CodecError::Decode { .. }
        ));
    }

    #[test]
    fn test_render_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageCodec::new()
            .render(&checker(), &dir.path().join("out.unknownext"))
            .unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn test_decode_with_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        ImageCodec::new().render(&checker(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();

        let limit = Duration::from_secs(5);
        let image = decode_bytes_with_timeout(ImageCodec::new(), bytes, None, limit)
            .await
            .unwrap();
        assert_eq!(image, checker());
    }
}
