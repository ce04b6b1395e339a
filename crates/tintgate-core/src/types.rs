//! Core data types: the validated pixel buffer, dimension bounds and the
//! import report emitted by the CLI.

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// Bytes per RGBA8888 pixel.
pub const BYTES_PER_PIXEL: u64 = 4;

/// Maximum accepted dimensions for one import.
///
/// Bounds are always passed explicitly; worst-case memory for a single
/// import is `max_width * max_height * 4` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Maximum width in pixels
    pub max_width: u32,

    /// Maximum height in pixels
    pub max_height: u32,
}

impl Bounds {
    /// General images: 8192 x 5120 x 4 B = 160 MiB worst case.
    pub const IMAGE: Bounds = Bounds::new(8192, 5120);

    /// Icon-sized assets.
    pub const ICON: Bounds = Bounds::new(512, 512);

    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// Check that `width x height` is non-empty, within bounds and that its
    /// payload fits in one allocation.
    pub fn check(&self, width: u64, height: u64) -> Result<(), ImportError> {
        if width == 0
            || height == 0
            || width > u64::from(self.max_width)
            || height > u64::from(self.max_height)
            || !allocatable(width, height)
        {
            return Err(ImportError::SizeViolation {
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }
        Ok(())
    }

    /// Largest payload (in bytes) an import under these bounds can allocate.
    ///
    /// `None` when the product does not fit in a `u64`.
    pub fn max_payload_len(&self) -> Option<u64> {
        rgba_len(self.max_width, self.max_height)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::IMAGE
    }
}

/// An immutable, bounds-verified RGBA8888 image.
///
/// `pixels.len() == width * height * 4` holds for the lifetime of the value;
/// there are no mutable accessors, transforms return new buffers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Build a buffer from raw parts produced on the trusted side.
    ///
    /// Rejects zero dimensions and any length mismatch.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImportError> {
        if width == 0 || height == 0 {
            return Err(ImportError::SizeViolation {
                width: width.into(),
                height: height.into(),
                max_width: u32::MAX,
                max_height: u32::MAX,
            });
        }
        let expected = rgba_len(width, height).ok_or(ImportError::SizeViolation {
            width: width.into(),
            height: height.into(),
            max_width: u32::MAX,
            max_height: u32::MAX,
        })?;
        if pixels.len() as u64 != expected {
            return Err(ImportError::LengthViolation {
                actual: pixels.len() as u64,
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Construct without re-checking; callers have already validated the length.
    pub(crate) fn from_validated(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(Some(pixels.len() as u64), rgba_len(width, height));
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA bytes, row-major, no stride padding.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// Iterate over pixels as `[r, g, b, a]`.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(4)
    }

    /// Consume the buffer, returning the RGBA bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.pixels
    }

    /// BLAKE3 hex digest of the pixel bytes.
    pub fn content_hash(&self) -> String {
        blake3::hash(&self.pixels).to_hex().to_string()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Number of RGBA bytes for `width x height`, or `None` on overflow.
pub fn rgba_len(width: u32, height: u32) -> Option<u64> {
    u64::from(width)
        .checked_mul(u64::from(height))?
        .checked_mul(BYTES_PER_PIXEL)
}

/// Whether a `width x height` payload can be held in a single `Vec<u8>`.
fn allocatable(width: u64, height: u64) -> bool {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
        .and_then(|n| usize::try_from(n).ok())
        .is_some_and(|n| n <= isize::MAX as usize)
}

/// Summary of one accepted (and optionally tinted) import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Payload size in bytes
    pub bytes: u64,

    /// BLAKE3 hash of the accepted payload (before tinting)
    pub content_hash: String,

    /// Tint colour applied, as `#rrggbb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<String>,

    /// Tint strategy used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl ImportReport {
    /// Report for an accepted, untinted buffer.
    pub fn new(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            bytes: buffer.data().len() as u64,
            content_hash: buffer.content_hash(),
            tint: None,
            strategy: None,
        }
    }
}
