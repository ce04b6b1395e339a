//! The raw image wire format and its validators.
//!
//! ```text
//! <width> <height>\n<width * height * 4 bytes of RGBA8888>
//! ```
//!
//! Both sides of every exchange use this module: producers write with
//! [`encode`], consumers read with [`StreamValidator`] (blocking) or
//! [`AsyncStreamValidator`] (tokio).
//!
//! - **header**: header grammar and the maximum header length
//! - **validate**: blocking validator
//! - **async_read**: tokio validator with two suspension points
//! - **encode**: serializer and the image-service producer

pub mod async_read;
pub mod encode;
pub mod header;
pub mod validate;

pub use async_read::AsyncStreamValidator;
pub use encode::{encode, encode_async, encode_to_vec, serve_image};
pub use header::header_len;
pub use validate::{parse, StreamValidator};

use crate::error::{ImportError, ImportResult};
use crate::types::{rgba_len, Bounds, PixelBuffer};

/// A header that passed both the grammar and the size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CheckedHeader {
    pub width: u32,
    pub height: u32,
    pub expected: u64,
}

/// Grammar and bounds check for a header line read from the stream.
pub(crate) fn check_header(line: &[u8], bounds: Bounds) -> ImportResult<CheckedHeader> {
    if line.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    let (width, height) = header::parse_header(line)?;
    bounds.check(width, height)?;

    // Both fit in u32 once within bounds, and their payload in a u64.
    let width = width as u32;
    let height = height as u32;
    let expected = rgba_len(width, height).ok_or(ImportError::SizeViolation {
        width: width.into(),
        height: height.into(),
        max_width: bounds.max_width,
        max_height: bounds.max_height,
    })?;
    Ok(CheckedHeader {
        width,
        height,
        expected,
    })
}

/// Allocation size for the payload of an accepted header.
pub(crate) fn payload_capacity(header: &CheckedHeader) -> ImportResult<usize> {
    usize::try_from(header.expected).map_err(|_| ImportError::LengthViolation {
        actual: 0,
        expected: header.expected,
    })
}

/// Log the outcome of one import.
pub(crate) fn log_outcome(result: &ImportResult<PixelBuffer>, bounds: Bounds) {
    match result {
        Ok(image) => tracing::debug!(
            width = image.width(),
            height = image.height(),
            hash = %image.content_hash(),
            "Accepted untrusted image"
        ),
        Err(e) => tracing::warn!(
            max_width = bounds.max_width,
            max_height = bounds.max_height,
            "Rejected untrusted image: {}",
            e
        ),
    }
}
