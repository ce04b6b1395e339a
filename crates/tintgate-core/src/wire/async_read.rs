//! Tokio validator for untrusted header+RGBA streams.
//!
//! Same stages and errors as [`StreamValidator`](super::StreamValidator).
//! The header read and the payload read are the only suspension points, and
//! nothing is published before both have completed. The reader is owned by
//! the future, so cancelling it (dropping the future, or a timeout expiring)
//! releases the stream.

use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use super::{check_header, log_outcome, payload_capacity, CheckedHeader};
use crate::error::{ImportError, ImportResult};
use crate::types::{Bounds, PixelBuffer};

/// Async counterpart of [`StreamValidator`](super::StreamValidator).
#[derive(Debug, Clone, Copy)]
pub struct AsyncStreamValidator {
    bounds: Bounds,
}

impl AsyncStreamValidator {
    /// Create a new validator with the given bounds.
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Parse one image from `reader`, consuming it to end of stream.
    pub async fn parse<R>(&self, mut reader: R) -> ImportResult<PixelBuffer>
    where
        R: AsyncBufRead + Unpin,
    {
        let result = self.parse_from(&mut reader).await;
        log_outcome(&result, self.bounds);
        result
    }

    /// Parse with a deadline covering both reads.
    ///
    /// On expiry the in-flight parse is dropped together with `reader`.
    pub async fn parse_with_timeout<R>(
        &self,
        reader: R,
        limit: Duration,
    ) -> ImportResult<PixelBuffer>
    where
        R: AsyncBufRead + Unpin,
    {
        match timeout(limit, self.parse(reader)).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = limit.as_millis() as u64;
                tracing::warn!(timeout_ms, "Producer did not deliver an image in time");
                Err(ImportError::Timeout { timeout_ms })
            }
        }
    }

    async fn parse_from<R>(&self, reader: &mut R) -> ImportResult<PixelBuffer>
    where
        R: AsyncBufRead + Unpin,
    {
        let max_len = super::header_len(self.bounds);
        let mut line = Vec::with_capacity(max_len);
        (&mut *reader)
            .take(max_len as u64)
            .read_until(b'\n', &mut line)
            .await?;

        let header = check_header(&line, self.bounds)?;
        let pixels = read_payload(reader, &header).await?;

        Ok(PixelBuffer::from_validated(
            header.width,
            header.height,
            pixels,
        ))
    }
}

/// Read exactly `header.expected` bytes, then require end of stream.
async fn read_payload<R>(reader: &mut R, header: &CheckedHeader) -> ImportResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut pixels = Vec::with_capacity(payload_capacity(header)?);
    (&mut *reader)
        .take(header.expected)
        .read_to_end(&mut pixels)
        .await?;
    if pixels.len() as u64 != header.expected {
        return Err(ImportError::LengthViolation {
            actual: pixels.len() as u64,
            expected: header.expected,
        });
    }

    let mut trailing = Vec::with_capacity(1);
    (&mut *reader).take(1).read_to_end(&mut trailing).await?;
    if !trailing.is_empty() {
        return Err(ImportError::LengthViolation {
            actual: header.expected + 1,
            expected: header.expected,
        });
    }
    Ok(pixels)
}
