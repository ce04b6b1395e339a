//! Blocking parser for untrusted header+RGBA streams.

use std::io::{BufRead, Read};

use super::{check_header, log_outcome, payload_capacity};
use crate::error::{ImportError, ImportResult};
use crate::types::{Bounds, PixelBuffer};

/// Validates untrusted image streams against fixed bounds.
///
/// Stages, in order: bounded header read, grammar check, size check, exact
/// payload read, end-of-stream check. No allocation proportional to the
/// image size happens before the size check passes.
#[derive(Debug, Clone, Copy)]
pub struct StreamValidator {
    bounds: Bounds,
}

impl StreamValidator {
    /// Create a new validator with the given bounds.
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Parse one image from `reader`, consuming it to end of stream.
    ///
    /// The reader is taken by value and dropped on every exit path.
    pub fn parse<R: BufRead>(&self, mut reader: R) -> ImportResult<PixelBuffer> {
        let result = self.parse_from(&mut reader);
        log_outcome(&result, self.bounds);
        result
    }

    fn parse_from<R: BufRead>(&self, reader: &mut R) -> ImportResult<PixelBuffer> {
        let max_len = super::header_len(self.bounds);
        let mut line = Vec::with_capacity(max_len);
        reader.by_ref().take(max_len as u64).read_until(b'\n', &mut line)?;

        let header = check_header(&line, self.bounds)?;

        let mut pixels = Vec::with_capacity(payload_capacity(&header)?);
        reader
            .by_ref()
            .take(header.expected)
            .read_to_end(&mut pixels)?;
        if pixels.len() as u64 != header.expected {
            return Err(ImportError::LengthViolation {
                actual: pixels.len() as u64,
                expected: header.expected,
            });
        }

        // One byte is enough to prove the payload is too long.
        let mut trailing = Vec::with_capacity(1);
        reader.by_ref().take(1).read_to_end(&mut trailing)?;
        if !trailing.is_empty() {
            return Err(ImportError::LengthViolation {
                actual: header.expected + 1,
                expected: header.expected,
            });
        }

        Ok(PixelBuffer::from_validated(
            header.width,
            header.height,
            pixels,
        ))
    }
}

/// Parse one image from `reader` under `bounds`.
pub fn parse<R: BufRead>(reader: R, bounds: Bounds) -> ImportResult<PixelBuffer> {
    StreamValidator::new(bounds).parse(reader)
}
