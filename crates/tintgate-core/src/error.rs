//! Error types for tintgate.
//!
//! Errors are organized by stage. Every import rejection is terminal: the
//! stream is discarded and nothing derived from it is returned. Each variant
//! carries the offending value, the configured bound or the expected length,
//! so a rejection can be logged without re-deriving anything.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tintgate operations.
#[derive(Error, Debug)]
pub enum TintgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Untrusted stream rejected
    #[error("Import rejected: {0}")]
    Import(#[from] ImportError),

    /// Colour string could not be parsed
    #[error("Colour error: {0}")]
    Color(#[from] ColorError),

    /// Trusted-side decode/encode failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Disposable conversion round trip failed
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Rejections of an untrusted header+RGBA stream.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The stream ended before a single header byte arrived
    #[error("No image received (empty stream)")]
    EmptyInput,

    /// The header did not match `<digits> <digits>\n`
    #[error("Image format violation: header {header:?}")]
    FormatViolation { header: String },

    /// Width or height outside the configured bounds
    #[error(
        "Image size constraint violation: width={width} height={height} \
         max_width={max_width} max_height={max_height}"
    )]
    SizeViolation {
        width: u64,
        height: u64,
        max_width: u32,
        max_height: u32,
    },

    /// Payload length differs from `width * height * 4`
    #[error("Image data length violation (is {actual}, should be {expected})")]
    LengthViolation { actual: u64, expected: u64 },

    /// The producer did not deliver a complete image in time
    #[error("Timed out waiting for image data after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The underlying stream failed
    #[error("IO error while reading image stream: {0}")]
    Io(#[from] std::io::Error),
}

/// Colour parsing errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorError {
    /// Channel depth is not a positive multiple of 4 bits (or exceeds 32)
    #[error("Unsupported colour depth: {depth} bits (must be a multiple of 4, at most 32)")]
    UnsupportedDepth { depth: u32 },

    /// Input is too short or contains non-hex digits
    #[error("Invalid colour {colour:?}: {reason}")]
    InvalidColor { colour: String, reason: String },
}

/// Errors from the trusted-side decode/render capabilities.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Unknown or undetectable image format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },
}

/// Errors from the disposable conversion round trip.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The request line was malformed
    #[error("Malformed conversion request: {message}")]
    Request { message: String },

    /// The untrusted input file exceeds the accepted size
    #[error("Conversion input too large ({size} bytes > {max} bytes)")]
    InputTooLarge { size: u64, max: u64 },

    /// The response stream was rejected
    #[error(transparent)]
    Import(#[from] ImportError),

    /// The decoder on the conversion side failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for tintgate results.
pub type Result<T> = std::result::Result<T, TintgateError>;

/// Convenience type alias for import results.
pub type ImportResult<T> = std::result::Result<T, ImportError>;
