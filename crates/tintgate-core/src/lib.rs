//! Tintgate Core - Untrusted image import and label tinting.
//!
//! Tintgate moves images across a trust boundary. An untrusted producer sends
//! raw RGBA in a minimal wire format; the trusted side validates every byte
//! against fixed bounds before keeping it, and can recolour the result with a
//! security-label colour.
//!
//! # Architecture
//!
//! ```text
//! untrusted stream → header (bounded) → size check → payload → EOF check → PixelBuffer
//!                                                                            ↓
//!                                                              tint / render / report
//! ```
//!
//! Files of arbitrary format never get decoded on the trusted side. They go
//! through a disposable converter ([`convert`]) that answers in the same
//! wire format and is validated the same way.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::io::BufReader;
//! use tintgate_core::{tint, Bounds, Label, StreamValidator};
//!
//! fn main() -> tintgate_core::Result<()> {
//!     let stdin = BufReader::new(std::io::stdin());
//!     let icon = StreamValidator::new(Bounds::ICON).parse(stdin)?;
//!     let tinted = tint(&icon, Label::Red.color());
//!     println!("{}x{} {}", tinted.width(), tinted.height(), tinted.content_hash());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod color;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod tint;
pub mod types;
pub mod wire;

pub use codec::{Decode, ImageCodec, Render};
pub use color::{hex_to_channels, hex_to_float, Color, Label};
pub use config::Config;
pub use convert::{
    convert_through, convert_through_async, serve_conversion, serve_conversion_async,
    ConversionRequest,
};
pub use error::{
    CodecError, ColorError, ConfigError, ConversionError, ImportError, ImportResult, Result,
    TintgateError,
};
pub use output::{ReportFormat, ReportWriter};
pub use tint::{tint, TintStrategy};
pub use types::{Bounds, ImportReport, PixelBuffer};
pub use wire::{encode, header_len, parse, AsyncStreamValidator, StreamValidator};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_import_tint_report() {
        let stream = b"1 1\n\xff\x00\x00\x80".to_vec();
        let icon = parse(Cursor::new(stream), Bounds::ICON).unwrap();
        let tinted = TintStrategy::Label.apply(&icon, Label::Blue.color());
        assert_eq!(tinted.data()[3], 0x80);

        let report = ImportReport::new(&tinted);
        assert_eq!((report.width, report.height, report.bytes), (1, 1, 4));
    }

    #[test]
    fn test_shared_buffer_across_threads() {
        let image = PixelBuffer::from_rgba(2, 1, vec![0, 0, 0, 255, 9, 9, 9, 255]).unwrap();
        let stream = wire::encode_to_vec(&image);
        let source = std::sync::Arc::new(parse(Cursor::new(stream.clone()), Bounds::ICON).unwrap());

        let handles: Vec<_> = TintStrategy::ALL
            .into_iter()
            .map(|strategy| {
                let source = std::sync::Arc::clone(&source);
                let stream = stream.clone();
                std::thread::spawn(move || {
                    let reparsed = parse(Cursor::new(stream), Bounds::ICON).unwrap();
                    assert_eq!(reparsed, *source);
                    strategy.apply(&source, Label::Green.color())
                })
            })
            .collect();

        for (handle, strategy) in handles.into_iter().zip(TintStrategy::ALL) {
            let tinted = handle.join().unwrap();
            assert_eq!(tinted, strategy.apply(&source, Label::Green.color()));
        }
    }
}
