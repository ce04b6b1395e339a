//! Disposable conversion round trip.
//!
//! The trusted side sends an untrusted file to a single-use converter and
//! reads back raw RGBA. Both directions reuse existing pieces: the request is
//! a short bounded line plus the file bytes, and the response is the regular
//! wire format checked by the regular validator.
//!
//! ```text
//! client -> converter:  "<format>:-\n" | "-\n"   then the file bytes, EOF
//! converter -> client:  "<width> <height>\n"     then width*height*4 bytes, EOF
//! ```

use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};

use crate::codec::{decode_bytes_with_timeout, split_format_prefix, Decode};
use crate::error::ConversionError;
use crate::types::{Bounds, PixelBuffer};
use crate::wire::{encode, encode_async, AsyncStreamValidator, StreamValidator};

/// Longest accepted format name in a request line.
pub const MAX_FORMAT_LEN: usize = 16;

/// A conversion request: optional format hint plus the untrusted file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    format: Option<String>,
    data: Vec<u8>,
}

impl ConversionRequest {
    /// Build a request, validating the format name.
    pub fn new(format: Option<String>, data: Vec<u8>) -> Result<Self, ConversionError> {
        if let Some(name) = &format {
            check_format_name(name)?;
        }
        Ok(Self { format, data })
    }

    /// Read a local (untrusted) file; a `format:` prefix becomes the hint.
    pub fn from_path(path: &Path, max_input_bytes: u64) -> Result<Self, ConversionError> {
        let (format, file) = split_format_prefix(path);
        let size = std::fs::metadata(&file)?.len();
        if size > max_input_bytes {
            return Err(ConversionError::InputTooLarge {
                size,
                max: max_input_bytes,
            });
        }
        // The file may have grown since the metadata call.
        let mut data = Vec::new();
        std::fs::File::open(&file)?
            .take(max_input_bytes.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 > max_input_bytes {
            return Err(ConversionError::InputTooLarge {
                size: data.len() as u64,
                max: max_input_bytes,
            });
        }
        let format = format.and_then(|f| f.extensions_str().first().map(|e| e.to_string()));
        Self::new(format, data)
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_parts(self) -> (Option<String>, Vec<u8>) {
        (self.format, self.data)
    }

    fn request_line(&self) -> String {
        match &self.format {
            Some(name) => format!("{name}:-\n"),
            None => "-\n".to_string(),
        }
    }

    /// Write the request line and the file bytes.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.request_line().as_bytes())?;
        writer.write_all(&self.data)?;
        writer.flush()
    }

    /// Async variant of [`write_to`](Self::write_to).
    pub async fn write_to_async<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(self.request_line().as_bytes()).await?;
        writer.write_all(&self.data).await?;
        writer.flush().await
    }

    /// Read a request from the client, accepting at most `max_input_bytes`
    /// of file data.
    pub fn read_from<R: BufRead>(
        mut reader: R,
        max_input_bytes: u64,
    ) -> Result<Self, ConversionError> {
        let max_line = MAX_FORMAT_LEN + ":-\n".len();
        let mut line = Vec::with_capacity(max_line);
        reader
            .by_ref()
            .take(max_line as u64)
            .read_until(b'\n', &mut line)?;
        let format = parse_request_line(&line)?;

        let mut data = Vec::new();
        reader
            .by_ref()
            .take(max_input_bytes.saturating_add(1))
            .read_to_end(&mut data)?;
        if data.len() as u64 > max_input_bytes {
            return Err(ConversionError::InputTooLarge {
                size: data.len() as u64,
                max: max_input_bytes,
            });
        }
        Self::new(format, data)
    }
}

fn check_format_name(name: &str) -> Result<(), ConversionError> {
    if name.is_empty()
        || name.len() > MAX_FORMAT_LEN
        || !name.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(ConversionError::Request {
            message: format!("invalid format name {:?}", name),
        });
    }
    Ok(())
}

fn parse_request_line(line: &[u8]) -> Result<Option<String>, ConversionError> {
    let malformed = || ConversionError::Request {
        message: format!("bad request line {:?}", line.escape_ascii().to_string()),
    };

    let body = line.strip_suffix(b"\n").ok_or_else(malformed)?;
    if body == b"-" {
        return Ok(None);
    }
    let name = body.strip_suffix(b":-").ok_or_else(malformed)?;
    let name = std::str::from_utf8(name).map_err(|_| malformed())?;
    check_format_name(name)?;
    Ok(Some(name.to_string()))
}

/// Client side: send `request`, close the request channel, then validate
/// the converter's response under `bounds`.
pub fn convert_through<W, R>(
    request: &ConversionRequest,
    writer: W,
    reader: R,
    bounds: Bounds,
) -> Result<PixelBuffer, ConversionError>
where
    W: Write,
    R: BufRead,
{
    {
        let mut writer = writer;
        request.write_to(&mut writer)?;
    }
    tracing::debug!(
        bytes = request.data.len(),
        format = request.format().unwrap_or("-"),
        "Sent conversion request"
    );
    Ok(StreamValidator::new(bounds).parse(reader)?)
}

/// Async client side with a deadline on the response.
pub async fn convert_through_async<W, R>(
    request: &ConversionRequest,
    mut writer: W,
    reader: R,
    bounds: Bounds,
    limit: Duration,
) -> Result<PixelBuffer, ConversionError>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    request.write_to_async(&mut writer).await?;
    writer.shutdown().await?;
    drop(writer);
    tracing::debug!(
        bytes = request.data.len(),
        format = request.format().unwrap_or("-"),
        "Sent conversion request"
    );

    Ok(AsyncStreamValidator::new(bounds)
        .parse_with_timeout(reader, limit)
        .await?)
}

/// Converter side: read one request, decode it, answer in wire format.
///
/// The decoded image must itself fit `bounds`; the client checks again.
pub fn serve_conversion<R, W, D>(
    reader: R,
    writer: W,
    decoder: &D,
    bounds: Bounds,
    max_input_bytes: u64,
) -> Result<(), ConversionError>
where
    R: BufRead,
    W: Write,
    D: Decode + ?Sized,
{
    let request = ConversionRequest::read_from(reader, max_input_bytes)?;
    let image = decoder.decode_bytes(&request.data, request.format())?;
    bounds.check(image.width().into(), image.height().into())?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "Converted request"
    );
    encode(&image, writer)?;
    Ok(())
}

/// Async converter side: the request is read on the blocking pool and the
/// decode is abandoned after `limit`.
pub async fn serve_conversion_async<R, W, D>(
    reader: R,
    mut writer: W,
    decoder: D,
    bounds: Bounds,
    max_input_bytes: u64,
    limit: Duration,
) -> Result<(), ConversionError>
where
    R: BufRead + Send + 'static,
    W: AsyncWrite + Unpin,
    D: Decode + Send + 'static,
{
    let request =
        tokio::task::spawn_blocking(move || ConversionRequest::read_from(reader, max_input_bytes))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
    let (format, data) = request.into_parts();
    tracing::debug!(
        bytes = data.len(),
        format = format.as_deref().unwrap_or("-"),
        "Received conversion request"
    );

    let image = decode_bytes_with_timeout(decoder, data, format, limit).await?;
    bounds.check(image.width().into(), image.height().into())?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "Converted request"
    );
    encode_async(&image, &mut writer).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MemoryCodec;
    use crate::error::ImportError;
    use crate::wire::encode_to_vec;
    use std::io::Cursor;
    use tokio::io::{AsyncReadExt, BufReader};

    fn icon() -> PixelBuffer {
        PixelBuffer::from_rgba(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 0]).unwrap()
    }

    fn codec() -> MemoryCodec {
        MemoryCodec::default().with_image("icon-bytes", icon())
    }

    #[test]
    fn test_request_line_round_trip() {
        let request =
            ConversionRequest::new(Some("png".to_string()), b"icon-bytes".to_vec()).unwrap();
        let mut bytes = Vec::new();
        request.write_to(&mut bytes).unwrap();
        assert!(bytes.starts_with(b"png:-\n"));

        let back = ConversionRequest::read_from(Cursor::new(bytes), 1024).unwrap();
        assert_eq!(back, request);

        let bare = ConversionRequest::read_from(Cursor::new(b"-\nxyz".to_vec()), 1024).unwrap();
        assert_eq!(bare.format(), None);
        assert_eq!(bare.data(), b"xyz");
    }

    #[test]
    fn test_malformed_request_lines() {
        for line in [
            &b"png\n"[..],
            b"png:-",
            b":-\n",
            b"p g:-\n",
            b"averyveryverylongformat:-\n",
            b"",
        ] {
            let err = ConversionRequest::read_from(Cursor::new(line.to_vec()), 1024).unwrap_err();
            assert!(matches!(err, ConversionError::Request { .. }), "{line:?}");
        }
    }

    #[test]
    fn test_request_input_limit() {
        let err = ConversionRequest::read_from(Cursor::new(b"-\n0123456789".to_vec()), 5)
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::InputTooLarge { size: 6, max: 5 }
        ));
    }

    #[test]
    fn test_request_from_path_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("upload.bin");
        std::fs::write(&file, b"icon-bytes").unwrap();

        let prefixed = std::path::PathBuf::from(format!("png:{}", file.display()));
        let request = ConversionRequest::from_path(&prefixed, 1024).unwrap();
        assert_eq!(request.format(), Some("png"));
        assert_eq!(request.data(), b"icon-bytes");

        let err = ConversionRequest::from_path(&file, 4).unwrap_err();
        assert!(matches!(err, ConversionError::InputTooLarge { size: 10, max: 4 }));
    }

    #[test]
    fn test_round_trip_through_converter() {
        let request = ConversionRequest::new(None, b"icon-bytes".to_vec()).unwrap();
        let mut request_bytes = Vec::new();
        request.write_to(&mut request_bytes).unwrap();

        let mut response = Vec::new();
        serve_conversion(
            Cursor::new(request_bytes),
            &mut response,
            &codec(),
            Bounds::ICON,
            1024,
        )
        .unwrap();
        assert_eq!(response, encode_to_vec(&icon()));

        let mut sent = Vec::new();
        let image =
            convert_through(&request, &mut sent, Cursor::new(response), Bounds::ICON).unwrap();
        assert_eq!(image, icon());
        assert_eq!(sent, b"-\nicon-bytes");
    }

    #[test]
    fn test_converter_refuses_oversized_result() {
        let mut response = Vec::new();
        let err = serve_conversion(
            Cursor::new(b"-\nicon-bytes".to_vec()),
            &mut response,
            &codec(),
            Bounds::new(1, 1),
            1024,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Import(ImportError::SizeViolation { .. })
        ));
        assert!(response.is_empty());
    }

    #[test]
    fn test_client_rejects_hostile_response() {
        let request = ConversionRequest::new(None, b"x".to_vec()).unwrap();
        let hostile = b"99999 99999\n".to_vec();
        let err = convert_through(&request, Vec::new(), Cursor::new(hostile), Bounds::ICON)
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Import(ImportError::FormatViolation { .. })
        ));
    }

    #[test]
    fn test_from_path_reads_at_most_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("upload.bin");
        std::fs::write(&file, b"0123456789").unwrap();

        let request = ConversionRequest::from_path(&file, 10).unwrap();
        assert_eq!(request.data(), b"0123456789");
        assert!(ConversionRequest::from_path(&file, 9).is_err());
    }

    #[tokio::test]
    async fn test_async_converter_answers_request() {
        let mut response = Vec::new();
        serve_conversion_async(
            Cursor::new(b"-\nicon-bytes".to_vec()),
            &mut response,
            codec(),
            Bounds::ICON,
            1024,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(response, encode_to_vec(&icon()));
    }

    #[tokio::test]
    async fn test_async_converter_checks_bounds_and_input() {
        let mut response = Vec::new();
        let err = serve_conversion_async(
            Cursor::new(b"-\nicon-bytes".to_vec()),
            &mut response,
            codec(),
            Bounds::new(1, 1),
            1024,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Import(ImportError::SizeViolation { .. })
        ));
        assert!(response.is_empty());

        let err = serve_conversion_async(
            Cursor::new(b"-\nicon-bytes".to_vec()),
            &mut response,
            codec(),
            Bounds::ICON,
            4,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConversionError::InputTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_async_converter_decode_timeout() {
        struct Stalled;
        impl Decode for Stalled {
            fn decode(&self, path: &Path) -> Result<PixelBuffer, crate::error::CodecError> {
                Err(crate::error::CodecError::Decode {
                    path: path.to_path_buf(),
                    message: "unused".to_string(),
                })
            }

            fn decode_bytes(
                &self,
                _bytes: &[u8],
                _format: Option<&str>,
            ) -> Result<PixelBuffer, crate::error::CodecError> {
                std::thread::sleep(Duration::from_millis(500));
                Ok(icon())
            }
        }

        let mut response = Vec::new();
        let err = serve_conversion_async(
            Cursor::new(b"-\nx".to_vec()),
            &mut response,
            Stalled,
            Bounds::ICON,
            1024,
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Codec(crate::error::CodecError::Timeout { .. })
        ));
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let (client_tx, mut server_rx) = tokio::io::duplex(1024);
        let (mut server_tx, client_rx) = tokio::io::duplex(1024);

        let server = tokio::spawn(async move {
            let mut request = Vec::new();
            server_rx.read_to_end(&mut request).await.unwrap();
            let mut response = Vec::new();
            serve_conversion(
                Cursor::new(request),
                &mut response,
                &codec(),
                Bounds::ICON,
                1024,
            )
            .unwrap();
            server_tx.write_all(&response).await.unwrap();
        });

        let request = ConversionRequest::new(None, b"icon-bytes".to_vec()).unwrap();
        let image = convert_through_async(
            &request,
            client_tx,
            BufReader::new(client_rx),
            Bounds::ICON,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        server.await.unwrap();
        assert_eq!(image, icon());
    }
}
