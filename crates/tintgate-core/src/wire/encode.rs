//! Serializer for the wire format, used by producers.

use std::io::{self, Write};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::header::format_header;
use crate::codec::Decode;
use crate::error::Result;
use crate::types::PixelBuffer;

/// Write `image` as `<width> <height>\n` followed by its RGBA bytes.
pub fn encode<W: Write>(image: &PixelBuffer, mut writer: W) -> io::Result<()> {
    writer.write_all(format_header(image.width(), image.height()).as_bytes())?;
    writer.write_all(image.data())?;
    writer.flush()
}

/// Encode into a freshly allocated buffer.
pub fn encode_to_vec(image: &PixelBuffer) -> Vec<u8> {
    let header = format_header(image.width(), image.height());
    let mut out = Vec::with_capacity(header.len() + image.data().len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(image.data());
    out
}

/// Async variant of [`encode`].
pub async fn encode_async<W>(image: &PixelBuffer, writer: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(format_header(image.width(), image.height()).as_bytes())
        .await?;
    writer.write_all(image.data()).await?;
    writer.flush().await
}

/// Producer side of the image service: decode a local file and emit it in
/// wire format.
pub fn serve_image<D, W>(decoder: &D, path: &Path, writer: W) -> Result<()>
where
    D: Decode + ?Sized,
    W: Write,
{
    let image = decoder.decode(path)?;
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Serving image"
    );
    encode(&image, writer)?;
    Ok(())
}
