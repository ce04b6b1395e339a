//! The `<width> <height>\n` header line.

use crate::error::ImportError;
use crate::types::Bounds;

/// Number of decimal digits in `n` (at least 1).
fn digits(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Longest header a stream under `bounds` may legally send:
/// both maxima written out, one space, one newline.
pub fn header_len(bounds: Bounds) -> usize {
    digits(bounds.max_width) + digits(bounds.max_height) + 2
}

/// Parse a header line against the grammar `^[0-9]+ [0-9]+\n$`.
///
/// Returns the two fields without checking them against any bound; values
/// too large for `u64` saturate so they are still reported (and rejected)
/// as size violations.
pub(crate) fn parse_header(line: &[u8]) -> Result<(u64, u64), ImportError> {
    let violation = || ImportError::FormatViolation {
        header: line.escape_ascii().to_string(),
    };

    let body = line.strip_suffix(b"\n").ok_or_else(violation)?;
    let mut fields = body.splitn(2, |&b| b == b' ');
    let width = fields.next().ok_or_else(violation)?;
    let height = fields.next().ok_or_else(violation)?;

    let is_number = |field: &[u8]| !field.is_empty() && field.iter().all(u8::is_ascii_digit);
    if !is_number(width) || !is_number(height) {
        return Err(violation());
    }

    Ok((decimal(width), decimal(height)))
}

fn decimal(field: &[u8]) -> u64 {
    field.iter().fold(0u64, |acc, &d| {
        acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
    })
}

/// Render a header for `width x height`.
pub(crate) fn format_header(width: u32, height: u32) -> String {
    format!("{width} {height}\n")
}
