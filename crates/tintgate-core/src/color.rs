//! Hex colour parsing and the VM label palette.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ColorError;

/// Parse the trailing `channels * depth / 4` hex digits of `colour` into
/// per-channel integers.
///
/// Taking only the tail means a `#` or `0x` prefix is ignored without being
/// inspected. `depth` is the bit depth of one channel and must be a positive
/// multiple of 4, at most 32.
pub fn hex_to_channels(colour: &str, channels: usize, depth: u32) -> Result<Vec<u32>, ColorError> {
    if depth == 0 || depth % 4 != 0 || depth > 32 {
        return Err(ColorError::UnsupportedDepth { depth });
    }

    let step = (depth / 4) as usize;
    let length = channels * step;
    let bytes = colour.as_bytes();
    if bytes.len() < length {
        return Err(invalid(
            colour,
            format!("expected at least {length} hex digits"),
        ));
    }

    bytes[bytes.len() - length..]
        .chunks(step)
        .map(|digits| {
            if !digits.iter().all(u8::is_ascii_hexdigit) {
                return Err(invalid(colour, "non-hex digit".to_string()));
            }
            // All bytes are ASCII hex digits, so neither conversion can fail.
            let text = std::str::from_utf8(digits)
                .map_err(|e| invalid(colour, e.to_string()))?;
            u32::from_str_radix(text, 16).map_err(|e| invalid(colour, e.to_string()))
        })
        .collect()
}

/// Legacy float variant: each channel normalized to `0.0..=1.0` by dividing
/// by `2^depth - 1`.
pub fn hex_to_float(colour: &str, channels: usize, depth: u32) -> Result<Vec<f64>, ColorError> {
    let values = hex_to_channels(colour, channels, depth)?;
    let max = ((1u64 << depth) - 1) as f64;
    Ok(values
        .into_iter()
        .map(|v| f64::from(v) / max)
        .collect())
}

fn invalid(colour: &str, reason: String) -> ColorError {
    ColorError::InvalidColor {
        colour: colour.to_string(),
        reason,
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `0xrrggbb` or `rrggbb`.
    pub fn from_hex(colour: &str) -> Result<Self, ColorError> {
        let channels = hex_to_channels(colour, 3, 8)?;
        // 8-bit depth keeps every channel within u8.
        Ok(Self::new(
            channels[0] as u8,
            channels[1] as u8,
            channels[2] as u8,
        ))
    }

    /// Parse either a label name (`"red"`) or a hex colour.
    pub fn parse_tint(s: &str) -> Result<Self, ColorError> {
        match s.parse::<Label>() {
            Ok(label) => Ok(label.color()),
            Err(_) => Self::from_hex(s),
        }
    }

    /// Channels as an array.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels normalized to `0.0..=1.0`.
    pub fn to_float(&self) -> [f64; 3] {
        self.channels().map(|c| f64::from(c) / 255.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Standard VM label colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Red,
    Orange,
    Yellow,
    Green,
    Gray,
    Blue,
    Purple,
    Black,
}

impl Label {
    /// Every label, in palette order.
    pub const ALL: [Label; 8] = [
        Label::Red,
        Label::Orange,
        Label::Yellow,
        Label::Green,
        Label::Gray,
        Label::Blue,
        Label::Purple,
        Label::Black,
    ];

    /// The label's colour.
    pub fn color(&self) -> Color {
        match self {
            Label::Red => Color::new(0xcc, 0x00, 0x00),
            Label::Orange => Color::new(0xf5, 0x79, 0x00),
            Label::Yellow => Color::new(0xed, 0xd4, 0x00),
            Label::Green => Color::new(0x73, 0xd2, 0x16),
            Label::Gray => Color::new(0x55, 0x57, 0x53),
            Label::Blue => Color::new(0x34, 0x65, 0xa4),
            Label::Purple => Color::new(0x75, 0x50, 0x7b),
            Label::Black => Color::new(0x00, 0x00, 0x00),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Label::Red => "red",
            Label::Orange => "orange",
            Label::Yellow => "yellow",
            Label::Green => "green",
            Label::Gray => "gray",
            Label::Blue => "blue",
            Label::Purple => "purple",
            Label::Black => "black",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Label {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Label::ALL
            .into_iter()
            .find(|label| label.name() == lower)
            .ok_or_else(|| invalid(s, "unknown label".to_string()))
    }
}
