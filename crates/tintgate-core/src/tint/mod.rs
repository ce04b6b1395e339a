//! Label-colour tinting.
//!
//! Every strategy replaces the hue and saturation of each pixel with those of
//! the tint colour while keeping (a function of) the pixel's own lightness.
//! Alpha is copied unchanged and the input buffer is never touched.
//!
//! Strategies are always chosen explicitly; [`tint`] uses
//! [`TintStrategy::default`].
//!
//! ```
//! use tintgate_core::{tint, Color, PixelBuffer};
//!
//! let icon = PixelBuffer::from_rgba(1, 1, vec![0xff, 0x00, 0x00, 0xff]).unwrap();
//! let tinted = tint(&icon, Color::new(0, 0, 0xff));
//! assert_eq!(tinted.data(), &[0x00, 0x00, 0xff, 0xff]);
//! ```

mod hls;
mod ratio;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::types::PixelBuffer;
use ratio::{extremes, TintRatio};

/// Named tint algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TintStrategy {
    /// Lightness-preserving integer tint with dark pixels lifted by a quarter
    /// towards mid lightness, so black artwork still shows the label.
    ///
    /// The lift `l2 + (255 - l2) / 4` is not a historical tint algorithm. It
    /// is a reconciliation chosen so that black under `#0000ff` becomes
    /// `#00003f`; [`Lightness`](TintStrategy::Lightness) is the unlifted
    /// formula, which maps the same pixel to `#000000`.
    #[default]
    Label,

    /// Lightness-preserving integer tint, tint pinned at lightness 0.5.
    Lightness,

    /// Integer tint that keeps each pixel's min/max (lightness and chroma)
    /// and takes only the hue from the tint.
    Saturation,

    /// Floating-point HLS round trip.
    Hls,
}

impl TintStrategy {
    pub const ALL: [TintStrategy; 4] = [
        TintStrategy::Label,
        TintStrategy::Lightness,
        TintStrategy::Saturation,
        TintStrategy::Hls,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TintStrategy::Label => "label",
            TintStrategy::Lightness => "lightness",
            TintStrategy::Saturation => "saturation",
            TintStrategy::Hls => "hls",
        }
    }

    /// Return a new buffer tinted with `colour`.
    pub fn apply(&self, buffer: &PixelBuffer, colour: Color) -> PixelBuffer {
        match self {
            TintStrategy::Label => {
                let ratio = TintRatio::pinned(colour);
                map_rgb(buffer, |rgb| {
                    let (max, min) = extremes(rgb);
                    ratio.apply_l2(lift_shadows(max + min))
                })
            }
            TintStrategy::Lightness => {
                let ratio = TintRatio::pinned(colour);
                map_rgb(buffer, |rgb| {
                    let (max, min) = extremes(rgb);
                    ratio.apply_l2(max + min)
                })
            }
            TintStrategy::Saturation => {
                let ratio = TintRatio::chroma(colour);
                map_rgb(buffer, |rgb| {
                    let (max, min) = extremes(rgb);
                    let chroma = max - min;
                    ratio.num.map(|n| (min + chroma * n / ratio.den) as u8)
                })
            }
            TintStrategy::Hls => {
                let [tr, tg, tb] = colour.to_float();
                let (hue, _, saturation) = hls::rgb_to_hls(tr, tg, tb);
                map_rgb(buffer, |rgb| {
                    let [r, g, b] = rgb.map(|c| f64::from(c) / 255.0);
                    let (_, lightness, _) = hls::rgb_to_hls(r, g, b);
                    let (r, g, b) = hls::hls_to_rgb(hue, lightness, saturation);
                    [r, g, b].map(|v| (v * 255.0) as u8)
                })
            }
        }
    }
}

impl fmt::Display for TintStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TintStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        TintStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == lower)
            .ok_or_else(|| format!("unknown tint strategy: {s}"))
    }
}

/// Tint with the default strategy.
pub fn tint(buffer: &PixelBuffer, colour: Color) -> PixelBuffer {
    TintStrategy::default().apply(buffer, colour)
}

/// Raise doubled lightness in the dark half by a quarter of its distance to
/// mid lightness; the bright half passes through.
fn lift_shadows(l2: u32) -> u32 {
    if l2 <= 255 {
        l2 + (255 - l2) / 4
    } else {
        l2
    }
}

fn map_rgb(buffer: &PixelBuffer, f: impl Fn([u8; 3]) -> [u8; 3]) -> PixelBuffer {
    let mut out = Vec::with_capacity(buffer.data().len());
    for px in buffer.pixels() {
        let [r, g, b] = f([px[0], px[1], px[2]]);
        out.extend_from_slice(&[r, g, b, px[3]]);
    }
    PixelBuffer::from_validated(buffer.width(), buffer.height(), out)
}
