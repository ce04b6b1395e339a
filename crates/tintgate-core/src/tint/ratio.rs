//! Fixed-point tint derivation shared by the integer strategies.
//!
//! A tint is held as three numerators over one common denominator so every
//! per-pixel step is an unsigned multiply followed by a truncating divide.

use crate::color::Color;

/// Tint hue/saturation as `num[c] / den`, plus inverted numerators
/// `den - num[c]` for the bright half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TintRatio {
    pub num: [u32; 3],
    pub inv: [u32; 3],
    pub den: u32,
}

impl TintRatio {
    fn new(num: [u32; 3], den: u32) -> Self {
        Self {
            num,
            inv: num.map(|n| den - n),
            den,
        }
    }

    /// The tint's hue and saturation with lightness pinned at 0.5.
    ///
    /// `num[c] <= den` always holds, so `inv` cannot underflow.
    pub fn pinned(colour: Color) -> Self {
        let [tr, tg, tb] = colour.channels().map(u32::from);
        let t_max = tr.max(tg).max(tb);
        let t_min = tr.min(tg).min(tb);
        let tl2 = t_max + t_min;

        if tl2 == 0 || tl2 == 510 {
            Self::new([1, 1, 1], 2)
        } else if tl2 <= 255 {
            Self::new([tr, tg, tb], tl2)
        } else {
            let den = 510 - tl2;
            Self::new([den - (255 - tr), den - (255 - tg), den - (255 - tb)], den)
        }
    }

    /// The tint reduced to its chroma: `(t - min) / (max - min)`.
    ///
    /// Achromatic tints map to one half on every channel.
    pub fn chroma(colour: Color) -> Self {
        let [tr, tg, tb] = colour.channels().map(u32::from);
        let t_max = tr.max(tg).max(tb);
        let t_min = tr.min(tg).min(tb);

        if t_max == t_min {
            Self::new([1, 1, 1], 2)
        } else {
            Self::new([tr - t_min, tg - t_min, tb - t_min], t_max - t_min)
        }
    }

    /// Recolour one pixel of doubled lightness `l2` (`0..=510`).
    pub fn apply_l2(&self, l2: u32) -> [u8; 3] {
        if l2 <= 255 {
            self.num.map(|n| (l2 * n / self.den) as u8)
        } else {
            let l2i = 510 - l2;
            self.inv
                .map(|ni| ((255 * self.den - l2i * ni) / self.den) as u8)
        }
    }
}

/// `(max, min)` of one pixel's colour channels.
pub(crate) fn extremes(rgb: [u8; 3]) -> (u32, u32) {
    let [r, g, b] = rgb.map(u32::from);
    (r.max(g).max(b), r.min(g).min(b))
}
