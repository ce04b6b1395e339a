//! Floating-point HLS round trip used by the legacy tint strategy.
//!
//! Hue in `0.0..1.0`, lightness and saturation in `0.0..=1.0`.

const ONE_THIRD: f64 = 1.0 / 3.0;
const ONE_SIXTH: f64 = 1.0 / 6.0;
const TWO_THIRD: f64 = 2.0 / 3.0;

/// Convert normalized RGB to `(hue, lightness, saturation)`.
pub(crate) fn rgb_to_hls(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max_c = r.max(g).max(b);
    let min_c = r.min(g).min(b);
    let sum_c = max_c + min_c;
    let range_c = max_c - min_c;
    let l = sum_c / 2.0;

    if min_c == max_c {
        return (0.0, l, 0.0);
    }

    let s = if l <= 0.5 {
        range_c / sum_c
    } else {
        range_c / (2.0 - sum_c)
    };

    let rc = (max_c - r) / range_c;
    let gc = (max_c - g) / range_c;
    let bc = (max_c - b) / range_c;
    let h = if r == max_c {
        bc - gc
    } else if g == max_c {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    ((h / 6.0).rem_euclid(1.0), l, s)
}

/// Convert `(hue, lightness, saturation)` back to normalized RGB.
pub(crate) fn hls_to_rgb(h: f64, l: f64, s: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }

    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;

    (
        channel(m1, m2, h + ONE_THIRD),
        channel(m1, m2, h),
        channel(m1, m2, h - ONE_THIRD),
    )
}

fn channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < ONE_SIXTH {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < TWO_THIRD {
        m1 + (m2 - m1) * (TWO_THIRD - hue) * 6.0
    } else {
        m1
    }
}
