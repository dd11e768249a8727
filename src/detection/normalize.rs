use crate::models::{NormalizedRect, Rect};

/// Digits kept by [`normalize`].
pub const DEFAULT_PRECISION: u32 = 4;

/// Most digits [`round_ratio`] will keep; larger requests are clamped.
pub const MAX_PRECISION: u32 = 9;

/// `num / den` rounded half up to `digits` decimal places.
///
/// The rounding is done on the exact rational, so `301 / 800` gives `0.3763`
/// even though the nearest double of the quotient sits just below the half.
/// A zero denominator yields zero. `digits` is clamped to [`MAX_PRECISION`].
pub fn round_ratio(num: i64, den: i64, digits: u32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
    let scale = 10i128.pow(digits.min(MAX_PRECISION));
    let scaled = num as i128 * scale;
    let rounded = (2 * scaled + den as i128).div_euclid(2 * den as i128);
    rounded as f64 / scale as f64
}

/// Marker rectangle as fractions of the device extent, four decimals.
pub fn normalize(rect: &Rect, device: &Rect) -> NormalizedRect {
    normalize_with_precision(rect, device, DEFAULT_PRECISION)
}

/// `rect` as fractions of `frame`'s width and height. An axis of `frame`
/// with no extent maps to zero.
pub fn normalize_with_precision(rect: &Rect, frame: &Rect, digits: u32) -> NormalizedRect {
    let ratio = |value: i32, extent: i32| {
        if extent <= 0 {
            0.0
        } else {
            round_ratio(value as i64, extent as i64, digits)
        }
    };
    NormalizedRect {
        x: ratio(rect.x, frame.width),
        y: ratio(rect.y, frame.height),
        width: ratio(rect.width, frame.width),
        height: ratio(rect.height, frame.height),
    }
}
