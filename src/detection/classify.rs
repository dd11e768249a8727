use crate::config::{BlackThresholds, BoundsConfig, MarkerConfig, RedThresholds};
use crate::models::MarkerColor;

/// Part of the photographed device: opaque enough and not near-white.
#[inline]
pub fn is_foreground(rgba: [u8; 4], config: &BoundsConfig) -> bool {
    let [r, g, b, a] = rgba;
    let transparent = a < config.alpha_cutoff;
    let white = r > config.white_cutoff && g > config.white_cutoff && b > config.white_cutoff;
    !transparent && !white
}

#[inline]
pub fn is_marker_red(rgba: [u8; 4], t: &RedThresholds) -> bool {
    let [r, g, b, _] = rgba;
    let (ri, gi, bi) = (r as i16, g as i16, b as i16);
    r > t.min_red
        && g < t.max_green
        && b < t.max_blue
        && ri - gi > t.min_dominance
        && ri - bi > t.min_dominance
}

#[inline]
pub fn is_marker_black(rgba: [u8; 4], t: &BlackThresholds) -> bool {
    let [r, g, b, _] = rgba;
    let (ri, gi, bi) = (r as i16, g as i16, b as i16);
    let brightness = (ri + gi + bi) as f32 / 3.0;
    brightness < t.max_brightness
        && (ri - gi).abs() < t.max_channel_spread
        && (gi - bi).abs() < t.max_channel_spread
}

/// Predicate for one marker color family.
pub fn matches_marker(color: MarkerColor, rgba: [u8; 4], config: &MarkerConfig) -> bool {
    match color {
        MarkerColor::Red => is_marker_red(rgba, &config.red),
        MarkerColor::Black => is_marker_black(rgba, &config.black),
    }
}
