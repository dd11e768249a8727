//! Device silhouette search.
//!
//! Foreground pixels are counted per row and per column. Each axis is then
//! scanned for the first dense line, and the silhouette ends at the first
//! line that opens a run of sparse lines at least `gap_run` long. A run cut
//! short by the image edge still counts as a gap.

use crate::buffer::PixelBuffer;
use crate::config::BoundsConfig;
use crate::detection::classify::is_foreground;
use crate::models::{DeviceBounds, Rect};

/// Foreground pixel counts per row and per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityProfile {
    pub rows: Vec<u32>,
    pub cols: Vec<u32>,
}

pub fn density_profile(buffer: &PixelBuffer, config: &BoundsConfig) -> DensityProfile {
    let (width, height) = buffer.dimensions();
    let mut rows = vec![0u32; height as usize];
    let mut cols = vec![0u32; width as usize];

    for (x, y, rgba) in buffer.enumerate_pixels() {
        if is_foreground(rgba, config) {
            rows[y as usize] += 1;
            cols[x as usize] += 1;
        }
    }

    DensityProfile { rows, cols }
}

/// Inclusive `(start, end)` of the dense span along one axis.
pub fn dense_span(counts: &[u32], threshold: u32, gap_run: usize) -> Option<(usize, usize)> {
    let dense = |c: &u32| *c > threshold;
    let start = counts.iter().position(dense)?;

    for i in start + 1..counts.len() {
        let end = (i + gap_run).min(counts.len());
        if !counts[i..end].iter().any(dense) {
            return Some((start, i - 1));
        }
    }

    let end = counts.iter().rposition(dense)?;
    Some((start, end))
}

/// Rectangle of the photographed device, or the whole frame when the
/// silhouette cannot be trusted.
pub fn scan_device_bounds(buffer: &PixelBuffer, config: &BoundsConfig) -> DeviceBounds {
    let (width, height) = buffer.dimensions();
    let full = DeviceBounds {
        rect: Rect::full_frame(width, height),
        degraded: true,
    };
    if buffer.is_empty() {
        return full;
    }

    let profile = density_profile(buffer, config);
    let min_row_pixels = (width as f64 * config.min_density_ratio).floor() as u32;
    let min_col_pixels = (height as f64 * config.min_density_ratio).floor() as u32;

    let rows = dense_span(&profile.rows, min_row_pixels, config.gap_run);
    let cols = dense_span(&profile.cols, min_col_pixels, config.gap_run);
    let (Some((top, bottom)), Some((left, right))) = (rows, cols) else {
        log::debug!("no foreground silhouette in {}x{} frame", width, height);
        return full;
    };

    let rect = Rect::new(
        left as i32,
        top as i32,
        (right - left) as i32,
        (bottom - top) as i32,
    );

    let aspect_ok = rect
        .aspect_ratio()
        .is_some_and(|a| a >= config.aspect_min && a <= config.aspect_max);
    let wide_enough = rect.width as f64 >= width as f64 * config.min_extent_ratio;
    let tall_enough = rect.height as f64 >= height as f64 * config.min_extent_ratio;

    if !(aspect_ok && wide_enough && tall_enough) {
        log::warn!(
            "device silhouette {} rejected (aspect {:?}), using full {}x{} frame",
            rect,
            rect.aspect_ratio(),
            width,
            height
        );
        return full;
    }

    DeviceBounds {
        rect,
        degraded: false,
    }
}
