//! Sanity checks that keep implausible detections out of the dataset.
//!
//! Checks run in a fixed order and the first failure wins:
//! missing values, device aspect ratio, marker area, marker containment.

use crate::config::ValidationConfig;
use crate::dataset::RawGeometry;
use crate::models::{AnomalyReason, Rect};

/// Measurements of a geometry that passed every check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accepted {
    pub device_aspect: f64,
    pub area_ratio: f64,
}

/// Validate a marker rectangle expressed relative to the device crop.
pub fn validate_geometry(
    marker: &Rect,
    device: &Rect,
    config: &ValidationConfig,
) -> Result<Accepted, AnomalyReason> {
    validate_raw(&RawGeometry::from_rects(marker, device), config)
}

/// Validate a geometry whose fields may be missing.
pub fn validate_raw(raw: &RawGeometry, config: &ValidationConfig) -> Result<Accepted, AnomalyReason> {
    let (Some(top), Some(left), Some(width), Some(height), Some(dw), Some(dh)) = (
        raw.top,
        raw.left,
        raw.width,
        raw.height,
        raw.device_width,
        raw.device_height,
    ) else {
        return Err(AnomalyReason::IncompleteData);
    };
    if dw == 0.0 || dh == 0.0 || [top, left, width, height, dw, dh].iter().any(|v| v.is_nan()) {
        return Err(AnomalyReason::IncompleteData);
    }

    let device_aspect = dw / dh;
    if device_aspect < config.aspect_min || device_aspect > config.aspect_max {
        return Err(AnomalyReason::AbnormalDeviceAspectRatio);
    }

    let area_ratio = (width * height) / (dw * dh);
    if area_ratio > config.max_area_ratio {
        return Err(AnomalyReason::MarkerAreaTooLarge);
    }

    if top < 0.0 || left < 0.0 || top + height > dh || left + width > dw {
        return Err(AnomalyReason::MarkerOutOfBounds);
    }

    Ok(Accepted {
        device_aspect,
        area_ratio,
    })
}
