use crate::config::{BoundsConfig, MarkerConfig, ValidationConfig};
use crate::detection::{bounds, region, validate};
use crate::error::{NfcError, Result};
use crate::models::{DetectionOutcome, DeviceBounds, Rect};
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;

const DEVICE_STROKE: Rgba<u8> = Rgba([0, 255, 0, 255]);
const MARKER_STROKE: Rgba<u8> = Rgba([0, 0, 255, 255]);

/// Stroke `rect` two pixels wide. Degenerate rectangles are skipped.
fn stroke(img: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    for inset in 0..2 {
        let w = rect.width - 2 * inset;
        let h = rect.height - 2 * inset;
        if w <= 0 || h <= 0 {
            return;
        }
        let r = imageproc::rect::Rect::at(rect.x + inset, rect.y + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(img, r, color);
    }
}

/// Working view with the marker stroked in blue, when it has an extent.
fn marker_overlay(data: &PipelineData) -> RgbaImage {
    let mut img = data.view.to_image();
    if let Some(rect) = data.outcome.and_then(|o| o.rect()) {
        stroke(&mut img, &rect, MARKER_STROKE);
    }
    img
}

fn require_device(data: &PipelineData, step: &str) -> Result<DeviceBounds> {
    data.device.ok_or_else(|| NfcError::StepOrder {
        step: step.to_string(),
        missing: "device bounds",
    })
}

/// Locate the device silhouette in the full frame
pub struct DeviceBoundsStep {
    pub config: BoundsConfig,
}

impl PipelineStep for DeviceBoundsStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let device = bounds::scan_device_bounds(&data.original, &self.config);
        log::debug!("device bounds {} (degraded: {})", device.rect, device.degraded);
        data.device = Some(device);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Device Bounds"
    }

    fn debug_image(&self, data: &PipelineData) -> RgbaImage {
        let mut img = data.original.to_image();
        if let Some(device) = &data.device {
            stroke(&mut img, &device.rect, DEVICE_STROKE);
        }
        img
    }
}

/// Restrict the working view to the device rectangle
pub struct DeviceCropStep;

impl PipelineStep for DeviceCropStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let device = require_device(&data, self.name())?;
        data.view = data.original.crop(&device.rect);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Device Crop"
    }
}

/// Search the working view for a red, then black, marker
pub struct MarkerSearchStep {
    pub config: MarkerConfig,
}

impl PipelineStep for MarkerSearchStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        match region::find_marker(&data.view, &self.config) {
            Some(found) => {
                data.marker_color = Some(found.color);
                data.outcome = Some(found.outcome());
            }
            None => data.outcome = Some(DetectionOutcome::NotFound),
        }
        Ok(data)
    }

    fn name(&self) -> &str {
        "Marker Search"
    }

    fn debug_image(&self, data: &PipelineData) -> RgbaImage {
        marker_overlay(data)
    }
}

/// Flag found markers whose geometry is implausible
pub struct GeometryCheckStep {
    pub config: ValidationConfig,
}

impl PipelineStep for GeometryCheckStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let device = require_device(&data, self.name())?;
        let Some(DetectionOutcome::Found(marker)) = data.outcome else {
            return Ok(data);
        };

        match validate::validate_geometry(&marker, &device.rect, &self.config) {
            Ok(accepted) => {
                log::debug!("marker {} covers {:.4} of the device", marker, accepted.area_ratio);
            }
            Err(reason) => {
                log::debug!("marker {} inside device {} flagged: {}", marker, device.rect, reason);
                data.outcome = Some(DetectionOutcome::Anomalous(marker, reason));
            }
        }
        Ok(data)
    }

    fn name(&self) -> &str {
        "Geometry Check"
    }

    fn debug_image(&self, data: &PipelineData) -> RgbaImage {
        marker_overlay(data)
    }
}
