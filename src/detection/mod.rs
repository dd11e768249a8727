pub mod bounds;
pub mod classify;
pub mod normalize;
pub mod region;
pub mod steps;
pub mod validate;

use crate::buffer::PixelBuffer;
use crate::config::DetectorConfig;
use crate::dataset::RawGeometry;
use crate::error::Result;
use crate::models::{DetectionOutcome, DeviceBounds, MarkerColor, NormalizedRect, Rect};
use crate::pipeline::Pipeline;
use std::path::PathBuf;
use std::sync::Arc;

pub use bounds::scan_device_bounds;
pub use normalize::normalize;
pub use region::find_marker_region;
pub use validate::validate_geometry;

/// Everything the detector learned about one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub device: DeviceBounds,
    pub marker_color: Option<MarkerColor>,
    /// Marker geometry relative to the device crop.
    pub outcome: DetectionOutcome,
}

impl Detection {
    /// Device-relative ratios of an accepted marker.
    pub fn normalized(&self, precision: u32) -> Option<NormalizedRect> {
        match self.outcome {
            DetectionOutcome::Found(marker) => Some(normalize::normalize_with_precision(
                &marker,
                &self.device.rect,
                precision,
            )),
            _ => None,
        }
    }

    /// Accepted marker as fractions of the whole `frame_width` x
    /// `frame_height` image, the box format used for training annotations.
    pub fn canvas_box(&self, frame_width: u32, frame_height: u32, precision: u32) -> Option<NormalizedRect> {
        match self.outcome {
            DetectionOutcome::Found(marker) => Some(normalize::normalize_with_precision(
                &marker.offset_by(&self.device.rect),
                &Rect::full_frame(frame_width, frame_height),
                precision,
            )),
            _ => None,
        }
    }

    /// Pixel geometry for manual review, when a marker was seen at all.
    pub fn raw_geometry(&self) -> Option<RawGeometry> {
        self.outcome
            .rect()
            .map(|marker| RawGeometry::from_rects(&marker, &self.device.rect))
    }
}

/// Main detection pipeline orchestrator
pub struct Detector {
    config: DetectorConfig,
    pipeline: Pipeline,
}

impl Detector {
    /// Build a detector after checking `config` for inconsistent thresholds.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: DetectorConfig) -> Self {
        let pipeline = build_standard_pipeline(&config);
        Self { config, pipeline }
    }

    /// Dump per-step images of every detected image under `output_dir`.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.pipeline = self.pipeline.with_debug(output_dir)?;
        Ok(self)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detect(&self, buffer: &PixelBuffer) -> Result<Detection> {
        self.detect_labeled(buffer, "image")
    }

    /// Run the full pipeline on `buffer`. `label` identifies the image in
    /// logs and debug output.
    pub fn detect_labeled(&self, buffer: &PixelBuffer, label: &str) -> Result<Detection> {
        let data = self.pipeline.run(buffer.clone(), label)?;
        let device = data.device.unwrap_or(DeviceBounds {
            rect: buffer.frame(),
            degraded: true,
        });
        Ok(Detection {
            device,
            marker_color: data.marker_color,
            outcome: data.outcome.unwrap_or(DetectionOutcome::NotFound),
        })
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::from_valid(DetectorConfig::default())
    }
}

/// Build the standard detection pipeline: device bounds, crop, marker
/// search, geometry check.
pub fn build_standard_pipeline(config: &DetectorConfig) -> Pipeline {
    use steps::*;

    Pipeline::new()
        .add_step(Arc::new(DeviceBoundsStep {
            config: config.bounds.clone(),
        }))
        .add_step(Arc::new(DeviceCropStep))
        .add_step(Arc::new(MarkerSearchStep {
            config: config.marker.clone(),
        }))
        .add_step(Arc::new(GeometryCheckStep {
            config: config.validation.clone(),
        }))
}
