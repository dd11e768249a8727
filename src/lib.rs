pub mod batch;
pub mod buffer;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod marking;
pub mod models;
pub mod pipeline;

pub use batch::{BatchContext, BatchProcessor, BatchSummary, ImageOutcome, ReviewReason, UnmatchedImage};
pub use buffer::PixelBuffer;
pub use config::DetectorConfig;
pub use dataset::{AnnotationSet, NfcLocation, NfcRecord, RawGeometry};
pub use detection::{
    find_marker_region, normalize, scan_device_bounds, validate_geometry, Detection, Detector,
};
pub use error::{NfcError, Result};
pub use marking::{check_geometries, mark_record, read_geometries};
pub use models::{AnomalyReason, DetectionOutcome, DeviceBounds, MarkerColor, NormalizedRect, Rect};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
