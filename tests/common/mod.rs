mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from nfc_locator for tests
pub use nfc_locator::{
    AnomalyReason, DetectionOutcome, Detector, DetectorConfig, NormalizedRect, PixelBuffer, Rect,
};
