//! JSON shapes shared with the surrounding dataset tooling.
//!
//! `NfcRecord` is the entry format of the NFC location dataset,
//! `AnnotationSet` is the `annotations.json` consumed by training, and
//! `RawGeometry` is the pixel-space geometry kept for manual review.

use crate::detection::normalize::round_ratio;
use crate::error::Result;
use crate::models::{NormalizedRect, Rect};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const UNKNOWN: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfcRecord {
    pub device: DeviceInfo,
    pub nfc_location: NfcLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub brand: String,
    pub model: String,
    /// Device height over device width.
    pub ratio: f64,
}

/// Marker location as fractions of the device extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NfcLocation {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl From<NormalizedRect> for NfcLocation {
    fn from(n: NormalizedRect) -> Self {
        Self {
            top: n.y,
            left: n.x,
            width: n.width,
            height: n.height,
        }
    }
}

impl NfcRecord {
    /// Build a record from an already normalized marker. Brand and model are
    /// uppercased.
    pub fn new(brand: &str, model: &str, device: &Rect, location: NormalizedRect, precision: u32) -> Self {
        Self {
            device: DeviceInfo {
                brand: brand.to_uppercase(),
                model: model.to_uppercase(),
                ratio: round_ratio(device.height as i64, device.width as i64, precision),
            },
            nfc_location: location.into(),
        }
    }
}

/// Pixel geometry of a marker inside its device crop. Every field is
/// optional so that incomplete inputs can be represented and rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGeometry {
    pub top: Option<f64>,
    pub left: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub device_width: Option<f64>,
    pub device_height: Option<f64>,
}

impl RawGeometry {
    pub fn from_rects(marker: &Rect, device: &Rect) -> Self {
        Self {
            top: Some(marker.y as f64),
            left: Some(marker.x as f64),
            width: Some(marker.width as f64),
            height: Some(marker.height as f64),
            device_width: Some(device.width as f64),
            device_height: Some(device.height as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnotationSet {
    pub images: Vec<AnnotatedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedImage {
    pub file_name: String,
    pub annotations: NormalizedRect,
}

impl AnnotationSet {
    pub fn push(&mut self, file_name: impl Into<String>, annotations: NormalizedRect) {
        self.images.push(AnnotatedImage {
            file_name: file_name.into(),
            annotations,
        });
    }

    pub fn get(&self, file_name: &str) -> Option<&NormalizedRect> {
        self.images
            .iter()
            .find(|img| img.file_name == file_name)
            .map(|img| &img.annotations)
    }

    /// File names whose box has a value outside `[0, 1]`.
    pub fn out_of_range(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|img| !img.annotations.is_within_unit())
            .map(|img| img.file_name.as_str())
            .collect()
    }
}

/// `(brand, model)` from the grandparent and parent directory names of
/// `relative`, uppercased, `UNKNOWN` where the path is too shallow.
pub fn device_identity(relative: &Path) -> (String, String) {
    let dirs: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let mut rev = dirs.iter().rev();
    let model = rev.next().map(|s| s.to_uppercase()).unwrap_or_else(|| UNKNOWN.to_string());
    let brand = rev.next().map(|s| s.to_uppercase()).unwrap_or_else(|| UNKNOWN.to_string());
    (brand, model)
}

/// Pretty-print `value` as JSON with two-space indentation.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::normalize::normalize;
    use serde_json::json;

    #[test]
    fn record_serializes_to_dataset_shape() {
        let device = Rect::new(0, 0, 400, 800);
        let marker = Rect::new(151, 301, 48, 38);
        let record = NfcRecord::new("apple", "iphone 15", &device, normalize(&marker, &device), 4);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "device": { "brand": "APPLE", "model": "IPHONE 15", "ratio": 2.0 },
                "nfcLocation": { "top": 0.3763, "left": 0.3775, "width": 0.12, "height": 0.0475 }
            })
        );
    }

    #[test]
    fn raw_geometry_tolerates_missing_fields() {
        let raw: RawGeometry = serde_json::from_str(r#"{ "top": 3, "deviceWidth": 100 }"#).unwrap();
        assert_eq!(raw.top, Some(3.0));
        assert_eq!(raw.device_width, Some(100.0));
        assert_eq!(raw.left, None);
    }

    #[test]
    fn annotation_range_check() {
        let mut set = AnnotationSet::default();
        set.push("a.png", NormalizedRect { x: 0.1, y: 0.2, width: 0.3, height: 0.4 });
        set.push("b.png", NormalizedRect { x: 0.9, y: 0.2, width: 1.2, height: 0.1 });
        assert_eq!(set.out_of_range(), vec!["b.png"]);
        assert_eq!(set.get("a.png").map(|n| n.width), Some(0.3));
    }

    #[test]
    fn identity_from_directory_layout() {
        assert_eq!(
            device_identity(Path::new("phones/Samsung/Galaxy S24/back.jpg")),
            ("SAMSUNG".to_string(), "GALAXY S24".to_string())
        );
        assert_eq!(
            device_identity(Path::new("pixel8/back.jpg")),
            (UNKNOWN.to_string(), "PIXEL8".to_string())
        );
        assert_eq!(
            device_identity(Path::new("back.jpg")),
            (UNKNOWN.to_string(), UNKNOWN.to_string())
        );
    }
}
