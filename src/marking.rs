//! Hand-made records and review of raw geometries.

use crate::config::{DetectorConfig, ValidationConfig};
use crate::dataset::{read_json, NfcRecord, RawGeometry};
use crate::detection::normalize::normalize_with_precision;
use crate::detection::validate::{validate_geometry, validate_raw, Accepted};
use crate::error::Result;
use crate::models::{AnomalyReason, Rect};
use serde::Deserialize;
use std::path::Path;

/// Turn a marker drawn on a `width` x `height` device frame into a dataset
/// record. The frame itself is the device, so the record ratio is
/// `height / width`.
pub fn mark_record(
    brand: &str,
    model: &str,
    frame: (u32, u32),
    marker: &Rect,
    config: &DetectorConfig,
) -> std::result::Result<NfcRecord, AnomalyReason> {
    let device = Rect::full_frame(frame.0, frame.1);
    validate_geometry(marker, &device, &config.validation)?;
    let location = normalize_with_precision(marker, &device, config.precision);
    Ok(NfcRecord::new(brand, model, &device, location, config.precision))
}

/// A geometry file holds either one object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GeometryInput {
    Many(Vec<RawGeometry>),
    One(RawGeometry),
}

impl GeometryInput {
    pub fn into_vec(self) -> Vec<RawGeometry> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

pub fn read_geometries(path: &Path) -> Result<Vec<RawGeometry>> {
    Ok(read_json::<GeometryInput>(path)?.into_vec())
}

/// Verdict for each geometry, in input order.
pub fn check_geometries(
    geometries: &[RawGeometry],
    config: &ValidationConfig,
) -> Vec<std::result::Result<Accepted, AnomalyReason>> {
    geometries.iter().map(|raw| validate_raw(raw, config)).collect()
}
