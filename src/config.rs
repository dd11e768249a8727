//! Tunable thresholds for every detection stage.
//!
//! All values default to the tuning used to build the existing NFC location
//! dataset. A JSON file may override any subset of them.

use crate::detection::normalize::MAX_PRECISION;
use crate::error::{NfcError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub bounds: BoundsConfig,
    pub marker: MarkerConfig,
    pub validation: ValidationConfig,
    /// Decimal digits kept in normalized coordinates.
    pub precision: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            marker: MarkerConfig::default(),
            validation: ValidationConfig::default(),
            precision: 4,
        }
    }
}

/// Device silhouette search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsConfig {
    /// Pixels with alpha below this are transparent padding.
    pub alpha_cutoff: u8,
    /// Pixels with all of R, G and B above this are white padding.
    pub white_cutoff: u8,
    /// Fraction of the row width (column height) a line must exceed to be
    /// part of the silhouette.
    pub min_density_ratio: f64,
    /// Consecutive sparse lines that end the silhouette.
    pub gap_run: usize,
    pub aspect_min: f64,
    pub aspect_max: f64,
    /// Minimum silhouette extent as a fraction of the frame, per axis.
    pub min_extent_ratio: f64,
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            alpha_cutoff: 10,
            white_cutoff: 240,
            min_density_ratio: 0.01,
            gap_run: 10,
            aspect_min: 0.4,
            aspect_max: 0.6,
            min_extent_ratio: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub red: RedThresholds,
    pub black: BlackThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedThresholds {
    pub min_red: u8,
    pub max_green: u8,
    pub max_blue: u8,
    /// Required margin of R over each of G and B.
    pub min_dominance: i16,
}

impl Default for RedThresholds {
    fn default() -> Self {
        Self {
            min_red: 180,
            max_green: 80,
            max_blue: 80,
            min_dominance: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackThresholds {
    /// Mean of R, G and B must stay below this.
    pub max_brightness: f32,
    /// |R-G| and |G-B| must stay below this.
    pub max_channel_spread: i16,
}

impl Default for BlackThresholds {
    fn default() -> Self {
        Self {
            max_brightness: 50.0,
            max_channel_spread: 10,
        }
    }
}

/// Sanity bands for accepted detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub aspect_min: f64,
    pub aspect_max: f64,
    pub max_area_ratio: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            aspect_min: 0.4,
            aspect_max: 0.65,
            max_area_ratio: 0.3,
        }
    }
}

impl DetectorConfig {
    /// Read a (possibly partial) config from a JSON file and validate it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let b = &self.bounds;
        if b.aspect_min <= 0.0 || b.aspect_min > b.aspect_max {
            return Err(NfcError::InvalidConfig(format!(
                "bounds aspect band [{}, {}] is empty or non-positive",
                b.aspect_min, b.aspect_max
            )));
        }
        if !(0.0..1.0).contains(&b.min_density_ratio) {
            return Err(NfcError::InvalidConfig(format!(
                "min_density_ratio must be in [0, 1), got {}",
                b.min_density_ratio
            )));
        }
        if !(0.0..=1.0).contains(&b.min_extent_ratio) {
            return Err(NfcError::InvalidConfig(format!(
                "min_extent_ratio must be in [0, 1], got {}",
                b.min_extent_ratio
            )));
        }
        if b.gap_run == 0 {
            return Err(NfcError::InvalidConfig("gap_run must be > 0".into()));
        }

        let v = &self.validation;
        if v.aspect_min <= 0.0 || v.aspect_min > v.aspect_max {
            return Err(NfcError::InvalidConfig(format!(
                "validation aspect band [{}, {}] is empty or non-positive",
                v.aspect_min, v.aspect_max
            )));
        }
        if v.max_area_ratio <= 0.0 {
            return Err(NfcError::InvalidConfig(format!(
                "max_area_ratio must be > 0, got {}",
                v.max_area_ratio
            )));
        }
        if self.precision > MAX_PRECISION {
            return Err(NfcError::InvalidConfig(format!(
                "precision must be at most {} digits, got {}",
                MAX_PRECISION, self.precision
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "validation": { "aspect_max": 0.6 } }"#).unwrap();
        assert_eq!(config.validation.aspect_max, 0.6);
        assert_eq!(config.validation.aspect_min, 0.4);
        assert_eq!(config.bounds, BoundsConfig::default());
        assert_eq!(config.precision, 4);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let mut config = DetectorConfig::default();
        config.validation.aspect_min = 0.7;
        assert!(matches!(config.validate(), Err(NfcError::InvalidConfig(_))));
    }

    #[test]
    fn zero_gap_run_is_rejected() {
        let mut config = DetectorConfig::default();
        config.bounds.gap_run = 0;
        assert!(config.validate().is_err());
    }
}
