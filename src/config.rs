//! Config module.
//! Manages I/O for the scan configuration JSON (reference layout, threshold, geometry policy).
//! Uses serde for JSON serialization; every field falls back to its default when omitted.
//! The config is an immutable value handed to `scan`, never process-wide state.

use crate::error::ScanError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How the reference layout is mapped onto a capture of a different resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// `s = (W/Wr + H/Hr) / 2`, no offsets. Assumes the capture keeps the reference aspect ratio.
    #[default]
    UniformAverage,
    /// Scale by the binding dimension and center the layout in the excess one (letterboxing).
    AspectFit,
}

impl std::fmt::Display for GeometryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryPolicy::UniformAverage => write!(f, "uniform average"),
            GeometryPolicy::AspectFit => write!(f, "aspect fit"),
        }
    }
}

impl std::str::FromStr for GeometryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" | "uniform-average" | "uniform_average" => Ok(GeometryPolicy::UniformAverage),
            "aspect-fit" | "aspect_fit" | "aspect" => Ok(GeometryPolicy::AspectFit),
            other => Err(format!("invalid geometry policy '{other}', expected uniform|aspect-fit")),
        }
    }
}

/// Board layout measured in reference-resolution pixels.
/// `start` is the center of cell (0,0), `end` the center of cell (9,8).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceLayout {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    /// Side of the square crop taken around each intersection
    pub cell_size: f64,
}

impl Default for ReferenceLayout {
    fn default() -> Self {
        Self {
            start_x: 177.0,
            start_y: 103.0,
            end_x: 920.0,
            end_y: 930.0,
            cell_size: 55.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub reference_width: u32,
    pub reference_height: u32,
    pub layout: ReferenceLayout,
    /// Minimum normalized cross-correlation score for a piece to be accepted
    pub threshold: f32,
    pub geometry: GeometryPolicy,
    /// Directory holding the 14 template PNGs
    pub template_dir: PathBuf,
    /// Accepted detections scoring below this are flagged as low confidence
    pub low_confidence_ceiling: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reference_width: 1920,
            reference_height: 1080,
            layout: ReferenceLayout::default(),
            threshold: 0.70,
            geometry: GeometryPolicy::default(),
            template_dir: PathBuf::from("templates"),
            low_confidence_ceiling: 0.85,
        }
    }
}

impl ScanConfig {
    /// Load config from file, or return defaults if the file doesn't exist.
    /// A file that exists but fails to parse is an error rather than a silent fallback.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;
        config.validate()?;
        log::info!("Loaded scan config from {}", config_path.display());
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, json)
            .with_context(|| format!("Failed to write config: {}", config_path.display()))
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        let invalid = |msg: String| -> Result<(), ScanError> { Err(ScanError::InvalidConfig(msg)) };
        if self.reference_width == 0 || self.reference_height == 0 {
            return invalid(format!(
                "reference resolution must be positive, got {}x{}",
                self.reference_width, self.reference_height
            ));
        }
        let l = &self.layout;
        if !(l.end_x > l.start_x && l.end_y > l.start_y) {
            return invalid(format!(
                "layout end ({}, {}) must lie right of and below start ({}, {})",
                l.end_x, l.end_y, l.start_x, l.start_y
            ));
        }
        if !(l.cell_size >= 2.0) {
            return invalid(format!("cell size must be at least 2 px, got {}", l.cell_size));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return invalid(format!("threshold must be within [0, 1], got {}", self.threshold));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let config = ScanConfig::default();
        assert_eq!((config.reference_width, config.reference_height), (1920, 1080));
        assert_eq!(config.layout.start_x, 177.0);
        assert_eq!(config.layout.end_y, 930.0);
        assert_eq!(config.threshold, 0.70);
        assert_eq!(config.geometry, GeometryPolicy::UniformAverage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        let config = ScanConfig {
            threshold: 0.8,
            geometry: GeometryPolicy::AspectFit,
            ..ScanConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ScanConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{ "threshold": 0.9, "layout": { "cell_size": 40 } }"#).unwrap();
        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.threshold, 0.9);
        assert_eq!(config.layout.cell_size, 40.0);
        assert_eq!(config.layout.start_x, 177.0);
        assert_eq!(config.reference_width, 1920);
    }

    #[test]
    fn test_unparseable_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, "not json").unwrap();
        assert!(ScanConfig::load(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScanConfig { threshold: 1.5, ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ScanError::InvalidConfig(_))));
        config.threshold = 0.7;
        config.layout.end_x = 100.0;
        assert!(config.validate().is_err());
        config.layout = ReferenceLayout::default();
        config.reference_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_geometry_policy_from_str() {
        assert_eq!("uniform".parse::<GeometryPolicy>(), Ok(GeometryPolicy::UniformAverage));
        assert_eq!("Aspect-Fit".parse::<GeometryPolicy>(), Ok(GeometryPolicy::AspectFit));
        assert!("stretch".parse::<GeometryPolicy>().is_err());
    }
}
