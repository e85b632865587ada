//! Pipeline configuration values.
//!
//! Each pipeline entry point takes one of these structs by reference; there
//! is no process-wide state. Both serialize to pretty JSON so a run can be
//! saved and repeated, and the command-line tools override single fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::sequence::SequenceOrder;

/// Default low percentile for display stretching
pub const DEFAULT_PERCENTILE_LOW: f64 = 5.0;
/// Default high percentile for display stretching
pub const DEFAULT_PERCENTILE_HIGH: f64 = 99.9;

/// Settings for median background subtraction and sharpening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Directory holding the input FITS frames
    pub source_directory: PathBuf,
    /// Directory receiving one PNG per processed frame
    pub output_directory: PathBuf,
    /// Neighbouring frames used on each side of the target
    pub window_radius: usize,
    /// Gaussian sigma smoothing the median background (pixels)
    pub blur_sigma: f64,
    /// Gaussian sigma of the unsharp mask (pixels)
    pub sharpen_sigma: f64,
    /// Unsharp mask gain
    pub sharpen_strength: f64,
    pub percentile_low: f64,
    pub percentile_high: f64,
    /// Search subdirectories of the source directory
    pub recursive: bool,
    pub ordering: SequenceOrder,
    /// Only process frames with a complete window on both sides; a sequence
    /// shorter than `2 * window_radius + 1` is then an error
    pub full_window_only: bool,
    /// Keep decoded window frames in memory between targets
    pub cache_frames: bool,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("."),
            output_directory: PathBuf::from("output"),
            window_radius: 10,
            blur_sigma: 5.0,
            sharpen_sigma: 10.0,
            sharpen_strength: 10.0,
            percentile_low: DEFAULT_PERCENTILE_LOW,
            percentile_high: DEFAULT_PERCENTILE_HIGH,
            recursive: true,
            ordering: SequenceOrder::Filename,
            full_window_only: true,
            cache_frames: false,
        }
    }
}

impl BackgroundConfig {
    pub fn validate(&self) -> Result<()> {
        validate_percentiles(self.percentile_low, self.percentile_high)?;
        validate_sigma("blur_sigma", self.blur_sigma)?;
        validate_sigma("sharpen_sigma", self.sharpen_sigma)?;
        if !self.sharpen_strength.is_finite() {
            return Err(PipelineError::Config(format!(
                "sharpen_strength must be finite, got {}",
                self.sharpen_strength
            )));
        }
        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        save_json(self, path)
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        load_json(path)
    }
}

/// Settings for the averaged frame-difference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferenceConfig {
    pub source_directory: PathBuf,
    /// File name of the first frame of the range
    pub start_filename: String,
    /// Frames in the range, including the first
    pub frame_count: usize,
    /// Lossless FITS output
    pub output_fits: PathBuf,
    /// Optional 8-bit preview
    pub output_preview: Option<PathBuf>,
    pub percentile_low: f64,
    pub percentile_high: f64,
    pub recursive: bool,
    pub ordering: SequenceOrder,
}

impl Default for DifferenceConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("."),
            start_filename: String::new(),
            frame_count: 25,
            output_fits: PathBuf::from("difference_image.fits"),
            output_preview: None,
            percentile_low: DEFAULT_PERCENTILE_LOW,
            percentile_high: DEFAULT_PERCENTILE_HIGH,
            recursive: false,
            ordering: SequenceOrder::Filename,
        }
    }
}

impl DifferenceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.start_filename.is_empty() {
            return Err(PipelineError::Config(
                "start_filename must name a frame".to_string(),
            ));
        }
        if self.frame_count == 0 {
            return Err(PipelineError::Config(
                "frame_count must be at least 1".to_string(),
            ));
        }
        validate_percentiles(self.percentile_low, self.percentile_high)
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        save_json(self, path)
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        load_json(path)
    }
}

/// Percentiles must lie in `[0, 100]` with `low <= high`.
pub fn validate_percentiles(low: f64, high: f64) -> Result<()> {
    let in_range = |p: f64| (0.0..=100.0).contains(&p);
    if !in_range(low) || !in_range(high) || low > high {
        return Err(PipelineError::Config(format!(
            "percentiles must satisfy 0 <= low <= high <= 100, got {low} and {high}"
        )));
    }
    Ok(())
}

fn validate_sigma(name: &str, sigma: f64) -> Result<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(PipelineError::Config(format!(
            "{name} must be a non-negative number, got {sigma}"
        )));
    }
    Ok(())
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> std::io::Result<T> {
    let json = std::fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_background_defaults() {
        let config = BackgroundConfig::default();
        assert_eq!(config.window_radius, 10);
        assert_eq!(config.blur_sigma, 5.0);
        assert_eq!(config.sharpen_sigma, 10.0);
        assert_eq!(config.sharpen_strength, 10.0);
        assert_eq!(config.percentile_low, 5.0);
        assert_eq!(config.percentile_high, 99.9);
        assert!(config.full_window_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_background_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("background.json");

        let config = BackgroundConfig {
            window_radius: 3,
            ordering: SequenceOrder::HeaderTimestamp {
                key: "DATE-OBS".to_string(),
            },
            cache_frames: true,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = BackgroundConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(
            &path,
            r#"{ "start_filename": "img_0042.fits", "frame_count": 5 }"#,
        )
        .unwrap();

        let loaded = DifferenceConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.start_filename, "img_0042.fits");
        assert_eq!(loaded.frame_count, 5);
        assert_eq!(loaded.percentile_high, DEFAULT_PERCENTILE_HIGH);
        assert_eq!(loaded.ordering, SequenceOrder::Filename);
    }

    #[test]
    fn test_invalid_json_is_invalid_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = BackgroundConfig::load_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_validation() {
        let config = BackgroundConfig {
            percentile_low: 99.0,
            percentile_high: 5.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));

        let config = BackgroundConfig {
            blur_sigma: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DifferenceConfig {
            start_filename: "a.fits".to_string(),
            frame_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        assert!(DifferenceConfig::default().validate().is_err());
    }
}
