//! Scan parameters, loaded from YAML and validated once at scan start.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::Point2D;
use seekscan_geom::TileSpec;

/// Parameters of one scan run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Camera binning for survey images.
    #[serde(default = "default_binning")]
    pub image_binning: u32,
    /// Exposure of survey images in seconds.
    #[serde(default = "default_exposure")]
    pub image_exposure: f64,
    /// Camera binning for diffraction patterns.
    #[serde(default = "default_binning")]
    pub diff_binning: u32,
    /// Exposure of diffraction patterns in seconds.
    #[serde(default = "default_exposure")]
    pub diff_exposure: f64,
    /// Illumination brightness used while in diffraction mode.
    #[serde(default = "default_diff_brightness")]
    pub diff_brightness: f64,
    /// Imaging magnification set before the scan starts.
    #[serde(default = "default_magnification")]
    pub magnification: u32,
    /// Survey images are downsampled to this size before detection.
    #[serde(default = "default_max_image_dim")]
    pub max_image_dim: usize,
    /// Spread parameter handed to object detection.
    #[serde(default = "default_detection_spread")]
    pub detection_spread: f64,
    /// Pixel whose beamshift counts as neutral.
    #[serde(default = "default_neutral_pixel")]
    pub neutral_pixel: Point2D,
    /// Regenerate the offset grid from the imaging field of view instead of
    /// using the persisted one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regrid: Option<RegridConfig>,
}

fn default_binning() -> u32 {
    2
}

fn default_exposure() -> f64 {
    0.1
}

fn default_diff_brightness() -> f64 {
    38957.0
}

fn default_magnification() -> u32 {
    5000
}

fn default_max_image_dim() -> usize {
    512
}

fn default_detection_spread() -> f64 {
    2.5
}

fn default_neutral_pixel() -> Point2D {
    Point2D::new(1024.0, 1024.0)
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            image_binning: default_binning(),
            image_exposure: default_exposure(),
            diff_binning: default_binning(),
            diff_exposure: default_exposure(),
            diff_brightness: default_diff_brightness(),
            magnification: default_magnification(),
            max_image_dim: default_max_image_dim(),
            detection_spread: default_detection_spread(),
            neutral_pixel: default_neutral_pixel(),
            regrid: None,
        }
    }
}

/// Field of view used when the grid is regenerated at scan start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegridConfig {
    /// Width of one survey image in stage units.
    pub box_x: f64,
    /// Height of one survey image; square when absent.
    #[serde(default)]
    pub box_y: Option<f64>,
    /// Gap between neighbouring images.
    #[serde(default = "default_padding")]
    pub padding: f64,
    /// Border scale factor.
    #[serde(default = "default_k")]
    pub k: f64,
    /// Grid rotation in radians, matching the camera orientation.
    #[serde(default = "default_angle")]
    pub angle: f64,
}

fn default_padding() -> f64 {
    2.0
}

fn default_k() -> f64 {
    1.0
}

fn default_angle() -> f64 {
    -0.95
}

impl RegridConfig {
    /// Tile specification handed to the grid generator.
    pub fn tile_spec(&self) -> TileSpec {
        TileSpec {
            box_x: self.box_x,
            box_y: self.box_y,
            padding: self.padding,
            k: self.k,
            angle: self.angle,
        }
    }
}

fn invalid(field: &str, value: impl ToString, expectation: &str) -> SeekError {
    SeekError::Config(
        ErrorInfo::new("scan-config", format!("{field} must be {expectation}"))
            .with_context("field", field)
            .with_context("value", value.to_string()),
    )
}

fn positive(field: &str, value: f64) -> Result<(), SeekError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "finite and positive"))
    }
}

impl ScanConfig {
    /// Loads a configuration from a YAML file.
    pub fn from_yaml_path(path: &Path) -> Result<Self, SeekError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| SeekError::persistence("scan-config-read", err, path.display()))?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            SeekError::Config(info) => {
                SeekError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Parses a configuration from YAML text; missing fields take defaults.
    pub fn from_yaml_str(contents: &str) -> Result<Self, SeekError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|err| SeekError::Config(ErrorInfo::new("scan-config-parse", err.to_string())))
    }

    /// Checks every field once; the executor calls this before moving anything.
    pub fn validate(&self) -> Result<(), SeekError> {
        if self.image_binning == 0 {
            return Err(invalid("image_binning", self.image_binning, "at least 1"));
        }
        if self.diff_binning == 0 {
            return Err(invalid("diff_binning", self.diff_binning, "at least 1"));
        }
        positive("image_exposure", self.image_exposure)?;
        positive("diff_exposure", self.diff_exposure)?;
        positive("diff_brightness", self.diff_brightness)?;
        positive("detection_spread", self.detection_spread)?;
        if self.magnification == 0 {
            return Err(invalid("magnification", self.magnification, "at least 1"));
        }
        if self.max_image_dim == 0 {
            return Err(invalid("max_image_dim", self.max_image_dim, "at least 1"));
        }
        if !self.neutral_pixel.is_finite() {
            return Err(invalid("neutral_pixel", self.neutral_pixel, "finite"));
        }
        if let Some(regrid) = &self.regrid {
            positive("regrid.box_x", regrid.box_x)?;
            if let Some(box_y) = regrid.box_y {
                positive("regrid.box_y", box_y)?;
            }
            if !regrid.padding.is_finite() || !regrid.angle.is_finite() || !regrid.k.is_finite() {
                return Err(invalid("regrid", "non-finite", "finite"));
            }
        }
        Ok(())
    }
}
