//! Dense hole mapping over low-magnification frames.

use serde::{Deserialize, Serialize};

use seekscan_core::errors::SeekError;
use seekscan_core::{autoscale, Image, ImageHeader, ObjectDetector, Point2D, StageCalibration};
use seekscan_geom::cluster_mean;

/// Options for [`map_holes_on_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleMapOptions {
    /// Expected hole area in pixels of an unbinned, unscaled frame.
    pub expected_area_px: f64,
    /// Frames are downsampled until their largest side fits.
    #[serde(default = "default_max_image_dim")]
    pub max_image_dim: usize,
    /// Stage distance below which observations of the same hole merge.
    #[serde(default = "default_merge_threshold")]
    pub threshold: f64,
}

fn default_max_image_dim() -> usize {
    512
}

fn default_merge_threshold() -> f64 {
    10_000.0
}

impl HoleMapOptions {
    /// Options with the default frame size and merge threshold.
    pub fn new(expected_area_px: f64) -> Self {
        Self {
            expected_area_px,
            max_image_dim: default_max_image_dim(),
            threshold: default_merge_threshold(),
        }
    }
}

/// One low-magnification frame with its header.
#[derive(Debug, Clone)]
pub struct MappingFrame {
    /// Acquired pixels.
    pub image: Image,
    /// Acquisition metadata; the stage position anchors the calibration.
    pub header: ImageHeader,
}

/// Region centroids already detected in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    /// Stage position at which the frame was taken.
    pub stage_position: Point2D,
    /// Centroids on the acquired (unbinned, unscaled) pixel grid.
    pub centroids: Vec<Point2D>,
}

/// Dense hole positions produced by [`map_holes_on_grid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoleMap {
    /// Merged stage positions sorted by `(x, y)`.
    pub positions: Vec<Point2D>,
    /// Observations before merging.
    pub raw_count: usize,
    /// Merge threshold that was applied.
    pub threshold: f64,
}

/// Detects holes in every frame and merges repeated observations.
///
/// Each frame is downsampled, searched for regions of the expected area
/// (corrected for binning and scale), and the centroids are mapped back to
/// the acquired pixel grid before conversion to stage coordinates.
pub fn map_holes_on_grid(
    frames: &[MappingFrame],
    detector: &dyn ObjectDetector,
    calibration: &dyn StageCalibration,
    options: &HoleMapOptions,
) -> Result<HoleMap, SeekError> {
    validate_options(options)?;
    let mut detections = Vec::with_capacity(frames.len());
    for (idx, frame) in frames.iter().enumerate() {
        let binning = f64::from(frame.header.binning.max(1));
        let (scaled, scale) = autoscale(&frame.image, options.max_image_dim);
        let area = options.expected_area_px * scale * scale / (binning * binning);
        let regions = detector.find_regions(&scaled, area)?;
        tracing::debug!(frame = idx, regions = regions.len(), scale, "frame searched");
        detections.push(FrameDetections {
            stage_position: frame.header.stage_position,
            centroids: regions
                .iter()
                .map(|region| region.centroid * (binning / scale))
                .collect(),
        });
    }
    merge_detections(&detections, calibration, options.threshold)
}

/// Converts detected centroids to stage space and merges repeats.
pub fn merge_detections(
    detections: &[FrameDetections],
    calibration: &dyn StageCalibration,
    threshold: f64,
) -> Result<HoleMap, SeekError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(SeekError::config(
            "map-threshold",
            "merge threshold must be finite and non-negative",
        ));
    }
    let observations: Vec<Point2D> = detections
        .iter()
        .flat_map(|frame| {
            frame
                .centroids
                .iter()
                .map(move |centroid| calibration.pixel_to_stage(*centroid, frame.stage_position))
        })
        .collect();
    let positions = cluster_mean(&observations, threshold);
    tracing::info!(
        frames = detections.len(),
        observations = observations.len(),
        holes = positions.len(),
        "hole map assembled"
    );
    Ok(HoleMap {
        positions,
        raw_count: observations.len(),
        threshold,
    })
}

fn validate_options(options: &HoleMapOptions) -> Result<(), SeekError> {
    let area_ok = options.expected_area_px.is_finite() && options.expected_area_px > 0.0;
    let threshold_ok = options.threshold.is_finite() && options.threshold >= 0.0;
    if !area_ok || !threshold_ok {
        return Err(SeekError::config(
            "map-options",
            "expected area must be positive and the threshold non-negative",
        ));
    }
    Ok(())
}
