#![deny(missing_docs)]
#![doc = "Core data model, collaborator traits and errors for the seekscan engine."]

pub mod calibration;
pub mod errors;
pub mod image;
pub mod provenance;
mod canonical;
mod types;

pub use calibration::AffineCalibration;
pub use errors::{ErrorInfo, SeekError};
pub use image::{autoscale, CaptureRequest, Image, ImageHeader};
pub use provenance::{Provenance, SchemaVersion};
pub use canonical::{stable_hash_string, to_canonical_json_bytes};
pub use types::{DetectedObject, Experiment, Hole, OffsetGrid, Point2D, Region};

/// Converts detector pixel coordinates into stage coordinates.
pub trait StageCalibration {
    /// Maps `centroid` (acquired pixel grid) of an image taken at
    /// `image_position` onto the stage.
    fn pixel_to_stage(&self, centroid: Point2D, image_position: Point2D) -> Point2D;
}

/// Converts detector pixel coordinates into beamshift settings.
pub trait BeamShiftCalibration {
    /// Beamshift that centers the beam on `centroid`.
    fn pixel_to_beamshift(&self, centroid: Point2D) -> Point2D;

    /// Batch form of [`BeamShiftCalibration::pixel_to_beamshift`].
    fn pixels_to_beamshift(&self, centroids: &[Point2D]) -> Vec<Point2D> {
        centroids
            .iter()
            .map(|centroid| self.pixel_to_beamshift(*centroid))
            .collect()
    }
}

/// Blocking control surface of the microscope.
///
/// Every call completes before returning. Commands the instrument refuses
/// (targets outside the stage travel, unsupported states) come back as
/// [`SeekError::Device`].
pub trait Microscope {
    /// Moves the stage to an absolute position.
    fn move_stage(&mut self, target: Point2D) -> Result<(), SeekError>;

    /// Current stage position.
    fn stage_position(&self) -> Result<Point2D, SeekError>;

    /// Applies a beamshift.
    fn set_beamshift(&mut self, shift: Point2D) -> Result<(), SeekError>;

    /// Sets the illumination brightness.
    fn set_brightness(&mut self, value: f64) -> Result<(), SeekError>;

    /// Resets the brightness to its maximum (safe) value.
    fn max_brightness(&mut self) -> Result<(), SeekError>;

    /// Sets the imaging magnification.
    fn set_magnification(&mut self, value: u32) -> Result<(), SeekError>;

    /// Currently active magnification.
    fn magnification(&self) -> Result<u32, SeekError>;

    /// Switches the optics to diffraction mode.
    fn enter_diffraction_mode(&mut self) -> Result<(), SeekError>;

    /// Switches the optics back to imaging mode.
    fn enter_imaging_mode(&mut self) -> Result<(), SeekError>;

    /// Compensates the diffraction shift caused by the current beamshift.
    fn compensate_diffraction_shift(&mut self) -> Result<(), SeekError>;

    /// Acquires one frame.
    fn capture_image(&mut self, request: &CaptureRequest)
        -> Result<(Image, ImageHeader), SeekError>;
}

/// Image analysis collaborator.
pub trait ObjectDetector {
    /// Finds candidate crystals in `image`.
    fn find_objects(
        &self,
        image: &Image,
        magnification: u32,
        spread: f64,
    ) -> Result<Vec<DetectedObject>, SeekError>;

    /// Finds hole-like regions whose area is close to `area_estimate` pixels.
    fn find_regions(&self, image: &Image, area_estimate: f64) -> Result<Vec<Region>, SeekError>;
}

/// Structured storage for experiments and mapped hole positions.
pub trait ExperimentStore {
    /// Loads the persisted experiment.
    fn load_experiment(&self) -> Result<Experiment, SeekError>;

    /// Persists an experiment, replacing any previous one.
    fn save_experiment(&self, experiment: &Experiment) -> Result<(), SeekError>;

    /// Loads the dense stage positions produced by hole mapping.
    fn load_hole_positions(&self) -> Result<Vec<Point2D>, SeekError>;

    /// Persists dense stage positions.
    fn save_hole_positions(&self, positions: &[Point2D]) -> Result<(), SeekError>;
}

/// Blocking operator prompt.
pub trait Operator {
    /// Shows `message` and returns the operator's answer, trimmed of the line ending.
    fn prompt(&mut self, message: &str) -> Result<String, SeekError>;
}
