//! Affine pixel-to-stage and pixel-to-beamshift transforms.
//!
//! Fitting these transforms happens elsewhere; this module only applies a
//! stored matrix.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::types::Point2D;
use crate::{BeamShiftCalibration, StageCalibration};

/// Stored 2×2 transform anchored at a reference pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineCalibration {
    /// Row-major linear part mapping pixel displacements to output units.
    pub matrix: [[f64; 2]; 2],
    /// Pixel at which the output equals `reference_output`.
    pub reference_pixel: Point2D,
    /// Output value (beamshift or stage offset) at the reference pixel.
    #[serde(default)]
    pub reference_output: Point2D,
}

impl AffineCalibration {
    /// Calibration that maps pixels one-to-one onto output units.
    pub fn identity(reference_pixel: Point2D) -> Self {
        Self {
            matrix: [[1.0, 0.0], [0.0, 1.0]],
            reference_pixel,
            reference_output: Point2D::ORIGIN,
        }
    }

    fn apply(&self, pixel: Point2D) -> Point2D {
        let m = Matrix2::new(
            self.matrix[0][0],
            self.matrix[0][1],
            self.matrix[1][0],
            self.matrix[1][1],
        );
        let delta = pixel - self.reference_pixel;
        let mapped = m * Vector2::new(delta.x, delta.y);
        Point2D::new(mapped.x, mapped.y)
    }
}

impl StageCalibration for AffineCalibration {
    fn pixel_to_stage(&self, centroid: Point2D, image_position: Point2D) -> Point2D {
        image_position + self.apply(centroid)
    }
}

impl BeamShiftCalibration for AffineCalibration {
    fn pixel_to_beamshift(&self, centroid: Point2D) -> Point2D {
        self.reference_output + self.apply(centroid)
    }
}
