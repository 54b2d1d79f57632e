#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use seekscan_core::{
    CaptureRequest, DetectedObject, Experiment, Hole, Image, ImageHeader, Microscope,
    ObjectDetector, OffsetGrid, Operator, Point2D, Region, SeekError,
};

/// Operator answering from a fixed script; runs dry with an abort.
pub struct ScriptedOperator {
    pub answers: VecDeque<String>,
    pub prompts: Vec<String>,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

impl Operator for ScriptedOperator {
    fn prompt(&mut self, message: &str) -> Result<String, SeekError> {
        self.prompts.push(message.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| SeekError::Abort(seekscan_core::ErrorInfo::new("eof", "script exhausted")))
    }
}

/// Microscope whose stage reports a queued list of positions.
pub struct StageScript {
    pub positions: RefCell<VecDeque<Point2D>>,
}

impl StageScript {
    pub fn new(positions: &[Point2D]) -> Self {
        Self {
            positions: RefCell::new(positions.iter().copied().collect()),
        }
    }
}

impl Microscope for StageScript {
    fn move_stage(&mut self, _target: Point2D) -> Result<(), SeekError> {
        Ok(())
    }

    fn stage_position(&self) -> Result<Point2D, SeekError> {
        Ok(self
            .positions
            .borrow_mut()
            .pop_front()
            .unwrap_or(Point2D::ORIGIN))
    }

    fn set_beamshift(&mut self, _shift: Point2D) -> Result<(), SeekError> {
        Ok(())
    }

    fn set_brightness(&mut self, _value: f64) -> Result<(), SeekError> {
        Ok(())
    }

    fn max_brightness(&mut self) -> Result<(), SeekError> {
        Ok(())
    }

    fn set_magnification(&mut self, _value: u32) -> Result<(), SeekError> {
        Ok(())
    }

    fn magnification(&self) -> Result<u32, SeekError> {
        Ok(5000)
    }

    fn enter_diffraction_mode(&mut self) -> Result<(), SeekError> {
        Ok(())
    }

    fn enter_imaging_mode(&mut self) -> Result<(), SeekError> {
        Ok(())
    }

    fn compensate_diffraction_shift(&mut self) -> Result<(), SeekError> {
        Ok(())
    }

    fn capture_image(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<(Image, ImageHeader), SeekError> {
        let header = ImageHeader {
            stage_position: Point2D::ORIGIN,
            binning: request.binning,
            exposure: request.exposure,
            magnification: 5000,
            comment: request.comment.clone(),
        };
        Ok((Image::filled(4, 4, 0.0), header))
    }
}

/// Detector returning the same regions for every frame and recording the
/// area estimates it was asked for.
pub struct FixedRegions {
    pub centroids: Vec<Point2D>,
    pub areas: RefCell<Vec<f64>>,
    pub dims: RefCell<Vec<(usize, usize)>>,
}

impl FixedRegions {
    pub fn new(centroids: Vec<Point2D>) -> Self {
        Self {
            centroids,
            areas: RefCell::new(Vec::new()),
            dims: RefCell::new(Vec::new()),
        }
    }
}

impl ObjectDetector for FixedRegions {
    fn find_objects(
        &self,
        _image: &Image,
        _magnification: u32,
        _spread: f64,
    ) -> Result<Vec<DetectedObject>, SeekError> {
        Ok(Vec::new())
    }

    fn find_regions(&self, image: &Image, area_estimate: f64) -> Result<Vec<Region>, SeekError> {
        self.areas.borrow_mut().push(area_estimate);
        self.dims.borrow_mut().push((image.width(), image.height()));
        Ok(self
            .centroids
            .iter()
            .map(|centroid| Region {
                centroid: *centroid,
            })
            .collect())
    }
}

pub fn rim_of(center: Point2D, radius: f64) -> [Point2D; 3] {
    [
        center + Point2D::new(radius, 0.0),
        center + Point2D::new(0.0, radius),
        center + Point2D::new(-radius, 0.0),
    ]
}

pub fn experiment_with_centers(centers: &[Point2D], radius: f64) -> Experiment {
    let holes = centers
        .iter()
        .map(|center| Hole {
            center: *center,
            radius,
        })
        .collect();
    Experiment::new(holes, OffsetGrid::new(vec![Point2D::ORIGIN]), radius)
}

pub fn assert_close(actual: Point2D, expected: Point2D) {
    assert!(
        actual.distance(&expected) < 1e-6,
        "expected {expected}, got {actual}"
    );
}
