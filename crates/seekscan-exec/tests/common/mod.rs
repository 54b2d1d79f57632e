#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use seekscan_core::{
    CaptureRequest, DetectedObject, Experiment, Hole, Image, ImageHeader, Microscope,
    ObjectDetector, OffsetGrid, Operator, Point2D, Region, SeekError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Move(Point2D),
    Beamshift(Point2D),
    Brightness(f64),
    MaxBrightness,
    Magnification(u32),
    Diffraction,
    Imaging,
    Compensate,
    Capture(String),
}

/// Microscope recording every call; selected commands are refused.
pub struct RecordingMicroscope {
    pub calls: Vec<Call>,
    pub rejected_targets: Vec<Point2D>,
    pub rejected_captures: Vec<String>,
    pub unwritable_captures: Vec<String>,
    pub refuse_diffraction: usize,
    pub frame_size: usize,
    pub in_diffraction: bool,
    position: Point2D,
    magnification: u32,
}

impl RecordingMicroscope {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            rejected_targets: Vec::new(),
            rejected_captures: Vec::new(),
            unwritable_captures: Vec::new(),
            refuse_diffraction: 0,
            frame_size: 256,
            in_diffraction: false,
            position: Point2D::ORIGIN,
            magnification: 0,
        }
    }

    pub fn captures(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Capture(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

fn rejected(code: &str) -> SeekError {
    SeekError::device_rejected(code, "refused by test microscope")
}

impl Microscope for RecordingMicroscope {
    fn move_stage(&mut self, target: Point2D) -> Result<(), SeekError> {
        self.calls.push(Call::Move(target));
        if self
            .rejected_targets
            .iter()
            .any(|t| t.distance(&target) < 1e-9)
        {
            return Err(rejected("stage-out-of-range"));
        }
        self.position = target;
        Ok(())
    }

    fn stage_position(&self) -> Result<Point2D, SeekError> {
        Ok(self.position)
    }

    fn set_beamshift(&mut self, shift: Point2D) -> Result<(), SeekError> {
        self.calls.push(Call::Beamshift(shift));
        Ok(())
    }

    fn set_brightness(&mut self, value: f64) -> Result<(), SeekError> {
        self.calls.push(Call::Brightness(value));
        Ok(())
    }

    fn max_brightness(&mut self) -> Result<(), SeekError> {
        self.calls.push(Call::MaxBrightness);
        Ok(())
    }

    fn set_magnification(&mut self, value: u32) -> Result<(), SeekError> {
        self.calls.push(Call::Magnification(value));
        self.magnification = value;
        Ok(())
    }

    fn magnification(&self) -> Result<u32, SeekError> {
        Ok(self.magnification)
    }

    fn enter_diffraction_mode(&mut self) -> Result<(), SeekError> {
        self.calls.push(Call::Diffraction);
        if self.refuse_diffraction > 0 {
            self.refuse_diffraction -= 1;
            return Err(rejected("diffraction-refused"));
        }
        self.in_diffraction = true;
        Ok(())
    }

    fn enter_imaging_mode(&mut self) -> Result<(), SeekError> {
        self.calls.push(Call::Imaging);
        self.in_diffraction = false;
        Ok(())
    }

    fn compensate_diffraction_shift(&mut self) -> Result<(), SeekError> {
        self.calls.push(Call::Compensate);
        Ok(())
    }

    fn capture_image(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<(Image, ImageHeader), SeekError> {
        self.calls.push(Call::Capture(request.out_name.clone()));
        if self.rejected_captures.contains(&request.out_name) {
            return Err(rejected("camera-busy"));
        }
        if self.unwritable_captures.contains(&request.out_name) {
            return Err(SeekError::persistence(
                "disk-full",
                "no space left on device",
                &request.out_name,
            ));
        }
        let header = ImageHeader {
            stage_position: self.position,
            binning: request.binning,
            exposure: request.exposure,
            magnification: self.magnification,
            comment: request.comment.clone(),
        };
        Ok((Image::filled(self.frame_size, self.frame_size, 0.0), header))
    }
}

/// Detector returning the same objects for every survey image.
pub struct FixedObjects {
    pub objects: Vec<DetectedObject>,
    pub seen_dims: RefCell<Vec<(usize, usize)>>,
}

impl FixedObjects {
    pub fn at(centroids: &[Point2D]) -> Self {
        Self {
            objects: centroids
                .iter()
                .map(|centroid| DetectedObject {
                    centroid: *centroid,
                    size: 5.0,
                })
                .collect(),
            seen_dims: RefCell::new(Vec::new()),
        }
    }

    pub fn none() -> Self {
        Self::at(&[])
    }
}

impl ObjectDetector for FixedObjects {
    fn find_objects(
        &self,
        image: &Image,
        _magnification: u32,
        _spread: f64,
    ) -> Result<Vec<DetectedObject>, SeekError> {
        self.seen_dims
            .borrow_mut()
            .push((image.width(), image.height()));
        Ok(self.objects.clone())
    }

    fn find_regions(&self, _image: &Image, _area_estimate: f64) -> Result<Vec<Region>, SeekError> {
        Ok(Vec::new())
    }
}

/// Operator answering from a script, then pressing enter forever.
pub struct ScriptedOperator {
    pub answers: VecDeque<String>,
    pub prompts: usize,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            prompts: 0,
        }
    }
}

impl Operator for ScriptedOperator {
    fn prompt(&mut self, _message: &str) -> Result<String, SeekError> {
        self.prompts += 1;
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

pub fn experiment(centers: &[Point2D], offsets: &[Point2D]) -> Experiment {
    let holes = centers
        .iter()
        .map(|center| Hole {
            center: *center,
            radius: 50.0,
        })
        .collect();
    Experiment::new(holes, OffsetGrid::new(offsets.to_vec()), 50.0)
}
