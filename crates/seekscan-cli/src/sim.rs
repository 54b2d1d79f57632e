//! Simulated instrument and a threshold detector, so every command can run
//! without hardware.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::{
    CaptureRequest, DetectedObject, Image, ImageHeader, Microscope, ObjectDetector, Point2D,
    Region,
};

/// Stage travel in each direction from the origin.
pub const STAGE_TRAVEL: f64 = 1_000_000.0;
/// Brightness reported after `max_brightness`.
pub const MAX_BRIGHTNESS: f64 = 65535.0;

/// Microscope state machine with a bounded stage and synthetic frames.
#[derive(Debug)]
pub struct SimulatedMicroscope {
    rng: StdRng,
    travel: f64,
    frame_size: usize,
    position: Point2D,
    beamshift: Point2D,
    brightness: f64,
    magnification: u32,
    diffraction: bool,
    frames: usize,
}

impl SimulatedMicroscope {
    /// Creates the simulator; `seed` drives the synthetic frame content.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            travel: STAGE_TRAVEL,
            frame_size: 1024,
            position: Point2D::ORIGIN,
            beamshift: Point2D::ORIGIN,
            brightness: MAX_BRIGHTNESS,
            magnification: 2500,
            diffraction: false,
            frames: 0,
        }
    }

    /// Frames captured so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn survey_frame(&mut self) -> Image {
        let size = self.frame_size;
        let mut pixels = vec![0.0f32; size * size];
        let radius = (size / 40).max(2) as i64;
        if (size as i64) <= 2 * radius + 1 {
            return Image::filled(size, size, 0.0);
        }
        let blobs = self.rng.gen_range(0..4usize);
        for _ in 0..blobs {
            let cx = self.rng.gen_range(radius..size as i64 - radius);
            let cy = self.rng.gen_range(radius..size as i64 - radius);
            for y in (cy - radius)..=(cy + radius) {
                for x in (cx - radius)..=(cx + radius) {
                    if (x - cx).pow(2) + (y - cy).pow(2) <= radius * radius {
                        pixels[y as usize * size + x as usize] = 1.0;
                    }
                }
            }
        }
        Image::new(size, size, pixels).unwrap_or_else(|_| Image::filled(size, size, 0.0))
    }
}

impl Microscope for SimulatedMicroscope {
    fn move_stage(&mut self, target: Point2D) -> Result<(), SeekError> {
        if !target.is_finite() || target.x.abs() > self.travel || target.y.abs() > self.travel {
            return Err(SeekError::Device(
                ErrorInfo::new("stage-out-of-range", "target outside the stage travel")
                    .with_context("target", target.to_string())
                    .with_context("travel", self.travel.to_string()),
            ));
        }
        self.position = target;
        Ok(())
    }

    fn stage_position(&self) -> Result<Point2D, SeekError> {
        Ok(self.position)
    }

    fn set_beamshift(&mut self, shift: Point2D) -> Result<(), SeekError> {
        self.beamshift = shift;
        Ok(())
    }

    fn set_brightness(&mut self, value: f64) -> Result<(), SeekError> {
        if !(0.0..=MAX_BRIGHTNESS).contains(&value) {
            return Err(SeekError::device_rejected(
                "brightness-out-of-range",
                format!("brightness {value} outside 0..={MAX_BRIGHTNESS}"),
            ));
        }
        self.brightness = value;
        Ok(())
    }

    fn max_brightness(&mut self) -> Result<(), SeekError> {
        self.brightness = MAX_BRIGHTNESS;
        Ok(())
    }

    fn set_magnification(&mut self, value: u32) -> Result<(), SeekError> {
        self.magnification = value;
        Ok(())
    }

    fn magnification(&self) -> Result<u32, SeekError> {
        Ok(self.magnification)
    }

    fn enter_diffraction_mode(&mut self) -> Result<(), SeekError> {
        self.diffraction = true;
        Ok(())
    }

    fn enter_imaging_mode(&mut self) -> Result<(), SeekError> {
        self.diffraction = false;
        Ok(())
    }

    fn compensate_diffraction_shift(&mut self) -> Result<(), SeekError> {
        Ok(())
    }

    fn capture_image(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<(Image, ImageHeader), SeekError> {
        let image = if self.diffraction {
            Image::filled(self.frame_size, self.frame_size, 0.0)
        } else {
            self.survey_frame()
        };
        self.frames += 1;
        tracing::debug!(
            out = %request.out_name,
            diffraction = self.diffraction,
            beamshift = %self.beamshift,
            brightness = self.brightness,
            "frame captured"
        );
        let header = ImageHeader {
            stage_position: self.position,
            binning: request.binning,
            exposure: request.exposure,
            magnification: self.magnification,
            comment: request.comment.clone(),
        };
        Ok((image, header))
    }
}

/// Connected bright components above a fixed threshold.
#[derive(Debug, Clone)]
pub struct ThresholdDetector {
    /// Pixels strictly above this value belong to a component.
    pub threshold: f32,
    /// Components smaller than this many pixels are dropped.
    pub min_area: usize,
}

impl Default for ThresholdDetector {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_area: 4,
        }
    }
}

struct Component {
    centroid: Point2D,
    area: usize,
}

impl ThresholdDetector {
    fn components(&self, image: &Image) -> Vec<Component> {
        let (width, height) = (image.width(), image.height());
        let pixels = image.pixels();
        let mut seen = vec![false; pixels.len()];
        let mut components = Vec::new();
        for start in 0..pixels.len() {
            if seen[start] || pixels[start] <= self.threshold {
                continue;
            }
            seen[start] = true;
            let mut queue = VecDeque::from([start]);
            let (mut sum_x, mut sum_y, mut area) = (0.0, 0.0, 0usize);
            while let Some(idx) = queue.pop_front() {
                let (x, y) = (idx % width, idx / width);
                sum_x += x as f64;
                sum_y += y as f64;
                area += 1;
                let neighbours = [
                    (x > 0).then(|| idx - 1),
                    (x + 1 < width).then(|| idx + 1),
                    (y > 0).then(|| idx - width),
                    (y + 1 < height).then(|| idx + width),
                ];
                for next in neighbours.into_iter().flatten() {
                    if !seen[next] && pixels[next] > self.threshold {
                        seen[next] = true;
                        queue.push_back(next);
                    }
                }
            }
            if area >= self.min_area {
                components.push(Component {
                    centroid: Point2D::new(sum_x / area as f64, sum_y / area as f64),
                    area,
                });
            }
        }
        components
    }
}

impl ObjectDetector for ThresholdDetector {
    fn find_objects(
        &self,
        image: &Image,
        _magnification: u32,
        _spread: f64,
    ) -> Result<Vec<DetectedObject>, SeekError> {
        Ok(self
            .components(image)
            .into_iter()
            .map(|component| DetectedObject {
                centroid: component.centroid,
                size: (4.0 * component.area as f64 / std::f64::consts::PI).sqrt(),
            })
            .collect())
    }

    fn find_regions(&self, image: &Image, area_estimate: f64) -> Result<Vec<Region>, SeekError> {
        Ok(self
            .components(image)
            .into_iter()
            .filter(|component| {
                let area = component.area as f64;
                area >= 0.5 * area_estimate && area <= 2.0 * area_estimate
            })
            .map(|component| Region {
                centroid: component.centroid,
            })
            .collect())
    }
}
