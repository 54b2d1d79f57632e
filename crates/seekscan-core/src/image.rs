//! Minimal image container exchanged with the instrument and detector.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, SeekError};
use crate::types::Point2D;

/// Row-major grayscale frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<f32>,
}

impl Image {
    /// Wraps a row-major pixel buffer, checking its length against the shape.
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Result<Self, SeekError> {
        if pixels.len() != width * height {
            return Err(SeekError::Config(
                ErrorInfo::new("image-shape", "pixel buffer does not match image shape")
                    .with_context("width", width.to_string())
                    .with_context("height", height.to_string())
                    .with_context("len", pixels.len().to_string()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniform frame filled with `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width * height],
        }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel value at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Raw row-major pixel buffer.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }
}

/// Metadata returned alongside every acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHeader {
    /// Stage position at the time of acquisition.
    pub stage_position: Point2D,
    /// Binning used by the camera.
    pub binning: u32,
    /// Exposure time in seconds.
    pub exposure: f64,
    /// Magnification reported by the instrument.
    pub magnification: u32,
    /// Free-form comment stored with the frame.
    #[serde(default)]
    pub comment: String,
}

/// Parameters of one camera acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Camera binning factor.
    pub binning: u32,
    /// Exposure time in seconds.
    pub exposure: f64,
    /// Comment stored in the image header.
    pub comment: String,
    /// Output name used by the instrument to store the frame.
    pub out_name: String,
}

/// Downsamples `image` so its largest dimension is at most `max_dim`.
///
/// Returns the resampled frame and the scale factor applied (1.0 when the
/// frame already fits or has no pixels). Detected centroids are divided by
/// this factor to get back to the acquired pixel grid.
pub fn autoscale(image: &Image, max_dim: usize) -> (Image, f64) {
    let largest = image.width.max(image.height);
    if max_dim == 0 || largest <= max_dim || image.width == 0 || image.height == 0 {
        return (image.clone(), 1.0);
    }
    let scale = max_dim as f64 / largest as f64;
    let width = ((image.width as f64 * scale).round() as usize).max(1);
    let height = ((image.height as f64 * scale).round() as usize).max(1);
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        let src_row = (((row as f64 + 0.5) / scale) as usize).min(image.height - 1);
        for col in 0..width {
            let src_col = (((col as f64 + 0.5) / scale) as usize).min(image.width - 1);
            pixels.push(image.pixels[src_row * image.width + src_col]);
        }
    }
    (
        Image {
            width,
            height,
            pixels,
        },
        scale,
    )
}
