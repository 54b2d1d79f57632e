use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::errors::SeekError;
use crate::provenance::{Provenance, SchemaVersion};
use crate::canonical::stable_hash_string;

/// A pair of real-valued coordinates in either pixel or stage space.
///
/// The space is implied by where the value comes from; converting between
/// the two always goes through a calibration transform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2D {
    /// The origin.
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Creates a point from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the point seen as a vector from the origin.
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (*self - *other).norm()
    }

    /// True when both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Coordinate-wise mean of a non-empty slice, `None` when empty.
    pub fn mean(points: &[Point2D]) -> Option<Point2D> {
        if points.is_empty() {
            return None;
        }
        let sum = points
            .iter()
            .fold(Point2D::ORIGIN, |acc, point| acc + *point);
        Some(sum * (1.0 / points.len() as f64))
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Point2D::new(x, y)
    }
}

impl std::fmt::Display for Point2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A circular opening in the sample support, in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hole {
    /// Stage-space center of the hole.
    pub center: Point2D,
    /// Radius of the hole in stage units.
    pub radius: f64,
}

/// Ordered offsets relative to a hole center, shared by every hole of an experiment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetGrid(Vec<Point2D>);

impl OffsetGrid {
    /// Wraps an ordered list of offsets.
    pub fn new(offsets: Vec<Point2D>) -> Self {
        Self(offsets)
    }

    /// Number of offsets in the grid.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the grid holds no offsets.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the offsets in scan order.
    pub fn iter(&self) -> std::slice::Iter<'_, Point2D> {
        self.0.iter()
    }

    /// Borrows the offsets as a slice.
    pub fn as_slice(&self) -> &[Point2D] {
        &self.0
    }

    /// Largest offset norm, zero for an empty grid.
    pub fn max_norm(&self) -> f64 {
        self.0.iter().map(Point2D::norm).fold(0.0, f64::max)
    }
}

impl<'a> IntoIterator for &'a OffsetGrid {
    type Item = &'a Point2D;
    type IntoIter = std::slice::Iter<'a, Point2D>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Persisted experiment record consumed by the scan executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    /// Schema version of the record.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Provenance stamped when the record was assembled.
    #[serde(default)]
    pub provenance: Provenance,
    /// Holes visited by the executor, in scan order.
    pub holes: Vec<Hole>,
    /// Offsets applied around every hole center.
    pub offset_grid: OffsetGrid,
    /// Mean hole radius used to size the grid.
    pub radius: f64,
    /// Systematic stage shift removed from the hole centers by reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_correction: Option<Point2D>,
    /// Planning-time centers kept after reconciliation replaced `holes`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned_centers: Vec<Point2D>,
}

#[derive(Serialize)]
struct FingerprintPayload<'a> {
    holes: &'a [Hole],
    offset_grid: &'a OffsetGrid,
    radius: f64,
    stage_correction: Option<Point2D>,
}

impl Experiment {
    /// Creates an experiment without provenance; see [`Experiment::stamp`].
    pub fn new(holes: Vec<Hole>, offset_grid: OffsetGrid, radius: f64) -> Self {
        Self {
            schema_version: SchemaVersion::default(),
            provenance: Provenance::default(),
            holes,
            offset_grid,
            radius,
            stage_correction: None,
            planned_centers: Vec::new(),
        }
    }

    /// Stable hash of the geometric payload (holes, grid, radius, correction).
    pub fn fingerprint(&self) -> Result<String, SeekError> {
        stable_hash_string(&FingerprintPayload {
            holes: &self.holes,
            offset_grid: &self.offset_grid,
            radius: self.radius,
            stage_correction: self.stage_correction,
        })
    }

    /// Refreshes the provenance block from the current payload.
    pub fn stamp(&mut self) -> Result<(), SeekError> {
        self.provenance = Provenance::stamped(self.fingerprint()?);
        Ok(())
    }

    /// Stage-space hole centers in scan order.
    pub fn centers(&self) -> Vec<Point2D> {
        self.holes.iter().map(|hole| hole.center).collect()
    }
}

/// Candidate object found by the detector in one acquired image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Pixel-space centroid at the scale of the image handed to the detector.
    pub centroid: Point2D,
    /// Size estimate (equivalent diameter) in pixels.
    pub size: f64,
}

/// Region returned by hole detection; only the centroid is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Pixel-space centroid of the region.
    pub centroid: Point2D,
}
