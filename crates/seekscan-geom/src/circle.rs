//! Circle through three rim points, via the perpendicular bisectors of two chords.

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::Point2D;
use serde::{Deserialize, Serialize};

/// Result of fitting a circle to three rim observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleFit {
    /// Fitted center.
    pub center: Point2D,
    /// Mean distance from the center to the three input points.
    pub radius: f64,
    /// Max minus min of those distances; zero for an exact fit.
    pub spread: f64,
}

fn degenerate(code: &str, message: &str, a: Point2D, b: Point2D, c: Point2D) -> SeekError {
    SeekError::Geometry(
        ErrorInfo::new(code, message)
            .with_context("a", a.to_string())
            .with_context("b", b.to_string())
            .with_context("c", c.to_string())
            .with_hint("sample three well separated points on the hole rim"),
    )
}

/// Relative sine below which two chords count as parallel.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

fn nearly_zero(value: f64, scale: f64) -> bool {
    value.abs() <= f64::EPSILON * scale.max(1.0) * 4.0
}

/// Center of the circle through `a`, `b` and `c`.
///
/// Fails with [`SeekError::Geometry`] when a chord is vertical (zero run) or
/// the two chords are parallel.
pub fn circle_center(a: Point2D, b: Point2D, c: Point2D) -> Result<Point2D, SeekError> {
    if ![a, b, c].iter().all(Point2D::is_finite) {
        return Err(degenerate("circle-non-finite", "non-finite rim point", a, b, c));
    }
    let run_a = b.x - a.x;
    let run_b = c.x - b.x;
    if nearly_zero(run_a, a.x.abs() + b.x.abs()) || nearly_zero(run_b, b.x.abs() + c.x.abs()) {
        return Err(degenerate("circle-vertical-chord", "chord has zero run", a, b, c));
    }
    let chord_a = b - a;
    let chord_b = c - b;
    let cross = chord_a.x * chord_b.y - chord_a.y * chord_b.x;
    if cross.abs() <= COLLINEAR_TOLERANCE * chord_a.norm() * chord_b.norm() {
        return Err(degenerate("circle-collinear", "rim points are collinear", a, b, c));
    }
    let slope_a = chord_a.y / run_a;
    let slope_b = chord_b.y / run_b;

    let center_x = (slope_a * slope_b * (a.y - c.y) + slope_b * (a.x + b.x)
        - slope_a * (b.x + c.x))
        / (2.0 * (slope_b - slope_a));
    // A flat chord has a vertical bisector; take y from the other one.
    let center_y = if slope_a != 0.0 {
        -(center_x - (a.x + b.x) / 2.0) / slope_a + (a.y + b.y) / 2.0
    } else {
        -(center_x - (b.x + c.x) / 2.0) / slope_b + (b.y + c.y) / 2.0
    };

    let center = Point2D::new(center_x, center_y);
    if !center.is_finite() {
        return Err(degenerate("circle-non-finite", "fit diverged", a, b, c));
    }
    Ok(center)
}

/// Fits center and radius; the radius is the mean distance to the three points.
pub fn fit_circle(points: [Point2D; 3]) -> Result<CircleFit, SeekError> {
    let [a, b, c] = points;
    let center = circle_center(a, b, c)?;
    let distances = points.map(|point| point.distance(&center));
    let radius = distances.iter().sum::<f64>() / 3.0;
    let max = distances.iter().copied().fold(f64::MIN, f64::max);
    let min = distances.iter().copied().fold(f64::MAX, f64::min);
    Ok(CircleFit {
        center,
        radius,
        spread: max - min,
    })
}
