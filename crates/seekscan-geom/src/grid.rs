//! Sampling grids tiling the usable interior of a circular hole.

use nalgebra::{Rotation2, Vector2};
use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::{OffsetGrid, Point2D};
use serde::{Deserialize, Serialize};

/// Camera field of view and spacing used to tile a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Width of one acquisition in stage units.
    pub box_x: f64,
    /// Height of one acquisition; square tiles from `box_x` when absent.
    #[serde(default)]
    pub box_y: Option<f64>,
    /// Gap between neighbouring tiles.
    #[serde(default = "TileSpec::default_padding")]
    pub padding: f64,
    /// Scale factor applied to the derived border width.
    #[serde(default = "TileSpec::default_k")]
    pub k: f64,
    /// Rotation of the grid in radians, clockwise for positive values.
    #[serde(default)]
    pub angle: f64,
}

impl TileSpec {
    fn default_padding() -> f64 {
        2.0
    }

    fn default_k() -> f64 {
        1.0
    }

    /// Square tiles of side `box_x` with default padding, k and no rotation.
    pub fn square(box_x: f64) -> Self {
        Self {
            box_x,
            box_y: None,
            padding: Self::default_padding(),
            k: Self::default_k(),
            angle: 0.0,
        }
    }
}

/// Debug summary of one grid generation, shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    /// Lattice columns.
    pub nx: usize,
    /// Lattice rows.
    pub ny: usize,
    /// Border scale factor.
    pub k: f64,
    /// Effective border width after clamping.
    pub borderwidth: f64,
    /// Hole radius.
    pub radius: f64,
    /// Tile width.
    pub box_x: f64,
    /// Tile height.
    pub box_y: f64,
    /// Rotation in radians.
    pub angle: f64,
    /// Number of offsets produced.
    pub count: usize,
}

fn linspace(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let step = 2.0 / (n - 1) as f64;
            (0..n).map(|i| -1.0 + step * i as f64).collect()
        }
    }
}

/// Keeps the points of an `nx`×`ny` lattice over [-1, 1]² whose distance
/// from the origin is below `1 - borderwidth`, scaled by `radius`.
///
/// Points come out in row-major order (rows of constant y, x increasing).
pub fn make_grid(nx: usize, ny: usize, radius: f64, borderwidth: f64) -> OffsetGrid {
    let limit = 1.0 - borderwidth;
    let xs = linspace(nx);
    let ys = linspace(ny);
    let mut offsets = Vec::new();
    for &y in &ys {
        for &x in &xs {
            if x.hypot(y) < limit {
                offsets.push(Point2D::new(x * radius, y * radius));
            }
        }
    }
    OffsetGrid::new(offsets)
}

fn invalid(code: &str, message: &str, value: f64) -> SeekError {
    SeekError::Config(ErrorInfo::new(code, message).with_context("value", value.to_string()))
}

fn tiles_across(radius: f64, size: f64, padding: f64) -> Result<usize, SeekError> {
    if !(size.is_finite() && size > 0.0) {
        return Err(invalid("grid-box", "tile size must be positive", size));
    }
    let pitch = size + padding;
    if !(pitch.is_finite() && pitch > 0.0) {
        return Err(invalid("grid-pitch", "tile pitch must be positive", pitch));
    }
    Ok(1 + (2.0 * radius / pitch).floor() as usize)
}

/// Generates offsets for tiles of `spec` inside a hole of `radius`, plus the
/// generation summary.
pub fn tile_offsets(spec: &TileSpec, radius: f64) -> Result<(OffsetGrid, GridSummary), SeekError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(invalid("grid-radius", "radius must be positive", radius));
    }
    if !spec.k.is_finite() || !spec.angle.is_finite() {
        return Err(invalid("grid-k-angle", "k and angle must be finite", spec.k));
    }
    let nx = tiles_across(radius, spec.box_x, spec.padding)?;
    let (ny, box_y) = match spec.box_y {
        Some(box_y) => (tiles_across(radius, box_y, spec.padding)?, box_y),
        None => (nx, spec.box_x),
    };

    let diff = 0.5 * (2.0 * spec.box_x.max(box_y).powi(2)).sqrt();
    let raw_border = spec.k * (1.0 - (radius - diff) / radius);
    let borderwidth = raw_border.clamp(0.0, 1.0);

    let mut grid = if nx == 1 && ny == 1 {
        // Tiles larger than the hole: one acquisition at the center.
        OffsetGrid::new(vec![Point2D::ORIGIN])
    } else {
        make_grid(nx, ny, radius, borderwidth)
    };

    if spec.angle != 0.0 {
        // Offsets are row vectors multiplied by the rotation matrix, which
        // turns the grid clockwise for a positive angle.
        let rotation = Rotation2::new(spec.angle).transpose();
        let rotated = grid
            .iter()
            .map(|offset| {
                let v = rotation * Vector2::new(offset.x, offset.y);
                Point2D::new(v.x, v.y)
            })
            .collect();
        grid = OffsetGrid::new(rotated);
    }

    let summary = GridSummary {
        nx,
        ny,
        k: spec.k,
        borderwidth,
        radius,
        box_x: spec.box_x,
        box_y,
        angle: spec.angle,
        count: grid.len(),
    };
    if grid.is_empty() {
        tracing::warn!(nx, ny, borderwidth, radius, "grid generation produced no offsets");
    } else {
        tracing::debug!(nx, ny, borderwidth, count = grid.len(), "generated offset grid");
    }
    Ok((grid, summary))
}

/// Offsets for `box_x`×`box_y` tiles spaced by `padding` inside a hole of
/// `radius`, rotated clockwise by `angle` radians.
pub fn make_offsets(
    box_x: f64,
    box_y: Option<f64>,
    radius: f64,
    padding: f64,
    k: f64,
    angle: f64,
) -> Result<OffsetGrid, SeekError> {
    let spec = TileSpec {
        box_x,
        box_y,
        padding,
        k,
        angle,
    };
    tile_offsets(&spec, radius).map(|(grid, _)| grid)
}
