//! Turning fitted holes into a persisted experiment.

use serde::{Deserialize, Serialize};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::{Experiment, ExperimentStore, Hole, ImageHeader, OffsetGrid, Point2D};
use seekscan_geom::{fit_circle, make_grid, tile_offsets, CircleFit, GridSummary};

use crate::config::{GridPlan, PlanConfig};

/// Spread of the fitted radii, reported when an experiment is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusStats {
    /// Mean radius; the grid is sized to this value.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl RadiusStats {
    /// Computes the statistics, `None` for an empty slice.
    pub fn from_radii(radii: &[f64]) -> Option<Self> {
        if radii.is_empty() {
            return None;
        }
        let n = radii.len() as f64;
        let mean = radii.iter().sum::<f64>() / n;
        let variance = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }

    /// Standard deviation relative to the mean.
    pub fn relative(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            self.std / self.mean
        }
    }
}

/// Experiment assembled by [`prepare_experiment`] with its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedExperiment {
    /// Record ready to persist.
    pub experiment: Experiment,
    /// Radius statistics across the fitted holes.
    pub radius_stats: RadiusStats,
    /// Grid summary when the grid came from tiles.
    pub grid_summary: Option<GridSummary>,
}

/// Fits one circle per group of observation headers.
///
/// Each group holds [`PlanConfig::group_size`] headers; the stage positions
/// of every header except the configured reference index form the rim
/// triangle.
pub fn fit_holes_from_headers(
    headers: &[ImageHeader],
    config: &PlanConfig,
) -> Result<Vec<CircleFit>, SeekError> {
    config.validate()?;
    let group_size = config.group_size();
    if headers.len() % group_size != 0 {
        return Err(SeekError::Config(
            ErrorInfo::new("plan-group-size", "observations do not split into whole groups")
                .with_context("observations", headers.len().to_string())
                .with_context("group_size", group_size.to_string()),
        ));
    }
    let mut fits = Vec::with_capacity(headers.len() / group_size);
    for (group_idx, group) in headers.chunks(group_size).enumerate() {
        let rim: Vec<Point2D> = group
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != config.reference_index)
            .map(|(_, header)| header.stage_position)
            .collect();
        let triangle = [rim[0], rim[1], rim[2]];
        let fit = fit_circle(triangle).map_err(|err| match err {
            SeekError::Geometry(info) => {
                SeekError::Geometry(info.with_context("group", group_idx.to_string()))
            }
            other => other,
        })?;
        tracing::info!(group = group_idx, center = %fit.center, radius = fit.radius, "fitted hole");
        fits.push(fit);
    }
    Ok(fits)
}

/// Builds the grid shared by every hole for the given mean radius.
pub fn build_offset_grid(
    plan: &GridPlan,
    radius: f64,
) -> Result<(OffsetGrid, Option<GridSummary>), SeekError> {
    match plan {
        GridPlan::Lattice {
            nx,
            ny,
            borderwidth,
        } => Ok((
            make_grid(*nx, ny.unwrap_or(*nx), radius, *borderwidth),
            None,
        )),
        GridPlan::Tiled(spec) => {
            let (grid, summary) = tile_offsets(spec, radius)?;
            Ok((grid, Some(summary)))
        }
    }
}

/// Assembles an experiment from fitted holes: mean radius, one shared grid.
pub fn prepare_experiment(
    fits: &[CircleFit],
    config: &PlanConfig,
) -> Result<PreparedExperiment, SeekError> {
    config.validate()?;
    let radii: Vec<f64> = fits.iter().map(|fit| fit.radius).collect();
    let Some(radius_stats) = RadiusStats::from_radii(&radii) else {
        return Err(SeekError::config(
            "plan-no-holes",
            "at least one hole is required to prepare an experiment",
        ));
    };
    tracing::info!(
        mean = radius_stats.mean,
        std = radius_stats.std,
        relative = radius_stats.relative(),
        "average hole radius"
    );

    let (offset_grid, grid_summary) = build_offset_grid(&config.grid, radius_stats.mean)?;
    let holes = fits
        .iter()
        .map(|fit| Hole {
            center: fit.center,
            radius: radius_stats.mean,
        })
        .collect();
    let mut experiment = Experiment::new(holes, offset_grid, radius_stats.mean);
    experiment.stamp()?;
    Ok(PreparedExperiment {
        experiment,
        radius_stats,
        grid_summary,
    })
}

/// Prepares and persists an experiment in one step.
pub fn prepare_and_store(
    fits: &[CircleFit],
    config: &PlanConfig,
    store: &dyn ExperimentStore,
) -> Result<PreparedExperiment, SeekError> {
    let prepared = prepare_experiment(fits, config)?;
    store.save_experiment(&prepared.experiment)?;
    tracing::info!(
        holes = prepared.experiment.holes.len(),
        offsets = prepared.experiment.offset_grid.len(),
        "experiment written"
    );
    Ok(prepared)
}
