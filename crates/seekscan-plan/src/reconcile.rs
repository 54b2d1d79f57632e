//! Aligning planning-time hole centers with a dense hole map.
//!
//! Planning picks a handful of holes in one optical frame; the dense map is
//! captured in another. The mean displacement between matching holes is the
//! systematic offset between the two frames.

use serde::{Deserialize, Serialize};

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::{Experiment, ExperimentStore, Hole, Point2D};

/// How one planning-time center matched the dense map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoleMatch {
    /// Index of the hole in the experiment before reconciliation.
    pub hole_index: usize,
    /// Index of the nearest dense observation within the radius, if any.
    pub nearest: Option<usize>,
    /// Dense position minus planning center for matched holes.
    pub shift: Option<Point2D>,
}

/// Outcome of [`reconcile_with_mapped_holes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Mean shift removed from the dense positions.
    pub correction: Point2D,
    /// Per-hole match report; unmatched holes carry no shift.
    pub matches: Vec<HoleMatch>,
    /// Experiment rewritten with the corrected hole list.
    pub experiment: Experiment,
}

impl Reconciliation {
    /// Number of holes that contributed a shift sample.
    pub fn contributing(&self) -> usize {
        self.matches.iter().filter(|m| m.shift.is_some()).count()
    }
}

fn nearest_within(center: Point2D, dense: &[Point2D], radius: f64) -> Option<usize> {
    dense
        .iter()
        .enumerate()
        .map(|(idx, point)| (idx, point.distance(&center)))
        .filter(|(_, distance)| *distance < radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

/// Computes the global stage correction and rewrites the experiment.
///
/// For every planning-time center the nearest dense position closer than the
/// experiment radius contributes one shift sample. Holes without a match are
/// reported in [`Reconciliation::matches`] but otherwise ignored. The dense
/// positions minus the mean shift become the new hole list; the previous
/// centers are kept as `planned_centers`.
pub fn reconcile_with_mapped_holes(
    experiment: &Experiment,
    dense: &[Point2D],
) -> Result<Reconciliation, SeekError> {
    let matches: Vec<HoleMatch> = experiment
        .holes
        .iter()
        .enumerate()
        .map(|(hole_index, hole)| {
            let nearest = nearest_within(hole.center, dense, experiment.radius);
            let shift = nearest.map(|idx| dense[idx] - hole.center);
            if let Some(shift) = shift {
                tracing::debug!(hole = hole_index, %shift, "hole matched");
            } else {
                tracing::warn!(hole = hole_index, center = %hole.center, "no mapped hole within radius");
            }
            HoleMatch {
                hole_index,
                nearest,
                shift,
            }
        })
        .collect();

    let shifts: Vec<Point2D> = matches.iter().filter_map(|m| m.shift).collect();
    let Some(correction) = Point2D::mean(&shifts) else {
        return Err(SeekError::Overlap(
            ErrorInfo::new(
                "reconcile-no-overlap",
                "no planning center has a mapped hole within its radius",
            )
            .with_context("holes", experiment.holes.len().to_string())
            .with_context("mapped", dense.len().to_string())
            .with_context("radius", experiment.radius.to_string())
            .with_hint("check that the hole map and the experiment cover the same grid square"),
        ));
    };
    tracing::info!(
        %correction,
        contributing = shifts.len(),
        holes = experiment.holes.len(),
        "stage correction (mean shift)"
    );

    let mut updated = experiment.clone();
    updated.planned_centers = experiment.centers();
    updated.holes = dense
        .iter()
        .map(|point| Hole {
            center: *point - correction,
            radius: experiment.radius,
        })
        .collect();
    updated.stage_correction = Some(correction);
    updated.stamp()?;

    Ok(Reconciliation {
        correction,
        matches,
        experiment: updated,
    })
}

/// Loads the experiment and the dense map from `store`, reconciles, and
/// writes the updated experiment back.
pub fn reconcile_store(store: &dyn ExperimentStore) -> Result<Reconciliation, SeekError> {
    let experiment = store.load_experiment()?;
    let dense = store.load_hole_positions()?;
    let reconciliation = reconcile_with_mapped_holes(&experiment, &dense)?;
    store.save_experiment(&reconciliation.experiment)?;
    tracing::info!(
        holes = reconciliation.experiment.holes.len(),
        "wrote reconciled hole coordinates"
    );
    Ok(reconciliation)
}
