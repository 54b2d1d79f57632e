//! The seek-and-image loop: holes × offsets, survey image, diffraction per object.

use seekscan_core::errors::{ErrorInfo, SeekError};
use seekscan_core::{
    autoscale, BeamShiftCalibration, CaptureRequest, Experiment, Microscope, ObjectDetector,
    OffsetGrid, Operator, Point2D,
};
use seekscan_geom::tile_offsets;

use crate::config::ScanConfig;
use crate::cursor::{OperatorCommand, ScanCursor};
use crate::report::{AcquisitionKind, AcquisitionRecord, ScanReport, SkipRecord, SkipStage};

/// Prompt shown before each acquisition in manual mode.
pub const ACQUIRE_PROMPT: &str = "\n (Press <enter> to save an image and continue) \n >> ";

/// Output name of the survey image at `offset` of `hole`.
pub fn imaging_name(hole: usize, offset: usize) -> String {
    format!("image_{hole:04}_{offset:04}")
}

/// Output name of the diffraction pattern of `object`.
pub fn diffraction_name(hole: usize, offset: usize, object: usize) -> String {
    format!("image_{hole:04}_{offset:04}_{object:04}")
}

enum OffsetOutcome {
    Done,
    NextHole,
}

/// Drives one scan over a planned experiment.
///
/// Device rejections become skips at the step where they occur: the hole for
/// a rejected center move, the offset for a rejected offset move or survey
/// image, the object for a failed diffraction step. Every other error ends
/// the scan. The report stays readable after an error, see
/// [`ScanExecutor::report`].
pub struct ScanExecutor<'a> {
    experiment: &'a Experiment,
    config: &'a ScanConfig,
    microscope: &'a mut dyn Microscope,
    detector: &'a dyn ObjectDetector,
    beamshift: &'a dyn BeamShiftCalibration,
    operator: &'a mut dyn Operator,
    cursor: ScanCursor,
    report: ScanReport,
}

impl<'a> ScanExecutor<'a> {
    /// Wires the executor to its collaborators.
    pub fn new(
        experiment: &'a Experiment,
        config: &'a ScanConfig,
        microscope: &'a mut dyn Microscope,
        detector: &'a dyn ObjectDetector,
        beamshift: &'a dyn BeamShiftCalibration,
        operator: &'a mut dyn Operator,
    ) -> Self {
        Self {
            experiment,
            config,
            microscope,
            detector,
            beamshift,
            operator,
            cursor: ScanCursor::default(),
            report: ScanReport::default(),
        }
    }

    /// Report of the last run, partial after an error.
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Offsets visited around every hole for this configuration.
    pub fn offsets(&self) -> Result<OffsetGrid, SeekError> {
        match &self.config.regrid {
            Some(regrid) => {
                let (grid, summary) = tile_offsets(&regrid.tile_spec(), self.experiment.radius)?;
                tracing::info!(
                    nx = summary.nx,
                    ny = summary.ny,
                    borderwidth = summary.borderwidth,
                    count = summary.count,
                    "offset grid regenerated from the imaging field of view"
                );
                Ok(grid)
            }
            None => Ok(self.experiment.offset_grid.clone()),
        }
    }

    /// Runs the scan to completion.
    ///
    /// Returns [`SeekError::Abort`] when the operator types `exit`.
    pub fn run(&mut self) -> Result<ScanReport, SeekError> {
        self.config.validate()?;
        self.cursor = ScanCursor::default();
        self.report = ScanReport {
            holes: self.experiment.holes.len(),
            ..ScanReport::default()
        };

        self.microscope.set_magnification(self.config.magnification)?;
        let magnification = self.microscope.magnification()?;
        let neutral = self.beamshift.pixel_to_beamshift(self.config.neutral_pixel);
        let offsets = self.offsets()?;
        self.report.offsets_per_hole = offsets.len();
        tracing::info!(
            binning = self.config.image_binning,
            exposure = self.config.image_exposure,
            magnification,
            "imaging parameters"
        );
        tracing::info!(
            binning = self.config.diff_binning,
            exposure = self.config.diff_exposure,
            brightness = self.config.diff_brightness,
            "diffraction parameters"
        );

        let experiment = self.experiment;
        for (hole_idx, hole) in experiment.holes.iter().enumerate() {
            self.cursor.enter_hole(hole_idx);
            if let Err(err) = self.microscope.move_stage(hole.center) {
                self.skip_or_fail(err, SkipStage::HoleMove, None, None)?;
                tracing::warn!(hole = hole_idx, "moving to next hole");
                continue;
            }
            self.report.holes_visited += 1;
            tracing::info!(hole = hole_idx, center = %hole.center, "going to hole center");

            for (offset_idx, offset) in offsets.iter().enumerate() {
                self.cursor.enter_offset(offset_idx);
                match self.visit_offset(hole.center, *offset, neutral)? {
                    OffsetOutcome::Done => {}
                    OffsetOutcome::NextHole => {
                        tracing::info!(hole = hole_idx, "going to next hole");
                        break;
                    }
                }
            }
        }

        self.report.completed = true;
        tracing::info!(
            holes = self.report.holes,
            visited = self.report.holes_visited,
            imaging = self.report.count(AcquisitionKind::Imaging),
            diffraction = self.report.count(AcquisitionKind::Diffraction),
            skips = self.report.skips.len(),
            "scan finished"
        );
        Ok(self.report.clone())
    }

    fn skip_or_fail(
        &mut self,
        err: SeekError,
        stage: SkipStage,
        offset: Option<usize>,
        object: Option<usize>,
    ) -> Result<(), SeekError> {
        if !err.is_device_rejection() {
            return Err(err);
        }
        tracing::warn!(
            hole = self.cursor.hole_index,
            offset = ?offset,
            object = ?object,
            stage = ?stage,
            %err,
            "device rejected command, skipping"
        );
        self.report.skips.push(SkipRecord {
            stage,
            hole: self.cursor.hole_index,
            offset,
            object,
            code: err.info().code.clone(),
            reason: err.to_string(),
        });
        Ok(())
    }

    fn visit_offset(
        &mut self,
        center: Point2D,
        offset: Point2D,
        neutral: Point2D,
    ) -> Result<OffsetOutcome, SeekError> {
        let hole_idx = self.cursor.hole_index;
        let offset_idx = self.cursor.offset_index;
        let target = center + offset;
        if let Err(err) = self.microscope.move_stage(target) {
            self.skip_or_fail(err, SkipStage::OffsetMove, Some(offset_idx), None)?;
            return Ok(OffsetOutcome::Done);
        }
        tracing::debug!(hole = hole_idx, offset = offset_idx, %target, "at offset");

        if self.cursor.needs_prompt() {
            let answer = self.operator.prompt(ACQUIRE_PROMPT)?;
            let command = OperatorCommand::parse(&answer);
            match command {
                OperatorCommand::Exit => {
                    self.report.aborted = true;
                    tracing::info!(hole = hole_idx, offset = offset_idx, "interrupted");
                    return Err(SeekError::Abort(
                        ErrorInfo::new("scan-exit", "operator terminated the scan")
                            .with_context("hole", hole_idx.to_string())
                            .with_context("offset", offset_idx.to_string()),
                    ));
                }
                OperatorCommand::Next => return Ok(OffsetOutcome::NextHole),
                other => self.cursor.apply(other),
            }
        }

        let out_name = imaging_name(hole_idx, offset_idx);
        let request = CaptureRequest {
            binning: self.config.image_binning,
            exposure: self.config.image_exposure,
            comment: format!(
                "Hole {hole_idx} image {offset_idx}\nx_offset={:.2e} y_offset={:.2e}",
                offset.x, offset.y
            ),
            out_name: out_name.clone(),
        };
        let (image, header) = match self.microscope.capture_image(&request) {
            Ok(frame) => frame,
            Err(err) => {
                self.skip_or_fail(err, SkipStage::Imaging, Some(offset_idx), None)?;
                return Ok(OffsetOutcome::Done);
            }
        };
        self.report.acquisitions.push(AcquisitionRecord {
            kind: AcquisitionKind::Imaging,
            hole: hole_idx,
            offset: offset_idx,
            object: None,
            stage_position: target,
            beamshift: None,
            out_name,
            comment: request.comment,
            plotting: self.cursor.plotting,
        });

        let (scaled, scale) = autoscale(&image, self.config.max_image_dim);
        let objects = self.detector.find_objects(
            &scaled,
            header.magnification,
            self.config.detection_spread,
        )?;
        if objects.is_empty() {
            tracing::debug!(hole = hole_idx, offset = offset_idx, "no objects");
            return Ok(OffsetOutcome::Done);
        }

        let factor = f64::from(self.config.image_binning) / scale;
        let centroids: Vec<Point2D> = objects
            .iter()
            .map(|object| object.centroid * factor)
            .collect();
        let shifts = self.beamshift.pixels_to_beamshift(&centroids);
        tracing::info!(
            hole = hole_idx,
            offset = offset_idx,
            objects = shifts.len(),
            "switching to diffraction mode"
        );
        let mut fatal = None;
        for (object_idx, shift) in shifts.into_iter().enumerate() {
            if let Err(err) = self.diffract(target, shift, object_idx) {
                if let Err(err) = self.skip_or_fail(
                    err,
                    SkipStage::Diffraction,
                    Some(offset_idx),
                    Some(object_idx),
                ) {
                    fatal = Some(err);
                    break;
                }
            }
        }
        // Imaging state comes back before any error leaves the offset.
        self.restore_imaging(neutral);
        match fatal {
            Some(err) => Err(err),
            None => Ok(OffsetOutcome::Done),
        }
    }

    fn diffract(
        &mut self,
        target: Point2D,
        shift: Point2D,
        object_idx: usize,
    ) -> Result<(), SeekError> {
        let hole_idx = self.cursor.hole_index;
        let offset_idx = self.cursor.offset_index;
        self.microscope.set_brightness(self.config.diff_brightness)?;
        self.microscope.set_beamshift(shift)?;
        self.microscope.enter_diffraction_mode()?;
        self.microscope.compensate_diffraction_shift()?;
        let out_name = diffraction_name(hole_idx, offset_idx, object_idx);
        let request = CaptureRequest {
            binning: self.config.diff_binning,
            exposure: self.config.diff_exposure,
            comment: format!("Hole {hole_idx} image {offset_idx} Crystal {object_idx}"),
            out_name: out_name.clone(),
        };
        self.microscope.capture_image(&request)?;
        tracing::debug!(object = object_idx, %shift, "diffraction pattern acquired");
        self.report.acquisitions.push(AcquisitionRecord {
            kind: AcquisitionKind::Diffraction,
            hole: hole_idx,
            offset: offset_idx,
            object: Some(object_idx),
            stage_position: target,
            beamshift: Some(shift),
            out_name,
            comment: request.comment,
            plotting: self.cursor.plotting,
        });
        Ok(())
    }

    fn restore_imaging(&mut self, neutral: Point2D) {
        let steps: [(&str, Result<(), SeekError>); 4] = [
            ("beamshift", self.microscope.set_beamshift(neutral)),
            ("compensate", self.microscope.compensate_diffraction_shift()),
            ("imaging_mode", self.microscope.enter_imaging_mode()),
            ("brightness", self.microscope.max_brightness()),
        ];
        for (step, result) in steps {
            if let Err(err) = result {
                tracing::warn!(step, %err, "failed to restore imaging state");
                self.report.restore_failures.push(format!("{step}: {err}"));
            }
        }
        tracing::info!(hole = self.cursor.hole_index, "switched back to image mode");
    }
}
