//! What a scan did: every acquisition and every skipped step.

use serde::{Deserialize, Serialize};

use seekscan_core::Point2D;

/// Kind of frame recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionKind {
    /// Survey image at an offset.
    Imaging,
    /// Diffraction pattern of one detected object.
    Diffraction,
}

/// One completed acquisition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionRecord {
    /// Imaging or diffraction.
    pub kind: AcquisitionKind,
    /// Hole index.
    pub hole: usize,
    /// Offset index within the hole.
    pub offset: usize,
    /// Object index for diffraction frames.
    pub object: Option<usize>,
    /// Commanded stage position.
    pub stage_position: Point2D,
    /// Beamshift applied for diffraction frames.
    pub beamshift: Option<Point2D>,
    /// Output name handed to the instrument.
    pub out_name: String,
    /// Comment stored in the frame header.
    pub comment: String,
    /// Display flag at acquisition time.
    pub plotting: bool,
}

/// Step at which a device rejection was turned into a skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    /// Moving to the hole center; the whole hole is skipped.
    HoleMove,
    /// Moving to an offset; the offset is skipped.
    OffsetMove,
    /// Acquiring the survey image; the offset is skipped.
    Imaging,
    /// Setting up or acquiring one diffraction pattern; the object is skipped.
    Diffraction,
}

/// One skipped step with the rejection that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    /// Where the rejection happened.
    pub stage: SkipStage,
    /// Hole index.
    pub hole: usize,
    /// Offset index, absent for hole moves.
    pub offset: Option<usize>,
    /// Object index for diffraction skips.
    pub object: Option<usize>,
    /// Error code of the rejection.
    pub code: String,
    /// Rendered rejection.
    pub reason: String,
}

/// Summary of a scan run; partial when the operator exits.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Holes in the experiment.
    pub holes: usize,
    /// Offsets per hole actually used.
    pub offsets_per_hole: usize,
    /// Holes whose center was reached.
    pub holes_visited: usize,
    /// Acquisitions in the order they happened.
    pub acquisitions: Vec<AcquisitionRecord>,
    /// Skipped steps in the order they happened.
    pub skips: Vec<SkipRecord>,
    /// Failures while returning to imaging mode; logged, never fatal.
    pub restore_failures: Vec<String>,
    /// True when every hole was processed.
    pub completed: bool,
    /// True when the operator terminated the scan.
    pub aborted: bool,
}

impl ScanReport {
    /// Number of acquisitions of the given kind.
    pub fn count(&self, kind: AcquisitionKind) -> usize {
        self.acquisitions
            .iter()
            .filter(|record| record.kind == kind)
            .count()
    }

    /// Acquisitions recorded at one hole offset.
    pub fn at(&self, hole: usize, offset: usize) -> impl Iterator<Item = &AcquisitionRecord> {
        self.acquisitions
            .iter()
            .filter(move |record| record.hole == hole && record.offset == offset)
    }
}
