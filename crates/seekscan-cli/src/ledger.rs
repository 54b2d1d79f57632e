//! CSV ledger of acquisitions, one row per frame.

use std::error::Error;
use std::path::Path;

use serde::Serialize;

use seekscan_exec::{AcquisitionKind, AcquisitionRecord};

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    kind: AcquisitionKind,
    hole: usize,
    offset: usize,
    object: Option<usize>,
    stage_x: f64,
    stage_y: f64,
    beamshift_x: Option<f64>,
    beamshift_y: Option<f64>,
    out_name: &'a str,
    plotting: bool,
}

impl<'a> From<&'a AcquisitionRecord> for LedgerRow<'a> {
    fn from(record: &'a AcquisitionRecord) -> Self {
        Self {
            kind: record.kind,
            hole: record.hole,
            offset: record.offset,
            object: record.object,
            stage_x: record.stage_position.x,
            stage_y: record.stage_position.y,
            beamshift_x: record.beamshift.map(|shift| shift.x),
            beamshift_y: record.beamshift.map(|shift| shift.y),
            out_name: &record.out_name,
            plotting: record.plotting,
        }
    }
}

/// Writes `records` to `path`, replacing any previous ledger.
pub fn write_ledger(path: &Path, records: &[AcquisitionRecord]) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(LedgerRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}
