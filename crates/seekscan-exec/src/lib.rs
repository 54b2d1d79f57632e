#![deny(missing_docs)]
#![doc = "Scan execution for seekscan: visits every hole offset, images it and collects diffraction from detected objects."]

pub mod config;
pub mod cursor;
pub mod executor;
pub mod report;

pub use config::{RegridConfig, ScanConfig};
pub use cursor::{OperatorCommand, ScanCursor, ScanMode};
pub use executor::{diffraction_name, imaging_name, ScanExecutor, ACQUIRE_PROMPT};
pub use report::{AcquisitionKind, AcquisitionRecord, ScanReport, SkipRecord, SkipStage};
