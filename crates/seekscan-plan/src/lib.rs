#![deny(missing_docs)]
#![doc = "Experiment planning for seekscan: hole sampling, grid assignment, hole mapping and reconciliation."]

pub mod config;
pub mod interactive;
pub mod mapping;
pub mod prepare;
pub mod reconcile;
pub mod store;

pub use config::{GridPlan, PlanConfig};
pub use interactive::{synthetic_circle, HoleSampler, SampleDecision};
pub use mapping::{
    map_holes_on_grid, merge_detections, FrameDetections, HoleMap, HoleMapOptions, MappingFrame,
};
pub use prepare::{
    build_offset_grid, fit_holes_from_headers, prepare_and_store, prepare_experiment,
    PreparedExperiment, RadiusStats,
};
pub use reconcile::{reconcile_store, reconcile_with_mapped_holes, HoleMatch, Reconciliation};
pub use store::{JsonStore, EXPERIMENT_FILE, HOLE_POSITIONS_FILE};
