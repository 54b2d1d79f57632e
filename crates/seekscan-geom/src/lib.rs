//! Pure geometry used to plan a seek-and-image experiment.

pub mod circle;
pub mod cluster;
pub mod grid;

pub use circle::{circle_center, fit_circle, CircleFit};
pub use cluster::{cluster_labels, cluster_mean};
pub use grid::{make_grid, make_offsets, tile_offsets, GridSummary, TileSpec};
