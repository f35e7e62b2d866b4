//! Placement validation, layer numbering and load metrics for cargo
//! containers, plus the HTTP service that exposes them.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layering;
pub mod metrics;
pub mod model;
pub mod placement;
pub mod types;

pub use error::{InputIssue, Outcome, ValidationError};
pub use geometry::snap_to_grid;
pub use layering::{calculate_layer_assignments, layer_summary};
pub use metrics::load_metrics;
pub use model::{CargoItem, ContainerType, Unit, normalize};
pub use placement::{evaluate_placement, is_valid_placement, preview_path};
pub use types::Position3D;
