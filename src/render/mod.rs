//! Rendering backends.
//!
//! The plotters implementation of the overlay [`crate::geo::Surface`] and
//! the dashboard chart writers.

pub mod charts;
pub mod surface;

pub use charts::{render_dashboard_charts, ChartOptions};
pub use surface::PngSurface;
