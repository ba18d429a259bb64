//! Geolocation overlay.
//!
//! Draws deduplicated customer locations over a background map.

pub mod fetch;
pub mod overlay;

pub use fetch::{fetch_background, RetrievalError, DEFAULT_BACKGROUND_URL};
pub use overlay::{BoundingBox, MapOverlay, PointStyle, RenderError, Surface};
