//! Dataset loading and scoping.
//!
//! This module reads the order and geolocation exports, validates their
//! shape, and applies the date-range filter before aggregation.

pub mod de;
pub mod loader;

pub use loader::{dedup_locations, filter_orders, load_locations, load_orders, LoadError};
