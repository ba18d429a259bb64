//! Analysis modules.
//!
//! The aggregation layer of the dashboard: per-day bucketing, value counts
//! and the headline statistics built on top of them.

pub mod aggregator;
pub mod summary;

pub use aggregator::DataAnalyzer;
pub use summary::{bottom_categories, top_categories, Aggregates};
