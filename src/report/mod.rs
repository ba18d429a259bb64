//! Dashboard report generation.
//!
//! This module renders a computed dashboard as Markdown or JSON.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, summary_line};
