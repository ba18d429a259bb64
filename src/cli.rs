//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Ecomdash - E-commerce public data dashboard
///
/// Loads the order and geolocation exports, scopes them to a date range and
/// writes a dashboard report with charts and a customer map.
///
/// Examples:
///   ecomdash --orders df_ecommerce.csv --geolocation geolocation.csv
///   ecomdash --start 2017-01-01 --end 2017-12-31 --format json -o dashboard.json
///   ecomdash --no-map --charts-dir out/charts
///   ecomdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Pre-joined order export (CSV)
    ///
    /// Default: from config or df_ecommerce.csv
    #[arg(long, value_name = "FILE", env = "ECOMDASH_ORDERS")]
    pub orders: Option<PathBuf>,

    /// Customer geolocation export (CSV)
    ///
    /// Default: from config or geolocation.csv
    #[arg(long, value_name = "FILE", env = "ECOMDASH_GEOLOCATION")]
    pub geolocation: Option<PathBuf>,

    /// First approval day to include (YYYY-MM-DD)
    ///
    /// Defaults to the earliest order_approved_at in the data.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last approval day to include (YYYY-MM-DD), inclusive
    ///
    /// Defaults to the latest order_approved_at in the data.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Directory for chart images
    #[arg(long, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// Output path for the customer map image
    #[arg(long, value_name = "FILE")]
    pub map_output: Option<PathBuf>,

    /// Background map image (URL or local path)
    #[arg(long, value_name = "SOURCE")]
    pub background: Option<String>,

    /// Background fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the customer map
    #[arg(long)]
    pub no_map: bool,

    /// Skip chart images
    #[arg(long)]
    pub no_charts: bool,

    /// Number of categories in the best/worst-selling tables
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ecomdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ecomdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(format!(
                    "Start date {} is after end date {}",
                    start, end
                ));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if let Some(ref background) = self.background {
            if background.trim().is_empty() {
                return Err("Background source must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
