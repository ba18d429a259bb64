//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ecomdash.toml` files.

use crate::geo::DEFAULT_BACKGROUND_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".ecomdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input files.
    #[serde(default)]
    pub data: DataConfig,

    /// Geolocation overlay settings.
    #[serde(default)]
    pub map: MapConfig,

    /// Report and chart settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "dashboard.md".to_string()
}

/// Input dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Pre-joined order export.
    #[serde(default = "default_orders")]
    pub orders: String,

    /// Customer geolocation export.
    #[serde(default = "default_geolocation")]
    pub geolocation: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            orders: default_orders(),
            geolocation: default_geolocation(),
        }
    }
}

fn default_orders() -> String {
    "df_ecommerce.csv".to_string()
}

fn default_geolocation() -> String {
    "geolocation.csv".to_string()
}

/// Geolocation overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Render the overlay at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Background image URL or local path.
    #[serde(default = "default_background")]
    pub background: String,

    /// Background fetch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Overlay PNG path.
    #[serde(default = "default_map_output")]
    pub output: String,

    /// Overlay size in pixels.
    #[serde(default = "default_map_size")]
    pub size: u32,

    /// Marker opacity (0.0 - 1.0).
    #[serde(default = "default_point_alpha")]
    pub point_alpha: f64,

    /// Marker radius in pixels.
    #[serde(default = "default_point_radius")]
    pub point_radius: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            background: default_background(),
            timeout_seconds: default_timeout(),
            output: default_map_output(),
            size: default_map_size(),
            point_alpha: default_point_alpha(),
            point_radius: default_point_radius(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_background() -> String {
    DEFAULT_BACKGROUND_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_map_output() -> String {
    "charts/customer_map.png".to_string()
}

fn default_map_size() -> u32 {
    1000
}

fn default_point_alpha() -> f64 {
    0.3
}

fn default_point_radius() -> u32 {
    1
}

/// Report and chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write PNG charts next to the report.
    #[serde(default = "default_true")]
    pub charts: bool,

    /// Directory for chart images.
    #[serde(default = "default_charts_dir")]
    pub charts_dir: String,

    /// Categories listed in the best/worst-selling tables.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Chart width in pixels.
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            charts: true,
            charts_dir: default_charts_dir(),
            top_n: default_top_n(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

fn default_charts_dir() -> String {
    "charts".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    600
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings; only
    /// values the user actually passed are applied.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref orders) = args.orders {
            self.data.orders = orders.display().to_string();
        }
        if let Some(ref geolocation) = args.geolocation {
            self.data.geolocation = geolocation.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref background) = args.background {
            self.map.background = background.clone();
        }
        if let Some(timeout) = args.timeout {
            self.map.timeout_seconds = timeout;
        }
        if let Some(ref map_output) = args.map_output {
            self.map.output = map_output.display().to_string();
        }
        if args.no_map {
            self.map.enabled = false;
        }

        if let Some(ref charts_dir) = args.charts_dir {
            self.report.charts_dir = charts_dir.display().to_string();
        }
        if args.no_charts {
            self.report.charts = false;
        }
        if let Some(top) = args.top {
            self.report.top_n = top;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
