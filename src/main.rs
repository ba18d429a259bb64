//! Ecomdash - E-commerce public data dashboard
//!
//! A CLI tool that loads the order and geolocation exports, scopes them to
//! a date range, and writes a dashboard report with charts and a customer
//! location map.
//!
//! Exit codes:
//!   0 - Success (a missing map or chart still counts as success)
//!   1 - Runtime error (bad arguments, unreadable or malformed input, etc.)

mod analysis;
mod cli;
mod config;
mod dataset;
mod geo;
mod models;
mod render;
mod report;

use analysis::{bottom_categories, top_categories, Aggregates, DataAnalyzer};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use geo::{MapOverlay, PointStyle};
use indicatif::{ProgressBar, ProgressStyle};
use models::{Dashboard, DashboardMetadata, DateRange, GeoRecord, MapStatus, OrderRecord};
use render::{ChartOptions, PngSurface};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Ecomdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_dashboard(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ecomdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to set input files, map background, chart output and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Run one render pass: load, filter, aggregate, draw and write the report.
async fn run_dashboard(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let orders_path = PathBuf::from(&config.data.orders);
    let geolocation_path = PathBuf::from(&config.data.geolocation);

    // Step 1: Load the inputs
    println!("📥 Loading dataset...");
    let spinner = loading_spinner(args.quiet);

    spinner.set_message(format!("orders: {}", orders_path.display()));
    let orders = dataset::load_orders(&orders_path)
        .with_context(|| format!("Failed to load orders from {}", orders_path.display()))?;

    let locations = if config.map.enabled {
        spinner.set_message(format!("geolocation: {}", geolocation_path.display()));
        dataset::load_locations(&geolocation_path).with_context(|| {
            format!(
                "Failed to load geolocation from {}",
                geolocation_path.display()
            )
        })?
    } else {
        Vec::new()
    };
    spinner.finish_and_clear();

    // Step 2: Scope to the date range
    let range = resolve_range(&args, &orders)?;
    let filtered = match range {
        Some(ref range) => dataset::filter_orders(&orders, range),
        None => Vec::new(),
    };
    match range {
        Some(ref r) => println!(
            "📅 Date range: {} ({} days, {} rows)",
            r,
            r.len_days(),
            filtered.len()
        ),
        None => println!("📅 No approved orders in dataset"),
    }

    // Step 3: Aggregate
    println!("📊 Aggregating...");
    let analyzer = DataAnalyzer::new(&filtered);
    if analyzer.is_empty() {
        warn!("No orders in the selected date range; the dashboard will be empty");
    }
    debug!("Analyzer holds {} rows", analyzer.row_count());
    let aggregates = Aggregates::compute(&analyzer);
    let summary = aggregates.summary();

    // Step 4: Charts
    let charts = if config.report.charts {
        println!("📈 Drawing charts...");
        let options = ChartOptions {
            dir: PathBuf::from(&config.report.charts_dir),
            size: (config.report.chart_width, config.report.chart_height),
            top_n: config.report.top_n,
        };
        render::render_dashboard_charts(&aggregates, &options)
            .into_iter()
            .map(|(name, path)| (name, path.display().to_string()))
            .collect()
    } else {
        Vec::new()
    };

    // Step 5: Customer map
    let map = if config.map.enabled {
        println!("🗺️  Drawing customer map...");
        render_map(locations, &config.map).await
    } else {
        MapStatus::Skipped
    };

    // Step 6: Build and write the report
    println!("📝 Generating report...");
    let top_n = config.report.top_n;
    let dashboard = Dashboard {
        metadata: DashboardMetadata {
            orders_file: orders_path.display().to_string(),
            geolocation_file: geolocation_path.display().to_string(),
            date_range: range,
            rows_loaded: orders.len(),
            rows_in_range: filtered.len(),
            generated_at: Utc::now(),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        summary,
        top_categories: top_categories(&aggregates.sum_order_items, top_n),
        bottom_categories: bottom_categories(&aggregates.sum_order_items, top_n),
        daily_orders: aggregates.daily_orders,
        sum_spend: aggregates.sum_spend,
        sum_order_items: aggregates.sum_order_items,
        review_scores: aggregates.review_scores,
        by_state: aggregates.by_state,
        order_status: aggregates.order_status,
        map,
        charts,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Dashboard Summary:");
    println!("   {}", report::summary_line(&dashboard.summary));
    println!("   Charts: {}", dashboard.charts.len());
    if let MapStatus::Unavailable { ref reason } = dashboard.map {
        println!("   ⚠️  Map unavailable: {}", reason);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Dashboard complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Fetch the background and draw the overlay. Failures degrade to a placeholder.
async fn render_map(locations: Vec<GeoRecord>, map_config: &config::MapConfig) -> MapStatus {
    let timeout = Duration::from_secs(map_config.timeout_seconds);

    let background = match geo::fetch_background(&map_config.background, timeout).await {
        Ok(image) => image,
        Err(e) => {
            warn!("Background map unavailable: {}", e);
            return MapStatus::Unavailable {
                reason: e.to_string(),
            };
        }
    };

    let overlay = MapOverlay::new(locations).with_style(PointStyle {
        alpha: map_config.point_alpha,
        radius: map_config.point_radius,
        ..PointStyle::default()
    });

    info!("Plotting {} customer locations", overlay.point_count());

    let mut surface = PngSurface::new(&map_config.output, (map_config.size, map_config.size));
    let result = overlay
        .render(&mut surface, &background)
        .and_then(|()| surface.save());

    match result {
        Ok(()) => MapStatus::Rendered {
            path: surface.path().display().to_string(),
            points: surface.point_count(),
        },
        Err(e) => {
            warn!("Failed to draw customer map: {}", e);
            MapStatus::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Date range from the flags, falling back to the span of the data.
///
/// A range whose start falls after its end is rejected, including one
/// where only one end was given and the other came from the data.
fn resolve_range(args: &Args, orders: &[OrderRecord]) -> Result<Option<DateRange>> {
    let span = DateRange::span(orders);
    let (Some(start), Some(end)) = (
        args.start.or(span.map(|s| s.start)),
        args.end.or(span.map(|s| s.end)),
    ) else {
        return Ok(None);
    };

    if start > end {
        anyhow::bail!(
            "start date ({}) must not be after end date ({})",
            start,
            end
        );
    }
    Ok(Some(DateRange::new(start, end)))
}

/// Spinner shown while the inputs load.
fn loading_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use chrono::{NaiveDate, NaiveDateTime};

    fn order(approved: &str) -> OrderRecord {
        OrderRecord {
            order_id: approved.to_string(),
            customer_id: "c".to_string(),
            customer_unique_id: None,
            order_status: "delivered".to_string(),
            order_purchase_timestamp: None,
            order_approved_at: Some(
                NaiveDateTime::parse_from_str(approved, "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            order_delivered_carrier_date: None,
            order_delivered_customer_date: None,
            order_estimated_delivery_date: None,
            shipping_limit_date: None,
            payment_value: None,
            product_id: None,
            product_category_name_english: None,
            review_score: None,
            customer_state: "SP".to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_resolve_range_defaults_to_span() {
        let orders = vec![order("2017-03-01 10:00:00"), order("2018-08-29 15:00:00")];
        let args = make_args();

        let range = resolve_range(&args, &orders).unwrap().unwrap();
        assert_eq!(range, DateRange::new(day("2017-03-01"), day("2018-08-29")));
    }

    #[test]
    fn test_resolve_range_uses_flags() {
        let orders = vec![order("2017-03-01 10:00:00"), order("2018-08-29 15:00:00")];
        let mut args = make_args();
        args.start = Some(day("2018-01-01"));

        let range = resolve_range(&args, &orders).unwrap().unwrap();
        assert_eq!(range, DateRange::new(day("2018-01-01"), day("2018-08-29")));
    }

    #[test]
    fn test_resolve_range_rejects_inverted() {
        let orders = vec![order("2018-08-29 15:00:00")];

        let mut args = make_args();
        args.start = Some(day("2019-01-01"));
        let err = resolve_range(&args, &orders).unwrap_err();
        assert!(err.to_string().contains("2019-01-01"));

        let mut args = make_args();
        args.end = Some(day("2018-01-01"));
        assert!(resolve_range(&args, &orders).is_err());
    }

    #[test]
    fn test_resolve_range_empty_dataset() {
        assert_eq!(resolve_range(&make_args(), &[]).unwrap(), None);

        let mut args = make_args();
        args.start = Some(day("2018-01-01"));
        args.end = Some(day("2018-01-31"));
        assert_eq!(
            resolve_range(&args, &[]).unwrap(),
            Some(DateRange::new(day("2018-01-01"), day("2018-01-31")))
        );
    }

    #[test]
    fn test_render_map_counts_plotted_locations() {
        let dir = tempfile::TempDir::new().unwrap();
        let background = dir.path().join("brazil.png");
        image::RgbImage::new(8, 8).save(&background).unwrap();

        let map_config = config::MapConfig {
            background: background.display().to_string(),
            output: dir.path().join("map.png").display().to_string(),
            size: 120,
            ..config::MapConfig::default()
        };
        let locations = vec![
            GeoRecord {
                customer_unique_id: "a".to_string(),
                longitude: -46.6,
                latitude: -23.5,
            },
            GeoRecord {
                customer_unique_id: "b".to_string(),
                longitude: -43.2,
                latitude: -22.9,
            },
        ];

        let status = tokio_test::block_on(render_map(locations, &map_config));
        match status {
            MapStatus::Rendered { path, points } => {
                assert_eq!(points, 2);
                assert!(Path::new(&path).exists());
            }
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[test]
    fn test_render_map_reports_missing_background() {
        let map_config = config::MapConfig {
            background: "/nonexistent/brazil.jpg".to_string(),
            ..config::MapConfig::default()
        };

        let status = tokio_test::block_on(render_map(Vec::new(), &map_config));
        match status {
            MapStatus::Unavailable { reason } => assert!(reason.contains("brazil.jpg")),
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
