//! Dashboard charts.
//!
//! Line charts for the daily series and bar charts for the count tables,
//! written as PNG files with plotters.

use super::surface::backend_err;
use crate::analysis::{bottom_categories, top_categories, Aggregates};
use crate::geo::RenderError;
use chrono::NaiveDate;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const ACCENT: RGBColor = RGBColor(0x90, 0xCA, 0xF9);
const MUTED: RGBColor = RGBColor(0xD3, 0xD3, 0xD3);

/// Chart output settings.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub dir: PathBuf,
    pub size: (u32, u32),
    /// Number of categories in the best/worst-selling charts.
    pub top_n: usize,
}

/// Draw a date series as a line with point markers.
///
/// Captions and axis labels need a system font. When text cannot be drawn
/// the chart is written again without them.
pub fn line_chart(
    path: &Path,
    title: &str,
    series: &[(NaiveDate, f64)],
    size: (u32, u32),
) -> Result<(), RenderError> {
    draw_line_chart(path, Some(title), series, size).or_else(|e| {
        warn!("Chart '{}' drawn without labels: {}", title, e);
        draw_line_chart(path, None, series, size)
    })
}

fn draw_line_chart(
    path: &Path,
    title: Option<&str>,
    series: &[(NaiveDate, f64)],
    size: (u32, u32),
) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(backend_err)?;

    let n = series.len().max(1);
    let y_max = upper_bound(series.iter().map(|(_, v)| *v));

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if let Some(title) = title {
        builder
            .caption(title, ("sans-serif", 28))
            .x_label_area_size(60)
            .y_label_area_size(80);
    }
    let mut chart = builder
        .build_cartesian_2d(0..n, 0f64..y_max)
        .map_err(backend_err)?;

    if title.is_some() {
        chart
            .configure_mesh()
            .x_labels(n.min(12))
            .x_label_formatter(&|i| {
                series
                    .get(*i)
                    .map(|(day, _)| day.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(backend_err)?;
    }

    chart
        .draw_series(LineSeries::new(
            series.iter().enumerate().map(|(i, (_, v))| (i, *v)),
            ACCENT.stroke_width(2),
        ))
        .map_err(backend_err)?;
    chart
        .draw_series(
            series
                .iter()
                .enumerate()
                .map(|(i, (_, v))| Circle::new((i, *v), 3, ACCENT.filled())),
        )
        .map_err(backend_err)?;

    root.present().map_err(backend_err)?;
    Ok(())
}

/// Draw labelled vertical bars; the bar at `highlight` uses the accent colour.
pub fn bar_chart(
    path: &Path,
    title: &str,
    bars: &[(String, f64)],
    highlight: Option<usize>,
    size: (u32, u32),
) -> Result<(), RenderError> {
    draw_bar_chart(path, Some(title), bars, highlight, size).or_else(|e| {
        warn!("Chart '{}' drawn without labels: {}", title, e);
        draw_bar_chart(path, None, bars, highlight, size)
    })
}

fn draw_bar_chart(
    path: &Path,
    title: Option<&str>,
    bars: &[(String, f64)],
    highlight: Option<usize>,
    size: (u32, u32),
) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(backend_err)?;

    let n = bars.len().max(1);
    let y_max = upper_bound(bars.iter().map(|(_, v)| *v));

    let mut builder = ChartBuilder::on(&root);
    builder.margin(15);
    if let Some(title) = title {
        builder
            .caption(title, ("sans-serif", 28))
            .x_label_area_size(60)
            .y_label_area_size(80);
    }
    let mut chart = builder
        .build_cartesian_2d((0..n).into_segmented(), 0f64..y_max)
        .map_err(backend_err)?;

    if title.is_some() {
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(i) => {
                    bars.get(*i).map(|(l, _)| l.clone()).unwrap_or_default()
                }
                _ => String::new(),
            })
            .draw()
            .map_err(backend_err)?;
    }

    chart
        .draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
            let color = match highlight {
                Some(h) if h == i => ACCENT,
                Some(_) => MUTED,
                None => ACCENT,
            };
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                color.filled(),
            );
            bar.set_margin(0, 0, 8, 8);
            bar
        }))
        .map_err(backend_err)?;

    root.present().map_err(backend_err)?;
    Ok(())
}

/// Write every dashboard chart into `options.dir`.
///
/// A chart that fails to render is logged and skipped. Returns the
/// (name, path) of each chart written.
pub fn render_dashboard_charts(
    aggregates: &Aggregates,
    options: &ChartOptions,
) -> Vec<(String, PathBuf)> {
    if let Err(e) = std::fs::create_dir_all(&options.dir) {
        warn!("Cannot create charts directory {}: {}", options.dir.display(), e);
        return Vec::new();
    }

    let mut written = Vec::new();
    let mut emit = |name: &str, result: Result<(), RenderError>, path: PathBuf| match result {
        Ok(()) => {
            info!("Chart written: {}", path.display());
            written.push((name.to_string(), path));
        }
        Err(e) => warn!("Skipping chart '{}': {}", name, e),
    };

    for (name, title, series) in daily_series(aggregates) {
        if series.is_empty() {
            continue;
        }
        let path = options.dir.join(format!("{}.png", name));
        emit(name, line_chart(&path, title, &series, options.size), path);
    }

    for (name, title, bars, highlight) in bar_tables(aggregates, options.top_n) {
        if bars.is_empty() {
            continue;
        }
        let path = options.dir.join(format!("{}.png", name));
        emit(name, bar_chart(&path, title, &bars, highlight, options.size), path);
    }

    written
}

type Series = Vec<(NaiveDate, f64)>;
type Bars = Vec<(String, f64)>;

fn daily_series(aggregates: &Aggregates) -> Vec<(&'static str, &'static str, Series)> {
    vec![
        (
            "daily_orders",
            "Daily Orders Delivered",
            aggregates
                .daily_orders
                .iter()
                .map(|d| (d.order_approved_at, d.order_count as f64))
                .collect(),
        ),
        (
            "daily_spend",
            "Customer Spend Money",
            aggregates
                .sum_spend
                .iter()
                .map(|d| (d.order_approved_at, d.total_spend))
                .collect(),
        ),
    ]
}

fn bar_tables(
    aggregates: &Aggregates,
    top_n: usize,
) -> Vec<(&'static str, &'static str, Bars, Option<usize>)> {
    let categories = |items: Vec<crate::models::CategoryCount>| -> Bars {
        items
            .into_iter()
            .map(|c| (c.product_category_name_english, c.product_count as f64))
            .collect()
    };

    let scores = &aggregates.review_scores;
    let highlight_score = scores
        .most_common
        .and_then(|m| scores.entries.iter().position(|e| e.key == m));

    vec![
        (
            "top_categories",
            "Most sold products",
            categories(top_categories(&aggregates.sum_order_items, top_n)),
            Some(0),
        ),
        (
            "bottom_categories",
            "Fewest products sold",
            categories(bottom_categories(&aggregates.sum_order_items, top_n)),
            Some(0),
        ),
        (
            "review_scores",
            "Rating by customers for service",
            scores
                .entries
                .iter()
                .map(|e| (e.key.to_string(), e.count as f64))
                .collect(),
            highlight_score,
        ),
        (
            "customers_by_state",
            "Number of customers from State",
            aggregates
                .by_state
                .entries
                .iter()
                .map(|e| (e.key.clone(), e.count as f64))
                .collect(),
            None,
        ),
    ]
}

/// Y-axis ceiling with headroom; 1.0 for empty or all-zero data.
fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DataAnalyzer;
    use crate::models::OrderRecord;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn order(id: &str, approved: &str, score: u8, category: &str) -> OrderRecord {
        let ts = NaiveDateTime::parse_from_str(approved, "%Y-%m-%d %H:%M:%S").unwrap();
        OrderRecord {
            order_id: id.to_string(),
            customer_id: id.to_string(),
            customer_unique_id: None,
            order_status: "delivered".to_string(),
            order_purchase_timestamp: None,
            order_approved_at: Some(ts),
            order_delivered_carrier_date: None,
            order_delivered_customer_date: None,
            order_estimated_delivery_date: None,
            shipping_limit_date: None,
            payment_value: Some(12.5),
            product_id: Some(id.to_string()),
            product_category_name_english: Some(category.to_string()),
            review_score: Some(score),
            customer_state: "SP".to_string(),
        }
    }

    #[test]
    fn test_upper_bound() {
        assert_eq!(upper_bound(std::iter::empty::<f64>()), 1.0);
        assert_eq!(upper_bound([0.0, 0.0].into_iter()), 1.0);
        assert!((upper_bound([2.0, 10.0].into_iter()) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_chart_tables_follow_aggregates() {
        let orders = vec![
            order("a", "2018-01-01 10:00:00", 4, "toys"),
            order("b", "2018-01-03 10:00:00", 5, "toys"),
            order("c", "2018-01-03 11:00:00", 5, "books"),
        ];
        let aggregates = Aggregates::compute(&DataAnalyzer::new(&orders));

        let series = daily_series(&aggregates);
        assert_eq!(series[0].0, "daily_orders");
        let counts: Vec<f64> = series[0].2.iter().map(|(_, v)| *v).collect();
        assert_eq!(counts, vec![1.0, 0.0, 2.0]);

        let bars = bar_tables(&aggregates, 5);
        let (name, _, review, highlight) = &bars[2];
        assert_eq!(*name, "review_scores");
        assert_eq!(review[0], ("5".to_string(), 2.0));
        assert_eq!(*highlight, Some(0));

        let (_, _, bottom, _) = &bars[1];
        assert_eq!(bottom[0].0, "books");
    }

    #[test]
    fn test_render_dashboard_charts_writes_png_files() {
        let dir = TempDir::new().unwrap();
        let orders = vec![
            order("a", "2018-01-01 10:00:00", 4, "toys"),
            order("b", "2018-01-02 10:00:00", 5, "books"),
        ];
        let aggregates = Aggregates::compute(&DataAnalyzer::new(&orders));
        let options = ChartOptions {
            dir: dir.path().join("charts"),
            size: (320, 200),
            top_n: 3,
        };

        let written = render_dashboard_charts(&aggregates, &options);

        let names: Vec<&str> = written.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "daily_orders",
                "daily_spend",
                "top_categories",
                "bottom_categories",
                "review_scores",
                "customers_by_state",
            ]
        );
        for (name, path) in &written {
            assert_eq!(path, &options.dir.join(format!("{}.png", name)));
            let image = image::open(path).unwrap();
            assert_eq!((image.width(), image.height()), (320, 200));
        }
    }

    #[test]
    fn test_render_dashboard_charts_skips_unwritable_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"plain file").unwrap();

        let orders = vec![order("a", "2018-01-01 10:00:00", 4, "toys")];
        let aggregates = Aggregates::compute(&DataAnalyzer::new(&orders));
        let options = ChartOptions {
            dir: blocker.join("charts"),
            size: (320, 200),
            top_n: 3,
        };

        assert!(render_dashboard_charts(&aggregates, &options).is_empty());
    }

    #[test]
    fn test_line_chart_reports_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"plain file").unwrap();

        let day = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
        let result = line_chart(&blocker.join("chart.png"), "Orders", &[(day, 1.0)], (100, 80));
        assert!(result.is_err());
    }
}
