//! Markdown report generation.
//!
//! This module renders the dashboard for one date range as a Markdown
//! document (text, tables and links to the chart images) or as JSON.

use crate::models::{
    CategoryCount, Dashboard, DashboardMetadata, DashboardSummary, Distribution, MapStatus,
};
use anyhow::Result;
use std::fmt::Display;

const EMPTY_NOTICE: &str = "_No orders in the selected date range._\n\n";
const MAP_EXPLANATION: &str =
    "The area with the highest number of customers is located in the southern region.";

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# E-Commerce Public Data Analysis\n\n");
    output.push_str("**This is a dashboard for analyzing E-Commerce public data.**\n\n");

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_daily_orders_section(dashboard));
    output.push_str(&generate_spend_section(dashboard));
    output.push_str(&generate_order_items_section(dashboard));
    output.push_str(&generate_review_section(dashboard));
    output.push_str(&generate_demographic_section(dashboard));
    output.push_str(&generate_status_section(dashboard));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Orders File:** `{}`\n", metadata.orders_file));
    section.push_str(&format!(
        "- **Geolocation File:** `{}`\n",
        metadata.geolocation_file
    ));
    match metadata.date_range {
        Some(ref range) => section.push_str(&format!("- **Date Range:** {}\n", range)),
        None => section.push_str("- **Date Range:** n/a\n"),
    }
    section.push_str(&format!(
        "- **Rows in Range:** {} of {}\n",
        metadata.rows_in_range, metadata.rows_loaded
    ));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_daily_orders_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();
    let summary = &dashboard.summary;

    section.push_str("## Daily Orders Delivered\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
        return section;
    }

    section.push_str(&format!("- **Total Order:** {}\n", summary.total_orders));
    section.push_str(&format!(
        "- **Total Revenue:** {:.2}\n\n",
        summary.total_revenue
    ));
    section.push_str(&chart_link(dashboard, "daily_orders", "Daily orders"));

    section.push_str("| Day | Orders | Revenue |\n");
    section.push_str("|:---|---:|---:|\n");
    for day in &dashboard.daily_orders {
        section.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            day.order_approved_at, day.order_count, day.revenue
        ));
    }
    section.push('\n');

    section
}

fn generate_spend_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();
    let summary = &dashboard.summary;

    section.push_str("## Customer Spend Money\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
        return section;
    }

    section.push_str(&format!("- **Total Spend:** {:.2}\n", summary.total_spend));
    section.push_str(&format!(
        "- **Average Spend:** {}\n\n",
        fmt_optional(summary.average_spend, 2)
    ));
    section.push_str(&chart_link(dashboard, "daily_spend", "Daily spend"));

    section
}

fn generate_order_items_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();
    let summary = &dashboard.summary;

    section.push_str("## Order Items\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
        return section;
    }

    section.push_str(&format!("- **Total Items:** {}\n", summary.total_items));
    section.push_str(&format!(
        "- **Average Items:** {}\n\n",
        fmt_optional(summary.average_items, 2)
    ));

    section.push_str("### Most sold products\n\n");
    section.push_str(&chart_link(dashboard, "top_categories", "Most sold products"));
    section.push_str(&category_table(&dashboard.top_categories));

    section.push_str("### Fewest products sold\n\n");
    section.push_str(&chart_link(
        dashboard,
        "bottom_categories",
        "Fewest products sold",
    ));
    section.push_str(&category_table(&dashboard.bottom_categories));

    section
}

fn generate_review_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();
    let summary = &dashboard.summary;

    section.push_str("## Review Score\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
        return section;
    }

    section.push_str(&format!(
        "- **Average Review Score:** {}\n",
        fmt_optional(summary.average_review_score, 2)
    ));
    section.push_str(&format!(
        "- **Most Common Review Score:** {}\n\n",
        fmt_key(summary.most_common_review_score.as_ref())
    ));
    section.push_str(&chart_link(
        dashboard,
        "review_scores",
        "Rating by customers for service",
    ));
    section.push_str(&distribution_table("Rating", &dashboard.review_scores));

    section
}

fn generate_demographic_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Customer Demographic\n\n");

    section.push_str("### State\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
    } else {
        section.push_str(&format!(
            "- **Most Common State:** {}\n\n",
            fmt_key(dashboard.summary.most_common_state.as_ref())
        ));
        section.push_str(&chart_link(
            dashboard,
            "customers_by_state",
            "Number of customers from State",
        ));
        section.push_str(&distribution_table("State", &dashboard.by_state));
    }

    section.push_str("### Geolocation\n\n");
    section.push_str(&generate_map_block(&dashboard.map));

    section
}

/// Map image, or a placeholder when the overlay could not be drawn.
fn generate_map_block(map: &MapStatus) -> String {
    match map {
        MapStatus::Rendered { path, points } => format!(
            "![Customer locations]({})\n\n*{} customer locations.*\n\n\
             <details>\n<summary>See Explanation</summary>\n\n{}\n</details>\n\n",
            path, points, MAP_EXPLANATION
        ),
        MapStatus::Unavailable { reason } => {
            format!("> ⚠️ **Map unavailable:** {}\n\n", reason)
        }
        MapStatus::Skipped => "_Map disabled._\n\n".to_string(),
    }
}

fn generate_status_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Order Status\n\n");
    if dashboard.is_empty() {
        section.push_str(EMPTY_NOTICE);
        return section;
    }

    section.push_str(&format!(
        "- **Most Common Status:** {}\n\n",
        fmt_key(dashboard.summary.most_common_status.as_ref())
    ));
    section.push_str(&distribution_table("Status", &dashboard.order_status));

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by ecomdash*\n".to_string()
}

fn chart_link(dashboard: &Dashboard, name: &str, alt: &str) -> String {
    dashboard
        .charts
        .iter()
        .find(|(chart, _)| chart == name)
        .map(|(_, path)| format!("![{}]({})\n\n", alt, path))
        .unwrap_or_default()
}

fn category_table(items: &[CategoryCount]) -> String {
    let mut table = String::new();
    table.push_str("| Category | Number of Sales |\n");
    table.push_str("|:---|---:|\n");
    for item in items {
        table.push_str(&format!(
            "| {} | {} |\n",
            item.product_category_name_english, item.product_count
        ));
    }
    table.push('\n');
    table
}

fn distribution_table<K: Display>(label: &str, dist: &Distribution<K>) -> String {
    let mut table = String::new();
    table.push_str(&format!("| {} | Count |\n", label));
    table.push_str("|:---|---:|\n");
    for entry in &dist.entries {
        table.push_str(&format!("| {} | {} |\n", entry.key, entry.count));
    }
    table.push('\n');
    table
}

fn fmt_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn fmt_key<K: Display>(value: Option<&K>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// One-line summary for console output.
pub fn summary_line(summary: &DashboardSummary) -> String {
    format!(
        "{} orders | revenue {:.2} | avg review {} | top state {}",
        summary.total_orders,
        summary.total_revenue,
        fmt_optional(summary.average_review_score, 2),
        fmt_key(summary.most_common_state.as_ref())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CountEntry, DailyOrders, DateRange};
    use chrono::{NaiveDate, Utc};

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn create_test_dashboard() -> Dashboard {
        let metadata = DashboardMetadata {
            orders_file: "df_ecommerce.csv".to_string(),
            geolocation_file: "geolocation.csv".to_string(),
            date_range: Some(DateRange::new(day("2018-01-01"), day("2018-01-03"))),
            rows_loaded: 10,
            rows_in_range: 3,
            generated_at: Utc::now(),
            duration_seconds: 1.5,
        };

        Dashboard {
            metadata,
            summary: DashboardSummary {
                total_orders: 3,
                total_revenue: 35.0,
                total_spend: 35.0,
                average_spend: Some(35.0 / 3.0),
                total_items: 3,
                average_items: Some(1.5),
                average_review_score: Some(4.0),
                most_common_review_score: Some(5),
                most_common_state: Some("SP".to_string()),
                most_common_status: Some("delivered".to_string()),
            },
            daily_orders: vec![DailyOrders {
                order_approved_at: day("2018-01-01"),
                order_count: 2,
                revenue: 30.0,
            }],
            sum_spend: Vec::new(),
            sum_order_items: Vec::new(),
            top_categories: vec![CategoryCount {
                product_category_name_english: "bed_bath_table".to_string(),
                product_count: 2,
            }],
            bottom_categories: vec![CategoryCount {
                product_category_name_english: "books".to_string(),
                product_count: 1,
            }],
            review_scores: Distribution {
                entries: vec![CountEntry { key: 5, count: 2 }],
                most_common: Some(5),
            },
            by_state: Distribution {
                entries: vec![CountEntry {
                    key: "SP".to_string(),
                    count: 2,
                }],
                most_common: Some("SP".to_string()),
            },
            order_status: Distribution {
                entries: vec![CountEntry {
                    key: "delivered".to_string(),
                    count: 3,
                }],
                most_common: Some("delivered".to_string()),
            },
            map: MapStatus::Rendered {
                path: "charts/customer_map.png".to_string(),
                points: 2,
            },
            charts: vec![(
                "daily_orders".to_string(),
                "charts/daily_orders.png".to_string(),
            )],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let dashboard = create_test_dashboard();
        let markdown = generate_markdown_report(&dashboard);

        assert!(markdown.contains("# E-Commerce Public Data Analysis"));
        assert!(markdown.contains("## Daily Orders Delivered"));
        assert!(markdown.contains("**Total Order:** 3"));
        assert!(markdown.contains("**Total Revenue:** 35.00"));
        assert!(markdown.contains("| 2018-01-01 | 2 | 30.00 |"));
        assert!(markdown.contains("![Daily orders](charts/daily_orders.png)"));
        assert!(markdown.contains("| bed_bath_table | 2 |"));
        assert!(markdown.contains("**Most Common State:** SP"));
        assert!(markdown.contains("![Customer locations](charts/customer_map.png)"));
        assert!(!markdown.contains(EMPTY_NOTICE));
    }

    #[test]
    fn test_generate_metadata_section() {
        let dashboard = create_test_dashboard();
        let section = generate_metadata_section(&dashboard.metadata);

        assert!(section.contains("df_ecommerce.csv"));
        assert!(section.contains("2018-01-01 to 2018-01-03"));
        assert!(section.contains("3 of 10"));
    }

    #[test]
    fn test_empty_range_renders_notice() {
        let mut dashboard = create_test_dashboard();
        dashboard.metadata.rows_in_range = 0;

        let markdown = generate_markdown_report(&dashboard);
        assert!(markdown.contains(EMPTY_NOTICE));
        assert!(!markdown.contains("**Total Order:**"));
    }

    #[test]
    fn test_map_placeholder_on_failure() {
        let block = generate_map_block(&MapStatus::Unavailable {
            reason: "request timed out".to_string(),
        });
        assert!(block.contains("Map unavailable"));
        assert!(block.contains("request timed out"));

        assert!(generate_map_block(&MapStatus::Skipped).contains("disabled"));
    }

    #[test]
    fn test_generate_json_report() {
        let dashboard = create_test_dashboard();
        let json = generate_json_report(&dashboard).unwrap();

        assert!(json.contains("\"daily_orders\""));
        assert!(json.contains("\"most_common\""));
        assert!(json.contains("\"status\": \"rendered\""));
    }

    #[test]
    fn test_summary_line() {
        let dashboard = create_test_dashboard();
        let line = summary_line(&dashboard.summary);
        assert_eq!(line, "3 orders | revenue 35.00 | avg review 4.00 | top state SP");
    }
}
