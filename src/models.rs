//! Data models for the dashboard.
//!
//! This module contains the input records, the derived tables produced by
//! the aggregation layer, and the dashboard document consumed by the
//! report generator.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// One row of the pre-joined order export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub customer_unique_id: Option<String>,
    pub order_status: String,
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub order_purchase_timestamp: Option<NaiveDateTime>,
    /// Approval time. Guaranteed `Some` for every record returned by the loader.
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub order_approved_at: Option<NaiveDateTime>,
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub order_delivered_carrier_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub order_delivered_customer_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub order_estimated_delivery_date: Option<NaiveDateTime>,
    #[serde(deserialize_with = "crate::dataset::de::optional_timestamp")]
    pub shipping_limit_date: Option<NaiveDateTime>,
    pub payment_value: Option<f64>,
    pub product_id: Option<String>,
    pub product_category_name_english: Option<String>,
    #[serde(deserialize_with = "crate::dataset::de::optional_score")]
    pub review_score: Option<u8>,
    pub customer_state: String,
}

impl OrderRecord {
    /// Calendar day the order was approved.
    pub fn approved_day(&self) -> Option<NaiveDate> {
        self.order_approved_at.map(|ts| ts.date())
    }
}

/// One customer location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub customer_unique_id: String,
    #[serde(rename = "geolocation_lng")]
    pub longitude: f64,
    #[serde(rename = "geolocation_lat")]
    pub latitude: f64,
}

/// Inclusive calendar-day range used to scope a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `day` lies within the range (both ends inclusive).
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    /// Range covering the first to the last approval day in `orders`.
    ///
    /// Returns `None` when no record carries an approval time.
    pub fn span(orders: &[OrderRecord]) -> Option<Self> {
        let mut days = orders.iter().filter_map(OrderRecord::approved_day);
        let first = days.next()?;
        let (start, end) = days.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    /// Number of days in the range.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Order volume and revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOrders {
    pub order_approved_at: NaiveDate,
    pub order_count: usize,
    pub revenue: f64,
}

/// Total spend for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    pub order_approved_at: NaiveDate,
    pub total_spend: f64,
}

/// Number of products sold in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub product_category_name_english: String,
    pub product_count: usize,
}

/// One key of a [`Distribution`] with its count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry<K> {
    pub key: K,
    pub count: usize,
}

/// Value counts sorted descending by count, ties by key ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution<K> {
    pub entries: Vec<CountEntry<K>>,
    /// Key of the first entry, i.e. the maximum count.
    pub most_common: Option<K>,
}

impl<K: Ord + Clone + Hash> Distribution<K> {
    /// Build a sorted distribution from raw counts.
    pub fn from_counts(counts: HashMap<K, usize>) -> Self {
        let mut entries: Vec<CountEntry<K>> = counts
            .into_iter()
            .map(|(key, count)| CountEntry { key, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        let most_common = entries.first().map(|e| e.key.clone());
        Self {
            entries,
            most_common,
        }
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count recorded for `key`, zero if absent.
    #[cfg(test)]
    pub fn count_of(&self, key: &K) -> usize {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

/// Headline numbers shown above each dashboard chart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub total_spend: f64,
    pub average_spend: Option<f64>,
    pub total_items: usize,
    pub average_items: Option<f64>,
    pub average_review_score: Option<f64>,
    pub most_common_review_score: Option<u8>,
    pub most_common_state: Option<String>,
    pub most_common_status: Option<String>,
}

/// Outcome of the geolocation overlay for this render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MapStatus {
    /// Overlay written to `path` with `points` customer locations.
    Rendered { path: String, points: usize },
    /// Overlay could not be produced; `reason` is shown in its place.
    Unavailable { reason: String },
    /// Overlay disabled by configuration.
    Skipped,
}

/// Metadata about the render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetadata {
    pub orders_file: String,
    pub geolocation_file: String,
    pub date_range: Option<DateRange>,
    pub rows_loaded: usize,
    pub rows_in_range: usize,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

/// Everything the report generator needs for one render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub summary: DashboardSummary,
    pub daily_orders: Vec<DailyOrders>,
    pub sum_spend: Vec<DailySpend>,
    pub sum_order_items: Vec<CategoryCount>,
    pub top_categories: Vec<CategoryCount>,
    pub bottom_categories: Vec<CategoryCount>,
    pub review_scores: Distribution<u8>,
    pub by_state: Distribution<String>,
    pub order_status: Distribution<String>,
    pub map: MapStatus,
    /// Chart image paths keyed by chart name.
    #[serde(default)]
    pub charts: Vec<(String, String)>,
}

impl Dashboard {
    /// True when the selected range contains no orders.
    pub fn is_empty(&self) -> bool {
        self.metadata.rows_in_range == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_distribution_sorting_and_tie_break() {
        let counts: HashMap<u8, usize> = [(5, 3), (4, 1), (3, 1), (2, 1)].into_iter().collect();
        let dist = Distribution::from_counts(counts);

        let keys: Vec<u8> = dist.entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![5, 2, 3, 4]);
        assert_eq!(dist.most_common, Some(5));
        assert_eq!(dist.total(), 6);
        assert_eq!(dist.count_of(&4), 1);
        assert_eq!(dist.count_of(&1), 0);
    }

    #[test]
    fn test_distribution_empty() {
        let dist: Distribution<String> = Distribution::from_counts(HashMap::new());
        assert!(dist.is_empty());
        assert_eq!(dist.most_common, None);
        assert_eq!(dist.total(), 0);
    }

    #[test]
    fn test_date_range_contains_is_inclusive() {
        let range = DateRange::new(day("2018-01-01"), day("2018-01-03"));
        assert!(range.contains(day("2018-01-01")));
        assert!(range.contains(day("2018-01-03")));
        assert!(!range.contains(day("2017-12-31")));
        assert!(!range.contains(day("2018-01-04")));
        assert_eq!(range.len_days(), 3);
        assert_eq!(range.to_string(), "2018-01-01 to 2018-01-03");
    }

    #[test]
    fn test_map_status_serializes_with_tag() {
        let json = serde_json::to_string(&MapStatus::Unavailable {
            reason: "timeout".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"unavailable\""));
        assert!(json.contains("timeout"));
    }
}
