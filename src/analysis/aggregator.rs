//! Order aggregation.
//!
//! [`DataAnalyzer`] turns one date-filtered order table into the derived
//! tables shown on the dashboard. Every method is a fresh pass over the
//! borrowed rows; nothing is cached between calls.
//!
//! An empty table is not an error: each method returns an empty table and
//! no most-common value.

use crate::models::{CategoryCount, DailyOrders, DailySpend, Distribution, OrderRecord};
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Aggregation over a date-filtered order table.
pub struct DataAnalyzer<'a> {
    orders: &'a [OrderRecord],
}

/// Per-day accumulator used by the daily bucketing.
#[derive(Default)]
struct DayBucket<'a> {
    order_ids: HashSet<&'a str>,
    payment_total: f64,
}

impl<'a> DataAnalyzer<'a> {
    pub fn new(orders: &'a [OrderRecord]) -> Self {
        debug!("Creating analyzer over {} rows", orders.len());
        Self { orders }
    }

    /// Number of rows under analysis.
    pub fn row_count(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Distinct orders and revenue per approval day, gap-filled from the
    /// first to the last day present.
    pub fn daily_orders(&self) -> Vec<DailyOrders> {
        gap_filled(self.bucket_by_day())
            .into_iter()
            .map(|(day, bucket)| DailyOrders {
                order_approved_at: day,
                order_count: bucket.as_ref().map_or(0, |b| b.order_ids.len()),
                revenue: bucket.as_ref().map_or(0.0, |b| b.payment_total),
            })
            .collect()
    }

    /// Total payment value per approval day, gap-filled like [`Self::daily_orders`].
    pub fn sum_spend(&self) -> Vec<DailySpend> {
        gap_filled(self.bucket_by_day())
            .into_iter()
            .map(|(day, bucket)| DailySpend {
                order_approved_at: day,
                total_spend: bucket.map_or(0.0, |b| b.payment_total),
            })
            .collect()
    }

    /// Products sold per category, most sold first.
    pub fn sum_order_items(&self) -> Vec<CategoryCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();

        for order in self.orders {
            if let Some(ref category) = order.product_category_name_english {
                let count = counts.entry(category.as_str()).or_default();
                if order.product_id.is_some() {
                    *count += 1;
                }
            }
        }

        let mut items: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, product_count)| CategoryCount {
                product_category_name_english: category.to_string(),
                product_count,
            })
            .collect();

        items.sort_by(|a, b| {
            b.product_count
                .cmp(&a.product_count)
                .then_with(|| {
                    a.product_category_name_english
                        .cmp(&b.product_category_name_english)
                })
        });

        items
    }

    /// Occurrences of each review score.
    pub fn review_scores(&self) -> Distribution<u8> {
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for score in self.orders.iter().filter_map(|o| o.review_score) {
            *counts.entry(score).or_default() += 1;
        }
        Distribution::from_counts(counts)
    }

    /// Distinct customers per state.
    pub fn by_state(&self) -> Distribution<String> {
        let mut customers: HashMap<&str, HashSet<&str>> = HashMap::new();
        for order in self.orders {
            customers
                .entry(order.customer_state.as_str())
                .or_default()
                .insert(order.customer_id.as_str());
        }

        Distribution::from_counts(
            customers
                .into_iter()
                .map(|(state, ids)| (state.to_string(), ids.len()))
                .collect(),
        )
    }

    /// Occurrences of each order status.
    pub fn order_status(&self) -> Distribution<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for order in self.orders {
            *counts.entry(order.order_status.clone()).or_default() += 1;
        }
        Distribution::from_counts(counts)
    }

    fn bucket_by_day(&self) -> BTreeMap<NaiveDate, DayBucket<'a>> {
        let mut buckets: BTreeMap<NaiveDate, DayBucket<'a>> = BTreeMap::new();

        for order in self.orders {
            let Some(day) = order.approved_day() else {
                continue;
            };
            let bucket = buckets.entry(day).or_default();
            bucket.order_ids.insert(order.order_id.as_str());
            if let Some(value) = order.payment_value {
                bucket.payment_total += value;
            }
        }

        buckets
    }
}

/// Walk every calendar day between the first and last bucket, pairing each
/// with its bucket if one exists.
fn gap_filled<'a>(
    buckets: BTreeMap<NaiveDate, DayBucket<'a>>,
) -> Vec<(NaiveDate, Option<DayBucket<'a>>)> {
    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Vec::new();
    };

    let mut buckets = buckets;
    let mut days = Vec::new();
    let mut day = first;
    while day <= last {
        days.push((day, buckets.remove(&day)));
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}
