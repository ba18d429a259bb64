//! Headline statistics derived from the aggregated tables.

use crate::analysis::DataAnalyzer;
use crate::models::{
    CategoryCount, DailyOrders, DailySpend, DashboardSummary, Distribution,
};

/// All derived tables for one render pass.
pub struct Aggregates {
    pub daily_orders: Vec<DailyOrders>,
    pub sum_spend: Vec<DailySpend>,
    pub sum_order_items: Vec<CategoryCount>,
    pub review_scores: Distribution<u8>,
    pub by_state: Distribution<String>,
    pub order_status: Distribution<String>,
}

impl Aggregates {
    /// Run every aggregation once, in dashboard order.
    pub fn compute(analyzer: &DataAnalyzer<'_>) -> Self {
        Self {
            daily_orders: analyzer.daily_orders(),
            sum_spend: analyzer.sum_spend(),
            sum_order_items: analyzer.sum_order_items(),
            review_scores: analyzer.review_scores(),
            by_state: analyzer.by_state(),
            order_status: analyzer.order_status(),
        }
    }

    /// Headline numbers for the report.
    pub fn summary(&self) -> DashboardSummary {
        let total_spend: f64 = self.sum_spend.iter().map(|d| d.total_spend).sum();
        let total_items: usize = self.sum_order_items.iter().map(|c| c.product_count).sum();

        DashboardSummary {
            total_orders: self.daily_orders.iter().map(|d| d.order_count).sum(),
            total_revenue: self.daily_orders.iter().map(|d| d.revenue).sum(),
            total_spend,
            average_spend: mean(total_spend, self.sum_spend.len()),
            total_items,
            average_items: mean(total_items as f64, self.sum_order_items.len()),
            average_review_score: average_score(&self.review_scores),
            most_common_review_score: self.review_scores.most_common,
            most_common_state: self.by_state.most_common.clone(),
            most_common_status: self.order_status.most_common.clone(),
        }
    }
}

/// Best-selling `n` categories.
pub fn top_categories(items: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    items.iter().take(n).cloned().collect()
}

/// Worst-selling `n` categories, fewest first.
pub fn bottom_categories(items: &[CategoryCount], n: usize) -> Vec<CategoryCount> {
    let mut ascending = items.to_vec();
    ascending.sort_by(|a, b| {
        a.product_count
            .cmp(&b.product_count)
            .then_with(|| a.product_category_name_english.cmp(&b.product_category_name_english))
    });
    ascending.truncate(n);
    ascending
}

/// Mean review score weighted by occurrence.
pub fn average_score(scores: &Distribution<u8>) -> Option<f64> {
    let weighted: usize = scores.entries.iter().map(|e| e.key as usize * e.count).sum();
    mean(weighted as f64, scores.total())
}

fn mean(total: f64, n: usize) -> Option<f64> {
    if n == 0 {
        None
    } else {
        Some(total / n as f64)
    }
}
