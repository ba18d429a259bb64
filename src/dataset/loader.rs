//! CSV loading for the order and geolocation exports.
//!
//! Shape problems (missing columns, malformed values) are reported here,
//! before any record reaches the aggregation layer.

use crate::models::{DateRange, GeoRecord, OrderRecord};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Columns the order export must provide.
pub const ORDER_COLUMNS: &[&str] = &[
    "order_id",
    "customer_id",
    "order_status",
    "order_purchase_timestamp",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
    "shipping_limit_date",
    "payment_value",
    "product_id",
    "product_category_name_english",
    "review_score",
    "customer_state",
];

/// Columns the geolocation export must provide.
pub const GEO_COLUMNS: &[&str] = &["customer_unique_id", "geolocation_lat", "geolocation_lng"];

/// Errors raised while loading an input table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}, row {row}: {message}")]
    Parse {
        path: PathBuf,
        row: u64,
        message: String,
    },
}

/// Load the order export, dropping rows without an approval time and
/// sorting the rest by `order_approved_at`.
pub fn load_orders(path: &Path) -> Result<Vec<OrderRecord>, LoadError> {
    info!("Loading orders from: {}", path.display());

    let records: Vec<OrderRecord> = read_table(path, ORDER_COLUMNS)?;
    let total = records.len();

    let mut orders: Vec<OrderRecord> = records
        .into_iter()
        .filter(|r| r.order_approved_at.is_some())
        .collect();

    let dropped = total - orders.len();
    if dropped > 0 {
        warn!(
            "Dropped {} order rows without order_approved_at from {}",
            dropped,
            path.display()
        );
    }

    // Stable, so rows sharing a timestamp keep file order.
    orders.sort_by_key(|r| r.order_approved_at);

    info!("Loaded {} order rows", orders.len());
    Ok(orders)
}

/// Load the geolocation export, keeping the first row per customer.
pub fn load_locations(path: &Path) -> Result<Vec<GeoRecord>, LoadError> {
    info!("Loading geolocation from: {}", path.display());

    let records: Vec<GeoRecord> = read_table(path, GEO_COLUMNS)?;
    let total = records.len();
    let locations = dedup_locations(records);

    info!(
        "Loaded {} locations ({} duplicates removed)",
        locations.len(),
        total - locations.len()
    );
    Ok(locations)
}

/// Keep only the first record for each customer unique id.
pub fn dedup_locations(records: Vec<GeoRecord>) -> Vec<GeoRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.customer_unique_id.clone()))
        .collect()
}

/// Keep the orders approved on a calendar day within `range`.
pub fn filter_orders(orders: &[OrderRecord], range: &DateRange) -> Vec<OrderRecord> {
    let filtered: Vec<OrderRecord> = orders
        .iter()
        .filter(|r| r.approved_day().is_some_and(|d| range.contains(d)))
        .cloned()
        .collect();

    debug!(
        "Date range {} keeps {} of {} rows",
        range,
        filtered.len(),
        orders.len()
    );
    filtered
}

fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader.headers().map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        row: 1,
        message: e.to_string(),
    })?;

    let present: HashSet<&str> = headers.iter().collect();
    if let Some(missing) = required.iter().find(|c| !present.contains(**c)) {
        return Err(LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: missing.to_string(),
        });
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<T>().enumerate() {
        let row = result.map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            // Header is line 1.
            row: idx as u64 + 2,
            message: e.to_string(),
        })?;
        rows.push(row);
    }

    Ok(rows)
}
