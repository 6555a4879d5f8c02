//! CSV order-table loader.
//!
//! Expected CSV columns (extra columns are ignored):
//!   orderDate, categoryName, storeName, brandName, productName,
//!   sellingPrice, costPrice, quantity, and optionally sku.
//!
//! Malformed rows are rejected one by one and counted; only an unreadable
//! header, missing columns, or a file without a single valid row fails the load.

use crate::parse::{parse_money, parse_order_date, parse_quantity};
use chrono::{DateTime, Utc};
use sales_core::config::IngestConfig;
use sales_core::fingerprint::sha256_hex;
use sales_core::types::{Dataset, TransactionRecord};
use sales_core::{SalesError, SalesResult};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "orderDate",
    "categoryName",
    "storeName",
    "brandName",
    "sellingPrice",
    "costPrice",
    "quantity",
    "productName",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "orderDate")]
    order_date: String,
    #[serde(rename = "categoryName")]
    category_name: String,
    #[serde(rename = "storeName")]
    store_name: String,
    #[serde(rename = "brandName")]
    brand_name: String,
    #[serde(rename = "productName")]
    product_name: String,
    #[serde(rename = "sellingPrice")]
    selling_price: String,
    #[serde(rename = "costPrice")]
    cost_price: String,
    quantity: String,
    #[serde(default)]
    sku: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<TransactionRecord, String> {
        let record = TransactionRecord {
            order_date: parse_order_date(&self.order_date)?,
            selling_price: parse_money("sellingPrice", &self.selling_price)?,
            cost_price: parse_money("costPrice", &self.cost_price)?,
            quantity: parse_quantity(&self.quantity)?,
            category_name: self.category_name,
            store_name: self.store_name,
            brand_name: self.brand_name,
            product_name: self.product_name,
            sku: self.sku.filter(|s| !s.is_empty()),
        };
        if record.line_sales().is_none() {
            return Err("sellingPrice × quantity exceeds the representable range".to_string());
        }
        if record.line_cost().is_none() {
            return Err("costPrice × quantity exceeds the representable range".to_string());
        }
        Ok(record)
    }
}

/// A row that was skipped, with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub line: u64,
    pub reason: String,
}

/// Result of one upload.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub id: Uuid,
    pub name: String,
    /// SHA-256 of the raw file bytes.
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub dataset: Dataset,
    pub rows_read: usize,
    pub rejected_count: usize,
    /// At most `max_rejection_samples` entries.
    pub rejections: Vec<RowRejection>,
}

/// Load an order table from any reader.
pub fn load_csv<R: Read>(name: &str, mut reader: R, config: &IngestConfig) -> SalesResult<LoadedDataset> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| SalesError::Load(format!("failed to read '{name}': {e}")))?;
    load_csv_bytes(name, &bytes, config)
}

/// Load an order table from a file path.
pub fn load_csv_file(path: impl AsRef<Path>, config: &IngestConfig) -> SalesResult<LoadedDataset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| SalesError::Load(format!("failed to open '{}': {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    load_csv_bytes(&name, &bytes, config)
}

/// Load an order table from an uploaded buffer.
pub fn load_csv_bytes(name: &str, bytes: &[u8], config: &IngestConfig) -> SalesResult<LoadedDataset> {
    let delimiter = config.delimiter_byte().ok_or_else(|| {
        SalesError::Config(format!("delimiter {:?} is not a single ASCII character", config.delimiter))
    })?;
    let fingerprint = sha256_hex(bytes);
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = reader
        .headers()
        .map_err(|e| SalesError::Load(format!("failed to read CSV headers: {e}")))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(SalesError::Load(format!("'{name}' is empty")));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SalesError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    let mut rejections = Vec::new();
    let mut rejected_count = 0usize;
    let mut rows_read = 0usize;

    for result in reader.records() {
        rows_read += 1;
        let outcome = result
            .map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                (line, format!("malformed CSV record: {e}"))
            })
            .and_then(|row| {
                let line = row.position().map(|p| p.line()).unwrap_or(0);
                row.deserialize::<RawRow>(Some(&headers))
                    .map_err(|e| e.to_string())
                    .and_then(RawRow::into_record)
                    .map_err(|reason| (line, reason))
            });

        match outcome {
            Ok(record) => records.push(record),
            Err((line, reason)) => {
                warn!(file = %name, line, reason = %reason, "Skipping malformed row");
                rejected_count += 1;
                if rejections.len() < config.max_rejection_samples {
                    rejections.push(RowRejection { line, reason });
                }
            }
        }
    }

    metrics::counter!("ingest.rows_loaded").increment(records.len() as u64);
    metrics::counter!("ingest.rows_rejected").increment(rejected_count as u64);

    if records.is_empty() {
        return Err(SalesError::Load(format!(
            "'{name}' contains no valid rows ({rejected_count} rejected)"
        )));
    }

    let loaded = LoadedDataset {
        id: Uuid::new_v4(),
        name: name.to_string(),
        fingerprint,
        loaded_at: Utc::now(),
        dataset: Dataset::new(records),
        rows_read,
        rejected_count,
        rejections,
    };

    info!(
        file = %loaded.name,
        dataset_id = %loaded.id,
        rows = loaded.dataset.len(),
        rejected = loaded.rejected_count,
        "Order table loaded"
    );

    Ok(loaded)
}
