//! Fixtures shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sales_core::types::{Dataset, TransactionRecord};

pub(crate) fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub(crate) fn record(date: DateTime<Utc>, category: &str, sell: i64, cost: i64, qty: u32) -> TransactionRecord {
    TransactionRecord {
        order_date: date,
        category_name: category.into(),
        store_name: "North".into(),
        brand_name: "Acme".into(),
        product_name: format!("{category}-item"),
        sku: None,
        selling_price: Decimal::from(sell),
        cost_price: Decimal::from(cost),
        quantity: qty,
    }
}

/// A: 10/6 x2 on Jan 1, A: 10/6 x1 on Jan 2, B: 5/5 x4 on Jan 3.
pub(crate) fn scenario_dataset() -> Dataset {
    Dataset::new(vec![
        record(day(2024, 1, 1), "A", 10, 6, 2),
        record(day(2024, 1, 2), "A", 10, 6, 1),
        record(day(2024, 1, 3), "B", 5, 5, 4),
    ])
}
