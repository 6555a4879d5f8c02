//! Filter Engine — narrows a dataset by date range and dimension membership.

use chrono::{DateTime, Utc};
use sales_core::types::{validate_range, Dataset, FilterCriteria, TransactionRecord};
use sales_core::SalesResult;
use tracing::debug;

/// Records inside `criteria`'s inclusive date range that pass every
/// dimension membership test, in their original order.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> SalesResult<Dataset> {
    let (start, end) = criteria.date_range()?;
    let filtered: Dataset = dataset
        .iter()
        .filter(|r| within(r, start, end) && criteria.matches_dimensions(r))
        .cloned()
        .collect();

    debug!(
        input = dataset.len(),
        output = filtered.len(),
        dimensions = criteria.allowed.len(),
        "Filtered dataset"
    );
    Ok(filtered)
}

/// Date predicate only; dimension selections are ignored.
pub fn filter_by_date(
    dataset: &Dataset,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> SalesResult<Dataset> {
    let (start, end) = validate_range(start, end)?;
    let filtered: Dataset = dataset
        .iter()
        .filter(|r| within(r, start, end))
        .cloned()
        .collect();

    debug!(input = dataset.len(), output = filtered.len(), "Filtered dataset by date");
    Ok(filtered)
}

fn within(record: &TransactionRecord, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    record.order_date >= start && record.order_date <= end
}
