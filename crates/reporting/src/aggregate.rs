//! Aggregation Engine — group-by over one dimension with sales, cost,
//! quantity, profit, and profit-margin summaries.

use rust_decimal::Decimal;
use sales_core::types::{
    AggregateRow, Dataset, Dimension, DimensionKey, MarginFormula, SalesFigures, TransactionRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    Sales,
    Profit,
    Quantity,
    Margin,
}

#[derive(Debug, Default)]
struct Accumulator {
    sales: Decimal,
    cost: Decimal,
    quantity: u64,
    lines: u64,
    overflowed: bool,
}

impl Accumulator {
    fn add(&mut self, record: &TransactionRecord) {
        self.quantity += u64::from(record.quantity);
        self.lines += 1;
        if self.overflowed {
            return;
        }
        let sums = record
            .line_sales()
            .and_then(|line| self.sales.checked_add(line))
            .zip(record.line_cost().and_then(|line| self.cost.checked_add(line)));
        match sums {
            Some((sales, cost)) => {
                self.sales = sales;
                self.cost = cost;
            }
            None => self.overflowed = true,
        }
    }

    fn finish(self, formula: MarginFormula) -> SalesFigures {
        if self.overflowed {
            return SalesFigures::overflow(self.quantity, self.lines);
        }
        SalesFigures::from_totals(self.sales, self.cost, self.quantity, self.lines, formula)
    }
}

/// Group `dataset` by `dimension`. Rows come out in order of first appearance.
pub fn aggregate(dataset: &Dataset, dimension: Dimension, formula: MarginFormula) -> Vec<AggregateRow> {
    let mut index: HashMap<DimensionKey, usize> = HashMap::new();
    let mut groups: Vec<(DimensionKey, Accumulator)> = Vec::new();

    for record in dataset {
        let key = dimension.key_of(record);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, Accumulator::default()));
                groups.len() - 1
            }
        };
        groups[slot].1.add(record);
    }

    groups
        .into_iter()
        .map(|(key, acc)| AggregateRow {
            key,
            figures: acc.finish(formula),
        })
        .collect()
}

/// Totals over the whole dataset.
pub fn summarize(dataset: &Dataset, formula: MarginFormula) -> SalesFigures {
    let mut acc = Accumulator::default();
    for record in dataset {
        acc.add(record);
    }
    acc.finish(formula)
}

/// The `n` most frequent values of `dimension` by row count. Ties keep
/// first-appearance order; `n` larger than the distinct count returns them all.
pub fn top_n_by_frequency(dataset: &Dataset, dimension: Dimension, n: usize) -> Vec<DimensionKey> {
    let mut index: HashMap<DimensionKey, usize> = HashMap::new();
    let mut counts: Vec<(DimensionKey, u64)> = Vec::new();

    for record in dataset {
        let key = dimension.key_of(record);
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(n).map(|(key, _)| key).collect()
}

/// Descending by `by`, stable, optionally truncated. Undefined margins sort last.
pub fn rank(mut rows: Vec<AggregateRow>, by: RankBy, limit: Option<usize>) -> Vec<AggregateRow> {
    match by {
        RankBy::Sales => rows.sort_by(|a, b| b.figures.total_sales.cmp(&a.figures.total_sales)),
        RankBy::Profit => rows.sort_by(|a, b| b.figures.profit.cmp(&a.figures.profit)),
        RankBy::Quantity => rows.sort_by(|a, b| b.figures.total_quantity.cmp(&a.figures.total_quantity)),
        RankBy::Margin => rows.sort_by(|a, b| b.figures.profit_margin.cmp(&a.figures.profit_margin)),
    }
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

/// Ascending by key; chronological for time buckets.
pub fn order_by_key(mut rows: Vec<AggregateRow>) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    rows
}
