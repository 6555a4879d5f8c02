//! Domain types shared by ingestion, filtering, aggregation, and the session layer.

use crate::error::{SalesError, SalesResult};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

// ─── Transactions ───────────────────────────────────────────────────────────

/// One order line of the uploaded table.
///
/// `order_date` is already UTC: timezone handling happens once, at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub order_date: DateTime<Utc>,
    pub category_name: String,
    pub store_name: String,
    pub brand_name: String,
    pub product_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Per-unit selling price.
    pub selling_price: Decimal,
    /// Per-unit cost price.
    pub cost_price: Decimal,
    pub quantity: u32,
}

impl TransactionRecord {
    /// `selling_price × quantity`, `None` on overflow.
    pub fn line_sales(&self) -> Option<Decimal> {
        self.selling_price.checked_mul(Decimal::from(self.quantity))
    }

    /// `cost_price × quantity`, `None` on overflow.
    pub fn line_cost(&self) -> Option<Decimal> {
        self.cost_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Ordered, in-memory collection of transaction records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    records: Vec<TransactionRecord>,
}

impl Dataset {
    pub fn new(records: Vec<TransactionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest order date, used to seed the date pickers.
    pub fn date_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut dates = self.records.iter().map(|r| r.order_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(min, max), d| (min.min(d), max.max(d))))
    }

    /// Distinct values of `dimension`, in order of first appearance.
    pub fn distinct(&self, dimension: Dimension) -> Vec<DimensionKey> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| dimension.key_of(r))
            .filter(|k| seen.insert(k.clone()))
            .collect()
    }
}

impl FromIterator<TransactionRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = TransactionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a TransactionRecord;
    type IntoIter = std::slice::Iter<'a, TransactionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ─── Dimensions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Brand,
    Store,
    Product,
    /// Hour of day, 0-23.
    Hour,
    /// Calendar day (UTC).
    Day,
    /// ISO week.
    Week,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::Category,
        Dimension::Brand,
        Dimension::Store,
        Dimension::Product,
        Dimension::Hour,
        Dimension::Day,
        Dimension::Week,
    ];

    pub fn key_of(&self, record: &TransactionRecord) -> DimensionKey {
        match self {
            Dimension::Category => DimensionKey::Label(record.category_name.clone()),
            Dimension::Brand => DimensionKey::Label(record.brand_name.clone()),
            Dimension::Store => DimensionKey::Label(record.store_name.clone()),
            Dimension::Product => DimensionKey::Label(record.product_name.clone()),
            Dimension::Hour => DimensionKey::Hour(record.order_date.hour()),
            Dimension::Day => DimensionKey::Day(record.order_date.date_naive()),
            Dimension::Week => {
                let iso = record.order_date.iso_week();
                DimensionKey::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Category => "category",
            Dimension::Brand => "brand",
            Dimension::Store => "store",
            Dimension::Product => "product",
            Dimension::Hour => "hour",
            Dimension::Day => "day",
            Dimension::Week => "week",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Group-by key extracted from a record for one [`Dimension`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKey {
    Label(String),
    Hour(u32),
    Day(NaiveDate),
    Week { year: i32, week: u32 },
}

impl DimensionKey {
    pub fn as_label(&self) -> Option<&str> {
        match self {
            DimensionKey::Label(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for DimensionKey {
    fn from(value: &str) -> Self {
        DimensionKey::Label(value.to_string())
    }
}

impl From<String> for DimensionKey {
    fn from(value: String) -> Self {
        DimensionKey::Label(value)
    }
}

impl From<&String> for DimensionKey {
    fn from(value: &String) -> Self {
        DimensionKey::Label(value.clone())
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionKey::Label(s) => f.write_str(s),
            DimensionKey::Hour(h) => write!(f, "{h:02}:00"),
            DimensionKey::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DimensionKey::Week { year, week } => write!(f, "{year}-W{week:02}"),
        }
    }
}

// ─── Filter criteria ────────────────────────────────────────────────────────

/// Date bounds (inclusive, both required) plus allowed values per dimension.
///
/// A dimension absent from `allowed` is unconstrained. A dimension present
/// with an empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub allowed: BTreeMap<Dimension, BTreeSet<DimensionKey>>,
}

impl FilterCriteria {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            allowed: BTreeMap::new(),
        }
    }

    /// Inclusive calendar days: from 00:00 UTC on `start` through the last
    /// instant of `end`.
    pub fn for_days(start: NaiveDate, end: NaiveDate) -> Self {
        Self::between(start_of_day(start), end_of_day(end))
    }

    pub fn allow<I, K>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<DimensionKey>,
    {
        self.allowed
            .insert(dimension, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn allowed_values(&self, dimension: Dimension) -> Option<&BTreeSet<DimensionKey>> {
        self.allowed.get(&dimension)
    }

    /// Validated bounds. Missing or inverted bounds are an `InvalidRange`.
    pub fn date_range(&self) -> SalesResult<(DateTime<Utc>, DateTime<Utc>)> {
        validate_range(self.start, self.end)
    }

    pub fn matches_dimensions(&self, record: &TransactionRecord) -> bool {
        self.allowed
            .iter()
            .all(|(dimension, values)| values.contains(&dimension.key_of(record)))
    }
}

pub fn validate_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> SalesResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start.ok_or_else(|| SalesError::InvalidRange("start date is missing".into()))?;
    let end = end.ok_or_else(|| SalesError::InvalidRange("end date is missing".into()))?;
    if start > end {
        return Err(SalesError::InvalidRange(format!(
            "start {} is after end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok((start, end))
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    match day.succ_opt() {
        Some(next) => start_of_day(next) - Duration::nanoseconds(1),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

// ─── Metrics ────────────────────────────────────────────────────────────────

/// Denominator used for profit margin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginFormula {
    /// profit / total_sales × 100
    #[default]
    OnSales,
    /// profit / (total_sales + total_cost) × 100
    OnSalesAndCost,
}

impl MarginFormula {
    /// `None` when the denominator itself overflows.
    pub fn denominator(&self, total_sales: Decimal, total_cost: Decimal) -> Option<Decimal> {
        match self {
            MarginFormula::OnSales => Some(total_sales),
            MarginFormula::OnSalesAndCost => total_sales.checked_add(total_cost),
        }
    }

    /// `Ok(None)` when the denominator is zero. Overflow is an error, never a
    /// silent `None`.
    pub fn margin(
        &self,
        profit: Decimal,
        total_sales: Decimal,
        total_cost: Decimal,
    ) -> Result<Option<Decimal>, ArithmeticOverflow> {
        let denominator = self
            .denominator(total_sales, total_cost)
            .ok_or(ArithmeticOverflow)?;
        if denominator.is_zero() {
            return Ok(None);
        }
        profit
            .checked_div(denominator)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(Some)
            .ok_or(ArithmeticOverflow)
    }
}

/// A money total or ratio left the range `Decimal` can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOverflow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFigures {
    pub total_sales: Decimal,
    pub total_cost: Decimal,
    pub total_quantity: u64,
    /// Number of order lines that fed these totals.
    pub line_count: u64,
    pub profit: Decimal,
    /// Percentage; `None` when undefined.
    pub profit_margin: Option<Decimal>,
    /// Money totals exceeded the `Decimal` range. Totals, profit and margin
    /// are zeroed and must not be displayed as numbers.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overflowed: bool,
}

impl SalesFigures {
    pub fn from_totals(
        total_sales: Decimal,
        total_cost: Decimal,
        total_quantity: u64,
        line_count: u64,
        formula: MarginFormula,
    ) -> Self {
        let Some(profit) = total_sales.checked_sub(total_cost) else {
            return Self::overflow(total_quantity, line_count);
        };
        match formula.margin(profit, total_sales, total_cost) {
            Ok(profit_margin) => Self {
                total_sales,
                total_cost,
                total_quantity,
                line_count,
                profit,
                profit_margin,
                overflowed: false,
            },
            Err(ArithmeticOverflow) => Self::overflow(total_quantity, line_count),
        }
    }

    /// Figures for a group whose money totals could not be represented.
    pub fn overflow(total_quantity: u64, line_count: u64) -> Self {
        Self {
            total_sales: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_quantity,
            line_count,
            profit: Decimal::ZERO,
            profit_margin: None,
            overflowed: true,
        }
    }

    pub fn empty() -> Self {
        Self::from_totals(Decimal::ZERO, Decimal::ZERO, 0, 0, MarginFormula::OnSales)
    }

    /// Margin, or the reason there is none for `subject`.
    pub fn margin(&self, subject: &str) -> SalesResult<Decimal> {
        if self.overflowed {
            return Err(SalesError::Overflow(subject.to_string()));
        }
        self.profit_margin
            .ok_or_else(|| SalesError::UndefinedMetric(subject.to_string()))
    }
}

/// Summary for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub key: DimensionKey,
    #[serde(flatten)]
    pub figures: SalesFigures,
}

impl AggregateRow {
    pub fn margin(&self) -> SalesResult<Decimal> {
        self.figures.margin(&self.key.to_string())
    }
}

// ─── Dashboard variants ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardVariant {
    /// Category and store selection; overview grouped by category.
    #[default]
    CategoryStore,
    /// Brand selection; overview grouped by brand.
    Brand,
}

impl DashboardVariant {
    pub fn primary_dimension(&self) -> Dimension {
        match self {
            DashboardVariant::CategoryStore => Dimension::Category,
            DashboardVariant::Brand => Dimension::Brand,
        }
    }
}
