//! Dashboard report — every aggregate table the chart and table renderers
//! consume for one date range and selection.

use crate::aggregate::{aggregate, order_by_key, rank, summarize, RankBy};
use crate::filter::{filter, filter_by_date};
use crate::selection::{resolve, ActiveSelection, SelectionDefaults, UserSelection};
use chrono::{DateTime, NaiveDate, Utc};
use sales_core::config::DashboardConfig;
use sales_core::types::{
    end_of_day, start_of_day, validate_range, AggregateRow, DashboardVariant, Dataset, Dimension,
    MarginFormula, SalesFigures,
};
use sales_core::{SalesError, SalesResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selection: UserSelection,
}

impl DashboardRequest {
    /// Inclusive calendar-day range, as picked in the date inputs.
    pub fn for_days(start: NaiveDate, end: NaiveDate, selection: UserSelection) -> Self {
        Self {
            start: Some(start_of_day(start)),
            end: Some(end_of_day(end)),
            selection,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub variant: DashboardVariant,
    pub margin_formula: MarginFormula,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub selection: ActiveSelection,
    /// Rows left after date and selection filtering.
    pub data_points: usize,
    pub totals: SalesFigures,
    /// Grouped by the variant's primary dimension (category or brand).
    pub overview: Vec<AggregateRow>,
    pub category_breakdown: Vec<AggregateRow>,
    pub store_performance: Vec<AggregateRow>,
    pub weekly_sales: Vec<AggregateRow>,
    pub daily_sales: Vec<AggregateRow>,
    pub hourly_sales: Vec<AggregateRow>,
    pub top_products: Vec<AggregateRow>,
    /// Date-only filtering by the primary dimension; the selection is ignored.
    pub baseline: Vec<AggregateRow>,
    /// Date-only filtering by store.
    pub store_baseline: Vec<AggregateRow>,
    /// Brand variant only: the whole upload, no date or selection filtering,
    /// restricted to the top-N brands and ranked by sales.
    pub brand_performance: Vec<AggregateRow>,
    /// Overview keys whose profit margin is undefined.
    pub undefined_margins: Vec<String>,
    /// Keys whose money totals exceeded the representable range.
    #[serde(default)]
    pub overflowed_groups: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ReportOutcome {
    /// Nothing matched the selection; aggregation was skipped.
    Empty { date_filtered_rows: usize },
    Report(Box<DashboardReport>),
}

/// Filter `dataset` for `request` and build every dashboard table.
///
/// Fails only on an invalid date range. An empty match is an outcome, not an error.
pub fn build_report(
    dataset: &Dataset,
    request: &DashboardRequest,
    config: &DashboardConfig,
) -> SalesResult<ReportOutcome> {
    let (start, end) = validate_range(request.start, request.end)?;
    let top_n = request.selection.top_n.unwrap_or(config.default_top_n).max(1);
    let defaults = SelectionDefaults::from_dataset(dataset, top_n);
    let selection = resolve(config.variant, &request.selection, &defaults);

    let filtered = filter(dataset, &selection.criteria(start, end))?;
    let date_filtered = filter_by_date(dataset, Some(start), Some(end))?;

    if filtered.is_empty() {
        info!(
            date_filtered = date_filtered.len(),
            "No rows match the selected criteria"
        );
        return Ok(ReportOutcome::Empty {
            date_filtered_rows: date_filtered.len(),
        });
    }

    let formula = config.margin_formula;
    let primary = config.variant.primary_dimension();
    let overview = aggregate(&filtered, primary, formula);

    let mut undefined_margins = Vec::new();
    let mut overflowed_groups = Vec::new();
    for row in &overview {
        match row.margin() {
            Ok(_) => {}
            Err(e @ SalesError::Overflow(_)) => {
                warn!(dimension = %primary, error = %e, "Group totals overflowed");
                overflowed_groups.push(row.key.to_string());
            }
            Err(e) => {
                warn!(dimension = %primary, error = %e, "Profit margin undefined");
                undefined_margins.push(row.key.to_string());
            }
        }
    }

    let brand_performance = match config.variant {
        DashboardVariant::Brand => brand_performance(dataset, &defaults.top_brands, formula),
        DashboardVariant::CategoryStore => Vec::new(),
    };

    let report = DashboardReport {
        generated_at: Utc::now(),
        variant: config.variant,
        margin_formula: formula,
        start,
        end,
        data_points: filtered.len(),
        totals: summarize(&filtered, formula),
        category_breakdown: aggregate(&filtered, Dimension::Category, formula),
        store_performance: rank(aggregate(&filtered, Dimension::Store, formula), RankBy::Sales, None),
        weekly_sales: order_by_key(aggregate(&filtered, Dimension::Week, formula)),
        daily_sales: order_by_key(aggregate(&filtered, Dimension::Day, formula)),
        hourly_sales: order_by_key(aggregate(&filtered, Dimension::Hour, formula)),
        top_products: rank(
            aggregate(&filtered, Dimension::Product, formula),
            RankBy::Sales,
            Some(config.top_products),
        ),
        baseline: aggregate(&date_filtered, primary, formula),
        store_baseline: rank(aggregate(&date_filtered, Dimension::Store, formula), RankBy::Sales, None),
        brand_performance,
        overview,
        undefined_margins,
        overflowed_groups,
        selection,
    };

    info!(
        variant = ?report.variant,
        data_points = report.data_points,
        groups = report.overview.len(),
        "Dashboard report built"
    );

    Ok(ReportOutcome::Report(Box::new(report)))
}

fn brand_performance(dataset: &Dataset, top_brands: &[String], formula: MarginFormula) -> Vec<AggregateRow> {
    let mut rows = aggregate(dataset, Dimension::Brand, formula);
    rows.retain(|row| {
        row.key
            .as_label()
            .is_some_and(|brand| top_brands.iter().any(|top| top == brand))
    });
    rank(rows, RankBy::Sales, None)
}
