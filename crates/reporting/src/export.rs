//! CSV and JSON export of aggregate tables and whole reports.

use crate::dashboard::DashboardReport;
use rust_decimal::Decimal;
use sales_core::types::AggregateRow;
use sales_core::SalesResult;

const CSV_COLUMNS: [&str; 7] = [
    "key",
    "total_sales",
    "total_cost",
    "total_quantity",
    "line_count",
    "profit",
    "profit_margin",
];

/// One CSV line per row. An undefined margin is an empty cell; an overflowed
/// group has every money cell empty.
pub fn rows_to_csv(rows: &[AggregateRow]) -> SalesResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS).map_err(anyhow::Error::from)?;
    for row in rows {
        let figures = &row.figures;
        let money = |value: Decimal| {
            if figures.overflowed {
                String::new()
            } else {
                value.normalize().to_string()
            }
        };
        writer
            .write_record([
                row.key.to_string(),
                money(figures.total_sales),
                money(figures.total_cost),
                figures.total_quantity.to_string(),
                figures.line_count.to_string(),
                money(figures.profit),
                figures
                    .profit_margin
                    .map(|m| m.normalize().to_string())
                    .unwrap_or_default(),
            ])
            .map_err(anyhow::Error::from)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV export: {e}"))?;
    Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
}

pub fn report_to_json(report: &DashboardReport) -> SalesResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::dashboard::{build_report, DashboardRequest, ReportOutcome};
    use crate::selection::UserSelection;
    use crate::testing::{day, record, scenario_dataset};
    use chrono::NaiveDate;
    use sales_core::config::DashboardConfig;
    use sales_core::types::{Dataset, Dimension, MarginFormula, SalesFigures};

    #[test]
    fn test_csv_export() {
        let dataset = Dataset::new(vec![
            record(day(2024, 1, 1), "A", 10, 6, 3),
            record(day(2024, 1, 1), "Free, Samples", 0, 0, 1),
        ]);
        let rows = aggregate(&dataset, Dimension::Category, MarginFormula::OnSales);
        let csv = rows_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 groups
        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(lines[1], "A,30,18,3,1,12,40");
        assert_eq!(lines[2], "\"Free, Samples\",0,0,1,1,0,");
    }

    #[test]
    fn test_csv_export_blanks_overflowed_money() {
        let rows = vec![AggregateRow {
            key: "Huge".into(),
            figures: SalesFigures::overflow(4, 2),
        }];
        let csv = rows_to_csv(&rows).unwrap();
        assert_eq!(csv.lines().nth(1), Some("Huge,,,4,2,,"));
    }

    #[test]
    fn test_json_export() {
        let request = DashboardRequest::for_days(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            UserSelection::default(),
        );
        let outcome = build_report(&scenario_dataset(), &request, &DashboardConfig::default()).unwrap();
        let ReportOutcome::Report(report) = outcome else {
            panic!("expected a report");
        };
        let json = report_to_json(&report).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["data_points"], 3);
        assert_eq!(parsed["selection"]["variant"], "category_store");
        assert_eq!(parsed["overview"][0]["key"]["label"], "A");
        assert_eq!(parsed["overview"][0]["total_sales"], "30");
        assert!(parsed["overview"][1]["profit_margin"].is_string());
    }
}
