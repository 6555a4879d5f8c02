//! Integration test for the upload → filter → aggregate → report flow.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sales_core::config::AppConfig;
    use sales_core::types::{DashboardVariant, DimensionKey, MarginFormula};
    use sales_dashboard::{AnalysisOutcome, DashboardSession};
    use sales_reporting::{report_to_json, rows_to_csv, DashboardReport, DashboardRequest, UserSelection};
    use std::sync::Arc;

    const ORDERS: &str = "\
orderDate,categoryName,storeName,brandName,productName,sellingPrice,costPrice,quantity
2024-01-01 09:15:00,A,North,Acme,Widget,10,6,2
2024-01-02 14:00:00,A,South,Acme,Widget,10,6,1
2024-01-03 10:30:00,B,South,Zenith,Gadget,5,5,4
";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn loaded_session(config: AppConfig, csv: &str) -> DashboardSession {
        let mut session = DashboardSession::new(config);
        session.upload("orders.csv", csv.as_bytes()).unwrap();
        session
    }

    fn expect_report(outcome: AnalysisOutcome) -> Arc<DashboardReport> {
        match outcome {
            AnalysisOutcome::Ready(report) => report,
            other => panic!("expected a report, got {other:?}"),
        }
    }

    fn row<'a>(rows: &'a [sales_core::AggregateRow], key: &str) -> &'a sales_core::AggregateRow {
        rows.iter()
            .find(|r| r.key == DimensionKey::from(key))
            .unwrap_or_else(|| panic!("no row for {key}"))
    }

    #[test]
    fn test_date_window_and_category_totals() {
        let session = loaded_session(AppConfig::default(), ORDERS);
        let request = DashboardRequest::for_days(date(1), date(2), UserSelection::default());
        let report = expect_report(session.analyze(&request));

        assert_eq!(report.data_points, 2);
        assert_eq!(report.overview.len(), 1);
        let a = row(&report.overview, "A");
        assert_eq!(a.figures.total_sales, Decimal::from(30));
        assert_eq!(a.figures.total_cost, Decimal::from(18));
        assert_eq!(a.figures.total_quantity, 3);
        assert_eq!(a.figures.profit, Decimal::from(12));
        assert_eq!(a.figures.profit_margin, Some(Decimal::from(40)));

        assert_eq!(report.daily_sales.len(), 2);
        assert_eq!(report.hourly_sales[0].key, DimensionKey::Hour(9));
        assert_eq!(report.store_performance.len(), 2);
    }

    #[test]
    fn test_explicit_selection_narrows_but_baseline_does_not() {
        let session = loaded_session(AppConfig::default(), ORDERS);
        let selection = UserSelection {
            stores: vec!["South".into()],
            ..UserSelection::default()
        };
        let report = expect_report(session.analyze(&DashboardRequest::for_days(date(1), date(3), selection)));

        assert_eq!(report.data_points, 2);
        assert_eq!(report.totals.total_sales, Decimal::from(30));
        let baseline_sales: Decimal = report.baseline.iter().map(|r| r.figures.total_sales).sum();
        assert_eq!(baseline_sales, Decimal::from(50));
        assert_eq!(report.store_baseline.len(), 2);
    }

    #[test]
    fn test_alternative_margin_formula() {
        let mut config = AppConfig::default();
        config.dashboard.margin_formula = MarginFormula::OnSalesAndCost;
        let session = loaded_session(config, ORDERS);
        let report = expect_report(session.analyze(&DashboardRequest::for_days(
            date(1),
            date(2),
            UserSelection::default(),
        )));
        assert_eq!(row(&report.overview, "A").figures.profit_margin, Some(Decimal::from(25)));
        assert_eq!(report.margin_formula, MarginFormula::OnSalesAndCost);
    }

    #[test]
    fn test_brand_variant() {
        let mut config = AppConfig::default();
        config.dashboard.variant = DashboardVariant::Brand;
        let session = loaded_session(config, ORDERS);

        let all = expect_report(session.analyze(&DashboardRequest::for_days(
            date(1),
            date(3),
            UserSelection::default(),
        )));
        assert_eq!(all.overview.len(), 2);

        let zenith = UserSelection {
            brands: vec!["Zenith".into()],
            ..UserSelection::default()
        };
        let report = expect_report(session.analyze(&DashboardRequest::for_days(date(1), date(3), zenith)));
        let z = row(&report.overview, "Zenith");
        assert_eq!(z.figures.profit, Decimal::ZERO);
        assert_eq!(z.figures.profit_margin, Some(Decimal::ZERO));
    }

    #[test]
    fn test_invalid_range_is_a_warning() {
        let session = loaded_session(AppConfig::default(), ORDERS);
        let inverted = DashboardRequest::for_days(date(3), date(1), UserSelection::default());
        assert!(matches!(session.analyze(&inverted), AnalysisOutcome::InvalidRange { .. }));

        let open = DashboardRequest {
            end: None,
            ..DashboardRequest::for_days(date(1), date(3), UserSelection::default())
        };
        assert!(matches!(session.analyze(&open), AnalysisOutcome::InvalidRange { .. }));
        assert_eq!(session.cached_reports(), 0);
    }

    #[test]
    fn test_no_matches_skips_aggregation() {
        let session = loaded_session(AppConfig::default(), ORDERS);
        let selection = UserSelection {
            categories: vec!["Z".into()],
            ..UserSelection::default()
        };
        let outcome = session.analyze(&DashboardRequest::for_days(date(1), date(3), selection));
        match outcome {
            AnalysisOutcome::NoMatches { message } => assert!(message.contains("3 rows")),
            other => panic!("expected no matches, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_margin_does_not_abort_other_groups() {
        let csv = format!("{ORDERS}2024-01-02 08:00:00,C,North,Acme,Freebie,0,0,0\n");
        let session = loaded_session(AppConfig::default(), &csv);
        let report = expect_report(session.analyze(&DashboardRequest::for_days(
            date(1),
            date(3),
            UserSelection::default(),
        )));

        assert_eq!(report.undefined_margins, vec!["C".to_string()]);
        assert_eq!(row(&report.overview, "C").figures.profit_margin, None);
        assert_eq!(row(&report.overview, "A").figures.profit_margin, Some(Decimal::from(40)));
        assert_eq!(report.totals.total_quantity, 7);
    }

    #[test]
    fn test_malformed_rows_are_reported_not_fatal() {
        let csv = format!("{ORDERS}not-a-date,A,North,Acme,Widget,10,6,1\n2024-01-02,A,North,Acme,Widget,ten,6,1\n");
        let mut session = DashboardSession::new(AppConfig::default());
        let summary = session.upload("orders.csv", csv.as_bytes()).unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.rejected_count, 2);
        assert_eq!(summary.rejections.len(), 2);
    }

    #[test]
    fn test_unrepresentable_totals_never_fail_the_analysis() {
        let huge = "50000000000000000000000000000";
        let csv = format!(
            "{ORDERS}2024-01-02 11:00:00,C,North,Acme,Yacht,{huge},1,2\n\
             2024-01-02 12:00:00,D,North,Acme,Yacht,{huge},1,1\n\
             2024-01-02 13:00:00,D,North,Acme,Yacht,{huge},1,1\n"
        );
        let mut session = DashboardSession::new(AppConfig::default());
        let summary = session.upload("orders.csv", csv.as_bytes()).unwrap();
        assert_eq!(summary.rejected_count, 1);

        let report = expect_report(session.analyze(&DashboardRequest::for_days(
            date(1),
            date(3),
            UserSelection::default(),
        )));
        assert_eq!(report.overflowed_groups, vec!["D".to_string()]);
        assert_eq!(row(&report.overview, "A").figures.profit_margin, Some(Decimal::from(40)));
    }

    #[test]
    fn test_reupload_serves_fresh_results() {
        let mut session = loaded_session(AppConfig::default(), ORDERS);
        let request = DashboardRequest::for_days(date(1), date(3), UserSelection::default());
        let before = expect_report(session.analyze(&request));
        assert_eq!(before.totals.total_sales, Decimal::from(50));

        let doubled = ORDERS.replace(",10,6,2", ",10,6,4");
        session.upload("orders.csv", doubled.as_bytes()).unwrap();
        let after = expect_report(session.analyze(&request));
        assert_eq!(after.totals.total_sales, Decimal::from(70));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_report_exports() {
        let session = loaded_session(AppConfig::default(), ORDERS);
        let report = expect_report(session.analyze(&DashboardRequest::for_days(
            date(1),
            date(3),
            UserSelection::default(),
        )));

        let csv = rows_to_csv(&report.overview).unwrap();
        assert!(csv.lines().count() >= 3);
        let json = report_to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data_points"], 3);
    }
}
