//! End-to-end scenarios for the analysis engine
//!
//! Each test feeds a synthetic dataset through `AnalysisEngine::analyze` and
//! checks the blocks that dataset is designed to exercise:
//! - constant spend over two years
//! - a single spike in a flat month
//! - short history, empty input and invalid settings (block isolation)
//! - structural CSV failures

#[cfg(test)]
mod engine_scenario_tests {
    use chrono::{Duration, NaiveDate};
    use timeflow::analysis_core::TrendDirection;
    use timeflow::{AnalysisEngine, AnalysisError, AnalysisSettings, NegativeSpendPolicy, RawTransaction};

    fn daily_rows(start: NaiveDate, days: i64, spend: impl Fn(i64) -> f64) -> Vec<RawTransaction> {
        (0..days)
            .map(|i| {
                let date = start + Duration::days(i);
                RawTransaction::new(date.format("%Y-%m-%d").to_string(), spend(i), 10.0).with_lead_time(5.0)
            })
            .collect()
    }

    fn monthly_rows(months: usize, spend: impl Fn(usize) -> f64) -> Vec<RawTransaction> {
        (0..months)
            .map(|i| {
                let year = 2021 + (i / 12) as i32;
                let month = (i % 12) as u32 + 1;
                RawTransaction::new(format!("{}-{:02}-10", year, month), spend(i), 4.0)
            })
            .collect()
    }

    #[test]
    fn test_constant_daily_spend_over_two_years() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let rows = daily_rows(start, 730, |_| 1000.0);

        let result = AnalysisEngine::default().analyze(&rows).unwrap();

        assert_eq!(result.yearly_growth.to_vec(), vec![None, Some(0.0)]);
        assert_eq!(result.anomalies.total_anomalies, 0);
        assert_eq!(result.correlations.spend_quantity, 0.0);
        assert_eq!(result.correlations.spend_leadtime, 0.0);
        assert_eq!(result.correlations.quantity_leadtime, 0.0);

        let aov = result.purchase_patterns.monthly_aov.to_vec();
        assert_eq!(aov.len(), 24);
        assert!(aov.iter().all(|v| *v == Some(1000.0)));
        assert!(result.purchase_patterns.basket_size.values().all(|b| *b == 10.0));

        let seasonality = &result.seasonality_metrics;
        assert!(seasonality.has_seasonality);
        assert_eq!(seasonality.seasonal_strength, Some(0.0));

        let lead_times = result.lead_times.as_ref().unwrap();
        assert!(lead_times.lead_time_efficiency.values().all(|e| *e == 100.0));
        assert!(result.diagnostics.is_empty(), "unexpected diagnostics: {:?}", result.diagnostics);
    }

    #[test]
    fn test_constant_monthly_spend_has_no_seasonal_strength() {
        let result = AnalysisEngine::default().analyze(&monthly_rows(24, |_| 1000.0)).unwrap();

        assert_eq!(result.seasonality_metrics.seasonal_strength, Some(0.0));
        assert!(result.monthly_growth.values().skip(1).all(|g| *g == Some(0.0)));
        assert_eq!(result.trend_analysis.direction, TrendDirection::Downward);
        assert_eq!(result.trend_analysis.strength, 0.0);
    }

    #[test]
    fn test_single_spike_is_the_only_anomaly() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let rows = daily_rows(start, 30, |i| if i == 15 { 50_000.0 } else { 1000.0 });

        let result = AnalysisEngine::default().analyze(&rows).unwrap();

        assert_eq!(result.anomalies.anomaly_dates, vec!["2024-06-16".to_string()]);
        assert_eq!(result.anomalies.total_anomalies, 1);
        assert_eq!(result.anomalies.anomalies.get("2024-06-16"), Some(&50_000.0));
    }

    #[test]
    fn test_short_history_skips_decomposition() {
        let result = AnalysisEngine::default().analyze(&monthly_rows(6, |i| 100.0 + i as f64)).unwrap();

        let seasonality = &result.seasonality_metrics;
        assert!(!seasonality.has_seasonality);
        assert!(seasonality.message.as_deref().unwrap().contains("need at least 12 months"));
        assert!(seasonality.components.is_none());

        assert_eq!(result.monthly_growth.len(), 6);
        assert_eq!(result.trend_analysis.direction, TrendDirection::Upward);
    }

    #[test]
    fn test_invalid_anomaly_window_leaves_other_blocks_intact() {
        let settings = AnalysisSettings {
            anomaly_detection_window: 0,
            ..AnalysisSettings::default()
        };
        let rows = monthly_rows(14, |i| 100.0 * (i + 1) as f64);

        let result = AnalysisEngine::new(settings).analyze(&rows).unwrap();

        assert_eq!(result.anomalies.total_anomalies, 0);
        let diagnostic = result.diagnostics.iter().find(|d| d.block == "anomalies").unwrap();
        assert_eq!(diagnostic.kind, "invalid_parameter");

        assert_eq!(result.monthly_growth.len(), 14);
        assert_eq!(result.monthly_growth.to_vec()[1], Some(100.0));
        assert!((result.correlations.spend_quantity).abs() <= 1.0);
        assert_eq!(result.purchase_patterns.purchase_frequency.len(), 14);
        assert!(!result.is_degraded("purchase_patterns"));
    }

    #[test]
    fn test_empty_input_degrades_instead_of_failing() {
        let result = AnalysisEngine::default().analyze(&[]).unwrap();

        assert_eq!(result.summary.total_transactions, 0);
        assert_eq!(result.summary.average_spend, None);
        assert!(result.yearly_growth.is_empty());
        assert_eq!(result.anomalies.total_anomalies, 0);
        assert_eq!(result.trend_analysis.direction, TrendDirection::Unknown);
        assert!(!result.seasonality_metrics.has_seasonality);
        assert!(result.is_degraded("trend_analysis"));
        assert!(result.is_degraded("seasonality_metrics"));
    }

    #[test]
    fn test_correlations_stay_in_bounds() {
        let rows: Vec<RawTransaction> = (0..60)
            .map(|i| {
                let spend = ((i * 37) % 101) as f64 + 1.0;
                let quantity = ((i * 13) % 7) as f64 + 1.0;
                RawTransaction::new(format!("2023-{:02}-{:02}", i % 12 + 1, i % 28 + 1), spend, quantity)
                    .with_lead_time(((i * 5) % 11) as f64)
            })
            .collect();

        let result = AnalysisEngine::default().analyze(&rows).unwrap();
        for (_, r) in result.correlations.entries() {
            assert!((-1.0..=1.0).contains(&r), "coefficient out of bounds: {}", r);
        }
    }

    #[test]
    fn test_negative_spend_policy_reaches_growth() {
        let rows = vec![
            RawTransaction::new("2023-01-05", 100.0, 1.0),
            RawTransaction::new("2023-02-05", 100.0, 1.0),
            RawTransaction::new("2023-02-06", -50.0, 1.0),
        ];

        let include = AnalysisEngine::default().analyze(&rows).unwrap();
        assert_eq!(include.monthly_growth.to_vec(), vec![None, Some(-50.0)]);

        let settings = AnalysisSettings {
            negative_spend: NegativeSpendPolicy::Exclude,
            ..AnalysisSettings::default()
        };
        let exclude = AnalysisEngine::new(settings).analyze(&rows).unwrap();
        assert_eq!(exclude.monthly_growth.to_vec(), vec![None, Some(0.0)]);
    }

    #[test]
    fn test_missing_columns_fail_the_run() {
        let csv = "transaction_date,amount\n2023-01-01,10\n";
        match AnalysisEngine::default().analyze_csv(csv.as_bytes()) {
            Err(AnalysisError::MissingColumns(columns)) => {
                assert_eq!(columns, vec!["total_spend".to_string(), "quantity_purchased".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_bad_date_fails_the_run() {
        let csv = "transaction_date,total_spend,quantity_purchased\n2023-01-01,10,1\nnot a date,5,1\n";
        let err = AnalysisEngine::default().analyze_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn test_display_headers_are_accepted() {
        let csv = "\
Transaction Date,Total Spend ($),Quantity Purchased,Lead Time (Days)
2023-01-01,\"$1,000.00\",3,4
2023-02-01,500,2,6
";
        let result = AnalysisEngine::default().analyze_csv(csv.as_bytes()).unwrap();

        assert_eq!(result.summary.total_spend, 1500.0);
        assert_eq!(result.monthly_growth.to_vec(), vec![None, Some(-50.0)]);
        assert!(result.lead_times.is_some());
    }
}
