//! Rolling-window outlier detection over daily spend
//!
//! Each day is compared against the mean and sample standard deviation of the
//! trailing `window` observations ending at that day (the day itself included).
//! Early days use however many observations exist. A day is flagged when
//! `|value - mean| > threshold * std`.

use super::period::PeriodSeries;
use super::stats::{mean, sample_std};
use crate::error::BlockError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Anomaly block of the analysis result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnomalyReport {
    /// Anomalous date (`YYYY-MM-DD`) to that day's spend
    pub anomalies: BTreeMap<String, f64>,
    pub anomaly_dates: Vec<String>,
    pub total_anomalies: usize,
}

impl AnomalyReport {
    fn push(&mut self, date: String, value: f64) {
        self.anomaly_dates.push(date.clone());
        self.anomalies.insert(date, value);
        self.total_anomalies += 1;
    }
}

/// Rolling statistics at one index: `(mean, std)`. The std is `None` when the
/// window holds a single observation.
fn rolling_stats(values: &[f64], index: usize, window: usize) -> (f64, Option<f64>) {
    let start = (index + 1).saturating_sub(window);
    let slice = &values[start..=index];
    (mean(slice).unwrap_or(0.0), sample_std(slice))
}

pub fn detect_anomalies(daily: &PeriodSeries<f64>, window: usize, threshold: f64) -> Result<AnomalyReport, BlockError> {
    if window == 0 {
        return Err(BlockError::InvalidParameter {
            name: "anomaly_detection_window".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if !(threshold > 0.0) || !threshold.is_finite() {
        return Err(BlockError::InvalidParameter {
            name: "anomaly_std_threshold".to_string(),
            reason: format!("must be a positive number, got {}", threshold),
        });
    }

    let mut report = AnomalyReport::default();
    let values = daily.to_vec();

    for (i, key) in daily.keys().enumerate() {
        let value = values[i];
        if !value.is_finite() {
            return Err(BlockError::Computation(format!("non-finite spend on {}", key)));
        }
        let (rolling_mean, rolling_std) = rolling_stats(&values, i, window);

        // a flat or single-point window can never flag
        let std = match rolling_std {
            Some(std) if std > 0.0 => std,
            _ => continue,
        };

        if (value - rolling_mean).abs() > threshold * std {
            report.push(key.to_string(), value);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_core::period::PeriodKey;
    use chrono::{Duration, NaiveDate};

    fn daily(values: &[f64]) -> PeriodSeries<f64> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (PeriodKey::Day(start + Duration::days(i as i64)), *v))
            .collect()
    }

    #[test]
    fn test_last_value_spike_is_flagged() {
        let series = daily(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 100.0]);
        let report = detect_anomalies(&series, 7, 2.0).unwrap();

        assert_eq!(report.total_anomalies, 1);
        assert_eq!(report.anomaly_dates, vec!["2024-03-07".to_string()]);
        assert_eq!(report.anomalies.get("2024-03-07"), Some(&100.0));
    }

    #[test]
    fn test_constant_series_never_flags() {
        let report = detect_anomalies(&daily(&[250.0; 40]), 7, 2.0).unwrap();
        assert_eq!(report, AnomalyReport::default());
    }

    #[test]
    fn test_single_day_is_never_flagged() {
        let report = detect_anomalies(&daily(&[1_000_000.0]), 7, 2.0).unwrap();
        assert_eq!(report.total_anomalies, 0);
    }

    #[test]
    fn test_spike_mid_month() {
        let mut values = vec![1000.0; 30];
        values[14] = 50_000.0;
        let report = detect_anomalies(&daily(&values), 7, 2.0).unwrap();

        assert_eq!(report.anomaly_dates, vec!["2024-03-15".to_string()]);
        assert_eq!(report.total_anomalies, 1);
    }

    #[test]
    fn test_empty_input_yields_empty_report() {
        let report = detect_anomalies(&PeriodSeries::new(), 7, 2.0).unwrap();
        assert_eq!(report.total_anomalies, 0);
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_invalid_parameters() {
        let series = daily(&[1.0, 2.0]);
        assert!(matches!(
            detect_anomalies(&series, 0, 2.0),
            Err(BlockError::InvalidParameter { .. })
        ));
        assert!(matches!(
            detect_anomalies(&series, 7, f64::NAN),
            Err(BlockError::InvalidParameter { .. })
        ));
    }
}
