//! Additive seasonal decomposition of the monthly spend series
//!
//! `Y = T + S + R` with a fixed yearly period of 12 months:
//! - **trend**: centered 2x12 moving average, absent for the first and last six
//!   months
//! - **seasonal**: mean detrended value per position in the cycle, centered to
//!   sum to zero, repeated over the whole series
//! - **residual**: `Y - T - S`, absent wherever the trend is absent
//!
//! Two complete cycles are required for the seasonal means to be meaningful.

use super::period::{PeriodKey, PeriodSeries};
use super::stats::{mean, round2, sample_variance};
use crate::error::BlockError;
use serde::Serialize;
use std::collections::BTreeMap;

pub const SEASONAL_PERIOD: usize = 12;

/// Decomposed components, aligned to the input keys
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalComponents {
    pub seasonal: PeriodSeries<f64>,
    pub trend: PeriodSeries<Option<f64>>,
    pub residual: PeriodSeries<Option<f64>>,
}

/// Seasonality block of the analysis result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalityMetrics {
    pub has_seasonality: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trough_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_factors: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<SeasonalComponents>,
}

impl SeasonalityMetrics {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            has_seasonality: false,
            message: Some(message.into()),
            seasonal_strength: None,
            peak_month: None,
            trough_month: None,
            seasonal_factors: None,
            components: None,
        }
    }
}

/// Centered moving average for an even period (half weights at both ends)
fn centered_trend(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            let window = &values[i - half..=i + half];
            let inner: f64 = window[1..window.len() - 1].iter().sum();
            let edges = (window[0] + window[window.len() - 1]) * 0.5;
            Some((inner + edges) / period as f64)
        })
        .collect()
}

/// Decompose `series` additively with the given period
pub fn decompose(series: &PeriodSeries<f64>, period: usize) -> Result<SeasonalComponents, BlockError> {
    let values = series.to_vec();
    let n = values.len();

    if period < 2 || period % 2 != 0 {
        return Err(BlockError::InvalidParameter {
            name: "period".to_string(),
            reason: "must be an even number of at least 2".to_string(),
        });
    }
    if n < 2 * period {
        return Err(BlockError::InsufficientData {
            required: 2 * period,
            actual: n,
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(BlockError::Computation("series contains non-finite values".to_string()));
    }
    if values.iter().all(|v| *v == 0.0) {
        return Err(BlockError::Computation("series has no non-zero values".to_string()));
    }

    let trend = centered_trend(&values, period);

    let mut position_sums = vec![0.0; period];
    let mut position_counts = vec![0usize; period];
    for (i, t) in trend.iter().enumerate() {
        if let Some(t) = t {
            position_sums[i % period] += values[i] - t;
            position_counts[i % period] += 1;
        }
    }

    let mut position_means = Vec::with_capacity(period);
    for (sum, count) in position_sums.iter().zip(&position_counts) {
        if *count == 0 {
            return Err(BlockError::Computation("empty seasonal position".to_string()));
        }
        position_means.push(sum / *count as f64);
    }
    let offset = position_means.iter().sum::<f64>() / period as f64;
    for m in position_means.iter_mut() {
        *m -= offset;
    }

    let keys: Vec<PeriodKey> = series.keys().copied().collect();
    let seasonal: PeriodSeries<f64> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, position_means[i % period]))
        .collect();
    let residual: PeriodSeries<Option<f64>> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| (*key, trend[i].map(|t| values[i] - t - position_means[i % period])))
        .collect();
    let trend: PeriodSeries<Option<f64>> = keys.iter().copied().zip(trend).collect();

    Ok(SeasonalComponents {
        seasonal,
        trend,
        residual,
    })
}

/// Residual variance below this fraction of the series' mean square counts as
/// zero (floating point noise of an exact fit)
const RESIDUAL_VARIANCE_TOLERANCE: f64 = 1e-12;

/// `var(S) / (var(S) + var(R)) * 100`
///
/// Reported as 0 when the residual variance is zero. An exact fit leaves
/// nothing to compare the seasonal swing against: with exactly two cycles each
/// position in the year holds a single detrended value, so the seasonal means
/// absorb everything and the residual collapses to a constant.
pub fn seasonal_strength(components: &SeasonalComponents, observed: &PeriodSeries<f64>) -> f64 {
    let seasonal: Vec<f64> = components.seasonal.to_vec();
    let residual: Vec<f64> = components.residual.values().filter_map(|v| *v).collect();

    let var_s = sample_variance(&seasonal).unwrap_or(0.0);
    let var_r = sample_variance(&residual).unwrap_or(0.0);

    let scale = mean(&observed.values().map(|v| v * v).collect::<Vec<_>>()).unwrap_or(0.0);
    if var_r <= RESIDUAL_VARIANCE_TOLERANCE * scale.max(1.0) {
        return 0.0;
    }
    round2(var_s / (var_s + var_r) * 100.0)
}

/// Mean seasonal value per calendar month, keyed `"01"`..`"12"`
pub fn seasonal_factors(seasonal: &PeriodSeries<f64>) -> BTreeMap<String, f64> {
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (key, value) in seasonal.iter() {
        if let Some(month) = key.calendar_month() {
            let entry = groups.entry(format!("{:02}", month)).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(month, (sum, count))| (month, sum / count as f64))
        .collect()
}

/// Month with the extreme factor; ties resolve to the earliest calendar month
fn extreme_month(factors: &BTreeMap<String, f64>, pick_max: bool) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (month, value) in factors {
        let better = match best {
            None => true,
            Some((_, b)) if pick_max => *value > b,
            Some((_, b)) => *value < b,
        };
        if better {
            best = Some((month, *value));
        }
    }
    best.map(|(m, _)| m.clone())
}

/// Seasonality analysis over the monthly series
///
/// A series shorter than `min_months` is rejected with `InsufficientData`
/// before any decomposition is attempted.
pub fn analyze_seasonality(monthly: &PeriodSeries<f64>, min_months: usize) -> Result<SeasonalityMetrics, BlockError> {
    if monthly.len() < min_months {
        return Err(BlockError::InsufficientData {
            required: min_months,
            actual: monthly.len(),
        });
    }

    let components = decompose(monthly, SEASONAL_PERIOD)?;
    let strength = seasonal_strength(&components, monthly);
    let factors = seasonal_factors(&components.seasonal);

    Ok(SeasonalityMetrics {
        has_seasonality: true,
        message: None,
        seasonal_strength: Some(strength),
        peak_month: extreme_month(&factors, true),
        trough_month: extreme_month(&factors, false),
        seasonal_factors: Some(factors),
        components: Some(components),
    })
}

/// Human-readable reason for an unavailable seasonality block
pub fn unavailable_message(error: &BlockError, min_months: usize) -> String {
    match error {
        BlockError::InsufficientData { required, .. } if *required == min_months => format!(
            "Insufficient data for seasonal analysis (need at least {} months)",
            min_months
        ),
        other => format!("Error in seasonal analysis: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly(values: &[f64]) -> PeriodSeries<f64> {
        let mut key = PeriodKey::Month { year: 2022, month: 1 };
        let mut series = PeriodSeries::new();
        for v in values {
            series.insert(key, *v);
            key = key.next().unwrap();
        }
        series
    }

    fn seasonal_values(years: usize) -> Vec<f64> {
        // December peak, February trough, gentle upward trend, small irregular noise
        let pattern = [0.0, -40.0, -10.0, 0.0, 5.0, 10.0, 0.0, -5.0, 0.0, 5.0, 10.0, 25.0];
        (0..years * 12)
            .map(|i| 1000.0 + i as f64 * 2.0 + pattern[i % 12] + ((i * 7) % 5) as f64 * 0.5 - 1.0)
            .collect()
    }

    #[test]
    fn test_gating_below_min_months() {
        let series = monthly(&[100.0; 8]);
        let err = analyze_seasonality(&series, 12).unwrap_err();
        assert_eq!(err, BlockError::InsufficientData { required: 12, actual: 8 });
        assert_eq!(
            unavailable_message(&err, 12),
            "Insufficient data for seasonal analysis (need at least 12 months)"
        );
    }

    #[test]
    fn test_one_cycle_is_not_enough_to_decompose() {
        let series = monthly(&[100.0; 18]);
        let err = analyze_seasonality(&series, 12).unwrap_err();
        assert_eq!(err, BlockError::InsufficientData { required: 24, actual: 18 });
        assert!(unavailable_message(&err, 12).starts_with("Error in seasonal analysis"));
    }

    #[test]
    fn test_trend_edges_are_absent() {
        let components = decompose(&monthly(&seasonal_values(3)), 12).unwrap();
        let trend = components.trend.to_vec();

        assert!(trend[..6].iter().all(|t| t.is_none()));
        assert!(trend[30..].iter().all(|t| t.is_none()));
        assert!(trend[6..30].iter().all(|t| t.is_some()));

        let residual = components.residual.to_vec();
        assert!(residual[..6].iter().all(|r| r.is_none()));
        assert_eq!(components.seasonal.len(), 36);
    }

    #[test]
    fn test_detects_peak_and_trough_months() {
        let metrics = analyze_seasonality(&monthly(&seasonal_values(3)), 12).unwrap();

        assert!(metrics.has_seasonality);
        assert_eq!(metrics.peak_month.as_deref(), Some("12"));
        assert_eq!(metrics.trough_month.as_deref(), Some("02"));
        assert!(metrics.seasonal_strength.unwrap() > 90.0);

        let factors = metrics.seasonal_factors.unwrap();
        assert_eq!(factors.len(), 12);
        let total: f64 = factors.values().sum();
        assert!(total.abs() < 1e-6, "seasonal factors should be centered, got {}", total);
    }

    #[test]
    fn test_constant_series_has_zero_strength() {
        let metrics = analyze_seasonality(&monthly(&[1000.0; 24]), 12).unwrap();
        assert_eq!(metrics.seasonal_strength, Some(0.0));
    }

    #[test]
    fn test_two_cycle_exact_fit_has_zero_strength() {
        // constant daily spend: monthly totals differ only by month length
        let days = [31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0];
        let values: Vec<f64> = (0..24).map(|i| days[i % 12] * 1000.0).collect();
        let series = monthly(&values);

        let components = decompose(&series, 12).unwrap();
        let residual: Vec<f64> = components.residual.values().filter_map(|v| *v).collect();
        assert!(residual.iter().all(|r| (r - residual[0]).abs() < 1e-6));

        assert_eq!(seasonal_strength(&components, &series), 0.0);
    }

    #[test]
    fn test_all_zero_series_is_a_computation_failure() {
        let err = analyze_seasonality(&monthly(&[0.0; 24]), 12).unwrap_err();
        assert!(matches!(err, BlockError::Computation(_)));
    }

    #[test]
    fn test_unavailable_shape_serializes_minimal() {
        let metrics = SeasonalityMetrics::unavailable("nope");
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json, serde_json::json!({"has_seasonality": false, "message": "nope"}));
    }
}
