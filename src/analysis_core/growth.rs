//! Period-over-period growth, trailing moving averages and peak periods

use super::period::{PeriodKey, PeriodSeries};
use crate::error::BlockError;
use serde::Serialize;

/// Percent change between consecutive values, `None` where undefined
///
/// Index 0 has no prior value. A zero or non-finite prior value also yields
/// `None` rather than an infinite or NaN result.
pub fn pct_change_values(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let (prev, curr) = (values[i - 1], values[i]);
        let change = (curr - prev) / prev * 100.0;
        out.push(if prev != 0.0 && change.is_finite() {
            Some(change)
        } else {
            None
        });
    }
    out
}

/// Percent change over an already-sparse series: an absent input value makes
/// both its own change and the next one absent.
pub fn pct_change_sparse(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let change = match (i.checked_sub(1).and_then(|p| values[p]), values[i]) {
            (Some(prev), Some(curr)) if prev != 0.0 => Some((curr - prev) / prev * 100.0),
            _ => None,
        };
        out.push(change.filter(|c| c.is_finite()));
    }
    out
}

/// Period-over-period growth in percent. The first period is always absent.
///
/// A non-finite aggregate (an overflowing sum) fails the block instead of
/// silently turning into absent values.
pub fn growth_rates(series: &PeriodSeries<f64>) -> Result<PeriodSeries<Option<f64>>, BlockError> {
    let values = series.to_vec();
    if let Some((key, _)) = series.iter().find(|(_, v)| !v.is_finite()) {
        return Err(BlockError::Computation(format!("non-finite aggregate at {}", key)));
    }
    let changes = pct_change_values(&values);
    Ok(series.keys().copied().zip(changes).collect())
}

/// Trailing mean over exactly `window` periods; absent for the first
/// `window - 1` periods.
pub fn moving_average(series: &PeriodSeries<f64>, window: usize) -> PeriodSeries<Option<f64>> {
    let values = series.to_vec();
    series
        .keys()
        .enumerate()
        .map(|(i, key)| {
            let avg = if window == 0 || i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            };
            (*key, avg)
        })
        .collect()
}

/// One of the top spending periods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakPeriod {
    pub month_period: PeriodKey,
    pub total_spend: f64,
}

/// Top `k` periods by value, descending; ties keep the earlier period first
pub fn peak_periods(series: &PeriodSeries<f64>, k: usize) -> Vec<PeakPeriod> {
    let mut ranked: Vec<(PeriodKey, f64)> = series.iter().map(|(key, v)| (*key, *v)).collect();
    // stable sort: equal values stay in chronological order
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(k)
        .map(|(month_period, total_spend)| PeakPeriod {
            month_period,
            total_spend,
        })
        .collect()
}
