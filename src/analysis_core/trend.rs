//! Direction, strength and acceleration of the monthly growth series

use super::growth::pct_change_sparse;
use super::period::PeriodSeries;
use super::stats::mean;
use crate::error::BlockError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Upward,
    Downward,
    Unknown,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Upward => "Upward",
            TrendDirection::Downward => "Downward",
            TrendDirection::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendMetrics {
    pub direction: TrendDirection,
    /// Absolute mean growth, in percent
    pub strength: f64,
    pub is_accelerating: bool,
    /// Mean percent change of the growth series
    pub acceleration_rate: f64,
}

impl TrendMetrics {
    /// Shape reported when the trend cannot be computed
    pub fn unknown() -> Self {
        Self {
            direction: TrendDirection::Unknown,
            strength: 0.0,
            is_accelerating: false,
            acceleration_rate: 0.0,
        }
    }
}

impl Default for TrendMetrics {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Summarize period-over-period growth (percent). Absent growth values are
/// excluded from every mean, never counted as zero.
pub fn calculate_trend_metrics(growth: &PeriodSeries<Option<f64>>) -> Result<TrendMetrics, BlockError> {
    let present: Vec<f64> = growth.values().filter_map(|g| *g).collect();
    let mean_growth = mean(&present).ok_or(BlockError::InsufficientData {
        required: 2,
        actual: growth.len(),
    })?;

    let acceleration: Vec<f64> = pct_change_sparse(&growth.to_vec())
        .into_iter()
        .flatten()
        .collect();
    let acceleration_rate = mean(&acceleration).unwrap_or(0.0);

    Ok(TrendMetrics {
        direction: if mean_growth > 0.0 {
            TrendDirection::Upward
        } else {
            TrendDirection::Downward
        },
        strength: mean_growth.abs(),
        is_accelerating: acceleration_rate > 0.0,
        acceleration_rate,
    })
}
