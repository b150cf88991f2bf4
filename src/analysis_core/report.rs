//! The composite analysis result and the insight sentences derived from it

use super::anomaly::AnomalyReport;
use super::correlation::Correlations;
use super::growth::PeakPeriod;
use super::lead_time::LeadTimeAnalysis;
use super::patterns::PurchasePatterns;
use super::period::PeriodSeries;
use super::seasonal::SeasonalityMetrics;
use super::trend::{TrendDirection, TrendMetrics};
use crate::error::BlockError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Dataset-level totals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub total_spend: f64,
    pub total_transactions: usize,
    /// Absent for an empty dataset
    pub average_spend: Option<f64>,
}

/// One weekday row, Monday first in the result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOfWeekRow {
    pub day: String,
    #[serde(rename = "Total Spend")]
    pub total_spend: f64,
    #[serde(rename = "Average Spend")]
    pub average_spend: f64,
    #[serde(rename = "Transaction Count")]
    pub transaction_count: usize,
    #[serde(rename = "Total Quantity")]
    pub total_quantity: f64,
}

/// A block that fell back to its unavailable shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub block: String,
    pub kind: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(block: &str, error: &BlockError) -> Self {
        Self {
            block: block.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

pub fn moving_average_key(window: usize) -> String {
    format!("moving_average_{}m", window)
}

/// Everything one run produces. Built once, read-only afterwards; field order
/// is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub yearly_growth: PeriodSeries<Option<f64>>,
    pub quarterly_growth: PeriodSeries<Option<f64>>,
    pub monthly_growth: PeriodSeries<Option<f64>>,
    /// `moving_average_{w}m` for each configured window
    #[serde(flatten)]
    pub moving_averages: BTreeMap<String, PeriodSeries<Option<f64>>>,
    pub peak_months: Vec<PeakPeriod>,
    pub day_of_week_stats: Vec<DayOfWeekRow>,
    pub raw_monthly_spend: PeriodSeries<f64>,
    pub trend_analysis: TrendMetrics,
    pub anomalies: AnomalyReport,
    pub purchase_patterns: PurchasePatterns,
    pub correlations: Correlations,
    pub seasonality_metrics: SeasonalityMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_times: Option<LeadTimeAnalysis>,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn moving_average(&self, window: usize) -> Option<&PeriodSeries<Option<f64>>> {
        self.moving_averages.get(&moving_average_key(window))
    }

    /// Whether `block` degraded during the run
    pub fn is_degraded(&self, block: &str) -> bool {
        self.diagnostics.iter().any(|d| d.block == block)
    }
}

/// Plain-language findings: the trend, any anomalies, and every correlation
/// whose magnitude exceeds `threshold`
pub fn key_insights(result: &AnalysisResult, threshold: f64) -> Vec<String> {
    let mut insights = Vec::new();

    let trend = &result.trend_analysis;
    if trend.direction != TrendDirection::Unknown {
        insights.push(format!(
            "The overall trend is {} with {:.1}% strength and is {}.",
            trend.direction.as_str().to_lowercase(),
            trend.strength,
            if trend.is_accelerating { "accelerating" } else { "decelerating" }
        ));
    }

    if result.anomalies.total_anomalies > 0 {
        insights.push(format!(
            "Detected {} anomalies in spending patterns.",
            result.anomalies.total_anomalies
        ));
    }

    for (name, value) in result.correlations.entries() {
        if value.abs() > threshold {
            let relationship = if value > 0.0 { "strong positive" } else { "strong negative" };
            insights.push(format!(
                "Found {} correlation between {}.",
                relationship,
                name.replace('_', " vs ")
            ));
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_result() -> AnalysisResult {
        AnalysisResult {
            summary: Summary::default(),
            yearly_growth: PeriodSeries::new(),
            quarterly_growth: PeriodSeries::new(),
            monthly_growth: PeriodSeries::new(),
            moving_averages: BTreeMap::new(),
            peak_months: Vec::new(),
            day_of_week_stats: Vec::new(),
            raw_monthly_spend: PeriodSeries::new(),
            trend_analysis: TrendMetrics::unknown(),
            anomalies: AnomalyReport::default(),
            purchase_patterns: PurchasePatterns::default(),
            correlations: Correlations::default(),
            seasonality_metrics: SeasonalityMetrics::unavailable("none"),
            lead_times: None,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_insights_for_trend_anomalies_and_correlations() {
        let mut result = empty_result();
        result.trend_analysis = TrendMetrics {
            direction: TrendDirection::Upward,
            strength: 12.345,
            is_accelerating: false,
            acceleration_rate: -3.0,
        };
        result.anomalies.total_anomalies = 2;
        result.correlations = Correlations {
            spend_quantity: 0.92,
            spend_leadtime: -0.75,
            quantity_leadtime: 0.7,
        };

        let insights = key_insights(&result, 0.7);
        assert_eq!(
            insights,
            vec![
                "The overall trend is upward with 12.3% strength and is decelerating.".to_string(),
                "Detected 2 anomalies in spending patterns.".to_string(),
                "Found strong positive correlation between spend vs quantity.".to_string(),
                "Found strong negative correlation between spend vs leadtime.".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_trend_produces_no_sentence() {
        assert!(key_insights(&empty_result(), 0.7).is_empty());
    }

    #[test]
    fn test_moving_averages_are_flattened() {
        let mut result = empty_result();
        result.moving_averages.insert(moving_average_key(3), PeriodSeries::new());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("moving_average_3m").is_some());
        assert!(json.get("moving_averages").is_none());
        assert!(json.get("lead_times").is_none());
        assert_eq!(json["trend_analysis"]["direction"], "Unknown");
    }
}
