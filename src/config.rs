//! Analysis and export settings
//!
//! The engine only ever sees an immutable `AnalysisSettings` snapshot passed in at
//! construction. Editing and persisting happen on a separate `Config` value
//! (see `persistence`), so a settings change never races a run in flight.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;

/// How negative spend amounts (returns, refunds) enter spend-based measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativeSpendPolicy {
    /// Keep the signed amount
    #[default]
    Include,
    /// Drop negative amounts from spend sums and means
    Exclude,
    /// Count negative amounts as zero spend
    ClampZero,
}

impl NegativeSpendPolicy {
    /// Effective spend contribution of one amount, `None` when it is dropped
    pub fn apply(&self, amount: f64) -> Option<f64> {
        match self {
            NegativeSpendPolicy::Include => Some(amount),
            NegativeSpendPolicy::Exclude if amount < 0.0 => None,
            NegativeSpendPolicy::ClampZero if amount < 0.0 => Some(0.0),
            _ => Some(amount),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "include" => Some(NegativeSpendPolicy::Include),
            "exclude" => Some(NegativeSpendPolicy::Exclude),
            "clamp_zero" | "clamp" => Some(NegativeSpendPolicy::ClampZero),
            _ => None,
        }
    }
}

/// How calendar periods without any transaction are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Periods without transactions do not exist in the series
    #[default]
    Absent,
    /// Periods between the first and last observation are synthesized as zero
    ZeroFill,
}

impl GapPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "absent" => Some(GapPolicy::Absent),
            "zero_fill" | "zero" => Some(GapPolicy::ZeroFill),
            _ => None,
        }
    }
}

/// Settings read by the analysis engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub min_months_for_seasonality: usize,
    pub moving_average_windows: Vec<usize>,
    pub top_peak_months: usize,
    pub anomaly_detection_window: usize,
    pub anomaly_std_threshold: f64,
    pub trend_significance_threshold: f64,
    pub correlation_strength_threshold: f64,
    pub negative_spend: NegativeSpendPolicy,
    pub gap_policy: GapPolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            min_months_for_seasonality: 12,
            moving_average_windows: vec![3, 6],
            top_peak_months: 5,
            anomaly_detection_window: 7,
            anomaly_std_threshold: 2.0,
            trend_significance_threshold: 0.05,
            correlation_strength_threshold: 0.7,
            negative_spend: NegativeSpendPolicy::Include,
            gap_policy: GapPolicy::Absent,
        }
    }
}

impl AnalysisSettings {
    /// Apply environment overrides on top of the current values
    ///
    /// Environment variables:
    /// - `TIMEFLOW_MIN_MONTHS`
    /// - `TIMEFLOW_ANOMALY_WINDOW`
    /// - `TIMEFLOW_ANOMALY_THRESHOLD`
    /// - `TIMEFLOW_CORRELATION_THRESHOLD`
    /// - `TIMEFLOW_MA_WINDOWS` (comma-separated, e.g. `3,6,12`)
    /// - `TIMEFLOW_TOP_PEAKS`
    /// - `TIMEFLOW_NEGATIVE_SPEND` (`include` / `exclude` / `clamp_zero`)
    /// - `TIMEFLOW_GAP_POLICY` (`absent` / `zero_fill`)
    pub fn with_env_overrides(mut self) -> Self {
        self.min_months_for_seasonality = env::var("TIMEFLOW_MIN_MONTHS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.min_months_for_seasonality);

        self.anomaly_detection_window = env::var("TIMEFLOW_ANOMALY_WINDOW")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.anomaly_detection_window);

        self.anomaly_std_threshold = env::var("TIMEFLOW_ANOMALY_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.anomaly_std_threshold);

        self.correlation_strength_threshold = env::var("TIMEFLOW_CORRELATION_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.correlation_strength_threshold);

        if let Ok(raw) = env::var("TIMEFLOW_MA_WINDOWS") {
            let windows: Vec<usize> = raw
                .split(',')
                .filter_map(|w| w.trim().parse().ok())
                .collect();
            if windows.is_empty() {
                log::warn!("Invalid TIMEFLOW_MA_WINDOWS '{}', keeping {:?}", raw, self.moving_average_windows);
            } else {
                self.moving_average_windows = windows;
            }
        }

        self.top_peak_months = env::var("TIMEFLOW_TOP_PEAKS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.top_peak_months);

        if let Ok(raw) = env::var("TIMEFLOW_NEGATIVE_SPEND") {
            match NegativeSpendPolicy::from_str(&raw) {
                Some(policy) => self.negative_spend = policy,
                None => log::warn!("Invalid TIMEFLOW_NEGATIVE_SPEND '{}', keeping {:?}", raw, self.negative_spend),
            }
        }

        if let Ok(raw) = env::var("TIMEFLOW_GAP_POLICY") {
            match GapPolicy::from_str(&raw) {
                Some(policy) => self.gap_policy = policy,
                None => log::warn!("Invalid TIMEFLOW_GAP_POLICY '{}', keeping {:?}", raw, self.gap_policy),
            }
        }

        self
    }

    /// Reject values no analysis could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_months_for_seasonality == 0 {
            return Err(ConfigError::InvalidValue(
                "min_months_for_seasonality must be at least 1".to_string(),
            ));
        }
        if self.anomaly_detection_window == 0 {
            return Err(ConfigError::InvalidValue(
                "anomaly_detection_window must be at least 1".to_string(),
            ));
        }
        if !(self.anomaly_std_threshold > 0.0) {
            return Err(ConfigError::InvalidValue(
                "anomaly_std_threshold must be positive".to_string(),
            ));
        }
        if !(self.correlation_strength_threshold > 0.0 && self.correlation_strength_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue(
                "correlation_strength_threshold must be in (0, 1]".to_string(),
            ));
        }
        if self.moving_average_windows.iter().any(|&w| w == 0) {
            return Err(ConfigError::InvalidValue(
                "moving_average_windows must all be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_sheet_names() -> BTreeMap<String, String> {
    [
        ("yearly_growth", "Yearly Growth"),
        ("monthly_growth", "Monthly Growth"),
        ("seasonality", "Seasonal Analysis"),
        ("dow_analysis", "Day of Week Analysis"),
        ("anomalies", "Anomaly Detection"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Settings read by the export writers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub excel_sheet_names: BTreeMap<String, String>,
    pub default_filename_prefix: String,
    pub export_formats: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            excel_sheet_names: default_sheet_names(),
            default_filename_prefix: "time_analysis".to_string(),
            export_formats: vec!["excel".to_string(), "csv".to_string(), "json".to_string()],
        }
    }
}

impl ExportSettings {
    /// Display name for a sheet, honoring user overrides
    pub fn sheet_name(&self, key: &str, fallback: &str) -> String {
        self.excel_sheet_names
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Full persisted configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
    pub export: ExportSettings,
}

impl Config {
    /// Immutable copy of the analysis settings for one run
    pub fn snapshot(&self) -> AnalysisSettings {
        self.analysis.clone()
    }
}
