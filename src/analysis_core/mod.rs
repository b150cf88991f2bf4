//! Analysis Core - time series statistics over transaction records
//!
//! Turns raw transaction rows into growth rates, moving averages, seasonal
//! decomposition, anomaly flags, purchase patterns and correlations.
//!
//! # Architecture
//!
//! ```text
//! RawTransaction (loader) → derive_features → DecoratedTransaction
//!     ↓
//! Aggregator (PeriodSeries per year / quarter / month / day)
//!     ↓
//! growth · seasonal · anomaly · patterns · correlation · trend · lead_time
//!     ↓
//! AnalysisEngine → AnalysisResult → export (JSON, CSV or SQLite)
//! ```

pub mod aggregation;
pub mod anomaly;
pub mod correlation;
pub mod engine;
pub mod features;
pub mod growth;
pub mod lead_time;
pub mod patterns;
pub mod period;
pub mod report;
pub mod seasonal;
pub mod stats;
pub mod trend;

pub use aggregation::{Aggregator, Measure, WeekdayStats};
pub use anomaly::{detect_anomalies, AnomalyReport};
pub use correlation::{analyze_correlations, Correlations};
pub use engine::AnalysisEngine;
pub use features::{derive_features, parse_date, DecoratedTransaction};
pub use growth::{growth_rates, moving_average, peak_periods, PeakPeriod};
pub use lead_time::{analyze_lead_times, LeadTimeAnalysis};
pub use patterns::{analyze_purchase_patterns, PurchasePatterns};
pub use period::{fill_gaps, Granularity, PeriodKey, PeriodSeries};
pub use report::{key_insights, AnalysisResult, DayOfWeekRow, Diagnostic, Summary};
pub use seasonal::{analyze_seasonality, SeasonalComponents, SeasonalityMetrics};
pub use trend::{calculate_trend_metrics, TrendDirection, TrendMetrics};
