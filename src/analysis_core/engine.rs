//! Analysis Engine - runs every analytical block over one dataset
//!
//! The engine owns nothing but its settings snapshot. Each call to `analyze`
//! decorates its own copy of the rows, builds one `Aggregator` over it and runs
//! the blocks independently:
//!
//! ```text
//! RawTransaction rows
//!     ↓
//! derive_features (strict: a bad date fails the run)
//!     ↓
//! Aggregator (year / quarter / month / day / weekday)
//!     ↓
//! growth · moving averages · peaks · weekday stats · trend · anomalies
//! purchase patterns · correlations · seasonality · lead times
//!     ↓
//! AnalysisResult (+ diagnostics for every degraded block)
//! ```
//!
//! Every block, the period sums included, runs under `BlockRunner`. A block
//! that fails yields its fallback shape and a `Diagnostic`; the other blocks
//! are unaffected.

use super::aggregation::{Aggregator, Measure};
use super::anomaly::{detect_anomalies, AnomalyReport};
use super::correlation::{analyze_correlations, Correlations};
use super::features::derive_features;
use super::growth::{growth_rates, moving_average, peak_periods};
use super::lead_time::analyze_lead_times;
use super::patterns::{analyze_purchase_patterns, PurchasePatterns};
use super::period::{fill_gaps, Granularity, PeriodSeries};
use super::report::{moving_average_key, AnalysisResult, DayOfWeekRow, Diagnostic, Summary};
use super::seasonal::{analyze_seasonality, unavailable_message, SeasonalityMetrics};
use super::stats::round2;
use super::trend::{calculate_trend_metrics, TrendMetrics};
use crate::config::{AnalysisSettings, GapPolicy};
use crate::error::{BlockError, Result};
use crate::loader::{load_transactions, load_transactions_file, RawTransaction};
use std::collections::BTreeMap;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

/// Stateless analysis engine over an immutable settings snapshot
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    settings: AnalysisSettings,
}

/// Collects diagnostics while blocks run
struct BlockRunner {
    diagnostics: Vec<Diagnostic>,
}

impl BlockRunner {
    fn new() -> Self {
        Self { diagnostics: Vec::new() }
    }

    /// Run one block; on failure (error or panic) log it, record a diagnostic
    /// and return the block's fallback
    fn run<T>(
        &mut self,
        block: &str,
        compute: impl FnOnce() -> std::result::Result<T, BlockError>,
        fallback: impl FnOnce(&BlockError) -> T,
    ) -> T {
        let outcome = catch_unwind(AssertUnwindSafe(compute))
            .unwrap_or_else(|_| Err(BlockError::Computation(format!("{} panicked", block))));

        match outcome {
            Ok(value) => {
                log::debug!("{} complete", block);
                value
            }
            Err(error) => {
                if let BlockError::InsufficientData { .. } = error {
                    log::info!("{} unavailable: {}", block, error);
                } else {
                    log::warn!("⚠️  {} degraded: {}", block, error);
                }
                self.diagnostics.push(Diagnostic::new(block, &error));
                fallback(&error)
            }
        }
    }
}

impl AnalysisEngine {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    /// Spend summed per period, gap-filled per the settings. A failed fill
    /// keeps the observed periods.
    fn spend_series(
        &self,
        runner: &mut BlockRunner,
        aggregator: &Aggregator<'_>,
        granularity: Granularity,
        block: &str,
    ) -> PeriodSeries<f64> {
        let observed = runner.run(
            block,
            || Ok(aggregator.sum_by(granularity, Measure::Spend)),
            |_| PeriodSeries::new(),
        );
        match self.settings.gap_policy {
            GapPolicy::Absent => observed,
            GapPolicy::ZeroFill => runner.run(block, || fill_gaps(&observed), |_| observed.clone()),
        }
    }

    /// Run every block over `rows`
    ///
    /// Fails only on structural problems (unparseable dates). Statistical
    /// problems degrade individual blocks and are listed in `diagnostics`.
    pub fn analyze(&self, rows: &[RawTransaction]) -> Result<AnalysisResult> {
        let settings = &self.settings;
        let transactions = derive_features(rows)?;
        let aggregator = Aggregator::new(&transactions, settings.negative_spend);
        let mut runner = BlockRunner::new();

        log::debug!("Decorated {} transactions", transactions.len());

        let yearly = self.spend_series(&mut runner, &aggregator, Granularity::Year, "yearly_spend");
        let quarterly = self.spend_series(&mut runner, &aggregator, Granularity::Quarter, "quarterly_spend");
        let monthly = self.spend_series(&mut runner, &aggregator, Granularity::Month, "monthly_spend");
        let daily = self.spend_series(&mut runner, &aggregator, Granularity::Day, "daily_spend");

        let summary = runner.run(
            "summary",
            || {
                let spend_column = aggregator.column(Measure::Spend);
                let total_spend: f64 = spend_column.iter().sum();
                Ok(Summary {
                    total_spend: round2(total_spend),
                    total_transactions: transactions.len(),
                    average_spend: if spend_column.is_empty() {
                        None
                    } else {
                        Some(round2(total_spend / spend_column.len() as f64))
                    },
                })
            },
            |_| Summary {
                total_transactions: transactions.len(),
                ..Summary::default()
            },
        );

        let yearly_growth = runner.run("yearly_growth", || growth_rates(&yearly), |_| PeriodSeries::new());
        let quarterly_growth = runner.run("quarterly_growth", || growth_rates(&quarterly), |_| PeriodSeries::new());
        let monthly_growth = runner.run("monthly_growth", || growth_rates(&monthly), |_| PeriodSeries::new());

        let mut moving_averages = BTreeMap::new();
        for &window in &settings.moving_average_windows {
            let key = moving_average_key(window);
            let series = runner.run(
                &key,
                || {
                    if window == 0 {
                        return Err(BlockError::InvalidParameter {
                            name: "moving_average_windows".to_string(),
                            reason: "window must be at least 1".to_string(),
                        });
                    }
                    Ok(moving_average(&monthly, window))
                },
                |_| PeriodSeries::new(),
            );
            moving_averages.insert(key, series);
        }

        let peak_months = runner.run(
            "peak_months",
            || Ok(peak_periods(&monthly, settings.top_peak_months)),
            |_| Vec::new(),
        );

        let day_of_week_stats = runner.run(
            "day_of_week_stats",
            || {
                Ok(aggregator
                    .weekday_stats()
                    .into_iter()
                    .map(|(day, stats)| DayOfWeekRow {
                        day: day.to_string(),
                        total_spend: round2(stats.total_spend),
                        average_spend: round2(stats.average_spend),
                        transaction_count: stats.transaction_count,
                        total_quantity: round2(stats.total_quantity),
                    })
                    .collect())
            },
            |_| Vec::new(),
        );

        let trend_analysis = runner.run(
            "trend_analysis",
            || calculate_trend_metrics(&monthly_growth),
            |_| TrendMetrics::unknown(),
        );

        let anomalies = runner.run(
            "anomalies",
            || detect_anomalies(&daily, settings.anomaly_detection_window, settings.anomaly_std_threshold),
            |_| AnomalyReport::default(),
        );

        let purchase_patterns = runner.run(
            "purchase_patterns",
            || analyze_purchase_patterns(&aggregator, settings.gap_policy),
            |_| PurchasePatterns::default(),
        );

        let correlations = runner.run(
            "correlations",
            || analyze_correlations(&aggregator),
            |_| Correlations::default(),
        );

        let min_months = settings.min_months_for_seasonality;
        let seasonality_metrics = runner.run(
            "seasonality_metrics",
            || analyze_seasonality(&monthly, min_months),
            |error| SeasonalityMetrics::unavailable(unavailable_message(error, min_months)),
        );

        let lead_times = runner.run("lead_times", || analyze_lead_times(&aggregator), |_| None);

        log::info!(
            "Analyzed {} transactions over {} months ({} degraded blocks)",
            summary.total_transactions,
            monthly.len(),
            runner.diagnostics.len()
        );

        Ok(AnalysisResult {
            summary,
            yearly_growth,
            quarterly_growth,
            monthly_growth,
            moving_averages,
            peak_months,
            day_of_week_stats,
            raw_monthly_spend: monthly,
            trend_analysis,
            anomalies,
            purchase_patterns,
            correlations,
            seasonality_metrics,
            lead_times,
            diagnostics: runner.diagnostics,
        })
    }

    /// Load CSV rows from `reader` and analyze them
    pub fn analyze_csv<R: Read>(&self, reader: R) -> Result<AnalysisResult> {
        let rows = load_transactions(reader)?;
        self.analyze(&rows)
    }

    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisResult> {
        let rows = load_transactions_file(path)?;
        self.analyze(&rows)
    }
}
