//! Tabular view of an analysis result: one named sheet per report section

use crate::analysis_core::period::{PeriodKey, PeriodSeries};
use crate::analysis_core::report::AnalysisResult;
use crate::config::ExportSettings;
use std::collections::BTreeSet;
use std::fmt;

/// One cell. Missing statistics are `Empty`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Integer(i64),
}

impl Cell {
    fn optional(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Integer(i) => write!(f, "{}", i),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Stable section key, e.g. `yearly_growth`. Unique per workbook; backends
    /// name tables and files after it.
    pub key: String,
    /// Display name, e.g. `Yearly Growth`. User-configurable, may repeat.
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(key: &str, name: String, columns: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            name,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

}

fn growth_sheet(key: &str, name: String, label: &str, series: &PeriodSeries<Option<f64>>) -> Sheet {
    let mut sheet = Sheet::new(key, name, &[label, "Growth (%)"]);
    for (period, growth) in series.iter() {
        sheet.push(vec![period.to_string().into(), Cell::optional(*growth)]);
    }
    sheet
}

fn metric_sheet(key: &str, name: String) -> Sheet {
    Sheet::new(key, name, &["Metric", "Value"])
}

/// Build every report sheet, in workbook order
pub fn to_sheets(result: &AnalysisResult, settings: &ExportSettings) -> Vec<Sheet> {
    let mut summary = metric_sheet("summary", settings.sheet_name("summary", "Summary"));
    summary.push(vec!["Total Spend".into(), result.summary.total_spend.into()]);
    summary.push(vec!["Total Transactions".into(), result.summary.total_transactions.into()]);
    summary.push(vec!["Average Spend".into(), Cell::optional(result.summary.average_spend)]);

    let mut sheets = vec![
        summary,
        growth_sheet(
            "yearly_growth",
            settings.sheet_name("yearly_growth", "Yearly Growth"),
            "Year",
            &result.yearly_growth,
        ),
        growth_sheet(
            "monthly_growth",
            settings.sheet_name("monthly_growth", "Monthly Growth"),
            "Month",
            &result.monthly_growth,
        ),
        growth_sheet(
            "quarterly_growth",
            settings.sheet_name("quarterly_growth", "Quarterly Growth"),
            "Quarter",
            &result.quarterly_growth,
        ),
    ];

    let mut peaks = Sheet::new(
        "peak_months",
        settings.sheet_name("peak_months", "Peak Months"),
        &["Month", "Total Spend"],
    );
    for peak in &result.peak_months {
        peaks.push(vec![peak.month_period.to_string().into(), peak.total_spend.into()]);
    }
    sheets.push(peaks);

    let mut dow = Sheet::new(
        "dow_analysis",
        settings.sheet_name("dow_analysis", "Day of Week Analysis"),
        &["Day", "Total Spend", "Average Spend", "Transaction Count", "Total Quantity"],
    );
    for row in &result.day_of_week_stats {
        dow.push(vec![
            row.day.as_str().into(),
            row.total_spend.into(),
            row.average_spend.into(),
            row.transaction_count.into(),
            row.total_quantity.into(),
        ]);
    }
    sheets.push(dow);

    sheets.push(moving_average_sheet(result, settings));

    let mut monthly = Sheet::new(
        "monthly_spend",
        settings.sheet_name("monthly_spend", "Monthly Spend"),
        &["Month", "Total Spend"],
    );
    for (period, spend) in result.raw_monthly_spend.iter() {
        monthly.push(vec![period.to_string().into(), (*spend).into()]);
    }
    sheets.push(monthly);

    let trend = &result.trend_analysis;
    let mut trend_sheet = metric_sheet("trend_analysis", settings.sheet_name("trend_analysis", "Trend Analysis"));
    trend_sheet.push(vec!["Direction".into(), trend.direction.as_str().into()]);
    trend_sheet.push(vec!["Strength (%)".into(), trend.strength.into()]);
    trend_sheet.push(vec!["Is Accelerating".into(), yes_no(trend.is_accelerating).into()]);
    trend_sheet.push(vec!["Acceleration Rate".into(), trend.acceleration_rate.into()]);
    sheets.push(trend_sheet);

    sheets.push(seasonality_sheet(result, settings));
    sheets.push(seasonal_components_sheet(result, settings));

    let mut anomalies = Sheet::new(
        "anomalies",
        settings.sheet_name("anomalies", "Anomaly Detection"),
        &["Date", "Total Spend"],
    );
    for date in &result.anomalies.anomaly_dates {
        let value = result.anomalies.anomalies.get(date).copied();
        anomalies.push(vec![date.as_str().into(), Cell::optional(value)]);
    }
    sheets.push(anomalies);

    sheets.push(purchase_pattern_sheet(result, settings));

    let mut correlations = Sheet::new(
        "correlations",
        settings.sheet_name("correlations", "Correlations"),
        &["Metric Pair", "Coefficient"],
    );
    for (pair, value) in result.correlations.entries() {
        correlations.push(vec![pair.into(), value.into()]);
    }
    sheets.push(correlations);

    sheets.extend(lead_time_sheets(result, settings));

    let mut diagnostics = Sheet::new(
        "diagnostics",
        settings.sheet_name("diagnostics", "Diagnostics"),
        &["Block", "Kind", "Message"],
    );
    for diagnostic in &result.diagnostics {
        diagnostics.push(vec![
            diagnostic.block.as_str().into(),
            diagnostic.kind.as_str().into(),
            diagnostic.message.as_str().into(),
        ]);
    }
    sheets.push(diagnostics);

    sheets
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn moving_average_sheet(result: &AnalysisResult, settings: &ExportSettings) -> Sheet {
    // configured windows, ascending
    let mut windows: Vec<(usize, &PeriodSeries<Option<f64>>)> = result
        .moving_averages
        .iter()
        .filter_map(|(key, series)| {
            let window = key.strip_prefix("moving_average_")?.strip_suffix('m')?.parse().ok()?;
            Some((window, series))
        })
        .collect();
    windows.sort_by_key(|(w, _)| *w);

    let labels: Vec<String> = windows.iter().map(|(w, _)| format!("{}-Month MA", w)).collect();
    let mut columns = vec!["Month"];
    columns.extend(labels.iter().map(String::as_str));

    let mut sheet = Sheet::new(
        "moving_averages",
        settings.sheet_name("moving_averages", "Moving Averages"),
        &columns,
    );
    for period in result.raw_monthly_spend.keys() {
        let mut row = vec![period.to_string().into()];
        for (_, series) in &windows {
            row.push(Cell::optional(series.get(period).copied().flatten()));
        }
        sheet.push(row);
    }
    sheet
}

fn seasonality_sheet(result: &AnalysisResult, settings: &ExportSettings) -> Sheet {
    let metrics = &result.seasonality_metrics;
    let mut sheet = Sheet::new(
        "seasonality",
        settings.sheet_name("seasonality", "Seasonality"),
        &["Metric", "Value"],
    );

    sheet.push(vec!["Has Seasonality".into(), yes_no(metrics.has_seasonality).into()]);
    if let Some(message) = &metrics.message {
        sheet.push(vec!["Message".into(), message.as_str().into()]);
    }
    sheet.push(vec!["Seasonal Strength".into(), Cell::optional(metrics.seasonal_strength)]);
    if let Some(peak) = &metrics.peak_month {
        sheet.push(vec!["Peak Month".into(), peak.as_str().into()]);
    }
    if let Some(trough) = &metrics.trough_month {
        sheet.push(vec!["Trough Month".into(), trough.as_str().into()]);
    }
    if let Some(factors) = &metrics.seasonal_factors {
        for (month, factor) in factors {
            sheet.push(vec![format!("Seasonal Factor {}", month).into(), (*factor).into()]);
        }
    }
    sheet
}

/// Observed, trend, seasonal and residual per month; no rows when the
/// decomposition did not run
fn seasonal_components_sheet(result: &AnalysisResult, settings: &ExportSettings) -> Sheet {
    let mut sheet = Sheet::new(
        "seasonal_components",
        settings.sheet_name("seasonal_components", "Seasonal Components"),
        &["Month", "Observed", "Trend", "Seasonal", "Residual"],
    );
    if let Some(components) = &result.seasonality_metrics.components {
        for (period, seasonal) in components.seasonal.iter() {
            sheet.push(vec![
                period.to_string().into(),
                Cell::optional(result.raw_monthly_spend.get(period).copied()),
                Cell::optional(components.trend.get(period).copied().flatten()),
                (*seasonal).into(),
                Cell::optional(components.residual.get(period).copied().flatten()),
            ]);
        }
    }
    sheet
}

/// Monthly lead times with efficiency, and the lead time distribution. Both
/// sheets are present without rows when the data carries no lead times.
fn lead_time_sheets(result: &AnalysisResult, settings: &ExportSettings) -> [Sheet; 2] {
    let mut monthly = Sheet::new(
        "lead_times",
        settings.sheet_name("lead_times", "Lead Times"),
        &["Month", "Average Lead Time (Days)", "Efficiency (%)"],
    );
    let mut distribution = Sheet::new(
        "lead_time_distribution",
        settings.sheet_name("lead_time_distribution", "Lead Time Distribution"),
        &["Lead Time (Days)", "Transactions"],
    );

    if let Some(lead_times) = &result.lead_times {
        let months: BTreeSet<PeriodKey> = lead_times
            .monthly_lead_times
            .keys()
            .chain(lead_times.lead_time_efficiency.keys())
            .copied()
            .collect();
        for month in months {
            monthly.push(vec![
                month.to_string().into(),
                Cell::optional(lead_times.monthly_lead_times.get(&month).copied()),
                Cell::optional(lead_times.lead_time_efficiency.get(&month).copied()),
            ]);
        }
        for (days, count) in &lead_times.lead_time_distribution {
            distribution.push(vec![days.as_str().into(), (*count).into()]);
        }
    }
    [monthly, distribution]
}

fn purchase_pattern_sheet(result: &AnalysisResult, settings: &ExportSettings) -> Sheet {
    let patterns = &result.purchase_patterns;
    let months: BTreeSet<PeriodKey> = patterns
        .monthly_aov
        .keys()
        .chain(patterns.purchase_frequency.keys())
        .chain(patterns.basket_size.keys())
        .copied()
        .collect();

    let mut sheet = Sheet::new(
        "purchase_patterns",
        settings.sheet_name("purchase_patterns", "Purchase Patterns"),
        &["Month", "Average Order Value", "Purchase Frequency", "Basket Size"],
    );
    for month in months {
        sheet.push(vec![
            month.to_string().into(),
            Cell::optional(patterns.monthly_aov.get(&month).copied().flatten()),
            patterns
                .purchase_frequency
                .get(&month)
                .map(|c| Cell::from(*c))
                .unwrap_or(Cell::Empty),
            Cell::optional(patterns.basket_size.get(&month).copied()),
        ]);
    }
    sheet
}
