//! CSV transaction loader.
//!
//! Parses transaction CSV files into `RawTransaction` rows. Required columns:
//!   transaction_date, total_spend, quantity_purchased
//! Optional: lead_time_days. Any other column whose value parses as a number is
//! kept in `RawTransaction::extra`.
//!
//! Display headers used by spreadsheet exports (`Total Spend ($)`,
//! `Quantity Purchased`, `Lead Time (Days)`) are accepted as aliases.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

pub const DATE_COLUMN: &str = "transaction_date";
pub const SPEND_COLUMN: &str = "total_spend";
pub const QUANTITY_COLUMN: &str = "quantity_purchased";
pub const LEAD_TIME_COLUMN: &str = "lead_time_days";

const DATE_ALIASES: &[&str] = &["transaction_date", "transaction date"];
const SPEND_ALIASES: &[&str] = &["total_spend", "total spend ($)", "total spend"];
const QUANTITY_ALIASES: &[&str] = &["quantity_purchased", "quantity purchased"];
const LEAD_TIME_ALIASES: &[&str] = &["lead_time_days", "lead time (days)", "lead time"];

/// One transaction row as it arrives, before any date handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub transaction_date: String,
    pub total_spend: f64,
    pub quantity_purchased: f64,
    pub lead_time_days: Option<f64>,
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl RawTransaction {
    pub fn new(transaction_date: impl Into<String>, total_spend: f64, quantity_purchased: f64) -> Self {
        Self {
            transaction_date: transaction_date.into(),
            total_spend,
            quantity_purchased,
            lead_time_days: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_lead_time(mut self, days: f64) -> Self {
        self.lead_time_days = Some(days);
        self
    }
}

/// Resolved header positions for one CSV file
#[derive(Debug)]
struct ColumnMap {
    date: usize,
    spend: usize,
    quantity: usize,
    lead_time: Option<usize>,
    extra: Vec<(usize, String)>,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let date = find_column(headers, DATE_ALIASES);
        let spend = find_column(headers, SPEND_ALIASES);
        let quantity = find_column(headers, QUANTITY_ALIASES);

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push(DATE_COLUMN.to_string());
        }
        if spend.is_none() {
            missing.push(SPEND_COLUMN.to_string());
        }
        if quantity.is_none() {
            missing.push(QUANTITY_COLUMN.to_string());
        }

        match (date, spend, quantity) {
            (Some(date), Some(spend), Some(quantity)) => {
                let lead_time = find_column(headers, LEAD_TIME_ALIASES);
                let known = [Some(date), Some(spend), Some(quantity), lead_time];
                let extra = headers
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| !known.contains(&Some(*idx)))
                    .map(|(idx, name)| (idx, name.trim().to_string()))
                    .collect();

                Ok(Self {
                    date,
                    spend,
                    quantity,
                    lead_time,
                    extra,
                })
            }
            _ => Err(AnalysisError::MissingColumns(missing)),
        }
    }
}

/// Parse a numeric cell, tolerating currency symbols and thousands separators
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn required_number(record: &csv::StringRecord, idx: usize, row: usize, column: &str) -> Result<f64> {
    let raw = record.get(idx).unwrap_or("");
    parse_amount(raw).ok_or_else(|| AnalysisError::InvalidNumber {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Load transaction rows from a CSV reader.
pub fn load_transactions<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::resolve(csv_reader.headers()?)?;
    log::debug!("Resolved CSV columns: {:?}", columns);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = idx + 1;

        let lead_time_days = match columns.lead_time {
            Some(col) => {
                let raw = record.get(col).unwrap_or("");
                if raw.is_empty() {
                    None
                } else {
                    Some(required_number(&record, col, row, LEAD_TIME_COLUMN)?)
                }
            }
            None => None,
        };

        let extra = columns
            .extra
            .iter()
            .filter_map(|(col, name)| {
                record
                    .get(*col)
                    .and_then(parse_amount)
                    .map(|v| (name.clone(), v))
            })
            .collect();

        rows.push(RawTransaction {
            transaction_date: record.get(columns.date).unwrap_or("").to_string(),
            total_spend: required_number(&record, columns.spend, row, SPEND_COLUMN)?,
            quantity_purchased: required_number(&record, columns.quantity, row, QUANTITY_COLUMN)?,
            lead_time_days,
            extra,
        });
    }

    log::info!("Loaded {} transactions", rows.len());
    Ok(rows)
}

/// Load transaction rows from a CSV file path.
pub fn load_transactions_file(path: impl AsRef<std::path::Path>) -> Result<Vec<RawTransaction>> {
    let file = std::fs::File::open(path)?;
    load_transactions(file)
}
