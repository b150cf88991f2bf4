//! Calendar features derived from each transaction date

use super::period::{Granularity, PeriodKey};
use crate::error::{AnalysisError, Result};
use crate::loader::RawTransaction;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a transaction date, keeping only the calendar day
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Full English weekday name
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Transaction plus the calendar attributes every aggregation groups by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratedTransaction {
    pub transaction_date: NaiveDate,
    pub total_spend: f64,
    pub quantity_purchased: f64,
    pub lead_time_days: Option<f64>,
    pub year: i32,
    pub month: u32,
    pub quarter: u32,
    pub month_period: String,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Weekday,
}

fn serialize_weekday<S: serde::Serializer>(weekday: &Weekday, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(weekday_name(*weekday))
}

impl DecoratedTransaction {
    pub fn from_raw(raw: &RawTransaction, date: NaiveDate) -> Self {
        Self {
            transaction_date: date,
            total_spend: raw.total_spend,
            quantity_purchased: raw.quantity_purchased,
            lead_time_days: raw.lead_time_days,
            year: date.year(),
            month: date.month(),
            quarter: (date.month() - 1) / 3 + 1,
            month_period: date.format("%Y-%m").to_string(),
            weekday: date.weekday(),
        }
    }

    pub fn period(&self, granularity: Granularity) -> PeriodKey {
        PeriodKey::of(self.transaction_date, granularity)
    }
}

/// Decorate every row. Strict: the first unparseable date fails the whole run.
pub fn derive_features(rows: &[RawTransaction]) -> Result<Vec<DecoratedTransaction>> {
    rows.iter()
        .enumerate()
        .map(|(idx, raw)| {
            parse_date(&raw.transaction_date)
                .map(|date| DecoratedTransaction::from_raw(raw, date))
                .ok_or_else(|| AnalysisError::InvalidDate {
                    row: idx + 1,
                    value: raw.transaction_date.clone(),
                })
        })
        .collect()
}
