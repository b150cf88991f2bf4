//! Calendar period keys and chronologically ordered series

use chrono::{Datelike, Duration, NaiveDate};
use crate::error::BlockError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Year,
    Quarter,
    Month,
    Day,
}

/// A calendar bucket. Keys of one granularity order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Year(i32),
    Quarter { year: i32, quarter: u32 },
    Month { year: i32, month: u32 },
    Day(NaiveDate),
}

impl PeriodKey {
    /// Bucket containing `date` at the given granularity
    pub fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Year => PeriodKey::Year(date.year()),
            Granularity::Quarter => PeriodKey::Quarter {
                year: date.year(),
                quarter: (date.month() - 1) / 3 + 1,
            },
            Granularity::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Day => PeriodKey::Day(date),
        }
    }

    /// The period immediately after this one, `None` past the calendar range
    pub fn next(&self) -> Option<Self> {
        let next = match *self {
            PeriodKey::Year(year) => PeriodKey::Year(year.checked_add(1)?),
            PeriodKey::Quarter { year, quarter } if quarter >= 4 => PeriodKey::Quarter {
                year: year.checked_add(1)?,
                quarter: 1,
            },
            PeriodKey::Quarter { year, quarter } => PeriodKey::Quarter {
                year,
                quarter: quarter + 1,
            },
            PeriodKey::Month { year, month } if month >= 12 => PeriodKey::Month {
                year: year.checked_add(1)?,
                month: 1,
            },
            PeriodKey::Month { year, month } => PeriodKey::Month {
                year,
                month: month + 1,
            },
            PeriodKey::Day(date) => PeriodKey::Day(date.checked_add_signed(Duration::days(1))?),
        };
        Some(next)
    }

    /// Calendar month (1-12) of a monthly key
    pub fn calendar_month(&self) -> Option<u32> {
        match self {
            PeriodKey::Month { month, .. } => Some(*month),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Year(year) => write!(f, "{}", year),
            PeriodKey::Quarter { year, quarter } => write!(f, "{}-Q{}", year, quarter),
            PeriodKey::Month { year, month } => write!(f, "{}-{:02}", year, month),
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Period-keyed series, always iterated in ascending period order
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSeries<T> {
    points: BTreeMap<PeriodKey, T>,
}

impl<T> Default for PeriodSeries<T> {
    fn default() -> Self {
        Self {
            points: BTreeMap::new(),
        }
    }
}

impl<T> PeriodSeries<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: PeriodKey, value: T) -> Option<T> {
        self.points.insert(key, value)
    }

    pub fn get(&self, key: &PeriodKey) -> Option<&T> {
        self.points.get(key)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&PeriodKey, &T)> {
        self.points.iter()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &PeriodKey> {
        self.points.keys()
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.points.values()
    }

    /// Same keys, transformed values
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> PeriodSeries<U> {
        PeriodSeries {
            points: self.points.iter().map(|(k, v)| (*k, f(v))).collect(),
        }
    }
}

impl<T: Copy> PeriodSeries<T> {
    /// Values in period order
    pub fn to_vec(&self) -> Vec<T> {
        self.points.values().copied().collect()
    }
}

impl<T> FromIterator<(PeriodKey, T)> for PeriodSeries<T> {
    fn from_iter<I: IntoIterator<Item = (PeriodKey, T)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<T: Serialize> Serialize for PeriodSeries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for (key, value) in &self.points {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

/// Upper bound on the length of a gap-filled series
pub const MAX_FILLED_PERIODS: usize = 10_000;

/// Insert default-valued (zero) points for every period missing between the
/// first and last observed period
///
/// Fails when the filled span would exceed `MAX_FILLED_PERIODS`, which happens
/// when a stray date sits decades away from the rest of the data.
pub fn fill_gaps<T: Copy + Default>(series: &PeriodSeries<T>) -> Result<PeriodSeries<T>, BlockError> {
    let (first, last) = match (series.keys().next(), series.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(PeriodSeries::new()),
    };

    let mut filled = PeriodSeries::new();
    let mut key = Some(first);
    while let Some(current) = key.filter(|k| *k <= last) {
        if filled.len() >= MAX_FILLED_PERIODS {
            return Err(BlockError::Computation(format!(
                "gap filling from {} to {} exceeds {} periods",
                first, last, MAX_FILLED_PERIODS
            )));
        }
        filled.insert(current, series.get(&current).copied().unwrap_or_default());
        key = current.next();
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_labels() {
        let d = date(2023, 11, 5);
        assert_eq!(PeriodKey::of(d, Granularity::Year).to_string(), "2023");
        assert_eq!(PeriodKey::of(d, Granularity::Quarter).to_string(), "2023-Q4");
        assert_eq!(PeriodKey::of(d, Granularity::Month).to_string(), "2023-11");
        assert_eq!(PeriodKey::of(d, Granularity::Day).to_string(), "2023-11-05");
    }

    #[test]
    fn test_series_orders_chronologically() {
        let series: PeriodSeries<f64> = vec![
            (PeriodKey::Month { year: 2024, month: 1 }, 3.0),
            (PeriodKey::Month { year: 2023, month: 12 }, 2.0),
            (PeriodKey::Month { year: 2023, month: 2 }, 1.0),
        ]
        .into_iter()
        .collect();

        let labels: Vec<String> = series.keys().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["2023-02", "2023-12", "2024-01"]);
    }

    #[test]
    fn test_next_rolls_over_year() {
        assert_eq!(
            PeriodKey::Month { year: 2023, month: 12 }.next(),
            Some(PeriodKey::Month { year: 2024, month: 1 })
        );
        assert_eq!(
            PeriodKey::Quarter { year: 2023, quarter: 4 }.next(),
            Some(PeriodKey::Quarter { year: 2024, quarter: 1 })
        );
        assert_eq!(
            PeriodKey::Day(date(2024, 2, 28)).next(),
            Some(PeriodKey::Day(date(2024, 2, 29)))
        );
    }

    #[test]
    fn test_next_stops_at_the_last_representable_day() {
        assert_eq!(PeriodKey::Day(NaiveDate::MAX).next(), None);
        assert_eq!(PeriodKey::Year(i32::MAX).next(), None);
    }

    #[test]
    fn test_fill_gaps_inserts_zero_months() {
        let series: PeriodSeries<f64> = vec![
            (PeriodKey::Month { year: 2023, month: 11 }, 5.0),
            (PeriodKey::Month { year: 2024, month: 2 }, 7.0),
        ]
        .into_iter()
        .collect();

        let filled = fill_gaps(&series).unwrap();
        assert_eq!(filled.to_vec(), vec![5.0, 0.0, 0.0, 7.0]);
    }

    #[test]
    fn test_fill_gaps_rejects_a_decades_wide_daily_span() {
        let series: PeriodSeries<f64> = vec![
            (PeriodKey::Day(date(1900, 1, 1)), 5.0),
            (PeriodKey::Day(date(2023, 6, 1)), 7.0),
        ]
        .into_iter()
        .collect();

        let err = fill_gaps(&series).unwrap_err();
        assert!(matches!(err, BlockError::Computation(_)));

        let edge: PeriodSeries<f64> = vec![
            (PeriodKey::Day(NaiveDate::MAX.pred_opt().unwrap()), 1.0),
            (PeriodKey::Day(NaiveDate::MAX), 2.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(fill_gaps(&edge).unwrap().to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_series_serializes_with_string_keys() {
        let mut series = PeriodSeries::new();
        series.insert(PeriodKey::Year(2023), None);
        series.insert(PeriodKey::Year(2024), Some(12.5));

        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(json, r#"{"2023":null,"2024":12.5}"#);
    }
}
