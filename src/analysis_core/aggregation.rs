//! Calendar-period aggregation over decorated transactions

use super::features::{weekday_name, DecoratedTransaction};
use super::period::{Granularity, PeriodKey, PeriodSeries};
use crate::config::NegativeSpendPolicy;
use chrono::Weekday;
use std::collections::BTreeMap;

/// Numeric field aggregated per period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Spend,
    Quantity,
    LeadTime,
}

/// Per-period running totals
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Weekday statistics row
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeekdayStats {
    pub total_spend: f64,
    pub average_spend: f64,
    pub transaction_count: usize,
    pub total_quantity: f64,
}

/// Groups one run's transactions by calendar period. Borrowed, never cached
/// across runs.
pub struct Aggregator<'a> {
    transactions: &'a [DecoratedTransaction],
    negative_spend: NegativeSpendPolicy,
}

impl<'a> Aggregator<'a> {
    pub fn new(transactions: &'a [DecoratedTransaction], negative_spend: NegativeSpendPolicy) -> Self {
        Self {
            transactions,
            negative_spend,
        }
    }

    pub fn transactions(&self) -> &'a [DecoratedTransaction] {
        self.transactions
    }

    /// Value a transaction contributes to `measure`, `None` when it contributes nothing
    pub fn value(&self, tx: &DecoratedTransaction, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Spend => self.negative_spend.apply(tx.total_spend),
            Measure::Quantity => Some(tx.quantity_purchased),
            Measure::LeadTime => tx.lead_time_days,
        }
    }

    fn accumulate(&self, granularity: Granularity, measure: Measure) -> BTreeMap<PeriodKey, Accumulator> {
        let mut groups: BTreeMap<PeriodKey, Accumulator> = BTreeMap::new();
        for tx in self.transactions {
            if let Some(value) = self.value(tx, measure) {
                groups.entry(tx.period(granularity)).or_default().add(value);
            }
        }
        groups
    }

    pub fn sum_by(&self, granularity: Granularity, measure: Measure) -> PeriodSeries<f64> {
        self.accumulate(granularity, measure)
            .into_iter()
            .map(|(key, acc)| (key, acc.sum))
            .collect()
    }

    pub fn mean_by(&self, granularity: Granularity, measure: Measure) -> PeriodSeries<f64> {
        self.accumulate(granularity, measure)
            .into_iter()
            .filter_map(|(key, acc)| acc.mean().map(|m| (key, m)))
            .collect()
    }

    /// Number of transactions per period, independent of any measure
    pub fn count_by(&self, granularity: Granularity) -> PeriodSeries<usize> {
        let mut groups: BTreeMap<PeriodKey, usize> = BTreeMap::new();
        for tx in self.transactions {
            *groups.entry(tx.period(granularity)).or_default() += 1;
        }
        groups.into_iter().collect()
    }

    /// Raw measure values grouped by period, in input order within a period
    pub fn values_by(&self, granularity: Granularity, measure: Measure) -> BTreeMap<PeriodKey, Vec<f64>> {
        let mut groups: BTreeMap<PeriodKey, Vec<f64>> = BTreeMap::new();
        for tx in self.transactions {
            if let Some(value) = self.value(tx, measure) {
                groups.entry(tx.period(granularity)).or_default().push(value);
            }
        }
        groups
    }

    /// Spend and quantity statistics per weekday, Monday first. Weekdays with no
    /// transaction are omitted.
    pub fn weekday_stats(&self) -> Vec<(&'static str, WeekdayStats)> {
        let mut spend = [Accumulator::default(); 7];
        let mut quantity = [0.0_f64; 7];
        let mut counts = [0usize; 7];

        for tx in self.transactions {
            let idx = tx.weekday.num_days_from_monday() as usize;
            counts[idx] += 1;
            quantity[idx] += tx.quantity_purchased;
            if let Some(value) = self.value(tx, Measure::Spend) {
                spend[idx].add(value);
            }
        }

        all_weekdays()
            .into_iter()
            .filter(|d| counts[d.num_days_from_monday() as usize] > 0)
            .map(|d| {
                let idx = d.num_days_from_monday() as usize;
                let stats = WeekdayStats {
                    total_spend: spend[idx].sum,
                    average_spend: spend[idx].mean().unwrap_or(0.0),
                    transaction_count: counts[idx],
                    total_quantity: quantity[idx],
                };
                (weekday_name(d), stats)
            })
            .collect()
    }

    /// Column of `measure` over every transaction, skipping rows without a value
    pub fn column(&self, measure: Measure) -> Vec<f64> {
        self.transactions
            .iter()
            .filter_map(|tx| self.value(tx, measure))
            .collect()
    }
}

fn all_weekdays() -> [Weekday; 7] {
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}
