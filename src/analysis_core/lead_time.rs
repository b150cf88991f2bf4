//! Lead time analysis, computed only when the dataset carries lead times

use super::aggregation::{Aggregator, Measure};
use super::period::{Granularity, PeriodSeries};
use super::stats::{median, round2};
use crate::error::BlockError;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTimeAnalysis {
    pub monthly_lead_times: PeriodSeries<f64>,
    /// Lead time in days (as written in the data) to number of transactions
    pub lead_time_distribution: BTreeMap<String, usize>,
    /// Percent of the month's transactions at or below the month's median lead time
    pub lead_time_efficiency: PeriodSeries<f64>,
}

fn distribution_label(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        format!("{}", days)
    }
}

/// `None` when no transaction has a lead time
pub fn analyze_lead_times(aggregator: &Aggregator<'_>) -> Result<Option<LeadTimeAnalysis>, BlockError> {
    let column = aggregator.column(Measure::LeadTime);
    if column.is_empty() {
        return Ok(None);
    }
    if column.iter().any(|d| !d.is_finite()) {
        return Err(BlockError::Computation("non-finite lead time".to_string()));
    }

    let monthly_lead_times = aggregator
        .mean_by(Granularity::Month, Measure::LeadTime)
        .map(|m| round2(*m));

    let mut lead_time_distribution = BTreeMap::new();
    for days in column {
        *lead_time_distribution.entry(distribution_label(days)).or_insert(0) += 1;
    }

    let lead_time_efficiency = aggregator
        .values_by(Granularity::Month, Measure::LeadTime)
        .into_iter()
        .filter_map(|(key, values)| {
            let mid = median(&values)?;
            let within = values.iter().filter(|v| **v <= mid).count();
            Some((key, round2(within as f64 / values.len() as f64 * 100.0)))
        })
        .collect();

    Ok(Some(LeadTimeAnalysis {
        monthly_lead_times,
        lead_time_distribution,
        lead_time_efficiency,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_core::features::derive_features;
    use crate::config::NegativeSpendPolicy;
    use crate::loader::RawTransaction;

    #[test]
    fn test_lead_time_block() {
        let raw = vec![
            RawTransaction::new("2023-01-02", 10.0, 1.0).with_lead_time(2.0),
            RawTransaction::new("2023-01-10", 10.0, 1.0).with_lead_time(4.0),
            RawTransaction::new("2023-01-15", 10.0, 1.0).with_lead_time(9.0),
            RawTransaction::new("2023-01-20", 10.0, 1.0).with_lead_time(10.0),
            RawTransaction::new("2023-02-01", 10.0, 1.0).with_lead_time(4.0),
            RawTransaction::new("2023-02-02", 10.0, 1.0),
        ];
        let txs = derive_features(&raw).unwrap();
        let analysis = analyze_lead_times(&Aggregator::new(&txs, NegativeSpendPolicy::Include))
            .unwrap()
            .unwrap();

        assert_eq!(analysis.monthly_lead_times.to_vec(), vec![6.25, 4.0]);
        assert_eq!(analysis.lead_time_distribution.get("4"), Some(&2));
        assert_eq!(analysis.lead_time_distribution.get("10"), Some(&1));
        // January median is 6.5: two of four at or below
        assert_eq!(analysis.lead_time_efficiency.to_vec(), vec![50.0, 100.0]);
    }

    #[test]
    fn test_absent_without_lead_times() {
        let raw = vec![RawTransaction::new("2023-01-02", 10.0, 1.0)];
        let txs = derive_features(&raw).unwrap();
        let analysis = analyze_lead_times(&Aggregator::new(&txs, NegativeSpendPolicy::Include)).unwrap();
        assert!(analysis.is_none());
    }
}
