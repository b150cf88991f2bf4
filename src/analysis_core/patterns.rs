//! Monthly purchase patterns: average order value, frequency and basket size

use super::aggregation::{Aggregator, Measure};
use super::period::{fill_gaps, Granularity, PeriodSeries};
use super::stats::round2;
use crate::config::GapPolicy;
use crate::error::BlockError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PurchasePatterns {
    /// Spend per transaction; absent for a month without transactions
    pub monthly_aov: PeriodSeries<Option<f64>>,
    pub purchase_frequency: PeriodSeries<usize>,
    /// Mean quantity per transaction
    pub basket_size: PeriodSeries<f64>,
}

/// With `GapPolicy::ZeroFill` months without transactions appear with a zero
/// frequency and an absent AOV.
pub fn analyze_purchase_patterns(aggregator: &Aggregator<'_>, gaps: GapPolicy) -> Result<PurchasePatterns, BlockError> {
    let spend = aggregator.sum_by(Granularity::Month, Measure::Spend);
    let frequency = match gaps {
        GapPolicy::Absent => aggregator.count_by(Granularity::Month),
        GapPolicy::ZeroFill => fill_gaps(&aggregator.count_by(Granularity::Month))?,
    };
    let quantity = aggregator.mean_by(Granularity::Month, Measure::Quantity);

    let monthly_aov = frequency
        .iter()
        .map(|(key, count)| {
            let aov = match (spend.get(key), *count) {
                (_, 0) => None,
                (Some(total), count) => Some(round2(total / count as f64)),
                // every transaction in the month was dropped by the spend policy
                (None, _) => Some(0.0),
            };
            (*key, aov)
        })
        .collect();

    if quantity.values().any(|q| !q.is_finite()) {
        return Err(BlockError::Computation("non-finite basket size".to_string()));
    }

    Ok(PurchasePatterns {
        monthly_aov,
        purchase_frequency: frequency,
        basket_size: quantity.map(|q| round2(*q)),
    })
}
