//! Pearson correlations between per-transaction measures

use super::aggregation::{Aggregator, Measure};
use super::stats::pearson;
use crate::error::BlockError;
use serde::Serialize;

/// Correlation block; degenerate pairs are reported as exactly 0.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Correlations {
    pub spend_quantity: f64,
    pub spend_leadtime: f64,
    pub quantity_leadtime: f64,
}

impl Correlations {
    /// `(name, coefficient)` pairs in a fixed order
    pub fn entries(&self) -> [(&'static str, f64); 3] {
        [
            ("spend_quantity", self.spend_quantity),
            ("spend_leadtime", self.spend_leadtime),
            ("quantity_leadtime", self.quantity_leadtime),
        ]
    }
}

/// Rows where both measures have a value
fn paired(aggregator: &Aggregator<'_>, x: Measure, y: Measure) -> (Vec<f64>, Vec<f64>) {
    aggregator
        .transactions()
        .iter()
        .filter_map(|tx| Some((aggregator.value(tx, x)?, aggregator.value(tx, y)?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .unzip()
}

fn coefficient(aggregator: &Aggregator<'_>, x: Measure, y: Measure) -> f64 {
    let (xs, ys) = paired(aggregator, x, y);
    pearson(&xs, &ys).unwrap_or(0.0)
}

pub fn analyze_correlations(aggregator: &Aggregator<'_>) -> Result<Correlations, BlockError> {
    let result = Correlations {
        spend_quantity: coefficient(aggregator, Measure::Spend, Measure::Quantity),
        spend_leadtime: coefficient(aggregator, Measure::Spend, Measure::LeadTime),
        quantity_leadtime: coefficient(aggregator, Measure::Quantity, Measure::LeadTime),
    };

    if result.entries().iter().any(|(_, r)| !(-1.0..=1.0).contains(r)) {
        return Err(BlockError::Computation(format!("coefficient out of range: {:?}", result)));
    }
    Ok(result)
}
