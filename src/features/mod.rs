//! Per-entity aggregates computed once per run and shared by every estimator.

mod behavioral;
mod grid;
mod pipeline;

pub use behavioral::{ConsumerProfile, PROFILE_DIM};
pub use grid::TransformerDay;
pub use pipeline::FeatureExtractor;

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Everything the estimators need besides the raw readings.
///
/// Maps are ordered so iteration, and therefore every derived table, is deterministic.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    /// Consumer profiles keyed by consumer id
    pub consumers: BTreeMap<String, ConsumerProfile>,
    /// Row indices of each consumer's readings, in input order
    pub consumer_rows: BTreeMap<String, Vec<usize>>,
    /// Daily transformer balance keyed by (transformer id, date)
    pub transformer_days: BTreeMap<(String, NaiveDate), TransformerDay>,
}

impl FeatureSet {
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Sum of absolute daily losses over all transformer-days with a reported input.
    pub fn total_loss(&self) -> f64 {
        self.transformer_days
            .values()
            .filter_map(TransformerDay::loss)
            .map(f64::abs)
            .sum()
    }
}
