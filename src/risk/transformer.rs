//! Transformers with an unusual concentration of inspection-flagged consumers.

use crate::report::TransformerAlert;
use crate::stats;
use std::collections::BTreeMap;

/// Count flagged consumers per transformer. Transformers without a flag do not appear.
pub fn flag_counts<'a>(flagged_transformers: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for t in flagged_transformers {
        *counts.entry(t.to_string()).or_insert(0) += 1;
    }
    counts
}

/// `Q3 + k·(Q3 − Q1)` over the counts; `None` when there are no counts.
pub fn iqr_threshold(counts: &BTreeMap<String, usize>, multiplier: f64) -> Option<f64> {
    let values: Vec<f64> = counts.values().map(|c| *c as f64).collect();
    let q1 = stats::quantile(&values, 0.25)?;
    let q3 = stats::quantile(&values, 0.75)?;
    Some(q3 + multiplier * (q3 - q1))
}

/// Transformers whose count strictly exceeds the IQR threshold, ordered by id.
pub fn detect(counts: &BTreeMap<String, usize>, multiplier: f64) -> Vec<TransformerAlert> {
    let Some(threshold) = iqr_threshold(counts, multiplier) else {
        return Vec::new();
    };
    counts
        .iter()
        .filter(|(_, c)| **c as f64 > threshold)
        .map(|(t, c)| TransformerAlert {
            transformer_id: t.clone(),
            anomalies_detected: *c,
        })
        .collect()
}
