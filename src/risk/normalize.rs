//! Min-max scaling of one signal across the run's cohort.

use super::SignalValues;
use crate::stats;

/// Result of normalizing one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub values: SignalValues,
    /// All present values were equal (or there was at most one)
    pub degenerate: bool,
}

/// Rescale to `(x − min) / (max − min)`. A degenerate range maps every entry to 0.
pub fn min_max(values: &SignalValues) -> Normalized {
    let raw: Vec<f64> = values.values().copied().collect();
    let (Some(lo), Some(hi)) = (stats::min(&raw), stats::max(&raw)) else {
        return Normalized {
            values: SignalValues::new(),
            degenerate: true,
        };
    };
    let range = hi - lo;
    if !(range > 0.0) || !range.is_finite() {
        return Normalized {
            values: values.keys().map(|k| (k.clone(), 0.0)).collect(),
            degenerate: true,
        };
    }
    Normalized {
        values: values
            .iter()
            .map(|(k, v)| (k.clone(), ((v - lo) / range).clamp(0.0, 1.0)))
            .collect(),
        degenerate: false,
    }
}
