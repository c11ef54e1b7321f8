//! Consumption statistics over one consumer's series.

use crate::ingest::Reading;
use crate::stats;
use serde::{Deserialize, Serialize};

/// Number of features fed to the isolation forest.
pub const PROFILE_DIM: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsumerProfile {
    pub consumer_id: String,
    /// First-seen transformer
    pub transformer_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub readings: usize,
    pub mean_usage: f64,
    /// Sample standard deviation; 0 for a single reading
    pub std_usage: f64,
    pub min_usage: f64,
    pub max_usage: f64,
    /// Last reading minus first reading
    pub trend: f64,
}

impl ConsumerProfile {
    /// Build from one consumer's rows, given in the order that defines `trend`.
    /// Returns `None` for an empty series.
    pub fn from_series(rows: &[&Reading]) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;
        let usage: Vec<f64> = rows.iter().map(|r| r.energy_consumed).collect();
        Some(Self {
            consumer_id: first.consumer_id.clone(),
            transformer_id: first.transformer_id.clone(),
            latitude: first.latitude,
            longitude: first.longitude,
            readings: usage.len(),
            mean_usage: stats::mean(&usage)?,
            std_usage: stats::sample_std(&usage).unwrap_or(0.0),
            min_usage: stats::min(&usage)?,
            max_usage: stats::max(&usage)?,
            trend: last.energy_consumed - first.energy_consumed,
        })
    }

    /// Feature row for the anomaly model
    pub fn to_vector(&self) -> [f64; PROFILE_DIM] {
        [
            self.mean_usage,
            self.std_usage,
            self.min_usage,
            self.max_usage,
            self.trend,
        ]
    }
}
