//! Reference-season consumption relative to a consumer's overall mean.

use super::{Estimator, EstimatorInput, RawSignal};
use crate::risk::Signal;
use crate::stats;

/// `mean(usage in reference season) / (mean(usage) + ε)`. Consumers with no reading in the
/// reference season are missing.
pub struct SeasonalEstimator;

impl Estimator for SeasonalEstimator {
    fn signal(&self) -> Signal {
        Signal::Seasonal
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let season = input.risk.reference_season.as_str();
        let eps = input.risk.epsilon;
        let values = input
            .features
            .consumer_rows
            .iter()
            .filter_map(|(id, rows)| {
                let all: Vec<f64> = rows.iter().map(|&i| input.readings[i].energy_consumed).collect();
                let in_season: Vec<f64> = rows
                    .iter()
                    .map(|&i| &input.readings[i])
                    .filter(|r| r.season == season)
                    .map(|r| r.energy_consumed)
                    .collect();
                let seasonal = stats::mean(&in_season)?;
                let overall = stats::mean(&all)?;
                Some((id.clone(), seasonal / (overall + eps)))
            })
            .collect();
        RawSignal::PerConsumer(values)
    }
}
