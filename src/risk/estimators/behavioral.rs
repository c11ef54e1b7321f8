//! Behavioural estimators over consumer profiles.

use super::{Estimator, EstimatorInput, RawSignal};
use crate::features::PROFILE_DIM;
use crate::model::{IsolationForest, RobustScaler};
use crate::risk::{Signal, SignalValues};
use ndarray::Array2;

/// Isolation-forest outlier label, flipped so outliers score `1` and inliers `-1`.
pub struct MlAnomalyEstimator;

impl Estimator for MlAnomalyEstimator {
    fn signal(&self) -> Signal {
        Signal::MlAnomaly
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let profiles: Vec<_> = input.features.consumers.values().collect();
        let n = profiles.len();
        if n < 2 {
            // nothing to compare against
            return RawSignal::PerConsumer(
                profiles.iter().map(|p| (p.consumer_id.clone(), 0.0)).collect(),
            );
        }

        let rows: Vec<[f64; PROFILE_DIM]> = profiles.iter().map(|p| p.to_vector()).collect();
        let x = Array2::from_shape_fn((n, PROFILE_DIM), |(i, j)| rows[i][j]);
        let scaled = RobustScaler::fit_transform(x.view());

        let Some(forest) = IsolationForest::fit(scaled.view(), input.model) else {
            return RawSignal::PerConsumer(SignalValues::new());
        };
        let labels = forest.predict(scaled.view());
        tracing::debug!(
            consumers = n,
            outliers = labels.iter().filter(|l| **l < 0).count(),
            offset = forest.offset(),
            "isolation forest fitted"
        );

        RawSignal::PerConsumer(
            profiles
                .iter()
                .zip(labels.iter())
                .map(|(p, label)| (p.consumer_id.clone(), -f64::from(*label)))
                .collect(),
        )
    }
}

/// Depth of the consumer's dips: `(mean − min) / (std + ε)`.
/// Consumers with a single reading have no spread and are left out.
pub struct StatAnomalyEstimator;

impl Estimator for StatAnomalyEstimator {
    fn signal(&self) -> Signal {
        Signal::StatAnomaly
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let eps = input.risk.epsilon;
        RawSignal::PerConsumer(
            input
                .features
                .consumers
                .values()
                .filter(|p| p.readings >= 2)
                .map(|p| {
                    let dip = (p.mean_usage - p.min_usage) / (p.std_usage + eps);
                    (p.consumer_id.clone(), dip)
                })
                .collect(),
        )
    }
}
