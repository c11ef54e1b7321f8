//! The six independent risk estimators.
//!
//! Every estimator is a pure function of the readings and the aggregated features. None reads
//! another's output, so they can run in any order or concurrently.

mod behavioral;
mod grid;
mod seasonal;

pub use behavioral::{MlAnomalyEstimator, StatAnomalyEstimator};
pub use grid::{PeerEstimator, TransformerLossEstimator, VoltageEstimator};
pub use seasonal::SeasonalEstimator;

use super::{Signal, SignalValues};
use crate::config::{ModelConfig, RiskConfig};
use crate::features::FeatureSet;
use crate::ingest::Reading;

/// Raw, unnormalized estimator output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSignal {
    /// One value per consumer id
    PerConsumer(SignalValues),
    /// One value per transformer id, broadcast to consumers after normalization
    PerTransformer(SignalValues),
}

impl RawSignal {
    pub fn values(&self) -> &SignalValues {
        match self {
            RawSignal::PerConsumer(v) | RawSignal::PerTransformer(v) => v,
        }
    }
}

/// Shared, read-only inputs of one run.
pub struct EstimatorInput<'a> {
    pub readings: &'a [Reading],
    pub features: &'a FeatureSet,
    pub risk: &'a RiskConfig,
    pub model: &'a ModelConfig,
}

pub trait Estimator: Send + Sync {
    fn signal(&self) -> Signal;

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal;
}

/// The standard estimator set, one per [`Signal`].
pub fn standard() -> Vec<Box<dyn Estimator>> {
    vec![
        Box::new(MlAnomalyEstimator),
        Box::new(StatAnomalyEstimator),
        Box::new(PeerEstimator),
        Box::new(TransformerLossEstimator),
        Box::new(VoltageEstimator),
        Box::new(SeasonalEstimator),
    ]
}
