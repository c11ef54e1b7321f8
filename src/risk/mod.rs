//! Multi-signal risk scoring: estimators → normalization → weighted combination →
//! classification → transformer outliers.

pub mod classify;
pub mod combine;
mod engine;
pub mod estimators;
pub mod normalize;
pub mod transformer;

pub use classify::{RiskClass, Thresholds};
pub use combine::{CombinedScore, SignalScores};
pub use engine::RiskEngine;
pub use estimators::{Estimator, EstimatorInput, RawSignal};

use crate::config::SignalWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Values of one signal keyed by consumer (or transformer) id. Absent keys are missing values.
pub type SignalValues = BTreeMap<String, f64>;

/// The six risk signals, serialized under their output column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "ml_anomaly_risk")]
    MlAnomaly,
    #[serde(rename = "stat_anomaly_risk")]
    StatAnomaly,
    #[serde(rename = "peer_risk")]
    Peer,
    #[serde(rename = "transformer_loss_risk")]
    TransformerLoss,
    #[serde(rename = "voltage_risk")]
    Voltage,
    #[serde(rename = "seasonal_risk")]
    Seasonal,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Signal::MlAnomaly,
        Signal::StatAnomaly,
        Signal::Peer,
        Signal::TransformerLoss,
        Signal::Voltage,
        Signal::Seasonal,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Signal::MlAnomaly => "ml_anomaly_risk",
            Signal::StatAnomaly => "stat_anomaly_risk",
            Signal::Peer => "peer_risk",
            Signal::TransformerLoss => "transformer_loss_risk",
            Signal::Voltage => "voltage_risk",
            Signal::Seasonal => "seasonal_risk",
        }
    }

    pub fn weight(self, weights: &SignalWeights) -> f64 {
        match self {
            Signal::MlAnomaly => weights.ml_anomaly,
            Signal::StatAnomaly => weights.stat_anomaly,
            Signal::Peer => weights.peer,
            Signal::TransformerLoss => weights.transformer_loss,
            Signal::Voltage => weights.voltage,
            Signal::Seasonal => weights.seasonal,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}
