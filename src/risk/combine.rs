//! Outer join of the normalized signals and the weighted, sharpened combination.

use super::{Signal, SignalValues};
use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The six normalized signals of one consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub ml_anomaly_risk: f64,
    pub stat_anomaly_risk: f64,
    pub peer_risk: f64,
    pub transformer_loss_risk: f64,
    pub voltage_risk: f64,
    pub seasonal_risk: f64,
}

impl SignalScores {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::MlAnomaly => self.ml_anomaly_risk,
            Signal::StatAnomaly => self.stat_anomaly_risk,
            Signal::Peer => self.peer_risk,
            Signal::TransformerLoss => self.transformer_loss_risk,
            Signal::Voltage => self.voltage_risk,
            Signal::Seasonal => self.seasonal_risk,
        }
    }

    pub fn set(&mut self, signal: Signal, value: f64) {
        let slot = match signal {
            Signal::MlAnomaly => &mut self.ml_anomaly_risk,
            Signal::StatAnomaly => &mut self.stat_anomaly_risk,
            Signal::Peer => &mut self.peer_risk,
            Signal::TransformerLoss => &mut self.transformer_loss_risk,
            Signal::Voltage => &mut self.voltage_risk,
            Signal::Seasonal => &mut self.seasonal_risk,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedScore {
    pub signals: SignalScores,
    pub base_risk: f64,
    pub final_risk: f64,
}

impl CombinedScore {
    pub fn from_signals(signals: SignalScores, config: &RiskConfig) -> Self {
        let base_risk = Signal::ALL
            .iter()
            .map(|s| s.weight(&config.weights) * signals.get(*s))
            .sum::<f64>()
            .clamp(0.0, 1.0);
        Self {
            signals,
            base_risk,
            final_risk: sharpen(base_risk, config.sharpening_exponent),
        }
    }
}

/// Power-law sharpening; spreads high scores and compresses low ones on [0, 1].
pub fn sharpen(base_risk: f64, exponent: f64) -> f64 {
    base_risk.powf(exponent)
}

/// Joined scores plus, per signal, how many consumers had no value and were filled with 0.
#[derive(Debug, Clone, Default)]
pub struct Combined {
    pub scores: BTreeMap<String, CombinedScore>,
    pub missing: BTreeMap<Signal, usize>,
}

/// Left-join every signal onto `consumers`; a consumer absent from a signal gets 0 for it.
pub fn combine<'a>(
    consumers: impl IntoIterator<Item = &'a str>,
    signals: &BTreeMap<Signal, SignalValues>,
    config: &RiskConfig,
) -> Combined {
    let mut out = Combined::default();
    for id in consumers {
        let mut scores = SignalScores::default();
        for signal in Signal::ALL {
            match signals.get(&signal).and_then(|v| v.get(id)) {
                Some(v) => scores.set(signal, *v),
                None => *out.missing.entry(signal).or_insert(0) += 1,
            }
        }
        out.scores
            .insert(id.to_string(), CombinedScore::from_signals(scores, config));
    }
    out
}
