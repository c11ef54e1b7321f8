//! Engine configuration. The defaults are the production scoring constants.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Defaults applied while turning input tables into readings
    pub ingest: IngestConfig,
    /// Feature aggregation options
    pub features: FeaturesConfig,
    /// Isolation forest parameters
    pub model: ModelConfig,
    /// Estimator constants, weights and classification thresholds
    pub risk: RiskConfig,
    /// Execution options for a single run
    pub run: RunConfig,
    /// Summary options
    pub report: ReportConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Substitute `energy_consumed * input_fill_factor` for a missing `energy_input`
    pub fill_missing_input: bool,
    pub input_fill_factor: f64,
    pub default_voltage: f64,
    pub default_voltage_variance: f64,
    pub default_season: String,
    pub default_temperature: f64,
    /// Centre of the synthetic coordinate cluster (latitude, longitude)
    pub reference_point: (f64, f64),
    /// Maximum offset in degrees from `reference_point`
    pub coordinate_spread: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Sort each consumer's readings by date before computing trend
    pub sort_by_date: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub n_estimators: usize,
    /// Expected share of outliers (0.0–0.5)
    pub contamination: f64,
    /// Upper bound on the per-tree subsample
    pub max_samples: usize,
    /// Seed for the forest; part of the output contract
    pub seed: u64,
}

/// Linear weights of the six signals in `base_risk`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub transformer_loss: f64,
    pub peer: f64,
    pub ml_anomaly: f64,
    pub stat_anomaly: f64,
    pub voltage: f64,
    pub seasonal: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub weights: SignalWeights,
    pub sharpening_exponent: f64,
    /// Guard added to or substituted for statistics that can be exactly zero
    pub epsilon: f64,
    /// Voltage drops below this many standard deviations are ignored
    pub voltage_sigma: f64,
    pub reference_season: String,
    pub inspection_quantile: f64,
    pub inspection_sigma: f64,
    pub high_quantile: f64,
    pub mild_quantile: f64,
    pub iqr_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Run the six estimators on the rayon pool
    pub parallel: bool,
    /// Budget for one whole run (binary only)
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Cost per unit of lost energy used by the run summary
    pub loss_tariff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fill_missing_input: true,
            input_fill_factor: 1.05,
            default_voltage: 230.0,
            default_voltage_variance: 0.0,
            default_season: "unknown".to_string(),
            default_temperature: 25.0,
            reference_point: (28.6139, 77.2090),
            coordinate_spread: 0.1,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            contamination: 0.08,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            transformer_loss: 0.30,
            peer: 0.22,
            ml_anomaly: 0.18,
            stat_anomaly: 0.07,
            voltage: 0.15,
            seasonal: 0.08,
        }
    }
}

impl SignalWeights {
    pub fn sum(&self) -> f64 {
        self.transformer_loss
            + self.peer
            + self.ml_anomaly
            + self.stat_anomaly
            + self.voltage
            + self.seasonal
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            sharpening_exponent: 1.6,
            epsilon: 1e-6,
            voltage_sigma: 1.5,
            reference_season: "monsoon".to_string(),
            inspection_quantile: 0.97,
            inspection_sigma: 2.0,
            high_quantile: 0.8,
            mild_quantile: 0.5,
            iqr_multiplier: 1.5,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            timeout_secs: None,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { loss_tariff: 9.0 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl EngineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<EngineConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "malformed config; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults")
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        let sum = self.risk.weights.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(EngineError::Config(format!(
                "signal weights must sum to 1.0, got {sum}"
            )));
        }
        let w = &self.risk.weights;
        if [w.transformer_loss, w.peer, w.ml_anomaly, w.stat_anomaly, w.voltage, w.seasonal]
            .iter()
            .any(|x| *x < 0.0)
        {
            return Err(EngineError::Config("signal weights must be non-negative".into()));
        }
        if !(self.model.contamination > 0.0 && self.model.contamination <= 0.5) {
            return Err(EngineError::Config(format!(
                "contamination must be in (0, 0.5], got {}",
                self.model.contamination
            )));
        }
        if self.model.n_estimators == 0 || self.model.max_samples == 0 {
            return Err(EngineError::Config(
                "n_estimators and max_samples must be positive".into(),
            ));
        }
        if self.risk.sharpening_exponent <= 0.0 {
            return Err(EngineError::Config("sharpening_exponent must be positive".into()));
        }
        if !(self.risk.epsilon > 0.0) {
            return Err(EngineError::Config("epsilon must be positive".into()));
        }
        for (name, q) in [
            ("inspection_quantile", self.risk.inspection_quantile),
            ("high_quantile", self.risk.high_quantile),
            ("mild_quantile", self.risk.mild_quantile),
        ] {
            if !(0.0..=1.0).contains(&q) {
                return Err(EngineError::Config(format!("{name} must be in [0, 1], got {q}")));
            }
        }
        if !(self.risk.mild_quantile <= self.risk.high_quantile
            && self.risk.high_quantile <= self.risk.inspection_quantile)
        {
            return Err(EngineError::Config(
                "quantiles must satisfy mild <= high <= inspection".into(),
            ));
        }
        Ok(())
    }
}
