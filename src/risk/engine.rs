//! Runs the full scoring pipeline over one dataset and composes the report.

use super::classify::classify_all;
use super::combine::combine;
use super::estimators::{self, Estimator, EstimatorInput, RawSignal};
use super::normalize::min_max;
use super::{transformer, Signal, SignalValues};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::features::{FeatureExtractor, FeatureSet};
use crate::ingest::Dataset;
use crate::report::{ConsumerRisk, Diagnostic, RiskReport};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, info_span, warn};

pub struct RiskEngine {
    config: EngineConfig,
    estimators: Vec<Box<dyn Estimator>>,
}

impl RiskEngine {
    /// Engine with the standard six estimators. Fails on an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            estimators: estimators::standard(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score every consumer in `dataset`. Either the whole report is produced or an error is
    /// returned before any estimator runs.
    pub fn run(&self, dataset: &Dataset) -> Result<RiskReport> {
        dataset.validate()?;
        let features = FeatureExtractor::new(self.config.features.clone()).extract(dataset);
        let span = info_span!("risk_run", rows = dataset.len(), consumers = features.consumer_count());
        let _guard = span.enter();

        if features.is_empty() {
            info!("empty dataset; nothing to score");
            return Ok(RiskReport::default());
        }

        let mut diagnostics = Vec::new();
        let raw = self.estimate_all(dataset, &features);
        let signals = self.normalize_all(&raw, &features, &mut diagnostics);

        let combined = combine(
            features.consumers.keys().map(String::as_str),
            &signals,
            &self.config.risk,
        );
        for (signal, consumers) in &combined.missing {
            warn!(%signal, consumers, "consumers without a value; filled with 0");
            diagnostics.push(Diagnostic::MissingSignal {
                signal: *signal,
                consumers: *consumers,
            });
        }

        let finals: Vec<f64> = combined.scores.values().map(|c| c.final_risk).collect();
        let (thresholds, classes) = classify_all(&finals, &self.config.risk);
        match &thresholds {
            Some(t) => debug!(mild = t.mild, high = t.high, inspection = t.inspection, "thresholds"),
            None => {
                warn!(consumers = finals.len(), "constant risk distribution; all consumers normal");
                diagnostics.push(Diagnostic::DegenerateScores {
                    consumers: finals.len(),
                });
            }
        }

        let consumers: Vec<ConsumerRisk> = combined
            .scores
            .iter()
            .zip(classes)
            .filter_map(|((id, score), class)| {
                let profile = features.consumers.get(id)?;
                let s = score.signals;
                Some(ConsumerRisk {
                    consumer_id: id.clone(),
                    transformer_id: profile.transformer_id.clone(),
                    latitude: profile.latitude,
                    longitude: profile.longitude,
                    ml_anomaly_risk: s.ml_anomaly_risk,
                    stat_anomaly_risk: s.stat_anomaly_risk,
                    peer_risk: s.peer_risk,
                    transformer_loss_risk: s.transformer_loss_risk,
                    voltage_risk: s.voltage_risk,
                    seasonal_risk: s.seasonal_risk,
                    base_risk: score.base_risk,
                    final_risk: score.final_risk,
                    risk_class: class.risk_class,
                    inspection_flag: class.inspection_flag,
                    risk_percentile: class.risk_percentile,
                })
            })
            .collect();

        let counts = transformer::flag_counts(
            consumers
                .iter()
                .filter(|c| c.inspection_flag)
                .map(|c| c.transformer_id.as_str()),
        );
        let transformers_at_risk = transformer::detect(&counts, self.config.risk.iqr_multiplier);
        let total_loss_all_transformers = features.total_loss();

        info!(
            flagged = counts.values().sum::<usize>(),
            transformers_at_risk = transformers_at_risk.len(),
            total_loss = total_loss_all_transformers,
            "risk run complete"
        );

        Ok(RiskReport {
            consumers,
            total_loss_all_transformers,
            transformers_at_risk,
            thresholds,
            diagnostics,
        })
    }

    /// Run every estimator, on the rayon pool when configured. Results are keyed by signal so
    /// execution order never leaks into the output.
    fn estimate_all(&self, dataset: &Dataset, features: &FeatureSet) -> BTreeMap<Signal, RawSignal> {
        let input = EstimatorInput {
            readings: dataset.readings(),
            features,
            risk: &self.config.risk,
            model: &self.config.model,
        };
        let run = |e: &Box<dyn Estimator>| {
            let raw = e.estimate(&input);
            debug!(signal = %e.signal(), values = raw.values().len(), "estimator finished");
            (e.signal(), raw)
        };
        if self.config.run.parallel {
            self.estimators.par_iter().map(run).collect()
        } else {
            self.estimators.iter().map(run).collect()
        }
    }

    /// Normalize each signal and broadcast transformer-level signals to consumers.
    fn normalize_all(
        &self,
        raw: &BTreeMap<Signal, RawSignal>,
        features: &FeatureSet,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> BTreeMap<Signal, SignalValues> {
        let mut out = BTreeMap::new();
        for (signal, raw) in raw {
            let normalized = min_max(raw.values());
            if normalized.degenerate {
                warn!(%signal, present = raw.values().len(), "degenerate signal; normalized to 0");
                diagnostics.push(Diagnostic::DegenerateSignal {
                    signal: *signal,
                    present: raw.values().len(),
                });
            }
            let values = match raw {
                RawSignal::PerConsumer(_) => normalized.values,
                RawSignal::PerTransformer(_) => features
                    .consumers
                    .values()
                    .filter_map(|p| {
                        normalized
                            .values
                            .get(&p.transformer_id)
                            .map(|v| (p.consumer_id.clone(), *v))
                    })
                    .collect(),
            };
            out.insert(*signal, values);
        }
        out
    }
}
