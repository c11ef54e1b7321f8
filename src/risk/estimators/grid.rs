//! Topology-aware estimators: transformer loss, peer comparison and voltage quality.

use super::{Estimator, EstimatorInput, RawSignal};
use crate::risk::{Signal, SignalValues};
use crate::stats;
use ndarray::{Array1, Zip};
use std::collections::BTreeMap;

/// Standard deviation with undefined or zero spread replaced by `eps`.
fn guarded_std(values: &[f64], eps: f64) -> f64 {
    match stats::sample_std(values) {
        Some(s) if s > 0.0 => s,
        _ => eps,
    }
}

/// Mean per key of `(key, value)` pairs.
fn mean_by_key(pairs: impl IntoIterator<Item = (String, f64)>) -> SignalValues {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (k, v) in pairs {
        let e = acc.entry(k).or_insert((0.0, 0));
        e.0 += v;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Mean daily loss ratio per transformer. Days without a usable input are skipped and a
/// transformer with no usable day is missing rather than zero.
pub struct TransformerLossEstimator;

impl Estimator for TransformerLossEstimator {
    fn signal(&self) -> Signal {
        Signal::TransformerLoss
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let ratios = input
            .features
            .transformer_days
            .values()
            .filter_map(|day| day.loss_ratio().map(|r| (day.transformer_id.clone(), r)));
        RawSignal::PerTransformer(mean_by_key(ratios))
    }
}

/// How far a consumer's mean usage falls below the mean of its transformer's consumers, in
/// units of the peer standard deviation. Consumers above their peers score 0.
pub struct PeerEstimator;

impl Estimator for PeerEstimator {
    fn signal(&self) -> Signal {
        Signal::Peer
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let eps = input.risk.epsilon;

        // mean usage per (transformer, consumer)
        let mut usage: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
        for r in input.readings {
            let e = usage
                .entry((r.transformer_id.as_str(), r.consumer_id.as_str()))
                .or_insert((0.0, 0));
            e.0 += r.energy_consumed;
            e.1 += 1;
        }
        let pairs: Vec<(&str, &str, f64)> = usage
            .into_iter()
            .map(|((t, c), (sum, n))| (t, c, sum / n as f64))
            .collect();

        let mut by_transformer: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (t, _, m) in &pairs {
            by_transformer.entry(*t).or_default().push(*m);
        }
        let peer: BTreeMap<&str, (f64, f64)> = by_transformer
            .iter()
            .map(|(t, means)| {
                let m = stats::mean(means).unwrap_or(0.0);
                (*t, (m, guarded_std(means, eps)))
            })
            .collect();

        let own: Array1<f64> = pairs.iter().map(|p| p.2).collect();
        let peer_mean: Array1<f64> = pairs.iter().map(|p| peer[p.0].0).collect();
        let peer_std: Array1<f64> = pairs.iter().map(|p| peer[p.0].1).collect();
        let deviation = &peer_mean - &own;
        let risk = Zip::from(&deviation)
            .and(&peer_std)
            .map_collect(|&dev, &spread| if dev > 0.0 { dev / spread } else { 0.0 });

        RawSignal::PerConsumer(mean_by_key(
            pairs
                .iter()
                .zip(risk.iter())
                .map(|(p, r)| (p.1.to_string(), *r)),
        ))
    }
}

/// Sag in units of `spread`, counted only from `sigma` standard deviations on.
fn sag_risk(sag: f64, spread: f64, sigma: f64) -> f64 {
    if sag >= sigma * spread {
        sag / spread
    } else {
        0.0
    }
}

/// Per-reading voltage drop below the transformer mean, counted only beyond
/// `voltage_sigma` standard deviations, averaged per consumer.
pub struct VoltageEstimator;

impl Estimator for VoltageEstimator {
    fn signal(&self) -> Signal {
        Signal::Voltage
    }

    fn estimate(&self, input: &EstimatorInput<'_>) -> RawSignal {
        let eps = input.risk.epsilon;
        let sigma = input.risk.voltage_sigma;

        let mut by_transformer: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for r in input.readings {
            by_transformer
                .entry(r.transformer_id.as_str())
                .or_default()
                .push(r.avg_voltage);
        }
        let band: BTreeMap<&str, (f64, f64)> = by_transformer
            .iter()
            .map(|(t, v)| (*t, (stats::mean(v).unwrap_or(0.0), guarded_std(v, eps))))
            .collect();

        let voltage: Array1<f64> = input.readings.iter().map(|r| r.avg_voltage).collect();
        let v_mean: Array1<f64> = input
            .readings
            .iter()
            .map(|r| band[r.transformer_id.as_str()].0)
            .collect();
        let v_std: Array1<f64> = input
            .readings
            .iter()
            .map(|r| band[r.transformer_id.as_str()].1)
            .collect();
        let sag = &v_mean - &voltage;
        let risk = Zip::from(&sag)
            .and(&v_std)
            .map_collect(|&dev, &spread| sag_risk(dev, spread, sigma));

        RawSignal::PerConsumer(mean_by_key(
            input
                .readings
                .iter()
                .zip(risk.iter())
                .map(|(r, v)| (r.consumer_id.clone(), *v)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sag_counts_from_the_band_edge() {
        // band of 2 V, 1.5σ cut at 3 V
        assert_eq!(sag_risk(3.0, 2.0, 1.5), 1.5);
        assert_eq!(sag_risk(2.999, 2.0, 1.5), 0.0);
        assert_eq!(sag_risk(5.0, 2.0, 1.5), 2.5);
        // voltage above the mean never scores
        assert_eq!(sag_risk(-4.0, 2.0, 1.5), 0.0);
    }

    #[test]
    fn guarded_std_replaces_zero_spread() {
        assert_eq!(guarded_std(&[230.0, 230.0], 1e-6), 1e-6);
        assert_eq!(guarded_std(&[230.0], 1e-6), 1e-6);
        assert!((guarded_std(&[228.0, 232.0], 1e-6) - 8f64.sqrt()).abs() < 1e-12);
    }
}
