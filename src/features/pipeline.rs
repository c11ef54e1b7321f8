//! Feature aggregation: readings → consumer profiles and transformer-day balances.

use super::{ConsumerProfile, FeatureSet, TransformerDay};
use crate::config::FeaturesConfig;
use crate::ingest::Dataset;
use std::collections::BTreeMap;

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    /// Group readings by consumer and by (transformer, date). An empty dataset yields an empty
    /// feature set.
    pub fn extract(&self, dataset: &Dataset) -> FeatureSet {
        let readings = dataset.readings();

        let mut consumer_rows: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, r) in readings.iter().enumerate() {
            consumer_rows.entry(r.consumer_id.clone()).or_default().push(i);
        }

        let mut consumers = BTreeMap::new();
        for (id, rows) in &consumer_rows {
            let mut series: Vec<_> = rows.iter().map(|&i| &readings[i]).collect();
            if self.config.sort_by_date {
                // stable, so same-day rows keep their input order
                series.sort_by_key(|r| r.date);
            }
            if let Some(profile) = ConsumerProfile::from_series(&series) {
                consumers.insert(id.clone(), profile);
            }
        }

        // (sum of consumption, sum of present inputs, count of present inputs)
        let mut daily: BTreeMap<_, (f64, f64, usize)> = BTreeMap::new();
        for r in readings {
            let acc = daily
                .entry((r.transformer_id.clone(), r.date))
                .or_insert((0.0, 0.0, 0));
            acc.0 += r.energy_consumed;
            if let Some(input) = r.energy_input {
                acc.1 += input;
                acc.2 += 1;
            }
        }
        let transformer_days: BTreeMap<_, _> = daily
            .into_iter()
            .map(|((transformer_id, date), (consumed, input_sum, input_n))| {
                let day = TransformerDay {
                    transformer_id: transformer_id.clone(),
                    date,
                    total_consumption: consumed,
                    energy_input: (input_n > 0).then(|| input_sum / input_n as f64),
                };
                ((transformer_id, date), day)
            })
            .collect();

        tracing::debug!(
            consumers = consumers.len(),
            transformer_days = transformer_days.len(),
            "features aggregated"
        );

        FeatureSet {
            consumers,
            consumer_rows,
            transformer_days,
        }
    }
}
