//! Run output: per-consumer risk records, transformer alerts, diagnostics and the summary.

use crate::risk::{RiskClass, Signal, Thresholds};
use serde::{Deserialize, Serialize};

/// Final record for one consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerRisk {
    pub consumer_id: String,
    pub transformer_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub ml_anomaly_risk: f64,
    pub stat_anomaly_risk: f64,
    pub peer_risk: f64,
    pub transformer_loss_risk: f64,
    pub voltage_risk: f64,
    pub seasonal_risk: f64,
    pub base_risk: f64,
    #[serde(rename = "aggregate_risk_score")]
    pub final_risk: f64,
    pub risk_class: RiskClass,
    pub inspection_flag: bool,
    pub risk_percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerAlert {
    pub transformer_id: String,
    pub anomalies_detected: usize,
}

/// Conditions the engine absorbed instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// All present raw values of a signal were equal; the signal is 0 for everyone
    DegenerateSignal { signal: Signal, present: usize },
    /// Consumers with no value for a signal, filled with 0
    MissingSignal { signal: Signal, consumers: usize },
    /// The `final_risk` distribution was constant; nobody is ranked above normal
    DegenerateScores { consumers: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// One record per consumer, ordered by consumer id
    pub consumers: Vec<ConsumerRisk>,
    pub total_loss_all_transformers: f64,
    pub transformers_at_risk: Vec<TransformerAlert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl RiskReport {
    pub fn consumer(&self, id: &str) -> Option<&ConsumerRisk> {
        self.consumers.iter().find(|c| c.consumer_id == id)
    }

    /// Consumers above the normal tier
    pub fn anomalies(&self) -> impl Iterator<Item = &ConsumerRisk> {
        self.consumers
            .iter()
            .filter(|c| c.risk_class != RiskClass::Normal)
    }

    pub fn flagged(&self) -> impl Iterator<Item = &ConsumerRisk> {
        self.consumers.iter().filter(|c| c.inspection_flag)
    }
}

/// Headline numbers for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_consumers: usize,
    pub anomalies_detected: usize,
    pub critical_cases: usize,
    /// Share of consumers in the normal tier, in percent, one decimal
    pub grid_health_score: f64,
    /// Total loss priced at the configured tariff, truncated to whole units
    pub total_loss_calculated: i64,
}

impl RunSummary {
    pub fn from_report(report: &RiskReport, loss_tariff: f64) -> Self {
        let total = report.consumers.len();
        let anomalies = report.anomalies().count();
        let critical = report
            .consumers
            .iter()
            .filter(|c| c.risk_class == RiskClass::Critical)
            .count();
        let grid_health_score = if total == 0 {
            0.0
        } else {
            let health = (100.0 - anomalies as f64 / total as f64 * 100.0).max(0.0);
            (health * 10.0).round() / 10.0
        };
        Self {
            total_consumers: total,
            anomalies_detected: anomalies,
            critical_cases: critical,
            grid_health_score,
            total_loss_calculated: (report.total_loss_all_transformers * loss_tariff).trunc() as i64,
        }
    }
}
