//! Data-driven risk tiers over the run's `final_risk` distribution.

use crate::config::RiskConfig;
use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskClass {
    Normal,
    Mild,
    High,
    Critical,
}

impl RiskClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskClass::Normal => "normal",
            RiskClass::Mild => "mild",
            RiskClass::High => "high",
            RiskClass::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier boundaries for one run. `mild ≤ high ≤ inspection` holds by construction when the
/// configured quantiles are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub mild: f64,
    pub high: f64,
    /// `max(P_inspection, mean + k·std)`
    pub inspection: f64,
}

impl Thresholds {
    /// `None` for a degenerate distribution: fewer than two scores, or all scores equal.
    pub fn compute(scores: &[f64], config: &RiskConfig) -> Option<Self> {
        if scores.len() < 2 {
            return None;
        }
        let lo = stats::min(scores)?;
        let hi = stats::max(scores)?;
        if hi <= lo {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q = |p: f64| stats::quantile_sorted(&sorted, p);

        let mean = stats::mean(scores)?;
        let spread_cut = stats::sample_std(scores).map(|s| mean + config.inspection_sigma * s);
        let p_inspection = q(config.inspection_quantile);
        let inspection = match spread_cut {
            Some(c) if c > p_inspection => c,
            _ => p_inspection,
        };
        Some(Self {
            mild: q(config.mild_quantile),
            high: q(config.high_quantile),
            inspection,
        })
    }

    pub fn classify(&self, score: f64) -> RiskClass {
        if score >= self.inspection {
            RiskClass::Critical
        } else if score >= self.high {
            RiskClass::High
        } else if score >= self.mild {
            RiskClass::Mild
        } else {
            RiskClass::Normal
        }
    }

    pub fn needs_inspection(&self, score: f64) -> bool {
        score >= self.inspection
    }
}

/// Per-consumer classification, in the order of `scores`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub risk_class: RiskClass,
    pub inspection_flag: bool,
    pub risk_percentile: f64,
}

/// Classify every score against thresholds derived from the scores themselves.
/// A degenerate distribution carries no ranking signal, so every consumer is `Normal`.
pub fn classify_all(scores: &[f64], config: &RiskConfig) -> (Option<Thresholds>, Vec<Classification>) {
    let thresholds = Thresholds::compute(scores, config);
    let ranks = stats::percentile_ranks(scores);
    let out = scores
        .iter()
        .zip(ranks)
        .map(|(&s, risk_percentile)| match &thresholds {
            Some(t) => Classification {
                risk_class: t.classify(s),
                inspection_flag: t.needs_inspection(s),
                risk_percentile,
            },
            None => Classification {
                risk_class: RiskClass::Normal,
                inspection_flag: false,
                risk_percentile,
            },
        })
        .collect();
    (thresholds, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_quantiles() {
        let cfg = RiskConfig::default();
        // 0.00..=0.98 plus one far outlier
        let mut scores: Vec<f64> = (0..99).map(|i| i as f64 / 100.0).collect();
        scores.push(5.0);
        let (t, classes) = classify_all(&scores, &cfg);
        let t = t.unwrap();
        assert!(t.mild <= t.high && t.high <= t.inspection);
        assert_eq!(classes[0].risk_class, RiskClass::Normal);
        assert_eq!(classes[60].risk_class, RiskClass::Mild);
        assert_eq!(classes[85].risk_class, RiskClass::High);
        assert_eq!(classes[99].risk_class, RiskClass::Critical);
        assert!(classes[99].inspection_flag);
        assert!(!classes[85].inspection_flag);
    }

    #[test]
    fn all_equal_scores_are_normal() {
        let (t, classes) = classify_all(&[0.0, 0.0, 0.0], &RiskConfig::default());
        assert!(t.is_none());
        assert!(classes.iter().all(|c| c.risk_class == RiskClass::Normal && !c.inspection_flag));
    }

    #[test]
    fn single_outlier_is_critical() {
        let mut scores = vec![0.1; 9];
        scores.push(0.9);
        let (_, classes) = classify_all(&scores, &RiskConfig::default());
        assert_eq!(classes[9].risk_class, RiskClass::Critical);
        assert_eq!(classes.iter().filter(|c| c.inspection_flag).count(), 1);
    }
}
