//! End-to-end scoring scenarios.

mod common;

use common::{dataset, mixed_cohort, reading, spike_cohort};
use grid_risk::{
    config::EngineConfig, Dataset, Diagnostic, RiskClass, RiskEngine, Signal,
};

fn engine() -> RiskEngine {
    RiskEngine::new(EngineConfig::default()).unwrap()
}

fn signals(c: &grid_risk::ConsumerRisk) -> [f64; 6] {
    [
        c.ml_anomaly_risk,
        c.stat_anomaly_risk,
        c.peer_risk,
        c.transformer_loss_risk,
        c.voltage_risk,
        c.seasonal_risk,
    ]
}

#[test]
fn identical_consumers_are_all_normal() {
    let mut rows = Vec::new();
    for d in 0..10 {
        for c in ["C1", "C2", "C3"] {
            // transformer input exactly matches the three consumers' total
            rows.push(reading(c, "T1", d, 10.0, Some(30.0)));
        }
    }
    let report = engine().run(&dataset(rows)).unwrap();

    assert_eq!(report.consumers.len(), 3);
    for c in &report.consumers {
        assert!(signals(c).iter().all(|s| *s == 0.0), "{c:?}");
        assert_eq!(c.final_risk, 0.0);
        assert_eq!(c.risk_class, RiskClass::Normal);
        assert!(!c.inspection_flag);
    }
    assert!(report.transformers_at_risk.is_empty());
    assert_eq!(report.total_loss_all_transformers, 0.0);
    assert!(report.thresholds.is_none());
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::DegenerateScores { consumers: 3 })));
}

#[test]
fn spiking_consumer_is_critical() {
    let report = engine().run(&spike_cohort()).unwrap();
    let spiker = report.consumer("C00").unwrap();

    assert_eq!(spiker.ml_anomaly_risk, 1.0);
    assert_eq!(spiker.stat_anomaly_risk, 1.0);
    // above its peers, so the one-sided peer signal stays at 0
    assert_eq!(spiker.peer_risk, 0.0);
    assert_eq!(spiker.risk_class, RiskClass::Critical);
    assert!(spiker.inspection_flag);
    assert_eq!(spiker.risk_percentile, 1.0);

    for c in report.consumers.iter().filter(|c| c.consumer_id != "C00") {
        assert_eq!(c.ml_anomaly_risk, 0.0);
        assert_eq!(c.peer_risk, 1.0);
        assert!(!c.inspection_flag);
        assert!(c.final_risk < spiker.final_risk);
        assert_eq!(c.risk_percentile, 0.5);
    }
    assert_eq!(report.flagged().count(), 1);
    // a single transformer with one flag sits exactly on its own IQR threshold
    assert!(report.transformers_at_risk.is_empty());
}

#[test]
fn negative_loss_transformer_scores_zero() {
    let mut rows = Vec::new();
    for d in 0..5 {
        // T1 reports less than its consumers used
        rows.push(reading("A1", "T1", d, 10.0, Some(18.0)));
        rows.push(reading("A2", "T1", d, 10.0, Some(18.0)));
        rows.push(reading("B1", "T2", d, 10.0, Some(25.0)));
        rows.push(reading("B2", "T2", d, 10.0, Some(25.0)));
        rows.push(reading("C1", "T3", d, 10.0, Some(22.0)));
        rows.push(reading("C2", "T3", d, 10.0, Some(22.0)));
    }
    let report = engine().run(&dataset(rows)).unwrap();

    for id in ["A1", "A2"] {
        assert_eq!(report.consumer(id).unwrap().transformer_loss_risk, 0.0);
    }
    for id in ["B1", "B2"] {
        assert_eq!(report.consumer(id).unwrap().transformer_loss_risk, 1.0);
    }
    let mid = report.consumer("C1").unwrap().transformer_loss_risk;
    assert!(mid > 0.0 && mid < 1.0);
    // |18 − 20| + |25 − 20| + |22 − 20| per day
    assert!((report.total_loss_all_transformers - 45.0).abs() < 1e-9);
}

#[test]
fn transformer_without_input_is_missing_not_zero() {
    let mut rows = Vec::new();
    for d in 0..4 {
        rows.push(reading("A1", "T1", d, 10.0, Some(12.0)));
        rows.push(reading("B1", "T2", d, 10.0, Some(11.0)));
        rows.push(reading("X1", "T3", d, 10.0, None));
    }
    let report = engine().run(&dataset(rows)).unwrap();

    assert_eq!(report.consumer("A1").unwrap().transformer_loss_risk, 1.0);
    assert_eq!(report.consumer("B1").unwrap().transformer_loss_risk, 0.0);
    assert_eq!(report.consumer("X1").unwrap().transformer_loss_risk, 0.0);
    assert!(report.diagnostics.contains(&Diagnostic::MissingSignal {
        signal: Signal::TransformerLoss,
        consumers: 1,
    }));
    // only transformer-days with a reported input contribute to the loss total
    assert!((report.total_loss_all_transformers - 12.0).abs() < 1e-9);
}

#[test]
fn zero_input_day_counts_toward_total_loss_only() {
    let mut rows = Vec::new();
    for d in 0..3 {
        rows.push(reading("A1", "T1", d, 10.0, Some(12.0)));
        rows.push(reading("B1", "T2", d, 10.0, Some(11.0)));
        // a reported input of 0 has no loss ratio but still a loss of −10
        rows.push(reading("Z1", "T3", d, 10.0, Some(0.0)));
    }
    let report = engine().run(&dataset(rows)).unwrap();

    assert_eq!(report.consumer("Z1").unwrap().transformer_loss_risk, 0.0);
    assert!(report.diagnostics.contains(&Diagnostic::MissingSignal {
        signal: Signal::TransformerLoss,
        consumers: 1,
    }));
    // (2 + 1 + 10) per day
    assert!((report.total_loss_all_transformers - 39.0).abs() < 1e-9);
}

#[test]
fn voltage_drop_beyond_band_is_scored() {
    let mut rows = Vec::new();
    for d in 0..10 {
        for c in 0..8 {
            let mut r = reading(&format!("V{c}"), "T1", d, 10.0, Some(80.0));
            if c == 0 && d % 2 == 0 {
                r.avg_voltage = 190.0;
            }
            rows.push(r);
        }
    }
    let report = engine().run(&dataset(rows)).unwrap();
    assert_eq!(report.consumer("V0").unwrap().voltage_risk, 1.0);
    for c in 1..8 {
        assert_eq!(report.consumer(&format!("V{c}")).unwrap().voltage_risk, 0.0);
    }
}

#[test]
fn seasonal_ratio_uses_reference_season() {
    let mut rows = Vec::new();
    for d in 0..6 {
        for (c, monsoon_usage) in [("S1", 20.0), ("S2", 10.0), ("S3", 5.0)] {
            let mut r = reading(c, "T1", d, if d < 3 { monsoon_usage } else { 10.0 }, None);
            r.season = if d < 3 { "monsoon".into() } else { "winter".into() };
            rows.push(r);
        }
    }
    let report = engine().run(&dataset(rows)).unwrap();
    assert_eq!(report.consumer("S1").unwrap().seasonal_risk, 1.0);
    assert_eq!(report.consumer("S3").unwrap().seasonal_risk, 0.0);
    let mid = report.consumer("S2").unwrap().seasonal_risk;
    assert!(mid > 0.0 && mid < 1.0);
}

#[test]
fn no_reference_season_degenerates_to_zero() {
    let report = engine().run(&spike_cohort()).unwrap();
    assert!(report.consumers.iter().all(|c| c.seasonal_risk == 0.0));
    assert!(report.diagnostics.contains(&Diagnostic::DegenerateSignal {
        signal: Signal::Seasonal,
        present: 0,
    }));
}

#[test]
fn empty_dataset_gives_empty_report() {
    let report = engine().run(&Dataset::default()).unwrap();
    assert!(report.consumers.is_empty());
    assert!(report.transformers_at_risk.is_empty());
    assert_eq!(report.total_loss_all_transformers, 0.0);
}

#[test]
fn single_consumer_is_normal() {
    let rows = (0..5).map(|d| reading("ONLY", "T1", d, 3.0 + d as f64, Some(9.0))).collect();
    let report = engine().run(&dataset(rows)).unwrap();
    let c = &report.consumers[0];
    assert!(signals(c).iter().all(|s| *s == 0.0));
    assert_eq!(c.risk_class, RiskClass::Normal);
    assert_eq!(c.risk_percentile, 1.0);
}

#[test]
fn single_reading_consumers_do_not_fail() {
    let rows = vec![
        reading("A", "T1", 0, 4.0, Some(10.0)),
        reading("B", "T1", 0, 6.0, Some(10.0)),
        reading("C", "T2", 0, 1.0, Some(2.0)),
    ];
    let report = engine().run(&dataset(rows)).unwrap();
    assert_eq!(report.consumers.len(), 3);
    for c in &report.consumers {
        assert!(signals(c).iter().all(|s| s.is_finite() && (0.0..=1.0).contains(s)));
    }
}

#[test]
fn runs_are_reproducible() {
    let data = mixed_cohort();
    let a = engine().run(&data).unwrap();
    let b = engine().run(&data).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let data = mixed_cohort();
    let mut config = EngineConfig::default();
    config.run.parallel = false;
    let sequential = RiskEngine::new(config).unwrap().run(&data).unwrap();
    let parallel = engine().run(&data).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn mixed_cohort_invariants() {
    let report = engine().run(&mixed_cohort()).unwrap();
    assert_eq!(report.consumers.len(), 30);

    let ids: Vec<_> = report.consumers.iter().map(|c| c.consumer_id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);

    let t = report.thresholds.unwrap();
    assert!(t.mild <= t.high && t.high <= t.inspection);
    for c in &report.consumers {
        assert!(signals(c).iter().all(|s| (0.0..=1.0).contains(s)));
        assert!((c.final_risk - c.base_risk.powf(1.6)).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&c.risk_percentile));
        assert_eq!(c.inspection_flag, c.risk_class == RiskClass::Critical);
        assert_eq!(c.risk_class, {
            let s = c.final_risk;
            if s >= t.inspection {
                RiskClass::Critical
            } else if s >= t.high {
                RiskClass::High
            } else if s >= t.mild {
                RiskClass::Mild
            } else {
                RiskClass::Normal
            }
        });
    }
    // M22 is the only consumer whose voltage sags beyond its transformer's band
    assert_eq!(report.consumer("M22").unwrap().voltage_risk, 1.0);
    assert_eq!(report.consumers.iter().filter(|c| c.voltage_risk > 0.0).count(), 1);

    // every non-degenerate signal spans [0, 1]
    for (i, signal) in Signal::ALL.iter().enumerate() {
        let degenerate = report
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::DegenerateSignal { signal: s, .. } if s == signal));
        if degenerate {
            continue;
        }
        let values: Vec<f64> = report.consumers.iter().map(|c| signals(c)[i]).collect();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(lo, 0.0, "{signal}");
        assert_eq!(hi, 1.0, "{signal}");
    }
}

#[test]
fn trend_can_follow_dates_instead_of_row_order() {
    use grid_risk::FeatureExtractor;

    // rows arrive newest first
    let rows = vec![
        reading("A", "T1", 2, 30.0, None),
        reading("A", "T1", 1, 20.0, None),
        reading("A", "T1", 0, 10.0, None),
    ];
    let data = dataset(rows);
    let as_given = FeatureExtractor::new(Default::default()).extract(&data);
    assert_eq!(as_given.consumers["A"].trend, -20.0);

    let by_date = FeatureExtractor::new(grid_risk::config::FeaturesConfig { sort_by_date: true })
        .extract(&data);
    assert_eq!(by_date.consumers["A"].trend, 20.0);
}
