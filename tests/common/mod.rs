#![allow(dead_code)]

use chrono::NaiveDate;
use grid_risk::{Dataset, Reading};

pub fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap() + chrono::Days::new(n as u64)
}

pub fn reading(consumer: &str, transformer: &str, d: u32, consumed: f64, input: Option<f64>) -> Reading {
    Reading {
        consumer_id: consumer.to_string(),
        transformer_id: transformer.to_string(),
        date: day(d),
        energy_consumed: consumed,
        energy_input: input,
        avg_voltage: 230.0,
        voltage_variance: 0.0,
        season: "summer".to_string(),
        temperature: 25.0,
        latitude: 28.6,
        longitude: 77.2,
    }
}

pub fn dataset(readings: Vec<Reading>) -> Dataset {
    Dataset::new(readings).unwrap()
}

/// Ten consumers on one transformer; `C00` spikes to 50 on days 3 and 6, the rest stay at 10.
pub fn spike_cohort() -> Dataset {
    let mut rows = Vec::new();
    for d in 0..10 {
        for c in 0..10 {
            let id = format!("C{c:02}");
            let consumed = if c == 0 && (d == 3 || d == 6) { 50.0 } else { 10.0 };
            rows.push(reading(&id, "T1", d, consumed, None));
        }
    }
    dataset(rows)
}

/// A mixed cohort over three transformers with varied usage, voltage and seasons.
pub fn mixed_cohort() -> Dataset {
    let mut rows = Vec::new();
    for c in 0..30u32 {
        let t = format!("T{}", c % 3);
        for d in 0..20u32 {
            let base = 8.0 + (c % 7) as f64 * 1.5;
            let wobble = ((c * 31 + d * 17) % 11) as f64 * 0.4;
            let consumed = if c == 13 && d > 10 { 0.5 } else { base + wobble };
            let mut r = reading(&format!("M{c:02}"), &t, d, consumed, Some(100.0 + (c % 3) as f64 * 5.0));
            r.avg_voltage = if c == 22 && d % 2 == 0 { 205.0 } else { 229.0 + ((c + d) % 3) as f64 };
            r.season = if d < 8 { "monsoon".into() } else { "winter".into() };
            rows.push(r);
        }
    }
    dataset(rows)
}
