//! Input readings and the loaders that build them from CSV tables.
//!
//! Two shapes are accepted: a single merged table with one row per consumer and day, or the
//! five raw tables (smart meter, consumer/transformer mapping, transformer input, voltage
//! quality, context) which are joined here. Either way the engine receives a [`Dataset`] with
//! every default already applied.

mod geo;
mod merge;
mod table;

pub use geo::synthetic_coordinates;
pub use merge::{load_tables, TableSet, TABLE_FILES};
pub use table::{parse_date, Table};

use crate::config::IngestConfig;
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One consumer reading for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub consumer_id: String,
    pub transformer_id: String,
    pub date: NaiveDate,
    pub energy_consumed: f64,
    /// Transformer-side input for the day; `None` when not reported
    pub energy_input: Option<f64>,
    pub avg_voltage: f64,
    pub voltage_variance: f64,
    pub season: String,
    pub temperature: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Validated set of readings for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    readings: Vec<Reading>,
}

impl Dataset {
    /// Wrap readings after checking the input contract.
    pub fn new(readings: Vec<Reading>) -> Result<Self> {
        let ds = Self { readings };
        ds.validate()?;
        Ok(ds)
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Ids must be non-empty and `energy_consumed` finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (i, r) in self.readings.iter().enumerate() {
            let row = i + 1;
            if r.consumer_id.trim().is_empty() {
                return Err(EngineError::invalid("readings", row, "consumer_id", "empty identifier"));
            }
            if r.transformer_id.trim().is_empty() {
                return Err(EngineError::invalid("readings", row, "transformer_id", "empty identifier"));
            }
            if !r.energy_consumed.is_finite() || r.energy_consumed < 0.0 {
                return Err(EngineError::invalid(
                    "readings",
                    row,
                    "energy_consumed",
                    format!("expected a non-negative number, got {}", r.energy_consumed),
                ));
            }
            if let Some(input) = r.energy_input {
                if !input.is_finite() {
                    return Err(EngineError::invalid("readings", row, "energy_input", "not a finite number"));
                }
            }
            if !r.avg_voltage.is_finite() {
                return Err(EngineError::invalid("readings", row, "avg_voltage", "not a finite number"));
            }
        }
        Ok(())
    }
}

/// Partially filled reading; optional fields get defaults in [`finish`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Draft {
    pub consumer_id: String,
    pub transformer_id: String,
    pub date: Option<NaiveDate>,
    pub energy_consumed: f64,
    pub energy_input: Option<f64>,
    pub avg_voltage: Option<f64>,
    pub voltage_variance: Option<f64>,
    pub season: Option<String>,
    pub temperature: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Apply the ingestion defaults and resolve per-consumer coordinates.
pub(crate) fn finish(drafts: Vec<Draft>, config: &IngestConfig) -> Result<Dataset> {
    // first row carrying both coordinates wins for the whole consumer
    let mut coords: HashMap<String, (f64, f64)> = HashMap::new();
    for d in &drafts {
        if let (Some(lat), Some(lon)) = (d.latitude, d.longitude) {
            coords.entry(d.consumer_id.clone()).or_insert((lat, lon));
        }
    }

    let mut synthesized = 0usize;
    let mut readings = Vec::with_capacity(drafts.len());
    for (i, d) in drafts.into_iter().enumerate() {
        let date = d
            .date
            .ok_or_else(|| EngineError::invalid("readings", i + 1, "date", "missing date"))?;
        let (latitude, longitude) = match coords.get(&d.consumer_id) {
            Some(c) => *c,
            None => {
                let c = synthetic_coordinates(
                    &d.consumer_id,
                    config.reference_point,
                    config.coordinate_spread,
                );
                coords.insert(d.consumer_id.clone(), c);
                synthesized += 1;
                c
            }
        };
        let energy_input = match d.energy_input {
            Some(v) => Some(v),
            None if config.fill_missing_input => Some(d.energy_consumed * config.input_fill_factor),
            None => None,
        };
        readings.push(Reading {
            consumer_id: d.consumer_id,
            transformer_id: d.transformer_id,
            date,
            energy_consumed: d.energy_consumed,
            energy_input,
            avg_voltage: d.avg_voltage.unwrap_or(config.default_voltage),
            voltage_variance: d.voltage_variance.unwrap_or(config.default_voltage_variance),
            season: d.season.unwrap_or_else(|| config.default_season.clone()),
            temperature: d.temperature.unwrap_or(config.default_temperature),
            latitude,
            longitude,
        });
    }
    if synthesized > 0 {
        tracing::warn!(consumers = synthesized, "latitude/longitude missing; generated synthetic coordinates");
    }
    Dataset::new(readings)
}

/// Build a dataset from one merged table.
pub fn from_merged_table(table: &Table, config: &IngestConfig) -> Result<Dataset> {
    let consumer = table.require("consumer_id")?;
    let transformer = table.require("transformer_id")?;
    let date = table.require("date")?;
    let consumed = table.require("energy_consumed")?;
    let input = table.column("energy_input");
    let voltage = table.column("avg_voltage");
    let variance = table.column("voltage_variance");
    let season = table.column("season");
    let temperature = table.column("temperature");
    let latitude = table.column("latitude");
    let longitude = table.column("longitude");

    let mut drafts = Vec::with_capacity(table.len());
    for (row, rec) in table.rows() {
        drafts.push(Draft {
            consumer_id: table.text(row, rec, consumer)?,
            transformer_id: table.text(row, rec, transformer)?,
            date: Some(table.date(row, rec, date)?),
            energy_consumed: table.number(row, rec, consumed)?,
            energy_input: table.opt_number(row, rec, input)?,
            avg_voltage: table.opt_number(row, rec, voltage)?,
            voltage_variance: table.opt_number(row, rec, variance)?,
            season: table.opt_text(rec, season),
            temperature: table.opt_number(row, rec, temperature)?,
            latitude: table.opt_number(row, rec, latitude)?,
            longitude: table.opt_number(row, rec, longitude)?,
        });
    }
    finish(drafts, config)
}

/// Load a merged CSV file.
pub fn load_merged(path: &Path, config: &IngestConfig) -> Result<Dataset> {
    let table = Table::from_path("merged", path)?;
    from_merged_table(&table, config)
}

/// Load either a merged CSV file or a directory holding the five raw tables.
pub fn load(path: &Path, config: &IngestConfig) -> Result<Dataset> {
    if path.is_dir() {
        load_tables(path, config)
    } else {
        load_merged(path, config)
    }
}
