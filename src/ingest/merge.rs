//! Five-table join: smart meter readings enriched with topology, transformer input, voltage
//! quality and daily context.

use super::{finish, Dataset, Draft, Table};
use crate::config::IngestConfig;
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;

/// File names expected in an input directory, in load order.
pub const TABLE_FILES: [&str; 5] = [
    "smart_meter_data.csv",
    "consumer_transformer_mapping.csv",
    "transformer_input_data.csv",
    "voltage_pq_data.csv",
    "context_data.csv",
];

pub struct TableSet {
    pub smart_meter: Table,
    pub mapping: Table,
    pub transformer_input: Table,
    pub voltage: Table,
    pub context: Table,
}

impl TableSet {
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let load = |file: &str| -> Result<Table> {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(EngineError::MissingTable(file.to_string()));
            }
            Table::from_path(file.trim_end_matches(".csv"), &path)
        };
        Ok(Self {
            smart_meter: load(TABLE_FILES[0])?,
            mapping: load(TABLE_FILES[1])?,
            transformer_input: load(TABLE_FILES[2])?,
            voltage: load(TABLE_FILES[3])?,
            context: load(TABLE_FILES[4])?,
        })
    }

    /// Smart meter ⋈ mapping (inner), then left joins of context on date, transformer input on
    /// (transformer, date) and voltage on (consumer, date). Duplicate right-side keys resolve to
    /// their first row.
    pub fn merge(&self, config: &IngestConfig) -> Result<Dataset> {
        let mapping = self.mapping_index()?;
        let context = self.context_index()?;
        let inputs = self.input_index()?;
        let voltage = self.voltage_index()?;

        let sm = &self.smart_meter;
        let c_consumer = sm.require("consumer_id")?;
        let c_date = sm.require("date")?;
        let c_consumed = sm.require("energy_consumed")?;
        let c_lat = sm.column("latitude");
        let c_lon = sm.column("longitude");

        let mut unmapped = 0usize;
        let mut drafts = Vec::with_capacity(sm.len());
        for (row, rec) in sm.rows() {
            let consumer_id = sm.text(row, rec, c_consumer)?;
            let Some(link) = mapping.get(&consumer_id) else {
                unmapped += 1;
                continue;
            };
            let date = sm.date(row, rec, c_date)?;
            let ctx = context.get(&date);
            let volt = voltage.get(&(consumer_id.clone(), date));
            drafts.push(Draft {
                transformer_id: link.transformer_id.clone(),
                date: Some(date),
                energy_consumed: sm.number(row, rec, c_consumed)?,
                energy_input: inputs
                    .get(&(link.transformer_id.clone(), date))
                    .copied()
                    .flatten(),
                avg_voltage: volt.and_then(|v| v.0),
                voltage_variance: volt.and_then(|v| v.1),
                season: ctx.and_then(|c| c.0.clone()),
                temperature: ctx.and_then(|c| c.1),
                latitude: sm.opt_number(row, rec, c_lat)?.or(link.latitude),
                longitude: sm.opt_number(row, rec, c_lon)?.or(link.longitude),
                consumer_id,
            });
        }
        if unmapped > 0 {
            tracing::warn!(rows = unmapped, "smart meter rows without a transformer mapping dropped");
        }
        finish(drafts, config)
    }

    fn mapping_index(&self) -> Result<HashMap<String, Link>> {
        let t = &self.mapping;
        let c_consumer = t.require("consumer_id")?;
        let c_transformer = t.require("transformer_id")?;
        let c_lat = t.column("latitude");
        let c_lon = t.column("longitude");
        let mut out = HashMap::new();
        for (row, rec) in t.rows() {
            let consumer = t.text(row, rec, c_consumer)?;
            if out.contains_key(&consumer) {
                continue;
            }
            let link = Link {
                transformer_id: t.text(row, rec, c_transformer)?,
                latitude: t.opt_number(row, rec, c_lat)?,
                longitude: t.opt_number(row, rec, c_lon)?,
            };
            out.insert(consumer, link);
        }
        Ok(out)
    }

    fn context_index(&self) -> Result<HashMap<NaiveDate, (Option<String>, Option<f64>)>> {
        let t = &self.context;
        let c_date = t.require("date")?;
        let c_season = t.column("season");
        let c_temp = t.column("temperature");
        let mut out = HashMap::new();
        for (row, rec) in t.rows() {
            let date = t.date(row, rec, c_date)?;
            if out.contains_key(&date) {
                continue;
            }
            out.insert(date, (t.opt_text(rec, c_season), t.opt_number(row, rec, c_temp)?));
        }
        Ok(out)
    }

    fn input_index(&self) -> Result<HashMap<(String, NaiveDate), Option<f64>>> {
        let t = &self.transformer_input;
        let c_transformer = t.require("transformer_id")?;
        let c_date = t.require("date")?;
        let c_input = t.require("energy_input")?;
        let mut out = HashMap::new();
        for (row, rec) in t.rows() {
            let key = (t.text(row, rec, c_transformer)?, t.date(row, rec, c_date)?);
            if out.contains_key(&key) {
                continue;
            }
            let input = t.opt_number(row, rec, Some(c_input))?;
            out.insert(key, input);
        }
        Ok(out)
    }

    fn voltage_index(&self) -> Result<HashMap<(String, NaiveDate), (Option<f64>, Option<f64>)>> {
        let t = &self.voltage;
        let c_consumer = t.require("consumer_id")?;
        let c_date = t.require("date")?;
        let c_volt = t.column("avg_voltage");
        let c_var = t.column("voltage_variance");
        let mut out = HashMap::new();
        for (row, rec) in t.rows() {
            let key = (t.text(row, rec, c_consumer)?, t.date(row, rec, c_date)?);
            if out.contains_key(&key) {
                continue;
            }
            let values = (t.opt_number(row, rec, c_volt)?, t.opt_number(row, rec, c_var)?);
            out.insert(key, values);
        }
        Ok(out)
    }
}

struct Link {
    transformer_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Load and join the five tables found in `dir`.
pub fn load_tables(dir: &Path, config: &IngestConfig) -> Result<Dataset> {
    TableSet::from_dir(dir)?.merge(config)
}
