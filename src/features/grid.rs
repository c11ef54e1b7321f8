//! Daily energy balance of one transformer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerDay {
    pub transformer_id: String,
    pub date: NaiveDate,
    /// Sum of consumer consumption on this transformer and day
    pub total_consumption: f64,
    /// Mean of the reported inputs; `None` when no row carried one
    pub energy_input: Option<f64>,
}

impl TransformerDay {
    pub fn loss(&self) -> Option<f64> {
        self.energy_input.map(|input| input - self.total_consumption)
    }

    /// Share of input not accounted for by consumption. Undefined when the input is missing or zero.
    pub fn loss_ratio(&self) -> Option<f64> {
        match self.energy_input {
            Some(input) if input != 0.0 => Some((input - self.total_consumption) / input),
            _ => None,
        }
    }
}
