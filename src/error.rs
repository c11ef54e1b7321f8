//! Error type for ingestion, configuration and the risk engine.
//!
//! Only schema and configuration problems are errors. Numerical degeneracies (single-row
//! groups, zero variance, all-equal scores) are absorbed by the engine and surfaced as
//! [`crate::report::Diagnostic`] entries instead.

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required column is absent from an input table.
    #[error("schema error: table `{table}` is missing required column `{column}`")]
    MissingColumn { table: String, column: String },

    /// One of the five input tables was not found.
    #[error("schema error: required input table `{0}` not found")]
    MissingTable(String),

    /// A cell could not be parsed or violates the input contract.
    #[error("invalid value in `{table}` row {row}, column `{column}`: {reason}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller-level budget for a whole run elapsed.
    #[error("risk run exceeded its time budget of {0:?}")]
    Timeout(Duration),

    #[error("risk run aborted: {0}")]
    Aborted(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        EngineError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn invalid(table: &str, row: usize, column: &str, reason: impl Into<String>) -> Self {
        EngineError::InvalidValue {
            table: table.to_string(),
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
