//! grid-risk — electricity theft risk scoring over grid telemetry.
//!
//! Modular structure:
//! - [`ingest`] — CSV tables → validated readings (merged table or five-table join)
//! - [`features`] — Per-consumer and per-transformer-day aggregates
//! - [`model`] — Robust scaling and a seeded isolation forest
//! - [`risk`] — Six estimators, normalization, combination, classification, transformer outliers
//! - [`report`] — Output records, diagnostics and the run summary
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod risk;
pub mod stats;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use features::{ConsumerProfile, FeatureExtractor, FeatureSet, TransformerDay};
pub use ingest::{Dataset, Reading};
pub use logging::StructuredLogger;
pub use model::IsolationForest;
pub use report::{ConsumerRisk, Diagnostic, RiskReport, RunSummary, TransformerAlert};
pub use risk::{RiskClass, RiskEngine, Signal};
