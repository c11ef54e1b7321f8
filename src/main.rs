//! grid-risk entrypoint: load a merged CSV or a five-table directory, score every consumer and
//! write the report as JSON or NDJSON.

use clap::{Parser, ValueEnum};
use grid_risk::{
    config::EngineConfig,
    error::EngineError,
    ingest,
    logging::StructuredLogger,
    report::{RiskReport, RunSummary},
    risk::RiskEngine,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// `{summary, report}` document
    Json,
    /// One consumer record per line
    Ndjson,
}

#[derive(Debug, Parser)]
#[command(name = "grid-risk", version, about = "Score electricity theft risk per consumer")]
struct Args {
    /// Merged CSV file, or a directory with the five input tables
    input: PathBuf,

    /// Engine configuration (JSON); defaults apply when the file is absent
    #[arg(long, env = "GRID_RISK_CONFIG", default_value = "grid-risk.json")]
    config: PathBuf,

    /// Write output here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Only emit consumers above the normal tier
    #[arg(long)]
    anomalies_only: bool,
}

#[derive(Serialize)]
struct Document<'a> {
    summary: RunSummary,
    report: &'a RiskReport,
}

/// Run the engine on the blocking pool, bounded by the configured budget.
fn score(engine: Arc<RiskEngine>, dataset: Arc<ingest::Dataset>) -> Result<RiskReport, EngineError> {
    let timeout = engine.config().run.timeout_secs.map(Duration::from_secs);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let result = rt.block_on(async move {
        let task = tokio::task::spawn_blocking(move || engine.run(&dataset));
        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => return Err(EngineError::Timeout(limit)),
            },
            None => task.await,
        };
        match joined {
            Ok(result) => result,
            Err(e) => Err(EngineError::Aborted(e.to_string())),
        }
    });
    // an expired run may still be computing; do not wait for it
    rt.shutdown_background();
    result
}

fn write_output(args: &Args, summary: RunSummary, report: &RiskReport) -> Result<(), EngineError> {
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    let mut report = report.clone();
    if args.anomalies_only {
        report
            .consumers
            .retain(|c| c.risk_class != grid_risk::RiskClass::Normal);
    }

    match args.format {
        Format::Json => {
            let doc = Document {
                summary,
                report: &report,
            };
            serde_json::to_writer_pretty(&mut out, &doc)?;
            writeln!(out)?;
        }
        Format::Ndjson => {
            for c in &report.consumers {
                StructuredLogger::emit_json(c, &mut out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let config = EngineConfig::load(&args.config);

    StructuredLogger::init(config.log.json, &config.log.level);

    let run_id = Uuid::new_v4();
    let span = info_span!("grid_risk", %run_id);
    let _guard = span.enter();
    info!(input = %args.input.display(), "grid-risk starting");

    let engine = Arc::new(RiskEngine::new(config.clone())?);
    let dataset = Arc::new(ingest::load(&args.input, &config.ingest)?);
    info!(rows = dataset.len(), "input loaded");

    let report = score(engine, dataset)?;
    // computed before --anomalies-only filtering so it reflects the whole cohort
    let summary = RunSummary::from_report(&report, config.report.loss_tariff);
    info!(
        consumers = summary.total_consumers,
        anomalies = summary.anomalies_detected,
        critical = summary.critical_cases,
        grid_health = summary.grid_health_score,
        "run summary"
    );

    write_output(&args, summary, &report)?;
    info!("grid-risk complete");
    Ok(())
}
