//! timeflow Binary - transaction time series analysis
//!
//! Loads a transaction CSV, runs every analysis block and writes the report.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin timeflow -- --input data/transactions.csv
//! cargo run --release --bin timeflow -- --input data/transactions.csv --format json --format sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - TIMEFLOW_INPUT - Transaction CSV path (alternative to --input)
//! - TIMEFLOW_SETTINGS - Settings JSON path (default: config/settings.json)
//! - TIMEFLOW_OUTPUT_DIR - Report output directory (default: output)
//! - TIMEFLOW_MIN_MONTHS, TIMEFLOW_ANOMALY_WINDOW, TIMEFLOW_ANOMALY_THRESHOLD,
//!   TIMEFLOW_CORRELATION_THRESHOLD, TIMEFLOW_MA_WINDOWS, TIMEFLOW_TOP_PEAKS,
//!   TIMEFLOW_NEGATIVE_SPEND, TIMEFLOW_GAP_POLICY - analysis setting overrides
//! - RUST_LOG - Logging level (optional, default: info)

use clap::Parser;
use std::path::PathBuf;
use timeflow::export::{export_report, parse_formats};
use timeflow::persistence::{load_settings, save_settings};
use timeflow::{key_insights, AnalysisEngine};

#[derive(Debug, Parser)]
#[command(name = "timeflow", version, about = "Time series analysis of transaction records")]
struct Args {
    /// Transaction CSV to analyze
    #[arg(short, long, env = "TIMEFLOW_INPUT")]
    input: PathBuf,

    /// Settings file (created with --save-settings)
    #[arg(short, long, env = "TIMEFLOW_SETTINGS", default_value = "config/settings.json")]
    settings: PathBuf,

    /// Directory for exported reports
    #[arg(short, long, env = "TIMEFLOW_OUTPUT_DIR", default_value = "output")]
    output: PathBuf,

    /// Export format: json, csv or sqlite (repeatable; defaults to the settings file)
    #[arg(short, long = "format")]
    formats: Vec<String>,

    /// Persist the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    log::info!("🚀 Starting timeflow");
    log::info!("   Input: {}", args.input.display());
    log::info!("   Settings: {}", args.settings.display());
    log::info!("   Output: {}", args.output.display());

    let mut config = load_settings(&args.settings)?;
    config.analysis = config.analysis.with_env_overrides();
    config.analysis.validate()?;

    if args.save_settings {
        save_settings(&config, &args.settings)?;
        log::info!("💾 Saved settings to {}", args.settings.display());
    }

    let format_names = if args.formats.is_empty() {
        config.export.export_formats.clone()
    } else {
        args.formats.clone()
    };
    let formats = parse_formats(&format_names)?;

    let engine = AnalysisEngine::new(config.snapshot());
    let input = args.input.clone();
    let result = tokio::task::spawn_blocking(move || engine.analyze_file(&input)).await??;

    let summary = &result.summary;
    log::info!("📊 Analysis complete");
    log::info!("   Transactions: {}", summary.total_transactions);
    log::info!("   Total spend: ${:.2}", summary.total_spend);
    if let Some(average) = summary.average_spend {
        log::info!("   Average spend: ${:.2}", average);
    }
    log::info!("   Months: {}", result.raw_monthly_spend.len());
    log::info!("   Anomalies: {}", result.anomalies.total_anomalies);

    for diagnostic in &result.diagnostics {
        log::warn!("⚠️  {} [{}]: {}", diagnostic.block, diagnostic.kind, diagnostic.message);
    }

    for insight in key_insights(&result, config.analysis.correlation_strength_threshold) {
        log::info!("🎯 {}", insight);
    }

    let outputs = export_report(&result, &config.export, &formats, &args.output).await?;
    for path in &outputs {
        log::info!("📝 {}", path.display());
    }

    log::info!("✅ Wrote {} files", outputs.len());
    Ok(())
}
