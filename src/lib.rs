//! timeflow - time series analysis of transaction records
//!
//! Loads a transaction CSV, derives growth, moving averages, seasonality,
//! anomalies, purchase patterns and correlations, and exports the result as
//! JSON, CSV sheets or a SQLite workbook.

pub mod analysis_core;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod persistence;

pub use analysis_core::{key_insights, AnalysisEngine, AnalysisResult};
pub use config::{AnalysisSettings, Config, ExportSettings, GapPolicy, NegativeSpendPolicy};
pub use error::{AnalysisError, BlockError, ConfigError};
pub use loader::{load_transactions, load_transactions_file, RawTransaction};
