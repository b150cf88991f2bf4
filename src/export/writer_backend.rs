//! Writer backend trait for analysis reports
//!
//! Defines the interface for writing one finished report to different targets.

use super::sheets::Sheet;
use crate::analysis_core::report::AnalysisResult;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

/// Backend trait for writing a report
#[async_trait]
pub trait ReportWriterBackend: Send {
    /// Write the report. JSON uses `result`, tabular backends use `sheets`.
    async fn write_report(&mut self, result: &AnalysisResult, sheets: &[Sheet]) -> Result<(), ExportError>;

    /// Flush pending writes to storage
    async fn flush(&mut self) -> Result<(), ExportError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
