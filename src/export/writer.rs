//! Unified writer interface for analysis reports
//!
//! Routes writes to the JSON, CSV or SQLite backend based on the export format.

use super::csv_writer::CsvReportWriter;
use super::json_writer::JsonReportWriter;
use super::sheets::Sheet;
use super::sqlite_writer::SqliteWorkbookWriter;
use super::writer_backend::{ExportError, ReportWriterBackend};
use crate::analysis_core::report::AnalysisResult;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    /// Spreadsheet-style workbook, stored as SQLite
    Sqlite,
}

impl ExportFormat {
    /// `excel` is accepted as an alias for the workbook format
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            "sqlite" | "excel" | "workbook" => Some(ExportFormat::Sqlite),
            _ => None,
        }
    }
}

/// Unified writer that routes to one backend
pub enum ReportWriter {
    Json(JsonReportWriter),
    Csv(CsvReportWriter),
    Sqlite(SqliteWorkbookWriter),
}

impl ReportWriter {
    /// Create a writer for `format` producing files under `output_dir`
    pub fn new(format: ExportFormat, output_dir: &Path, prefix: &str) -> Result<Self, ExportError> {
        match format {
            ExportFormat::Json => {
                let writer = JsonReportWriter::new(output_dir.join(format!("{}_results.json", prefix)))?;
                Ok(ReportWriter::Json(writer))
            }
            ExportFormat::Csv => {
                let writer = CsvReportWriter::new(output_dir, prefix)?;
                Ok(ReportWriter::Csv(writer))
            }
            ExportFormat::Sqlite => {
                let writer = SqliteWorkbookWriter::new(output_dir.join(format!("{}_results.sqlite", prefix)))?;
                Ok(ReportWriter::Sqlite(writer))
            }
        }
    }

    pub async fn write_report(&mut self, result: &AnalysisResult, sheets: &[Sheet]) -> Result<(), ExportError> {
        match self {
            ReportWriter::Json(w) => w.write_report(result, sheets).await,
            ReportWriter::Csv(w) => w.write_report(result, sheets).await,
            ReportWriter::Sqlite(w) => w.write_report(result, sheets).await,
        }
    }

    pub async fn flush(&mut self) -> Result<(), ExportError> {
        match self {
            ReportWriter::Json(w) => w.flush().await,
            ReportWriter::Csv(w) => w.flush().await,
            ReportWriter::Sqlite(w) => w.flush().await,
        }
    }

    /// Files this writer produced
    pub fn outputs(&self) -> Vec<PathBuf> {
        match self {
            ReportWriter::Json(w) => vec![w.path().to_path_buf()],
            ReportWriter::Csv(w) => w.written().to_vec(),
            ReportWriter::Sqlite(w) => vec![w.path().to_path_buf()],
        }
    }

    /// Get backend type for logging
    pub fn backend_type(&self) -> &'static str {
        match self {
            ReportWriter::Json(w) => w.backend_type(),
            ReportWriter::Csv(w) => w.backend_type(),
            ReportWriter::Sqlite(w) => w.backend_type(),
        }
    }
}
