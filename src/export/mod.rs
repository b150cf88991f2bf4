//! Export - writes a finished analysis as JSON, CSV sheets or a SQLite workbook
//!
//! # Architecture
//!
//! ```text
//! AnalysisResult ──────────────→ JsonReportWriter (one document)
//!     ↓
//! to_sheets (named tables, missing values as empty cells)
//!     ↓
//! ReportWriter → CsvReportWriter (file per sheet) or SqliteWorkbookWriter (table per sheet)
//! ```

pub mod csv_writer;
pub mod json_writer;
pub mod sheets;
pub mod sqlite_writer;
pub mod writer;
pub mod writer_backend;

pub use csv_writer::CsvReportWriter;
pub use json_writer::JsonReportWriter;
pub use sheets::{to_sheets, Cell, Sheet};
pub use sqlite_writer::SqliteWorkbookWriter;
pub use writer::{ExportFormat, ReportWriter};
pub use writer_backend::{ExportError, ReportWriterBackend};

use crate::analysis_core::report::AnalysisResult;
use crate::config::ExportSettings;
use std::path::{Path, PathBuf};

/// Resolve the configured format names, rejecting unknown ones
pub fn parse_formats(names: &[String]) -> Result<Vec<ExportFormat>, ExportError> {
    let mut formats = Vec::new();
    for name in names {
        let format = ExportFormat::from_str(name).ok_or_else(|| ExportError::UnsupportedFormat(name.clone()))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

/// Write `result` in every requested format under `output_dir`; returns the
/// files produced
pub async fn export_report(
    result: &AnalysisResult,
    settings: &ExportSettings,
    formats: &[ExportFormat],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let sheets = to_sheets(result, settings);
    let mut outputs = Vec::new();

    for format in formats {
        let mut writer = ReportWriter::new(*format, output_dir, &settings.default_filename_prefix)?;
        writer.write_report(result, &sheets).await?;
        writer.flush().await?;

        log::info!("✅ {} export complete", writer.backend_type());
        outputs.extend(writer.outputs());
    }

    Ok(outputs)
}
