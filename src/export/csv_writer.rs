//! CSV writer - one delimited file per sheet, `<prefix>_<sheet key>.csv`

use super::sheets::Sheet;
use super::writer_backend::{ExportError, ReportWriterBackend};
use crate::analysis_core::report::AnalysisResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct CsvReportWriter {
    output_dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl CsvReportWriter {
    pub fn new(output_dir: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self, ExportError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;

        log::info!("📝 Writing CSV sheets to: {}", output_dir.display());

        Ok(Self {
            output_dir,
            prefix: prefix.into(),
            written: Vec::new(),
        })
    }

    pub fn file_path(&self, sheet: &Sheet) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", self.prefix, sheet.key))
    }

    /// Files produced by the latest report, in sheet order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

#[async_trait]
impl ReportWriterBackend for CsvReportWriter {
    async fn write_report(&mut self, _result: &AnalysisResult, sheets: &[Sheet]) -> Result<(), ExportError> {
        self.written.clear();
        for sheet in sheets {
            let path = self.file_path(sheet);
            let mut writer = csv::Writer::from_path(&path)?;

            writer.write_record(&sheet.columns)?;
            for row in &sheet.rows {
                writer.write_record(row.iter().map(|cell| cell.to_string()))?;
            }
            writer.flush()?;

            log::debug!("✅ Wrote {} rows to {}", sheet.rows.len(), path.display());
            self.written.push(path);
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_core::AnalysisEngine;
    use crate::config::ExportSettings;
    use crate::export::sheets::to_sheets;
    use crate::loader::RawTransaction;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_one_file_per_sheet() {
        let dir = tempdir().unwrap();
        let rows = vec![
            RawTransaction::new("2022-06-01", 40.0, 1.0),
            RawTransaction::new("2023-06-01", 60.0, 1.0),
        ];
        let result = AnalysisEngine::default().analyze(&rows).unwrap();
        let sheets = to_sheets(&result, &ExportSettings::default());

        let mut writer = CsvReportWriter::new(dir.path(), "time_analysis").unwrap();
        writer.write_report(&result, &sheets).await.unwrap();
        writer.flush().await.unwrap();

        assert_eq!(writer.written().len(), sheets.len());

        let yearly = std::fs::read_to_string(dir.path().join("time_analysis_yearly_growth.csv")).unwrap();
        let lines: Vec<&str> = yearly.lines().collect();
        assert_eq!(lines, vec!["Year,Growth (%)", "2022,", "2023,50"]);

        assert!(dir.path().join("time_analysis_dow_analysis.csv").exists());
    }

    #[tokio::test]
    async fn test_duplicate_sheet_names_keep_separate_files() {
        let dir = tempdir().unwrap();
        let rows = vec![
            RawTransaction::new("2023-01-05", 10.0, 1.0),
            RawTransaction::new("2023-02-05", 30.0, 1.0),
        ];
        let result = AnalysisEngine::default().analyze(&rows).unwrap();

        let mut settings = ExportSettings::default();
        settings
            .excel_sheet_names
            .insert("anomalies".to_string(), "Yearly Growth".to_string());
        let sheets = to_sheets(&result, &settings);

        let mut writer = CsvReportWriter::new(dir.path(), "report").unwrap();
        writer.write_report(&result, &sheets).await.unwrap();
        writer.write_report(&result, &sheets).await.unwrap();

        let unique: std::collections::BTreeSet<&PathBuf> = writer.written().iter().collect();
        assert_eq!(writer.written().len(), sheets.len());
        assert_eq!(unique.len(), sheets.len());

        let yearly = std::fs::read_to_string(dir.path().join("report_yearly_growth.csv")).unwrap();
        assert!(yearly.starts_with("Year,Growth (%)"));
        let anomalies = std::fs::read_to_string(dir.path().join("report_anomalies.csv")).unwrap();
        assert!(anomalies.starts_with("Date,Total Spend"));
    }
}
