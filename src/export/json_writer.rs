//! JSON writer - the whole analysis result as one pretty-printed document

use super::sheets::Sheet;
use super::writer_backend::{ExportError, ReportWriterBackend};
use crate::analysis_core::report::AnalysisResult;
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonReportWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl JsonReportWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;

        log::info!("📝 Writing JSON report to: {}", path.display());

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportWriterBackend for JsonReportWriter {
    async fn write_report(&mut self, result: &AnalysisResult, _sheets: &[Sheet]) -> Result<(), ExportError> {
        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer_pretty(&mut *writer, result)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ExportError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_core::AnalysisEngine;
    use crate::loader::RawTransaction;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_json_report_round_trips_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("time_analysis_results.json");

        let rows = vec![
            RawTransaction::new("2023-01-02", 100.0, 2.0).with_lead_time(3.0),
            RawTransaction::new("2023-02-06", 150.0, 3.0).with_lead_time(5.0),
        ];
        let result = AnalysisEngine::default().analyze(&rows).unwrap();

        let mut writer = JsonReportWriter::new(&path).unwrap();
        writer.write_report(&result, &[]).await.unwrap();
        writer.flush().await.unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["yearly_growth"]["2023"], serde_json::Value::Null);
        assert_eq!(parsed["monthly_growth"]["2023-02"], 50.0);
        assert_eq!(parsed["summary"]["total_transactions"], 2);
        assert!(parsed["moving_average_3m"].is_object());
        assert!(parsed["lead_times"]["lead_time_distribution"].is_object());
        assert_eq!(parsed["seasonality_metrics"]["has_seasonality"], false);
    }
}
