//! SQLite workbook writer - one table per sheet in a single database file
//!
//! Stands in for a spreadsheet workbook: sheet order and display names are kept
//! in a `sheets` index table, each sheet's rows in a table named after its key.
//! Display names are user-configurable and only ever stored as data.

use super::sheets::{Cell, Sheet};
use super::writer_backend::{ExportError, ReportWriterBackend};
use crate::analysis_core::report::AnalysisResult;
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::{Path, PathBuf};

/// Name of the index table; no sheet may use it
const INDEX_TABLE: &str = "sheets";

pub struct SqliteWorkbookWriter {
    conn: Connection,
    path: PathBuf,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_value(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Null,
        Cell::Text(s) => Value::Text(s.clone()),
        Cell::Number(n) => Value::Real(*n),
        Cell::Integer(i) => Value::Integer(*i),
    }
}

impl SqliteWorkbookWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS sheets (
                position INTEGER NOT NULL,
                table_name TEXT PRIMARY KEY,
                sheet_name TEXT NOT NULL,
                row_count INTEGER NOT NULL
            )",
            [],
        )?;

        log::info!("✅ SQLite workbook initialized: {}", path.display());

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_sheets(&mut self, sheets: &[Sheet]) -> Result<(), ExportError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sheets", [])?;

        for (position, sheet) in sheets.iter().enumerate() {
            let table = sheet.key.as_str();
            if table.eq_ignore_ascii_case(INDEX_TABLE) {
                return Err(ExportError::Workbook(format!("sheet key '{}' is reserved", table)));
            }
            let columns: Vec<String> = sheet.columns.iter().map(|c| quote_ident(c)).collect();

            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
            tx.execute(
                &format!("CREATE TABLE {} ({})", quote_ident(table), columns.join(", ")),
                [],
            )?;

            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let insert = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.join(", "),
                placeholders.join(", ")
            );
            {
                let mut stmt = tx.prepare(&insert)?;
                for row in &sheet.rows {
                    stmt.execute(params_from_iter(row.iter().map(sql_value)))?;
                }
            }

            tx.execute(
                "INSERT INTO sheets (position, table_name, sheet_name, row_count) VALUES (?1, ?2, ?3, ?4)",
                params![position as i64, table, sheet.name, sheet.rows.len() as i64],
            )?;
        }

        tx.commit()?;
        log::debug!("✅ Wrote {} sheets to SQLite", sheets.len());
        Ok(())
    }
}

#[async_trait]
impl ReportWriterBackend for SqliteWorkbookWriter {
    async fn write_report(&mut self, _result: &AnalysisResult, sheets: &[Sheet]) -> Result<(), ExportError> {
        self.write_sheets(sheets)
    }

    async fn flush(&mut self) -> Result<(), ExportError> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}
