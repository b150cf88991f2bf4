//! Error types for loading, analysis and configuration
//!
//! Two tiers: `AnalysisError` is structural and fails the whole run, `BlockError`
//! stays local to one analytical block and turns into that block's fallback.

use thiserror::Error;

/// Structural failure: the dataset cannot be analyzed at all.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid date at row {row}: '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid number in column '{column}' at row {row}: '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure local to one analytical block.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlockError {
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Computation failed: {0}")]
    Computation(String),
}

impl BlockError {
    /// Stable machine-readable kind, used in result diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            BlockError::InsufficientData { .. } => "insufficient_data",
            BlockError::InvalidParameter { .. } => "invalid_parameter",
            BlockError::Computation(_) => "computation",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
