//! Error types for sheetdiff operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SheetdiffError>;

#[derive(Error, Debug)]
pub enum SheetdiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Workbook read error: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error(
        "Key columns [{}] do not uniquely identify rows in {table}; duplicate keys: {}",
        .columns.join(", "),
        .duplicates.join("; ")
    )]
    NonUniqueKey {
        table: String,
        columns: Vec<String>,
        duplicates: Vec<String>,
    },

    #[error("Invalid key specification: {message}")]
    InvalidKeySpec { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Data processing error: {message}")]
    DataProcessing { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl SheetdiffError {
    pub fn missing_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            table: table.into(),
        }
    }

    pub fn invalid_key_spec(msg: impl Into<String>) -> Self {
        Self::InvalidKeySpec {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn data_processing(msg: impl Into<String>) -> Self {
        Self::DataProcessing {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Structural errors abort a comparison before any report is produced
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingColumn { .. } | Self::NonUniqueKey { .. } | Self::InvalidKeySpec { .. }
        )
    }
}
