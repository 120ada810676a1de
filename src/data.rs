//! Loading uploaded files into the `Table` model.
//!
//! Delimited text, Parquet and JSON go through an in-memory DuckDB connection; spreadsheet
//! workbooks go through calamine.

use crate::error::{Result, SheetdiffError};
use crate::inspect::{classify_column, parse_temporal};
use crate::table::{Column, ColumnType, Table, Value};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use std::collections::HashMap;
use std::path::Path;

/// Anything that can turn a file into a `Table`
pub trait TableSource {
    fn load_table(&self, path: &Path) -> Result<Table>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Csv,
    Tsv,
    Parquet,
    Json,
    Workbook,
}

impl SourceFormat {
    fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "parquet" => Some(Self::Parquet),
            "json" | "jsonl" => Some(Self::Json),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Data processor for the supported file formats
pub struct DataProcessor {
    connection: Connection,
    sheet: Option<String>,
}

impl DataProcessor {
    /// Create a new data processor reading the first worksheet of workbooks
    pub fn new() -> Result<Self> {
        Self::with_sheet(None)
    }

    /// Create a processor that reads `sheet` from workbooks
    pub fn with_sheet(sheet: Option<String>) -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        connection.execute("SET enable_progress_bar=false", [])?;
        Ok(Self { connection, sheet })
    }

    /// Check if file format is supported
    pub fn is_supported_format(file_path: &Path) -> bool {
        SourceFormat::detect(file_path).is_some()
    }

    fn table_label(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn reader_sql(path: &Path, format: SourceFormat) -> Result<String> {
        let escaped = path.to_string_lossy().replace('\'', "''");
        match format {
            SourceFormat::Csv => Ok(format!("read_csv('{}', header = true)", escaped)),
            SourceFormat::Tsv => Ok(format!(
                "read_csv('{}', header = true, delim = '\\t')",
                escaped
            )),
            SourceFormat::Parquet => Ok(format!("read_parquet('{}')", escaped)),
            SourceFormat::Json => Ok(format!("read_json_auto('{}')", escaped)),
            SourceFormat::Workbook => Err(SheetdiffError::data_processing(format!(
                "'{}' is a workbook and is not read through DuckDB",
                path.display()
            ))),
        }
    }

    fn load_with_duckdb(&self, path: &Path, format: SourceFormat) -> Result<Table> {
        let create_view_sql = format!(
            "CREATE OR REPLACE VIEW data_view AS SELECT * FROM {}",
            Self::reader_sql(path, format)?
        );
        self.connection
            .execute(&create_view_sql, [])
            .map_err(|e| self.convert_duckdb_error(e, path))?;

        let columns = self.describe_view()?;
        let column_count = columns.len();
        let mut table = Table::new(Self::table_label(path), columns);
        if column_count == 0 {
            return Ok(table);
        }

        let mut stmt = self.connection.prepare("SELECT * FROM data_view").map_err(|e| {
            SheetdiffError::data_processing(format!("Failed to prepare data extraction query: {}", e))
        })?;
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(Self::convert_duckdb_value))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .map_err(|e| {
                SheetdiffError::data_processing(format!("Failed to extract data rows: {}", e))
            })?;

        for row in rows {
            let values = row.map_err(|e| {
                SheetdiffError::data_processing(format!("Failed to process data row: {}", e))
            })?;
            table.push_row(values)?;
        }

        Self::refine_text_columns(&mut table);
        Ok(table)
    }

    /// Column names and declared types of the current view, in file order
    fn describe_view(&self) -> Result<Vec<Column>> {
        let mut stmt = self.connection.prepare("DESCRIBE data_view").map_err(|e| {
            SheetdiffError::data_processing(format!("Failed to prepare describe query: {}", e))
        })?;
        let rows = stmt
            .query_map([], |row| {
                let name: String = row.get(0)?;
                let data_type: String = row.get(1)?;
                Ok(Column::new(name, Self::map_duckdb_type(&data_type)))
            })
            .map_err(|e| {
                SheetdiffError::data_processing(format!("Failed to query column info: {}", e))
            })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| {
                SheetdiffError::data_processing(format!("Failed to process column info row: {}", e))
            })?);
        }
        Ok(columns)
    }

    fn map_duckdb_type(data_type: &str) -> ColumnType {
        let upper = data_type.to_uppercase();
        match upper.as_str() {
            "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" | "HUGEINT" | "UTINYINT"
            | "USMALLINT" | "UINTEGER" | "UBIGINT" => ColumnType::Integer,
            "FLOAT" | "REAL" | "DOUBLE" => ColumnType::Decimal,
            "DATE" => ColumnType::Date,
            t if t.starts_with("DECIMAL") => ColumnType::Decimal,
            t if t.starts_with("TIMESTAMP") => ColumnType::DateTime,
            _ => ColumnType::Text,
        }
    }

    fn convert_duckdb_value(value: ValueRef<'_>) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Boolean(b) => Value::Text(b.to_string()),
            ValueRef::TinyInt(i) => Value::Integer(i.into()),
            ValueRef::SmallInt(i) => Value::Integer(i.into()),
            ValueRef::Int(i) => Value::Integer(i.into()),
            ValueRef::BigInt(i) => Value::Integer(i),
            ValueRef::HugeInt(i) => i64::try_from(i)
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(i.to_string())),
            ValueRef::UTinyInt(i) => Value::Integer(i.into()),
            ValueRef::USmallInt(i) => Value::Integer(i.into()),
            ValueRef::UInt(i) => Value::Integer(i.into()),
            ValueRef::UBigInt(i) => i64::try_from(i)
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(i.to_string())),
            ValueRef::Float(f) => Value::Decimal(f.into()),
            ValueRef::Double(f) => Value::Decimal(f),
            ValueRef::Decimal(d) => {
                let text = d.to_string();
                text.parse::<f64>()
                    .map(Value::Decimal)
                    .unwrap_or(Value::Text(text))
            }
            ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
            ValueRef::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(Duration::days(days.into())))
                .map(Value::Date)
                .unwrap_or(Value::Null),
            ValueRef::Timestamp(unit, raw) => {
                let micros = match unit {
                    TimeUnit::Second => raw.saturating_mul(1_000_000),
                    TimeUnit::Millisecond => raw.saturating_mul(1_000),
                    TimeUnit::Microsecond => raw,
                    TimeUnit::Nanosecond => raw / 1_000,
                };
                DateTime::from_timestamp_micros(micros)
                    .map(|dt| Value::DateTime(dt.naive_utc()))
                    .unwrap_or(Value::Null)
            }
            ValueRef::Blob(b) => Value::Text(format!("<blob:{} bytes>", b.len())),
            other => Value::Text(format!("{:?}", other)),
        }
    }

    /// Text columns holding delimiter-separated tokens are declared multi-value
    fn refine_text_columns(table: &mut Table) {
        let text_columns: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.column_type == ColumnType::Text)
            .map(|(i, _)| i)
            .collect();
        for index in text_columns {
            if classify_column(table.column_values(index)) == ColumnType::MultiValueText {
                table.set_column_type(index, ColumnType::MultiValueText);
            }
        }
    }

    /// Convert DuckDB errors to appropriate SheetdiffError types
    fn convert_duckdb_error(&self, error: duckdb::Error, file_path: &Path) -> SheetdiffError {
        let error_msg = error.to_string();

        if error_msg.contains("CSV Error")
            || error_msg.contains("Could not convert")
            || error_msg.contains("Invalid CSV")
            || error_msg.contains("Unterminated quoted field")
        {
            SheetdiffError::invalid_input(format!(
                "Malformed CSV file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("JSON") {
            SheetdiffError::invalid_input(format!(
                "Malformed JSON file '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else if error_msg.contains("No files found") || error_msg.contains("does not exist") {
            SheetdiffError::invalid_input(format!("File not found: {}", file_path.display()))
        } else if error_msg.contains("UTF-8") || error_msg.contains("encoding") {
            SheetdiffError::invalid_input(format!(
                "File encoding error '{}': {}",
                file_path.display(),
                error_msg
            ))
        } else {
            SheetdiffError::DuckDb(error)
        }
    }

    fn load_workbook(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = match &self.sheet {
            Some(name) => name.clone(),
            None => workbook.sheet_names().first().cloned().ok_or_else(|| {
                SheetdiffError::invalid_input(format!(
                    "Workbook '{}' has no worksheets",
                    path.display()
                ))
            })?,
        };
        log::debug!("Reading sheet '{}' from {}", sheet_name, path.display());
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let label = Self::table_label(path);
        let Some(header) = rows.next() else {
            return Ok(Table::new(label, Vec::new()));
        };
        let columns: Vec<Column> = header_names(header)
            .into_iter()
            .map(|name| Column::new(name, ColumnType::Text))
            .collect();
        let width = columns.len();
        let mut table = Table::new(label, columns);

        let mut skipped = 0usize;
        for row in rows {
            let values: Vec<Value> = (0..width)
                .map(|i| row.get(i).map(convert_cell).unwrap_or(Value::Null))
                .collect();
            if values.iter().all(Value::is_missing) {
                skipped += 1;
                continue;
            }
            table.push_row(values)?;
        }
        if skipped > 0 {
            log::debug!("Skipped {} blank rows in {}", skipped, table.name());
        }

        for index in 0..width {
            let column_type = classify_column(table.column_values(index));
            table.set_column_type(index, column_type);
        }
        Ok(table)
    }
}

impl TableSource for DataProcessor {
    fn load_table(&self, path: &Path) -> Result<Table> {
        if !path.exists() {
            return Err(SheetdiffError::invalid_input(format!(
                "File not found: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(SheetdiffError::invalid_input(format!(
                "Path is not a file: {}",
                path.display()
            )));
        }
        let format = SourceFormat::detect(path).ok_or_else(|| {
            SheetdiffError::invalid_input(format!(
                "Unsupported file format: {} (expected csv, tsv, parquet, json, jsonl, xlsx, xlsm, xls, xlsb or ods)",
                path.display()
            ))
        })?;

        let table = match format {
            SourceFormat::Workbook => self.load_workbook(path)?,
            other => self.load_with_duckdb(path, other)?,
        };
        log::info!(
            "Loaded {} ({} rows, {} columns)",
            table.name(),
            table.row_count(),
            table.column_count()
        );
        Ok(table)
    }
}

/// Header row to unique column names. Blank headers become `Unnamed: N`, repeats get `.1`, `.2`.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let raw = cell.to_string().trim().to_string();
            let base = if raw.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                raw
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        Value::Integer(f as i64)
    } else {
        Value::Decimal(f)
    }
}

fn temporal_value(dt: NaiveDateTime) -> Value {
    if dt.time() == NaiveTime::MIN {
        Value::Date(dt.date())
    } else {
        Value::DateTime(dt)
    }
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(temporal_value)
            .unwrap_or_else(|| float_value(dt.as_f64())),
        Data::DateTimeIso(s) => parse_temporal(s).unwrap_or_else(|| Value::Text(s.clone())),
        Data::Error(e) => {
            log::warn!("Spreadsheet error cell ({:?}) read as empty", e);
            Value::Null
        }
        other => Value::Text(other.to_string()),
    }
}
