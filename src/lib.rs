//! # sheetdiff
//!
//! Key-based comparison of two versions of a table: rows are reconciled on key columns,
//! selected fields are compared value by value, delimiter-separated fields are compared as
//! token sets, and the result is one `DiffReport` that renders to the terminal, HTML, JSON
//! or an `.xlsx` workbook.

pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod data;
pub mod duckdb_config;
pub mod error;
pub mod export;
pub mod field_diff;
pub mod hash;
pub mod inspect;
pub mod invoices;
pub mod output;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod set_diff;
pub mod table;

pub use compare::{compare_tables, compare_tables_with_context, CompareOptions, ComparisonContext, SourceInfo};
pub use data::{DataProcessor, TableSource};
pub use error::{Result, SheetdiffError};
pub use export::{ReportExporter, XlsxExporter};
pub use output::{HtmlRenderer, JsonFormatter, PrettyPrinter, ReportRenderer};
pub use report::DiffReport;
pub use table::{FieldSelection, KeySpec, KeyTuple, Table, Value};
