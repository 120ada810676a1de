//! Command-line interface for sheetdiff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetdiff")]
#[command(about = "Key-based comparison of spreadsheets and bills of materials")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file (defaults to $SHEETDIFF_CONFIG, then ./sheetdiff.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two tables matched on key columns
    Compare {
        /// Old version of the table
        left: PathBuf,

        /// New version of the table
        right: PathBuf,

        /// Key column; repeat for a composite key
        #[arg(long = "key", required = true)]
        keys: Vec<String>,

        /// Field to compare; defaults to every shared non-key column
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Comma-separated field to compare as a set of tokens
        #[arg(long = "set-field")]
        set_fields: Vec<String>,

        /// Sort report rows by key instead of file order
        #[arg(long)]
        sort_by_key: bool,

        /// Worksheet to read from workbook inputs
        #[arg(long)]
        sheet: Option<String>,

        /// Write an .xlsx report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write an HTML report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Compare two bills of materials by material code and position numbers
    Bom {
        /// Old BOM
        old: PathBuf,

        /// New BOM
        new: PathBuf,

        /// Material code column (detected from headers when omitted)
        #[arg(long)]
        material: Option<String>,

        /// Position number column (detected from headers when omitted)
        #[arg(long)]
        position: Option<String>,

        /// Additional column to compare value by value
        #[arg(long = "other")]
        others: Vec<String>,

        /// Worksheet to read from workbook inputs
        #[arg(long)]
        sheet: Option<String>,

        /// Write an .xlsx report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write an HTML report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show column types and a preview of a table
    Inspect {
        input: PathBuf,

        /// Number of preview rows
        #[arg(long)]
        rows: Option<usize>,

        /// Worksheet to read from workbook inputs
        #[arg(long)]
        sheet: Option<String>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Find invoices whose number is one away from another invoice in the file
    Invoices {
        input: PathBuf,

        /// Column holding invoice numbers
        #[arg(long, default_value = crate::invoices::DEFAULT_INVOICE_COLUMN)]
        invoice_column: String,

        /// Column to filter on
        #[arg(long)]
        category_column: Option<String>,

        /// Category value to keep; repeat for several
        #[arg(long = "value", requires = "category_column")]
        values: Vec<String>,

        /// Worksheet to read from workbook inputs
        #[arg(long)]
        sheet: Option<String>,

        /// Write matching rows to an .xlsx file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}
