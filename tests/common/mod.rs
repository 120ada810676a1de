//! Common test utilities and helpers

use rust_xlsxwriter::{Formula, Workbook};
use sheetdiff::{DataProcessor, Result, SheetdiffError, Table, TableSource};
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture manager for creating temporary input files
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Create a CSV file; cells containing commas or quotes are quoted
    pub fn create_csv(&self, name: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let mut content = String::new();
        for row in data {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| {
                    if cell.contains(',') || cell.contains('"') || cell.contains('，') {
                        format!("\"{}\"", cell.replace('"', "\"\""))
                    } else {
                        cell.to_string()
                    }
                })
                .collect();
            content.push_str(&cells.join(","));
            content.push('\n');
        }
        self.create_csv_raw(name, &content)
    }

    /// Create a file with raw string content
    pub fn create_csv_raw(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a single-sheet workbook; numeric-looking cells are written as numbers
    pub fn create_xlsx(&self, name: &str, sheet: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let path = self.path(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet)?;
        for (r, row) in data.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                if cell.is_empty() {
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(n) if r > 0 => {
                        worksheet.write_number(r, c, n)?;
                    }
                    _ => {
                        worksheet.write_string(r, c, *cell)?;
                    }
                }
            }
        }
        workbook.save(&path)?;
        Ok(path)
    }

    /// Like `create_xlsx`, but cells spelled as an Excel error (`#DIV/0!`, `#N/A`, ...) become
    /// formula cells whose cached result is that error
    pub fn create_xlsx_with_errors(&self, name: &str, sheet: &str, data: &[Vec<&str>]) -> Result<PathBuf> {
        let path = self.path(name);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet)?;
        for (r, row) in data.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                if cell.is_empty() {
                    continue;
                }
                if r > 0 && cell.starts_with('#') {
                    worksheet.write_formula(r, c, Formula::new("=1/0").set_result(*cell))?;
                } else if let (Ok(n), true) = (cell.parse::<f64>(), r > 0) {
                    worksheet.write_number(r, c, n)?;
                } else {
                    worksheet.write_string(r, c, *cell)?;
                }
            }
        }
        let bytes = workbook.save_to_buffer()?;
        fs::write(&path, mark_formula_errors(&bytes)?)?;
        Ok(path)
    }

    pub fn create_config(&self, name: &str, json: &str) -> Result<PathBuf> {
        let path = self.path(name);
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> Result<Table> {
        DataProcessor::new()?.load_table(path)
    }

    /// Load one sheet of a written workbook
    pub fn load_sheet(&self, path: &Path, sheet: &str) -> Result<Table> {
        DataProcessor::with_sheet(Some(sheet.to_string()))?.load_table(path)
    }
}

/// rust_xlsxwriter stores non-numeric formula results as strings; retag them as error cells
fn mark_formula_errors(xlsx: &[u8]) -> Result<Vec<u8>> {
    let zip_err = |e: zip::result::ZipError| SheetdiffError::data_processing(e.to_string());
    let mut archive = zip::ZipArchive::new(Cursor::new(xlsx)).map_err(zip_err)?;
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;
        let name = entry.name().to_string();
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        if name.starts_with("xl/worksheets/") {
            content = String::from_utf8_lossy(&content)
                .replace(r#" t="str"><f>"#, r#" t="e"><f>"#)
                .into_bytes();
        }
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .map_err(zip_err)?;
        writer.write_all(&content)?;
    }
    Ok(writer.finish().map_err(zip_err)?.into_inner())
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a sheetdiff command and return the result
    pub fn run_command(&self, args: &[&str]) -> Result<()> {
        use clap::Parser;
        use sheetdiff::cli::Cli;
        use sheetdiff::commands::execute_command;

        let mut cmd_args = vec!["sheetdiff"];
        cmd_args.extend(args);

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| SheetdiffError::invalid_input(e.to_string()))?;

        execute_command(cli.command, cli.config.as_deref())
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) {
        self.run_command(args).expect("Command should succeed");
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> SheetdiffError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// Sample data generators for testing
pub mod sample_data {
    pub fn simple_csv_data() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "name", "price"],
            vec!["1", "Apple", "1.50"],
            vec!["2", "Banana", "0.75"],
            vec!["3", "Cherry", "2.00"],
        ]
    }

    pub fn updated_csv_data() -> Vec<Vec<&'static str>> {
        vec![
            vec!["id", "name", "price"],
            vec!["1", "Apple", "1.60"], // Price changed
            vec!["2", "Banana", "0.75"],
            vec!["4", "Date", "3.00"], // New row, Cherry removed
        ]
    }

    pub fn old_bom() -> Vec<Vec<&'static str>> {
        vec![
            vec!["序号", "物料编码", "物料名称", "用量", "位置号"],
            vec!["1", "M-100", "电阻 10k", "2", "R1,R2"],
            vec!["2", "M-200", "电容 1uF", "3", "C1，C2,C3"],
            vec!["3", "M-300", "芯片", "1", "U1"],
        ]
    }

    pub fn new_bom() -> Vec<Vec<&'static str>> {
        vec![
            vec!["序号", "物料编码", "物料名称", "用量", "位置号"],
            vec!["1", "M-100", "电阻 10k", "3", "R1,R2,R5"],
            vec!["2", "M-200", "电容 1uF", "2", "C1,C3"],
            vec!["3", "M-400", "晶振", "1", "Y1"],
        ]
    }

    pub fn invoices() -> Vec<Vec<&'static str>> {
        vec![
            vec!["发票号码", "销售方名称", "价税合计", "发票类别"],
            vec!["INV2024031", "Acme", "100", "专票"],
            vec!["INV2024099", "Beta", "50", "普票"],
            vec!["INV2024030", "Acme", "120", "普票"],
            vec!["INV2024050", "Gamma", "80", "专票"],
        ]
    }
}

/// Assertion helpers for test validation
pub mod assertions {
    use sheetdiff::{Table, Value};
    use std::path::Path;

    /// Assert that a file exists and is not empty
    pub fn assert_file_exists_and_not_empty(path: &Path) {
        assert!(path.exists(), "File should exist: {}", path.display());
        let metadata = std::fs::metadata(path).expect("Should be able to read file metadata");
        assert!(metadata.len() > 0, "File should not be empty: {}", path.display());
    }

    /// Display form of one column, in row order
    pub fn column_strings(table: &Table, column: &str) -> Vec<String> {
        let index = table
            .column_index(column)
            .unwrap_or_else(|| panic!("column '{}' should exist", column));
        table.column_values(index).map(Value::to_string).collect()
    }
}
