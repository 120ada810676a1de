//! Workbook export of diff reports and plain tables

use crate::error::{Result, SheetdiffError};
use crate::field_diff::FieldDiff;
use crate::report::{DiffReport, KeyOnlyRow};
use crate::table::{Table, Value};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::collections::HashSet;

const MAX_SHEET_NAME: usize = 31;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Serialises a `DiffReport` into a downloadable document
pub trait ReportExporter {
    fn export(&self, report: &DiffReport) -> Result<Vec<u8>>;
}

/// Make `name` a legal worksheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    if truncated.is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}

/// Hands out sanitised sheet names, unique ignoring case
#[derive(Default)]
struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    fn claim(&mut self, name: &str) -> String {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

fn position(row: usize, col: usize) -> Result<(u32, u16)> {
    let row = u32::try_from(row)
        .map_err(|_| SheetdiffError::invalid_input(format!("row {} is beyond the sheet limit", row)))?;
    let col = u16::try_from(col).map_err(|_| {
        SheetdiffError::invalid_input(format!("column {} is beyond the sheet limit", col))
    })?;
    Ok((row, col))
}

fn write_value(
    sheet: &mut Worksheet,
    row: usize,
    col: usize,
    value: &Value,
    format: Option<&Format>,
) -> Result<()> {
    let (row, col) = position(row, col)?;
    match (value, format) {
        (Value::Null, None) => {}
        (Value::Null, Some(f)) => {
            sheet.write_blank(row, col, f)?;
        }
        (Value::Integer(i), None) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        (Value::Integer(i), Some(f)) => {
            sheet.write_number_with_format(row, col, *i as f64, f)?;
        }
        (Value::Decimal(d), None) => {
            sheet.write_number(row, col, *d)?;
        }
        (Value::Decimal(d), Some(f)) => {
            sheet.write_number_with_format(row, col, *d, f)?;
        }
        (other, None) => {
            sheet.write_string(row, col, other.to_string())?;
        }
        (other, Some(f)) => {
            sheet.write_string_with_format(row, col, other.to_string(), f)?;
        }
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, headers: &[String], bold: &Format) -> Result<()> {
    for (col, header) in headers.iter().enumerate() {
        let (row, col) = position(0, col)?;
        sheet.write_string_with_format(row, col, header, bold)?;
    }
    Ok(())
}

fn write_row(sheet: &mut Worksheet, row: usize, values: &[Value]) -> Result<()> {
    for (col, value) in values.iter().enumerate() {
        write_value(sheet, row, col, value, None)?;
    }
    Ok(())
}

/// Fill for the old/new cell pair of one compared field: highlighted only when the values differ
fn diff_cell_format<'a>(diff: &FieldDiff, highlight: &'a Format) -> Option<&'a Format> {
    diff.is_mismatch.then_some(highlight)
}

/// Multi-sheet `.xlsx` export
pub struct XlsxExporter {
    highlight_color: u32,
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self {
            highlight_color: 0xFFC7CE,
        }
    }
}

impl XlsxExporter {
    pub fn new(highlight_color: u32) -> Self {
        Self { highlight_color }
    }

    /// Single-sheet workbook holding `table` as-is
    pub fn export_table(&self, table: &Table) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let mut names = SheetNames::default();

        let sheet = workbook.add_worksheet();
        sheet.set_name(names.claim(table.name()))?;
        let headers: Vec<String> = table.column_names().into_iter().map(String::from).collect();
        write_header(sheet, &headers, &bold)?;
        for (i, row) in table.rows().iter().enumerate() {
            write_row(sheet, i + 1, row)?;
        }
        Ok(workbook.save_to_buffer()?)
    }

    fn write_summary(sheet: &mut Worksheet, report: &DiffReport, bold: &Format) -> Result<()> {
        let summary = &report.summary;
        let meta = &summary.metadata;
        let text_rows = [
            ("Report ID", meta.report_id.to_string()),
            ("Old file", meta.left_source.clone()),
            ("New file", meta.right_source.clone()),
            ("Old fingerprint", meta.left_fingerprint.clone().unwrap_or_default()),
            ("New fingerprint", meta.right_fingerprint.clone().unwrap_or_default()),
            ("Compared at", meta.compared_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            ("Key columns", meta.key_columns.join(", ")),
            ("Compared fields", meta.compared_fields.join(", ")),
            ("Set fields", meta.set_fields.join(", ")),
        ];
        let count_rows = [
            ("Old rows", summary.left_rows),
            ("New rows", summary.right_rows),
            ("Matched rows", summary.matched_rows),
            ("Mismatched rows", summary.mismatched_rows),
            ("Only in old", summary.left_only_rows),
            ("Only in new", summary.right_only_rows),
        ];

        let mut row = 0u32;
        for (label, value) in text_rows {
            sheet.write_string_with_format(row, 0, label, bold)?;
            sheet.write_string(row, 1, value)?;
            row += 1;
        }
        for (label, count) in count_rows {
            sheet.write_string_with_format(row, 0, label, bold)?;
            sheet.write_number(row, 1, count as f64)?;
            row += 1;
        }
        Ok(())
    }

    fn write_key_only(
        sheet: &mut Worksheet,
        columns: &[String],
        rows: &[KeyOnlyRow],
        bold: &Format,
    ) -> Result<()> {
        write_header(sheet, columns, bold)?;
        for (i, row) in rows.iter().enumerate() {
            write_row(sheet, i + 1, &row.values)?;
        }
        Ok(())
    }

    fn write_field_diffs(
        sheet: &mut Worksheet,
        report: &DiffReport,
        bold: &Format,
        highlight: &Format,
    ) -> Result<()> {
        let mut headers: Vec<String> = report.key_columns().to_vec();
        headers.push("Result".to_string());
        for field in report.compared_fields() {
            headers.push(format!("{}_old", field));
            headers.push(format!("{}_new", field));
        }
        write_header(sheet, &headers, bold)?;

        for (i, matched) in report.matched_rows.iter().enumerate() {
            let row = i + 1;
            write_row(sheet, row, matched.key.values())?;
            let mut col = matched.key.values().len();
            let result = Value::text(if matched.overall_match { "Y" } else { "N" });
            write_value(sheet, row, col, &result, None)?;
            col += 1;
            for diff in &matched.field_diffs {
                let format = diff_cell_format(diff, highlight);
                write_value(sheet, row, col, &diff.old_value, format)?;
                write_value(sheet, row, col + 1, &diff.new_value, format)?;
                col += 2;
            }
        }
        Ok(())
    }

    fn write_set_view(
        sheet: &mut Worksheet,
        report: &DiffReport,
        field: &str,
        added: bool,
        bold: &Format,
    ) -> Result<()> {
        let mut headers: Vec<String> = report.key_columns().to_vec();
        headers.push(field.to_string());
        write_header(sheet, &headers, bold)?;

        let view = if added {
            report.added_view(field)
        } else {
            report.removed_view(field)
        };
        for (i, diff) in view.into_iter().enumerate() {
            let row = i + 1;
            write_row(sheet, row, diff.key.values())?;
            let tokens = if added {
                &diff.added_values
            } else {
                &diff.removed_values
            };
            let joined = tokens.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            write_value(sheet, row, diff.key.values().len(), &Value::Text(joined), None)?;
        }
        Ok(())
    }
}

impl ReportExporter for XlsxExporter {
    fn export(&self, report: &DiffReport) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let highlight = Format::new().set_background_color(Color::RGB(self.highlight_color));
        let mut names = SheetNames::default();

        let sheet = workbook.add_worksheet();
        sheet.set_name(names.claim("Summary"))?;
        Self::write_summary(sheet, report, &bold)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(names.claim("Left Only"))?;
        Self::write_key_only(sheet, &report.left_columns, &report.left_only_rows, &bold)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(names.claim("Right Only"))?;
        Self::write_key_only(sheet, &report.right_columns, &report.right_only_rows, &bold)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(names.claim("Field Diffs"))?;
        Self::write_field_diffs(sheet, report, &bold, &highlight)?;

        for field in report.set_field_diffs.keys() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(names.claim(&format!("{} Added", field)))?;
            Self::write_set_view(sheet, report, field, true, &bold)?;

            let sheet = workbook.add_worksheet();
            sheet.set_name(names.claim(&format!("{} Removed", field)))?;
            Self::write_set_view(sheet, report, field, false, &bold)?;
        }

        log::debug!("Exported report {} to workbook", report.summary.metadata.report_id);
        Ok(workbook.save_to_buffer()?)
    }
}
