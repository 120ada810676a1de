//! Output formatting: terminal tree, HTML and JSON renderings of reports

use crate::error::Result;
use crate::hash;
use crate::inspect::ColumnProfile;
use crate::report::DiffReport;
use crate::table::{Table, Value};
use std::fmt::Write as _;

/// Turns a `DiffReport` into a display representation
pub trait ReportRenderer {
    type Output;

    fn render(&self, report: &DiffReport) -> Result<Self::Output>;
}

/// Pretty printer for terminal output
pub struct PrettyPrinter {
    preview_rows: usize,
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self { preview_rows: 10 }
    }
}

impl PrettyPrinter {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }

    /// Column profiles followed by the first rows of the table
    pub fn render_profiles(&self, table: &Table, profiles: &[ColumnProfile]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📋 {} ({} rows)", table.name(), table.row_count());
        for (i, profile) in profiles.iter().enumerate() {
            let prefix = if i == profiles.len() - 1 { "└─" } else { "├─" };
            let _ = writeln!(
                out,
                "{} {}: {} ({} filled, {} empty)",
                prefix,
                profile.name,
                profile.column_type.label(),
                profile.non_missing,
                profile.missing
            );
        }
        out.push('\n');
        out.push_str(&self.render_table_preview(table));
        out
    }

    /// Header plus up to `preview_rows` rows, tab separated
    pub fn render_table_preview(&self, table: &Table) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", table.column_names().join("\t"));
        for row in table.rows().iter().take(self.preview_rows) {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(out, "{}", cells.join("\t"));
        }
        if table.row_count() > self.preview_rows {
            let _ = writeln!(out, "... and {} more rows", table.row_count() - self.preview_rows);
        }
        out
    }

    fn render_key_only(&self, out: &mut String, title: &str, keys: &[String]) {
        if keys.is_empty() {
            let _ = writeln!(out, "├─ ✅ {}: none", title);
            return;
        }
        let _ = writeln!(out, "├─ ❌ {}: {}", title, keys.len());
        let shown: Vec<&str> = keys.iter().take(self.preview_rows).map(String::as_str).collect();
        let more = if keys.len() > shown.len() { " ..." } else { "" };
        let _ = writeln!(out, "│  └─ {}{}", shown.join(", "), more);
    }
}

impl ReportRenderer for PrettyPrinter {
    type Output = String;

    fn render(&self, report: &DiffReport) -> Result<String> {
        let summary = &report.summary;
        let meta = &summary.metadata;
        let mut out = String::new();

        let _ = writeln!(out, "🔍 Comparison: {} → {}", meta.left_source, meta.right_source);
        let _ = writeln!(out, "├─ Report: {}", meta.report_id);
        let _ = writeln!(out, "├─ Compared at: {}", meta.compared_at.format("%Y-%m-%d %H:%M:%S"));
        if let (Some(left), Some(right)) = (&meta.left_fingerprint, &meta.right_fingerprint) {
            let _ = writeln!(out, "├─ Fingerprints: {} / {}", hash::short(left), hash::short(right));
        }
        let _ = writeln!(out, "├─ Key: [{}]", meta.key_columns.join(", "));
        let _ = writeln!(
            out,
            "├─ Rows: {} old, {} new, {} matched",
            summary.left_rows, summary.right_rows, summary.matched_rows
        );

        let left_keys: Vec<String> = report.left_only_rows.iter().map(|r| r.key.to_string()).collect();
        let right_keys: Vec<String> =
            report.right_only_rows.iter().map(|r| r.key.to_string()).collect();
        self.render_key_only(&mut out, "Only in old", &left_keys);
        self.render_key_only(&mut out, "Only in new", &right_keys);

        if !report.compared_fields().is_empty() {
            if summary.mismatched_rows == 0 {
                let _ = writeln!(
                    out,
                    "├─ ✅ Fields [{}]: all matched",
                    report.compared_fields().join(", ")
                );
            } else {
                let _ = writeln!(out, "├─ ❌ Rows with field differences: {}", summary.mismatched_rows);
                for row in report.mismatched_rows().take(self.preview_rows) {
                    let _ = writeln!(out, "│  ├─ {}", row.key);
                    for diff in row.field_diffs.iter().filter(|d| d.is_mismatch) {
                        let _ = writeln!(
                            out,
                            "│  │  └─ {}: '{}' → '{}'",
                            diff.field, diff.old_value, diff.new_value
                        );
                    }
                }
                if summary.mismatched_rows > self.preview_rows {
                    let _ = writeln!(
                        out,
                        "│  └─ ... and {} more rows",
                        summary.mismatched_rows - self.preview_rows
                    );
                }
            }
        }

        for (field, diffs) in &report.set_field_diffs {
            if diffs.is_empty() {
                let _ = writeln!(out, "├─ ✅ {}: no token changes", field);
                continue;
            }
            let _ = writeln!(out, "├─ ❌ {}: {} keys changed", field, diffs.len());
            for diff in diffs.iter().take(self.preview_rows) {
                let _ = writeln!(out, "│  ├─ {}", diff.key);
                if !diff.added_values.is_empty() {
                    let added: Vec<&str> = diff.added_values.iter().map(String::as_str).collect();
                    let _ = writeln!(out, "│  │  ├─ + {}", added.join(", "));
                }
                if !diff.removed_values.is_empty() {
                    let removed: Vec<&str> =
                        diff.removed_values.iter().map(String::as_str).collect();
                    let _ = writeln!(out, "│  │  └─ - {}", removed.join(", "));
                }
            }
        }

        if report.has_differences() {
            let _ = writeln!(out, "└─ 🟡 Differences found");
        } else {
            let _ = writeln!(out, "└─ ✅ No differences");
        }
        Ok(out)
    }
}

/// HTML rendering with inline highlighting of mismatched values
pub struct HtmlRenderer;

impl HtmlRenderer {
    fn escape(text: &str) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#39;"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn cell(value: &Value, mismatch: bool) -> String {
        let text = Self::escape(&value.to_string());
        if mismatch {
            format!("<td><span class=\"mismatch\" style=\"color:red\">{}</span></td>", text)
        } else {
            format!("<td>{}</td>", text)
        }
    }

    fn header_row(out: &mut String, headers: &[String]) {
        out.push_str("<tr>");
        for h in headers {
            let _ = write!(out, "<th>{}</th>", Self::escape(h));
        }
        out.push_str("</tr>\n");
    }

    fn rows_table(out: &mut String, title: &str, columns: &[String], rows: &[crate::report::KeyOnlyRow]) {
        let _ = writeln!(out, "<h3>{}</h3>", Self::escape(title));
        out.push_str("<table>\n");
        Self::header_row(out, columns);
        for row in rows {
            out.push_str("<tr>");
            for value in &row.values {
                out.push_str(&Self::cell(value, false));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n");
    }
}

impl ReportRenderer for HtmlRenderer {
    type Output = String;

    fn render(&self, report: &DiffReport) -> Result<String> {
        let summary = &report.summary;
        let meta = &summary.metadata;
        let mut out = String::new();

        out.push_str("<div class=\"sheetdiff-report\">\n");
        let _ = writeln!(
            out,
            "<h2>{} → {}</h2>",
            Self::escape(&meta.left_source),
            Self::escape(&meta.right_source)
        );
        let _ = writeln!(
            out,
            "<p>{} rows compared, {} inconsistent.</p>",
            summary.matched_rows, summary.mismatched_rows
        );

        let mut headers: Vec<String> = report.key_columns().to_vec();
        headers.push("Result".to_string());
        for field in report.compared_fields() {
            headers.push(format!("{}_old", field));
            headers.push(format!("{}_new", field));
        }
        out.push_str("<h3>Matched rows</h3>\n<table>\n");
        Self::header_row(&mut out, &headers);
        for row in &report.matched_rows {
            out.push_str("<tr>");
            for value in row.key.values() {
                out.push_str(&Self::cell(value, false));
            }
            let _ = write!(out, "<td>{}</td>", if row.overall_match { "Y" } else { "N" });
            for diff in &row.field_diffs {
                out.push_str(&Self::cell(&diff.old_value, diff.is_mismatch));
                out.push_str(&Self::cell(&diff.new_value, diff.is_mismatch));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</table>\n");

        Self::rows_table(&mut out, "Only in old", &report.left_columns, &report.left_only_rows);
        Self::rows_table(&mut out, "Only in new", &report.right_columns, &report.right_only_rows);

        for (field, diffs) in &report.set_field_diffs {
            let _ = writeln!(out, "<h3>{}</h3>", Self::escape(field));
            out.push_str("<table>\n");
            let mut set_headers: Vec<String> = report.key_columns().to_vec();
            set_headers.push("Added".to_string());
            set_headers.push("Removed".to_string());
            Self::header_row(&mut out, &set_headers);
            for diff in diffs {
                out.push_str("<tr>");
                for value in diff.key.values() {
                    out.push_str(&Self::cell(value, false));
                }
                let added: Vec<&str> = diff.added_values.iter().map(String::as_str).collect();
                let removed: Vec<&str> = diff.removed_values.iter().map(String::as_str).collect();
                let _ = write!(
                    out,
                    "<td>{}</td><td>{}</td>",
                    Self::escape(&added.join(", ")),
                    Self::escape(&removed.join(", "))
                );
                out.push_str("</tr>\n");
            }
            out.push_str("</table>\n");
        }

        out.push_str("</div>\n");
        Ok(out)
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format any serializable data as JSON
    pub fn format<T: serde::Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

impl ReportRenderer for JsonFormatter {
    type Output = String;

    fn render(&self, report: &DiffReport) -> Result<String> {
        Self::format(report)
    }
}
