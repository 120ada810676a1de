//! Canonical diff report model and its builder

use crate::field_diff::{FieldDiff, RowFieldDiff};
use crate::reconcile::{ReconciliationResult, UnmatchedRow};
use crate::set_diff::SetFieldDiff;
use crate::table::{KeyTuple, Table, Value};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

/// Facts about one comparison request
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub report_id: Uuid,
    pub left_source: String,
    pub right_source: String,
    pub left_fingerprint: Option<String>,
    pub right_fingerprint: Option<String>,
    pub compared_at: DateTime<Local>,
    pub key_columns: Vec<String>,
    pub compared_fields: Vec<String>,
    pub set_fields: Vec<String>,
}

/// Metadata plus row counts
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    #[serde(flatten)]
    pub metadata: ReportMetadata,
    pub left_rows: usize,
    pub right_rows: usize,
    pub matched_rows: usize,
    pub mismatched_rows: usize,
    pub left_only_rows: usize,
    pub right_only_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedRow {
    pub key: KeyTuple,
    pub overall_match: bool,
    pub field_diffs: Vec<FieldDiff>,
}

/// A row found in only one table, with all of its values
#[derive(Debug, Clone, Serialize)]
pub struct KeyOnlyRow {
    pub key: KeyTuple,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub summary: ReportSummary,
    pub left_columns: Vec<String>,
    pub right_columns: Vec<String>,
    pub matched_rows: Vec<MatchedRow>,
    pub left_only_rows: Vec<KeyOnlyRow>,
    pub right_only_rows: Vec<KeyOnlyRow>,
    pub set_field_diffs: IndexMap<String, Vec<SetFieldDiff>>,
}

impl DiffReport {
    pub fn key_columns(&self) -> &[String] {
        &self.summary.metadata.key_columns
    }

    pub fn compared_fields(&self) -> &[String] {
        &self.summary.metadata.compared_fields
    }

    pub fn mismatched_rows(&self) -> impl Iterator<Item = &MatchedRow> {
        self.matched_rows.iter().filter(|r| !r.overall_match)
    }

    /// Keys whose set field gained tokens
    pub fn added_view(&self, field: &str) -> Vec<&SetFieldDiff> {
        self.set_field_diffs
            .get(field)
            .map(|diffs| diffs.iter().filter(|d| !d.added_values.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Keys whose set field lost tokens
    pub fn removed_view(&self, field: &str) -> Vec<&SetFieldDiff> {
        self.set_field_diffs
            .get(field)
            .map(|diffs| diffs.iter().filter(|d| !d.removed_values.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn has_differences(&self) -> bool {
        self.summary.mismatched_rows > 0
            || !self.left_only_rows.is_empty()
            || !self.right_only_rows.is_empty()
            || self.set_field_diffs.values().any(|d| !d.is_empty())
    }
}

/// Shapes engine output into a `DiffReport`
pub struct DiffReportBuilder {
    metadata: ReportMetadata,
    sort_by_key: bool,
}

impl DiffReportBuilder {
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            sort_by_key: false,
        }
    }

    /// Sort every row list by key instead of keeping reconciliation order
    pub fn sort_by_key(mut self, sort: bool) -> Self {
        self.sort_by_key = sort;
        self
    }

    pub fn build(
        self,
        reconciliation: &ReconciliationResult<'_>,
        field_diffs: IndexMap<KeyTuple, RowFieldDiff>,
        set_field_diffs: IndexMap<String, IndexMap<KeyTuple, SetFieldDiff>>,
    ) -> DiffReport {
        let mut field_diffs = field_diffs;
        let mut matched_rows: Vec<MatchedRow> = reconciliation
            .matched
            .iter()
            .map(|pair| {
                let row = field_diffs.swap_remove(&pair.key).unwrap_or(RowFieldDiff {
                    overall_match: true,
                    diffs: Vec::new(),
                });
                MatchedRow {
                    key: pair.key.clone(),
                    overall_match: row.overall_match,
                    field_diffs: row.diffs,
                }
            })
            .collect();

        let key_only = |table: &Table, rows: &[UnmatchedRow]| {
            rows.iter()
                .map(|r| KeyOnlyRow {
                    key: r.key.clone(),
                    values: table.row(r.row).to_vec(),
                })
                .collect::<Vec<_>>()
        };
        let mut left_only_rows = key_only(reconciliation.left, &reconciliation.left_only);
        let mut right_only_rows = key_only(reconciliation.right, &reconciliation.right_only);

        let mut set_field_diffs: IndexMap<String, Vec<SetFieldDiff>> = set_field_diffs
            .into_iter()
            .map(|(field, diffs)| {
                let changed = diffs.into_values().filter(SetFieldDiff::has_changes).collect();
                (field, changed)
            })
            .collect();

        if self.sort_by_key {
            matched_rows.sort_by(|a, b| a.key.cmp(&b.key));
            left_only_rows.sort_by(|a, b| a.key.cmp(&b.key));
            right_only_rows.sort_by(|a, b| a.key.cmp(&b.key));
            for diffs in set_field_diffs.values_mut() {
                diffs.sort_by(|a, b| a.key.cmp(&b.key));
            }
        }

        let mismatched_rows = matched_rows.iter().filter(|r| !r.overall_match).count();
        let summary = ReportSummary {
            metadata: self.metadata,
            left_rows: reconciliation.left.row_count(),
            right_rows: reconciliation.right.row_count(),
            matched_rows: matched_rows.len(),
            mismatched_rows,
            left_only_rows: left_only_rows.len(),
            right_only_rows: right_only_rows.len(),
        };

        DiffReport {
            summary,
            left_columns: reconciliation
                .left
                .column_names()
                .into_iter()
                .map(String::from)
                .collect(),
            right_columns: reconciliation
                .right
                .column_names()
                .into_iter()
                .map(String::from)
                .collect(),
            matched_rows,
            left_only_rows,
            right_only_rows,
            set_field_diffs,
        }
    }
}
