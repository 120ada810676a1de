//! Comparison entry points and the request-scoped context that drives them

use crate::error::Result;
use crate::field_diff::FieldDiffEngine;
use crate::reconcile::TableKeyReconciler;
use crate::report::{DiffReport, DiffReportBuilder, ReportMetadata};
use crate::set_diff::{SetFieldDiffEngine, DEFAULT_DELIMITERS};
use crate::table::{FieldSelection, KeySpec, Table};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use uuid::Uuid;

/// Caller-level options for a comparison
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Delimiter-separated columns to compare as token sets
    pub set_fields: Vec<String>,
    pub sort_by_key: bool,
    pub set_delimiters: Vec<char>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            set_fields: Vec::new(),
            sort_by_key: false,
            set_delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

/// Where a compared table came from
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub label: String,
    pub fingerprint: Option<String>,
}

impl SourceInfo {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }
}

/// Everything one comparison request needs. Created per request and passed explicitly.
#[derive(Debug, Clone)]
pub struct ComparisonContext {
    pub report_id: Uuid,
    pub started_at: DateTime<Local>,
    pub left: SourceInfo,
    pub right: SourceInfo,
    pub options: CompareOptions,
}

impl ComparisonContext {
    pub fn new(left: SourceInfo, right: SourceInfo, options: CompareOptions) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            started_at: Local::now(),
            left,
            right,
            options,
        }
    }

    /// Context labelled with the tables' own names and default options
    pub fn for_tables(left: &Table, right: &Table) -> Self {
        Self::new(
            SourceInfo::new(left.name()),
            SourceInfo::new(right.name()),
            CompareOptions::default(),
        )
    }
}

/// Compare two tables on `keys` with default options
pub fn compare_tables(
    left: &Table,
    right: &Table,
    keys: &KeySpec,
    fields: &FieldSelection,
) -> Result<DiffReport> {
    let context = ComparisonContext::for_tables(left, right);
    compare_tables_with_context(&context, left, right, keys, fields)
}

/// Full comparison: validate, reconcile, diff fields and set fields, build the report.
///
/// Every referenced column is checked before any work starts, so a bad request never yields a
/// partial report.
pub fn compare_tables_with_context(
    context: &ComparisonContext,
    left: &Table,
    right: &Table,
    keys: &KeySpec,
    fields: &FieldSelection,
) -> Result<DiffReport> {
    let fields = effective_fields(fields, keys);
    let set_fields = FieldSelection::new(context.options.set_fields.iter().cloned());
    let set_fields = effective_fields(&set_fields, keys);

    validate_columns(left, right, keys, &fields, &set_fields)?;

    log::info!(
        "Comparing {} ({} rows) with {} ({} rows) on [{}]",
        left.name(),
        left.row_count(),
        right.name(),
        right.row_count(),
        keys.columns().join(", ")
    );

    let reconciliation = TableKeyReconciler::reconcile(left, right, keys)?;
    let field_diffs = FieldDiffEngine::diff_fields(&reconciliation, &fields)?;

    let set_engine = SetFieldDiffEngine::with_delimiters(&context.options.set_delimiters);
    let mut set_field_diffs = IndexMap::new();
    for field in set_fields.fields() {
        let diffs = set_engine.diff_set_field(&reconciliation, field)?;
        set_field_diffs.insert(field.clone(), diffs);
    }

    let metadata = ReportMetadata {
        report_id: context.report_id,
        left_source: context.left.label.clone(),
        right_source: context.right.label.clone(),
        left_fingerprint: context.left.fingerprint.clone(),
        right_fingerprint: context.right.fingerprint.clone(),
        compared_at: context.started_at,
        key_columns: keys.columns().to_vec(),
        compared_fields: fields.fields().to_vec(),
        set_fields: set_fields.fields().to_vec(),
    };

    let report = DiffReportBuilder::new(metadata)
        .sort_by_key(context.options.sort_by_key)
        .build(&reconciliation, field_diffs, set_field_diffs);

    log::info!(
        "Comparison finished: {} matched ({} mismatched), {} left-only, {} right-only",
        report.summary.matched_rows,
        report.summary.mismatched_rows,
        report.summary.left_only_rows,
        report.summary.right_only_rows
    );

    Ok(report)
}

fn effective_fields(fields: &FieldSelection, keys: &KeySpec) -> FieldSelection {
    let filtered = fields.without_keys(keys);
    if filtered.fields().len() != fields.fields().len() {
        log::warn!("Key columns are not compared as fields; ignoring them in the field selection");
    }
    filtered
}

fn validate_columns(
    left: &Table,
    right: &Table,
    keys: &KeySpec,
    fields: &FieldSelection,
    set_fields: &FieldSelection,
) -> Result<()> {
    let requested = keys
        .columns()
        .iter()
        .chain(fields.fields())
        .chain(set_fields.fields());
    for column in requested {
        left.require_column(column)?;
        right.require_column(column)?;
    }
    Ok(())
}
