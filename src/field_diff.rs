//! Field-level comparison of matched rows

use crate::error::Result;
use crate::reconcile::ReconciliationResult;
use crate::table::{FieldSelection, KeyTuple, Value};
use indexmap::IndexMap;
use serde::Serialize;

/// Old/new values of one selected field for one matched key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDiff {
    pub key: KeyTuple,
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub is_mismatch: bool,
}

/// All field comparisons for one matched key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFieldDiff {
    pub overall_match: bool,
    pub diffs: Vec<FieldDiff>,
}

impl RowFieldDiff {
    pub fn mismatches(&self) -> impl Iterator<Item = &FieldDiff> {
        self.diffs.iter().filter(|d| d.is_mismatch)
    }
}

pub struct FieldDiffEngine;

impl FieldDiffEngine {
    /// Two missing values are equal. Missing against present is a mismatch, as is any other
    /// inequality. No tolerance is applied.
    pub fn values_differ(old: &Value, new: &Value) -> bool {
        if old.is_missing() && new.is_missing() {
            return false;
        }
        old != new
    }

    /// Compare `fields` for every matched pair, keyed in reconciliation order
    pub fn diff_fields(
        reconciliation: &ReconciliationResult<'_>,
        fields: &FieldSelection,
    ) -> Result<IndexMap<KeyTuple, RowFieldDiff>> {
        let left = reconciliation.left;
        let right = reconciliation.right;

        let columns = fields
            .fields()
            .iter()
            .map(|field| Ok((field, left.require_column(field)?, right.require_column(field)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut result = IndexMap::with_capacity(reconciliation.matched.len());
        for pair in &reconciliation.matched {
            let diffs: Vec<FieldDiff> = columns
                .iter()
                .map(|(field, left_col, right_col)| {
                    let old_value = left.value(pair.left_row, *left_col);
                    let new_value = right.value(pair.right_row, *right_col);
                    FieldDiff {
                        key: pair.key.clone(),
                        field: (*field).clone(),
                        old_value: old_value.clone(),
                        new_value: new_value.clone(),
                        is_mismatch: Self::values_differ(old_value, new_value),
                    }
                })
                .collect();

            let overall_match = diffs.iter().all(|d| !d.is_mismatch);
            result.insert(
                pair.key.clone(),
                RowFieldDiff {
                    overall_match,
                    diffs,
                },
            );
        }

        Ok(result)
    }
}
