//! Key-based row reconciliation between two tables

use crate::error::{Result, SheetdiffError};
use crate::table::{KeySpec, KeyTuple, Table};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A row present in both tables under the same key
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub key: KeyTuple,
    pub left_row: usize,
    pub right_row: usize,
}

/// A row present in only one of the tables
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRow {
    pub key: KeyTuple,
    pub row: usize,
}

/// Three disjoint partitions of the compared rows. Row positions refer to `left` / `right`.
#[derive(Debug, Clone)]
pub struct ReconciliationResult<'a> {
    pub left: &'a Table,
    pub right: &'a Table,
    pub keys: KeySpec,
    pub matched: Vec<MatchedPair>,
    pub left_only: Vec<UnmatchedRow>,
    pub right_only: Vec<UnmatchedRow>,
}

/// Partitions rows of two tables by composite key
pub struct TableKeyReconciler;

impl TableKeyReconciler {
    /// Split `left` and `right` into matched, left-only and right-only rows.
    ///
    /// Both tables are checked for key uniqueness before anything is produced: the join is
    /// strictly one-to-one.
    pub fn reconcile<'a>(
        left: &'a Table,
        right: &'a Table,
        keys: &KeySpec,
    ) -> Result<ReconciliationResult<'a>> {
        let left_keys = keys.indices(left)?;
        let right_keys = keys.indices(right)?;

        let left_index = Self::build_key_index(left, &left_keys, keys)?;
        let right_index = Self::build_key_index(right, &right_keys, keys)?;

        let mut matched = Vec::new();
        let mut left_only = Vec::new();
        for (key, &left_row) in &left_index {
            match right_index.get(key) {
                Some(&right_row) => matched.push(MatchedPair {
                    key: key.clone(),
                    left_row,
                    right_row,
                }),
                None => left_only.push(UnmatchedRow {
                    key: key.clone(),
                    row: left_row,
                }),
            }
        }

        let right_only = right_index
            .iter()
            .filter(|(key, _)| !left_index.contains_key(*key))
            .map(|(key, &row)| UnmatchedRow {
                key: key.clone(),
                row,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Reconciled {} vs {}: {} matched, {} left-only, {} right-only",
            left.name(),
            right.name(),
            matched.len(),
            left_only.len(),
            right_only.len()
        );

        Ok(ReconciliationResult {
            left,
            right,
            keys: keys.clone(),
            matched,
            left_only,
            right_only,
        })
    }

    /// Map each key-tuple to its row, preserving row order. Fails listing every repeated key.
    fn build_key_index(
        table: &Table,
        key_indices: &[usize],
        keys: &KeySpec,
    ) -> Result<IndexMap<KeyTuple, usize>> {
        let mut index = IndexMap::with_capacity(table.row_count());
        let mut duplicates: Vec<KeyTuple> = Vec::new();
        let mut seen_duplicates = HashSet::new();

        for (row_index, row) in table.rows().iter().enumerate() {
            let key = KeyTuple::from_row(row, key_indices);
            if index.contains_key(&key) {
                if seen_duplicates.insert(key.clone()) {
                    duplicates.push(key);
                }
                continue;
            }
            index.insert(key, row_index);
        }

        if !duplicates.is_empty() {
            return Err(SheetdiffError::NonUniqueKey {
                table: table.name().to_string(),
                columns: keys.columns().to_vec(),
                duplicates: duplicates.iter().map(|k| k.to_string()).collect(),
            });
        }

        Ok(index)
    }
}
