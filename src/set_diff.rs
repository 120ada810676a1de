//! Set-valued field comparison (e.g. BOM position numbers)

use crate::error::Result;
use crate::reconcile::ReconciliationResult;
use crate::table::{KeyTuple, Value};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;

/// Delimiters used when none are configured: ASCII comma and full-width comma
pub const DEFAULT_DELIMITERS: &[char] = &[',', '，'];

/// Tokens added to and removed from a set-valued field for one matched key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetFieldDiff {
    pub key: KeyTuple,
    pub added_values: BTreeSet<String>,
    pub removed_values: BTreeSet<String>,
}

impl SetFieldDiff {
    pub fn has_changes(&self) -> bool {
        !self.added_values.is_empty() || !self.removed_values.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SetFieldDiffEngine {
    delimiters: Vec<char>,
}

impl Default for SetFieldDiffEngine {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

impl SetFieldDiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `delimiters` in addition to the default commas
    pub fn with_delimiters(delimiters: &[char]) -> Self {
        let mut engine = Self::default();
        for d in delimiters {
            if !engine.delimiters.contains(d) {
                engine.delimiters.push(*d);
            }
        }
        engine
    }

    /// Split a cell into its token set.
    ///
    /// Missing cells give the empty set. Non-text scalars are a single opaque token.
    pub fn normalize(&self, value: &Value) -> BTreeSet<String> {
        if value.is_missing() {
            return BTreeSet::new();
        }
        match value {
            Value::Text(s) => s
                .split(|c: char| self.delimiters.contains(&c))
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
            other => {
                log::debug!("Treating non-text set value '{}' as a single token", other);
                BTreeSet::from([other.to_string()])
            }
        }
    }

    /// Added/removed tokens of `field` for every matched key, in reconciliation order
    pub fn diff_set_field(
        &self,
        reconciliation: &ReconciliationResult<'_>,
        field: &str,
    ) -> Result<IndexMap<KeyTuple, SetFieldDiff>> {
        let left_col = reconciliation.left.require_column(field)?;
        let right_col = reconciliation.right.require_column(field)?;

        let mut result = IndexMap::with_capacity(reconciliation.matched.len());
        for pair in &reconciliation.matched {
            let old = self.normalize(reconciliation.left.value(pair.left_row, left_col));
            let new = self.normalize(reconciliation.right.value(pair.right_row, right_col));

            result.insert(
                pair.key.clone(),
                SetFieldDiff {
                    key: pair.key.clone(),
                    added_values: new.difference(&old).cloned().collect(),
                    removed_values: old.difference(&new).cloned().collect(),
                },
            );
        }
        Ok(result)
    }
}
