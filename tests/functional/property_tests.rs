//! Property-based tests for key reconciliation and report building.
//!
//! Tables are generated with unique integer keys, a small numeric field and a set-valued
//! `refs` column whose tokens are joined with a mix of delimiters.
//!
//! ```bash
//! PROPTEST_CASES=1000 cargo test --test lib functional::property_tests
//! ```

use proptest::prelude::*;
use sheetdiff::compare::{compare_tables_with_context, CompareOptions, ComparisonContext, SourceInfo};
use sheetdiff::reconcile::TableKeyReconciler;
use sheetdiff::report::KeyOnlyRow;
use sheetdiff::{DiffReport, FieldSelection, KeySpec, Table, Value};
use std::collections::HashSet;

// =============================================================================
// Test Strategies
// =============================================================================

/// Position-number-like token
fn ref_token() -> impl Strategy<Value = String> {
    "[RCU][0-9]{1,2}"
}

/// Set-valued cell: missing, or tokens joined by ASCII or full-width commas with stray spaces
fn refs_cell() -> impl Strategy<Value = Value> {
    let separator = prop_oneof![Just(","), Just(", "), Just("，"), Just(" ， ")];
    prop_oneof![
        1 => Just(Value::Null),
        1 => Just(Value::text("")),
        4 => (prop::collection::vec(ref_token(), 1..5), separator)
            .prop_map(|(tokens, sep)| Value::text(tokens.join(sep))),
    ]
}

/// Table with unique keys drawn from `0..key_space`
fn table(name: &'static str, key_space: i64) -> impl Strategy<Value = Table> {
    prop::collection::hash_set(0..key_space, 0..25)
        .prop_flat_map(|keys| {
            let count = keys.len();
            (
                Just(keys.into_iter().collect::<Vec<_>>()),
                prop::collection::vec((0i64..4, refs_cell()), count),
            )
        })
        .prop_map(move |(keys, cells)| {
            let rows = keys
                .into_iter()
                .zip(cells)
                .map(|(key, (qty, refs))| vec![Value::Integer(key), Value::Integer(qty), refs])
                .collect();
            Table::from_rows(name, &["key", "qty", "refs"], rows).unwrap()
        })
}

fn compare(left: &Table, right: &Table) -> DiffReport {
    let options = CompareOptions {
        set_fields: vec!["refs".to_string()],
        ..CompareOptions::default()
    };
    let context = ComparisonContext::new(SourceInfo::new(left.name()), SourceInfo::new(right.name()), options);
    compare_tables_with_context(
        &context,
        left,
        right,
        &KeySpec::new(["key"]).unwrap(),
        &FieldSelection::new(["qty"]),
    )
    .unwrap()
}

fn key_set(rows: &[KeyOnlyRow]) -> HashSet<String> {
    rows.iter().map(|r| r.key.to_string()).collect()
}

// =============================================================================
// Reconciliation Properties
// =============================================================================

proptest! {
    /// Every row of each table lands in exactly one partition.
    #[test]
    fn partition_covers_every_row_once(left in table("left", 40), right in table("right", 40)) {
        let keys = KeySpec::new(["key"]).unwrap();
        let result = TableKeyReconciler::reconcile(&left, &right, &keys).unwrap();

        let mut left_rows: Vec<usize> = result.matched.iter().map(|m| m.left_row).collect();
        left_rows.extend(result.left_only.iter().map(|r| r.row));
        left_rows.sort_unstable();
        prop_assert_eq!(left_rows, (0..left.row_count()).collect::<Vec<_>>());

        let mut right_rows: Vec<usize> = result.matched.iter().map(|m| m.right_row).collect();
        right_rows.extend(result.right_only.iter().map(|r| r.row));
        right_rows.sort_unstable();
        prop_assert_eq!(right_rows, (0..right.row_count()).collect::<Vec<_>>());
    }

    /// A table compared with itself has no differences of any kind.
    #[test]
    fn self_comparison_has_no_differences(t in table("t", 40)) {
        let report = compare(&t, &t);
        prop_assert_eq!(report.summary.mismatched_rows, 0);
        prop_assert_eq!(report.matched_rows.len(), t.row_count());
        prop_assert!(report.left_only_rows.is_empty());
        prop_assert!(report.right_only_rows.is_empty());
        prop_assert!(report.set_field_diffs["refs"].is_empty());
        prop_assert!(!report.has_differences());
    }

    /// Swapping sides swaps the one-sided rows and the added/removed tokens, and keeps every
    /// mismatch flag.
    #[test]
    fn swapping_sides_mirrors_the_report(a in table("a", 30), b in table("b", 30)) {
        let forward = compare(&a, &b);
        let backward = compare(&b, &a);

        prop_assert_eq!(key_set(&forward.left_only_rows), key_set(&backward.right_only_rows));
        prop_assert_eq!(key_set(&forward.right_only_rows), key_set(&backward.left_only_rows));
        prop_assert_eq!(forward.summary.mismatched_rows, backward.summary.mismatched_rows);

        for row in &forward.matched_rows {
            let mirrored = backward.matched_rows.iter().find(|r| r.key == row.key);
            prop_assert!(mirrored.is_some(), "key {} matched on one side only", row.key);
            let mirrored = mirrored.unwrap();
            prop_assert_eq!(row.field_diffs[0].is_mismatch, mirrored.field_diffs[0].is_mismatch);
            prop_assert_eq!(&row.field_diffs[0].old_value, &mirrored.field_diffs[0].new_value);
        }

        prop_assert_eq!(forward.set_field_diffs["refs"].len(), backward.set_field_diffs["refs"].len());
        for diff in &forward.set_field_diffs["refs"] {
            let mirrored = backward.set_field_diffs["refs"].iter().find(|d| d.key == diff.key);
            prop_assert!(mirrored.is_some(), "set change for {} seen from one side only", diff.key);
            let mirrored = mirrored.unwrap();
            prop_assert_eq!(&diff.added_values, &mirrored.removed_values);
            prop_assert_eq!(&diff.removed_values, &mirrored.added_values);
        }
    }
}
