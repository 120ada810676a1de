//! Functional tests for BOM comparison on workbooks

use crate::common::{assertions, sample_data, CliTestRunner, TestFixture};
use sheetdiff::compare::{compare_tables_with_context, CompareOptions, ComparisonContext, SourceInfo};
use sheetdiff::{FieldSelection, KeySpec, Value};

#[test]
fn test_bom_workbook_comparison() {
    let fixture = TestFixture::new().unwrap();
    let old = fixture.create_xlsx("v1.xlsx", "BOM", &sample_data::old_bom()).unwrap();
    let new = fixture.create_xlsx("v2.xlsx", "BOM", &sample_data::new_bom()).unwrap();
    let left = fixture.load(&old).unwrap();
    let right = fixture.load(&new).unwrap();

    let options = CompareOptions {
        set_fields: vec!["位置号".to_string()],
        ..CompareOptions::default()
    };
    let context = ComparisonContext::new(SourceInfo::new("v1.xlsx"), SourceInfo::new("v2.xlsx"), options);
    let report = compare_tables_with_context(
        &context,
        &left,
        &right,
        &KeySpec::new(["物料编码"]).unwrap(),
        &FieldSelection::new(["用量"]),
    )
    .unwrap();

    assert_eq!(report.summary.matched_rows, 2);
    assert_eq!(report.summary.mismatched_rows, 2);
    assert_eq!(report.left_only_rows[0].key.to_string(), "M-300");
    assert_eq!(report.right_only_rows[0].key.to_string(), "M-400");

    let qty = &report.matched_rows[0].field_diffs[0];
    assert_eq!(qty.old_value, Value::Integer(2));
    assert_eq!(qty.new_value, Value::Integer(3));

    let positions = &report.set_field_diffs["位置号"];
    assert_eq!(positions.len(), 2);
    let resistor = &positions[0];
    assert_eq!(resistor.key.to_string(), "M-100");
    assert_eq!(resistor.added_values.iter().collect::<Vec<_>>(), vec!["R5"]);
    assert!(resistor.removed_values.is_empty());

    // full-width comma in the old file splits like an ASCII comma
    let capacitor = &positions[1];
    assert_eq!(capacitor.key.to_string(), "M-200");
    assert!(capacitor.added_values.is_empty());
    assert_eq!(capacitor.removed_values.iter().collect::<Vec<_>>(), vec!["C2"]);

    assert_eq!(report.added_view("位置号").len(), 1);
    assert_eq!(report.removed_view("位置号").len(), 1);
}

#[test]
fn test_cli_bom_detects_columns_and_exports() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture.create_xlsx("v1.xlsx", "BOM", &sample_data::old_bom()).unwrap();
    let new = fixture.create_xlsx("v2.xlsx", "BOM", &sample_data::new_bom()).unwrap();
    let output = fixture.path("bom_report.xlsx");
    let html = fixture.path("bom_report.html");

    runner.expect_success(&[
        "bom",
        old.to_str().unwrap(),
        new.to_str().unwrap(),
        "--other",
        "用量",
        "--output",
        output.to_str().unwrap(),
        "--html",
        html.to_str().unwrap(),
    ]);

    assertions::assert_file_exists_and_not_empty(&output);
    assertions::assert_file_exists_and_not_empty(&html);

    let added = fixture.load_sheet(&output, "位置号 Added").unwrap();
    assert_eq!(assertions::column_strings(&added, "物料编码"), vec!["M-100"]);
    assert_eq!(assertions::column_strings(&added, "位置号"), vec!["R5"]);

    let removed = fixture.load_sheet(&output, "位置号 Removed").unwrap();
    assert_eq!(assertions::column_strings(&removed, "物料编码"), vec!["M-200"]);
    assert_eq!(assertions::column_strings(&removed, "位置号"), vec!["C2"]);

    let diffs = fixture.load_sheet(&output, "Field Diffs").unwrap();
    assert_eq!(
        diffs.column_names(),
        vec!["物料编码", "Result", "用量_old", "用量_new"]
    );
    assert_eq!(assertions::column_strings(&diffs, "Result"), vec!["N", "N"]);

    let page = std::fs::read_to_string(&html).unwrap();
    assert!(page.contains("<span class=\"mismatch\" style=\"color:red\">2</span>"));
    assert!(page.contains("R5"));
}

#[test]
fn test_cli_bom_explicit_columns() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let old = fixture
        .create_csv("old.csv", &[vec!["part", "refs"], vec!["P1", "A1,A2"]])
        .unwrap();
    let new = fixture
        .create_csv("new.csv", &[vec!["part", "refs"], vec!["P1", "A2"]])
        .unwrap();

    runner.expect_success(&[
        "bom",
        old.to_str().unwrap(),
        new.to_str().unwrap(),
        "--material",
        "part",
        "--position",
        "refs",
        "--format",
        "json",
    ]);

    let err = runner.expect_failure(&[
        "bom",
        old.to_str().unwrap(),
        new.to_str().unwrap(),
        "--material",
        "part",
        "--position",
        "missing",
    ]);
    assert!(err.is_structural());
}
