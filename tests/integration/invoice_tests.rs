//! Integration tests for the `invoices` and `inspect` commands

use crate::common::{assertions, sample_data, CliTestRunner};
use sheetdiff::invoices::ConsecutiveInvoiceFinder;
use sheetdiff::SheetdiffError;

#[test]
fn test_invoices_exports_consecutive_rows() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let input = fixture.create_xlsx("invoices.xlsx", "Sheet1", &sample_data::invoices()).unwrap();
    let output = fixture.path("consecutive.xlsx");

    runner.expect_success(&[
        "invoices",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);

    let found = fixture.load(&output).unwrap();
    assert_eq!(
        assertions::column_strings(&found, "发票号码"),
        vec!["INV2024030", "INV2024031"]
    );
    assert_eq!(found.column_count(), 4);
}

#[test]
fn test_invoices_category_filter() {
    let fixture = crate::common::TestFixture::new().unwrap();
    let input = fixture.create_xlsx("invoices.xlsx", "Sheet1", &sample_data::invoices()).unwrap();
    let table = fixture.load(&input).unwrap();

    let found = ConsecutiveInvoiceFinder::new("发票号码")
        .with_category_filter("发票类别", vec!["专票".to_string()])
        .find(&table)
        .unwrap();
    assert_eq!(assertions::column_strings(&found, "发票号码"), vec!["INV2024031"]);
}

#[test]
fn test_invoices_missing_column() {
    let runner = CliTestRunner::new().unwrap();
    let input = runner
        .fixture()
        .create_csv("plain.csv", &[vec!["number", "kind"], vec!["A01", "x"]])
        .unwrap();

    let err = runner.expect_failure(&["invoices", input.to_str().unwrap()]);
    assert!(matches!(err, SheetdiffError::MissingColumn { ref column, .. } if column == "发票号码"));

    runner.expect_success(&[
        "invoices",
        input.to_str().unwrap(),
        "--invoice-column",
        "number",
        "--format",
        "json",
    ]);
}

#[test]
fn test_inspect_command() {
    let runner = CliTestRunner::new().unwrap();
    let input = runner.fixture().create_csv("data.csv", &sample_data::simple_csv_data()).unwrap();

    runner.expect_success(&["inspect", input.to_str().unwrap()]);
    runner.expect_success(&["inspect", input.to_str().unwrap(), "--rows", "1", "--format", "json"]);
}
