//! Unit tests for CLI argument parsing and validation

use clap::Parser;
use sheetdiff::cli::{Cli, Commands, OutputFormat};
use std::path::PathBuf;

#[test]
fn test_cli_compare_command() {
    let cli = Cli::try_parse_from(["sheetdiff", "compare", "old.csv", "new.csv", "--key", "id"]).unwrap();
    match cli.command {
        Commands::Compare {
            left,
            right,
            keys,
            fields,
            set_fields,
            sort_by_key,
            sheet,
            output,
            html,
            format,
        } => {
            assert_eq!(left, PathBuf::from("old.csv"));
            assert_eq!(right, PathBuf::from("new.csv"));
            assert_eq!(keys, vec!["id"]);
            assert!(fields.is_empty());
            assert!(set_fields.is_empty());
            assert!(!sort_by_key);
            assert!(sheet.is_none());
            assert!(output.is_none());
            assert!(html.is_none());
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_command_with_options() {
    let cli = Cli::try_parse_from([
        "sheetdiff", "compare", "old.xlsx", "new.xlsx",
        "--key", "code",
        "--key", "rev",
        "--field", "qty",
        "--field", "price",
        "--set-field", "positions",
        "--sort-by-key",
        "--sheet", "BOM",
        "--output", "report.xlsx",
        "--html", "report.html",
        "--format", "json",
    ])
    .unwrap();

    match cli.command {
        Commands::Compare {
            keys,
            fields,
            set_fields,
            sort_by_key,
            sheet,
            output,
            html,
            format,
            ..
        } => {
            assert_eq!(keys, vec!["code", "rev"]);
            assert_eq!(fields, vec!["qty", "price"]);
            assert_eq!(set_fields, vec!["positions"]);
            assert!(sort_by_key);
            assert_eq!(sheet.as_deref(), Some("BOM"));
            assert_eq!(output, Some(PathBuf::from("report.xlsx")));
            assert_eq!(html, Some(PathBuf::from("report.html")));
            assert_eq!(format, "json");
        }
        _ => panic!("Expected Compare command"),
    }
}

#[test]
fn test_cli_compare_requires_two_inputs_and_key() {
    assert!(Cli::try_parse_from(["sheetdiff", "compare", "old.csv", "--key", "id"]).is_err());
    assert!(Cli::try_parse_from(["sheetdiff", "compare", "old.csv", "new.csv"]).is_err());
}

#[test]
fn test_cli_bom_command() {
    let cli = Cli::try_parse_from([
        "sheetdiff", "bom", "v1.xlsx", "v2.xlsx",
        "--material", "物料编码",
        "--other", "用量",
        "--other", "物料名称",
    ])
    .unwrap();
    match cli.command {
        Commands::Bom {
            old,
            new,
            material,
            position,
            others,
            ..
        } => {
            assert_eq!(old, PathBuf::from("v1.xlsx"));
            assert_eq!(new, PathBuf::from("v2.xlsx"));
            assert_eq!(material.as_deref(), Some("物料编码"));
            assert!(position.is_none());
            assert_eq!(others, vec!["用量", "物料名称"]);
        }
        _ => panic!("Expected Bom command"),
    }
}

#[test]
fn test_cli_inspect_command() {
    let cli = Cli::try_parse_from(["sheetdiff", "inspect", "data.csv", "--rows", "3"]).unwrap();
    match cli.command {
        Commands::Inspect { input, rows, format, .. } => {
            assert_eq!(input, PathBuf::from("data.csv"));
            assert_eq!(rows, Some(3));
            assert_eq!(format, "pretty");
        }
        _ => panic!("Expected Inspect command"),
    }
}

#[test]
fn test_cli_inspect_rejects_bad_row_count() {
    assert!(Cli::try_parse_from(["sheetdiff", "inspect", "data.csv", "--rows", "many"]).is_err());
}

#[test]
fn test_cli_invoices_command() {
    let cli = Cli::try_parse_from([
        "sheetdiff", "invoices", "invoices.xlsx",
        "--category-column", "发票类别",
        "--value", "专票",
        "--value", "普票",
        "--output", "out.xlsx",
    ])
    .unwrap();
    match cli.command {
        Commands::Invoices {
            invoice_column,
            category_column,
            values,
            output,
            ..
        } => {
            assert_eq!(invoice_column, "发票号码");
            assert_eq!(category_column.as_deref(), Some("发票类别"));
            assert_eq!(values, vec!["专票", "普票"]);
            assert_eq!(output, Some(PathBuf::from("out.xlsx")));
        }
        _ => panic!("Expected Invoices command"),
    }
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from([
        "sheetdiff", "inspect", "data.csv", "--verbose", "--config", "cfg.json",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("cfg.json")));

    let cli = Cli::try_parse_from(["sheetdiff", "-v", "inspect", "data.csv"]).unwrap();
    assert!(cli.verbose);
    assert!(cli.config.is_none());
}

#[test]
fn test_cli_unknown_command() {
    assert!(Cli::try_parse_from(["sheetdiff", "merge", "a.csv"]).is_err());
}

#[test]
fn test_output_format_parse() {
    assert!(matches!(OutputFormat::parse("pretty"), Ok(OutputFormat::Pretty)));
    assert!(matches!(OutputFormat::parse("Json"), Ok(OutputFormat::Json)));
    assert!(OutputFormat::parse("yaml").is_err());
}
