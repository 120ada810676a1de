//! Command implementations for sheetdiff CLI

use crate::cli::{Commands, OutputFormat};
use crate::compare::{compare_tables_with_context, CompareOptions, ComparisonContext, SourceInfo};
use crate::config::SheetdiffConfig;
use crate::data::{DataProcessor, TableSource};
use crate::error::{Result, SheetdiffError};
use crate::export::{ReportExporter, XlsxExporter};
use crate::hash;
use crate::inspect::profile_table;
use crate::invoices::ConsecutiveInvoiceFinder;
use crate::output::{HtmlRenderer, JsonFormatter, PrettyPrinter, ReportRenderer};
use crate::progress::ProgressReporter;
use crate::report::DiffReport;
use crate::table::{FieldSelection, KeySpec, Table, Value};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Execute a command, resolving configuration first
pub fn execute_command(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let config = SheetdiffConfig::load(config_path)?;
    execute_with_config(command, &config)
}

/// Execute a command with an already loaded configuration
pub fn execute_with_config(command: Commands, config: &SheetdiffConfig) -> Result<()> {
    match command {
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
            let request = CompareRequest {
                left: &left,
                right: &right,
                sheet,
                keys,
                fields: (!fields.is_empty()).then(|| FieldSelection::new(fields)),
                set_fields,
                sort_by_key,
            };
            let targets = ReportTargets::new(output, html, &format)?;
            compare_command(config, request, &targets).map(|_| ())
        }
        Commands::Bom {
            old,
            new,
            material,
            position,
            others,
            sheet,
            output,
            html,
            format,
        } => {
            let targets = ReportTargets::new(output, html, &format)?;
            let columns = BomColumns {
                material,
                position,
                others,
            };
            bom_command(config, &old, &new, sheet, columns, &targets).map(|_| ())
        }
        Commands::Inspect {
            input,
            rows,
            sheet,
            format,
        } => inspect_command(config, &input, rows, sheet, &format),
        Commands::Invoices {
            input,
            invoice_column,
            category_column,
            values,
            sheet,
            output,
            format,
        } => {
            let mut finder = ConsecutiveInvoiceFinder::new(invoice_column);
            if let Some(column) = category_column {
                finder = finder.with_category_filter(column, values);
            }
            invoices_command(config, &input, &finder, sheet, output.as_deref(), &format)
        }
    }
}

/// Where a comparison's results go
struct ReportTargets {
    output: Option<PathBuf>,
    html: Option<PathBuf>,
    format: OutputFormat,
}

impl ReportTargets {
    fn new(output: Option<PathBuf>, html: Option<PathBuf>, format: &str) -> Result<Self> {
        let format = OutputFormat::parse(format).map_err(|e| SheetdiffError::invalid_input(e))?;
        Ok(Self {
            output,
            html,
            format,
        })
    }
}

struct CompareRequest<'a> {
    left: &'a Path,
    right: &'a Path,
    sheet: Option<String>,
    keys: Vec<String>,
    /// Explicit field selection; `None` compares every shared non-key column
    fields: Option<FieldSelection>,
    set_fields: Vec<String>,
    sort_by_key: bool,
}

struct BomColumns {
    material: Option<String>,
    position: Option<String>,
    others: Vec<String>,
}

fn processor_for(config: &SheetdiffConfig, sheet: Option<String>) -> Result<DataProcessor> {
    DataProcessor::with_sheet(sheet.or_else(|| config.sheet.clone()))
}

fn source_info(table: &Table, path: &Path) -> Result<SourceInfo> {
    let fingerprint = hash::fingerprint_file(path)?;
    log::debug!("{} fingerprint {}", path.display(), hash::short(&fingerprint));
    Ok(SourceInfo::new(table.name()).with_fingerprint(fingerprint))
}

fn load_pair(
    processor: &DataProcessor,
    left: &Path,
    right: &Path,
    progress: &mut ProgressReporter,
) -> Result<(Table, Table)> {
    progress.update_load(&format!("Loading {}...", left.display()));
    let left_table = processor.load_table(left)?;
    progress.update_load(&format!("Loading {}...", right.display()));
    let right_table = processor.load_table(right)?;
    progress.finish_load(&format!(
        "Loaded {} and {} rows",
        left_table.row_count(),
        right_table.row_count()
    ));
    Ok((left_table, right_table))
}

fn compare_command(
    config: &SheetdiffConfig,
    request: CompareRequest<'_>,
    targets: &ReportTargets,
) -> Result<DiffReport> {
    let mut progress = ProgressReporter::new(targets.format == OutputFormat::Pretty);
    let processor = processor_for(config, request.sheet)?;
    let (left, right) = load_pair(&processor, request.left, request.right, &mut progress)?;
    let keys = KeySpec::new(request.keys)?;

    let fields = match request.fields {
        Some(fields) => fields,
        None => {
            let shared = FieldSelection::common_non_key(&left, &right, &keys);
            FieldSelection::new(
                shared
                    .fields()
                    .iter()
                    .filter(|f| !request.set_fields.contains(f))
                    .cloned(),
            )
        }
    };

    let options = CompareOptions {
        set_fields: request.set_fields,
        sort_by_key: request.sort_by_key || config.sort_by_key,
        set_delimiters: config.set_delimiters.clone(),
    };
    let context = ComparisonContext::new(
        source_info(&left, request.left)?,
        source_info(&right, request.right)?,
        options,
    );

    let report = compare_tables_with_context(&context, &left, &right, &keys, &fields)?;
    progress.finish_compare(&format!(
        "Compared {} matched rows",
        report.summary.matched_rows
    ));

    write_targets(config, &report, targets, &mut progress)?;
    progress.clear();
    print_report(config, &report, targets)?;
    Ok(report)
}

/// First column whose header contains one of `hints`, ignoring case
fn detect_column(table: &Table, hints: &[String], exclude: Option<&str>) -> Option<String> {
    table
        .column_names()
        .into_iter()
        .filter(|name| Some(*name) != exclude)
        .find(|name| {
            let lower = name.to_lowercase();
            hints.iter().any(|hint| lower.contains(&hint.to_lowercase()))
        })
        .map(String::from)
}

/// Material and position columns for a BOM, from flags, header hints, or column order
fn resolve_bom_columns(
    table: &Table,
    config: &SheetdiffConfig,
    columns: &BomColumns,
) -> Result<(String, String)> {
    let material = match &columns.material {
        Some(m) => m.clone(),
        None => detect_column(table, &config.key_column_hints, None)
            .or_else(|| table.column_names().first().map(|s| s.to_string()))
            .ok_or_else(|| SheetdiffError::invalid_input(format!("{} has no columns", table.name())))?,
    };
    let position = match &columns.position {
        Some(p) => p.clone(),
        None => detect_column(table, &config.set_column_hints, Some(&material))
            .or_else(|| {
                table
                    .column_names()
                    .into_iter()
                    .find(|name| *name != material)
                    .map(String::from)
            })
            .ok_or_else(|| {
                SheetdiffError::invalid_input(format!(
                    "{} needs a position column besides '{}'",
                    table.name(),
                    material
                ))
            })?,
    };
    if material == position {
        return Err(SheetdiffError::invalid_key_spec(format!(
            "material and position columns must differ, both are '{}'",
            material
        )));
    }
    log::info!("BOM columns: material '{}', positions '{}'", material, position);
    Ok((material, position))
}

fn bom_command(
    config: &SheetdiffConfig,
    old: &Path,
    new: &Path,
    sheet: Option<String>,
    columns: BomColumns,
    targets: &ReportTargets,
) -> Result<DiffReport> {
    let mut progress = ProgressReporter::new(targets.format == OutputFormat::Pretty);
    let processor = processor_for(config, sheet)?;
    let (left, right) = load_pair(&processor, old, new, &mut progress)?;
    let (material, position) = resolve_bom_columns(&left, config, &columns)?;

    let keys = KeySpec::new([material])?;
    let fields = FieldSelection::new(columns.others.iter().filter(|c| **c != position).cloned());
    let options = CompareOptions {
        set_fields: vec![position],
        sort_by_key: config.sort_by_key,
        set_delimiters: config.set_delimiters.clone(),
    };
    let context = ComparisonContext::new(source_info(&left, old)?, source_info(&right, new)?, options);

    let report = compare_tables_with_context(&context, &left, &right, &keys, &fields)?;
    progress.finish_compare(&format!("Compared {} materials", report.summary.matched_rows));

    write_targets(config, &report, targets, &mut progress)?;
    progress.clear();
    print_report(config, &report, targets)?;
    Ok(report)
}

fn write_targets(
    config: &SheetdiffConfig,
    report: &DiffReport,
    targets: &ReportTargets,
    progress: &mut ProgressReporter,
) -> Result<()> {
    if let Some(path) = &targets.output {
        progress.start_export(&format!("Writing {}...", path.display()));
        let bytes = XlsxExporter::new(config.highlight_rgb()).export(report)?;
        std::fs::write(path, bytes)?;
        progress.finish_export(&format!("Wrote {}", path.display()));
        log::info!("Workbook report saved to {}", path.display());
    }
    if let Some(path) = &targets.html {
        let html = HtmlRenderer.render(report)?;
        std::fs::write(path, html)?;
        log::info!("HTML report saved to {}", path.display());
    }
    Ok(())
}

fn print_report(config: &SheetdiffConfig, report: &DiffReport, targets: &ReportTargets) -> Result<()> {
    match targets.format {
        OutputFormat::Pretty => {
            print!("{}", PrettyPrinter::new(config.preview_rows).render(report)?);
            if let Some(path) = &targets.output {
                println!("\n💾 Workbook saved to: {}", path.display());
            }
            if let Some(path) = &targets.html {
                println!("💾 HTML saved to: {}", path.display());
            }
        }
        OutputFormat::Json => println!("{}", JsonFormatter.render(report)?),
    }
    Ok(())
}

fn inspect_command(
    config: &SheetdiffConfig,
    input: &Path,
    rows: Option<usize>,
    sheet: Option<String>,
    format: &str,
) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(|e| SheetdiffError::invalid_input(e))?;
    let table = processor_for(config, sheet)?.load_table(input)?;
    let profiles = profile_table(&table);

    match output_format {
        OutputFormat::Pretty => {
            let printer = PrettyPrinter::new(rows.unwrap_or(config.preview_rows));
            print!("{}", printer.render_profiles(&table, &profiles));
        }
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "table": table.name(),
                "rows": table.row_count(),
                "columns": profiles,
            });
            println!("{}", JsonFormatter::format(&summary)?);
        }
    }
    Ok(())
}

/// Rows as header → value maps, for JSON output
fn table_records(table: &Table) -> Vec<IndexMap<&str, &Value>> {
    let names = table.column_names();
    table
        .rows()
        .iter()
        .map(|row| names.iter().copied().zip(row.iter()).collect())
        .collect()
}

fn invoices_command(
    config: &SheetdiffConfig,
    input: &Path,
    finder: &ConsecutiveInvoiceFinder,
    sheet: Option<String>,
    output: Option<&Path>,
    format: &str,
) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(|e| SheetdiffError::invalid_input(e))?;
    let table = processor_for(config, sheet)?.load_table(input)?;
    let found = finder.find(&table)?;

    if let Some(path) = output {
        let bytes = XlsxExporter::new(config.highlight_rgb()).export_table(&found)?;
        std::fs::write(path, bytes)?;
        log::info!("Consecutive invoices saved to {}", path.display());
    }

    match output_format {
        OutputFormat::Pretty => {
            if found.row_count() == 0 {
                println!("✅ No consecutive invoices found in {}", table.name());
            } else {
                println!(
                    "🧾 {} consecutive invoices in {}:",
                    found.row_count(),
                    table.name()
                );
                print!("{}", PrettyPrinter::new(config.preview_rows).render_table_preview(&found));
            }
            if let Some(path) = output {
                println!("💾 Saved to: {}", path.display());
            }
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format(&table_records(&found))?),
    }
    Ok(())
}
