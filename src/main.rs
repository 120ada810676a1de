//! Main entry point for sheetdiff CLI

use clap::Parser;
use sheetdiff::cli::Cli;
use sheetdiff::commands::execute_command;
use sheetdiff::duckdb_config;

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up verbose logging if requested
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Check the DuckDB library before touching any input file
    if let Err(e) = duckdb_config::init_duckdb() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Execute the command with the resolved config file, if any
    if let Err(e) = execute_command(cli.command, cli.config.as_deref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
