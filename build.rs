//! Links a system DuckDB when sheetdiff is built without the bundled feature

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=DUCKDB_LIB_PATH");

    // Features reach build scripts as env vars, not cfg flags
    if env::var_os("CARGO_FEATURE_BUNDLED").is_some() {
        return;
    }

    if env::var_os("SKIP_DUCKDB_DETECTION").is_some() {
        println!("cargo:rustc-link-lib=duckdb");
        return;
    }

    match find_duckdb_library() {
        Some(dir) => {
            println!("cargo:rustc-link-search=native={}", dir.display());
            println!("cargo:rustc-link-lib=duckdb");
        }
        None => {
            eprintln!("DuckDB library not found.");
            eprintln!("Install it, set DUCKDB_LIB_PATH=/path/to/duckdb/lib,");
            eprintln!("or build with `cargo build --features bundled`.");
            panic!("DuckDB library not found");
        }
    }
}

fn find_duckdb_library() -> Option<PathBuf> {
    if let Some(path) = env::var_os("DUCKDB_LIB_PATH").map(PathBuf::from) {
        if has_library(&path) {
            return Some(path);
        }
    }
    pkg_config_dir().or_else(|| {
        standard_dirs()
            .into_iter()
            .find(|dir| has_library(dir))
    })
}

fn pkg_config_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return None;
    }
    let output = Command::new("pkg-config")
        .args(["--libs-only-L", "duckdb"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .filter_map(|flag| flag.strip_prefix("-L"))
        .map(PathBuf::from)
        .find(|dir| has_library(dir))
}

fn standard_dirs() -> Vec<PathBuf> {
    let dirs: &[&str] = if cfg!(target_os = "macos") {
        &["/opt/homebrew/lib", "/usr/local/lib", "/opt/local/lib"]
    } else if cfg!(target_os = "windows") {
        &["C:\\Program Files\\DuckDB\\lib", "C:\\duckdb\\lib"]
    } else {
        &["/usr/lib", "/usr/local/lib", "/usr/lib/x86_64-linux-gnu", "/usr/lib64"]
    };
    dirs.iter().map(PathBuf::from).collect()
}

fn has_library(dir: &Path) -> bool {
    let names: &[&str] = if cfg!(target_os = "windows") {
        &["duckdb.dll", "duckdb.lib"]
    } else if cfg!(target_os = "macos") {
        &["libduckdb.dylib", "libduckdb.a"]
    } else {
        &["libduckdb.so", "libduckdb.so.1", "libduckdb.a"]
    };
    names.iter().any(|name| dir.join(name).exists())
}
