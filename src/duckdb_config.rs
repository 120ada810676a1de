//! DuckDB library discovery for builds without the bundled engine

use crate::error::{Result, SheetdiffError};
use std::env;
use std::path::{Path, PathBuf};

pub struct DuckDbConfig {
    pub library_path: Option<PathBuf>,
    pub prefer_bundled: bool,
}

impl DuckDbConfig {
    pub fn new() -> Self {
        Self {
            library_path: Self::discover_library_path(),
            prefer_bundled: env::var_os("DUCKDB_DISABLE_BUNDLED").is_none(),
        }
    }

    /// `DUCKDB_LIB_PATH`, then the platform's usual library directories
    fn discover_library_path() -> Option<PathBuf> {
        env::var_os("DUCKDB_LIB_PATH")
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .or_else(|| {
                Self::search_paths()
                    .into_iter()
                    .find(|p| Self::has_library(p))
            })
    }

    fn search_paths() -> Vec<PathBuf> {
        let dirs: &[&str] = if cfg!(target_os = "macos") {
            &["/opt/homebrew/lib", "/usr/local/lib", "/opt/local/lib"]
        } else if cfg!(target_os = "windows") {
            &["C:\\Program Files\\DuckDB\\lib", "C:\\duckdb\\lib"]
        } else {
            &[
                "/usr/lib",
                "/usr/local/lib",
                "/usr/lib/x86_64-linux-gnu",
                "/usr/lib64",
            ]
        };
        dirs.iter().map(PathBuf::from).collect()
    }

    fn has_library(dir: &Path) -> bool {
        let names: &[&str] = if cfg!(target_os = "windows") {
            &["duckdb.dll"]
        } else if cfg!(target_os = "macos") {
            &["libduckdb.dylib"]
        } else {
            &["libduckdb.so", "libduckdb.so.1"]
        };
        names.iter().any(|name| dir.join(name).exists())
    }

    pub fn use_bundled(&self) -> bool {
        cfg!(feature = "bundled") && self.prefer_bundled
    }

    pub fn validate(&self) -> Result<()> {
        if self.use_bundled() {
            return Ok(());
        }
        match &self.library_path {
            Some(path) if Self::has_library(path) => Ok(()),
            _ => Err(SheetdiffError::config(self.missing_library_message())),
        }
    }

    fn missing_library_message(&self) -> String {
        let mut message = String::from("DuckDB library not found.\n");
        message.push_str("Install DuckDB, set DUCKDB_LIB_PATH, or build with `--features bundled`.\n");
        message.push_str("Searched:\n");
        for path in Self::search_paths() {
            message.push_str(&format!("  {}\n", path.display()));
        }
        if let Some(path) = &self.library_path {
            message.push_str(&format!("Custom path without a library: {}\n", path.display()));
        }
        message.push_str("Workbook inputs (.xlsx, .xls, .ods) are read without DuckDB.");
        message
    }
}

impl Default for DuckDbConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate the DuckDB setup and log which library is used
pub fn init_duckdb() -> Result<DuckDbConfig> {
    let config = DuckDbConfig::new();
    config.validate()?;
    if config.use_bundled() {
        log::debug!("Using bundled DuckDB library");
    } else if let Some(path) = &config.library_path {
        log::info!("Using DuckDB library from: {}", path.display());
    }
    Ok(config)
}
