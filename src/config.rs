//! Optional JSON configuration file

use crate::error::{Result, SheetdiffError};
use crate::set_diff::DEFAULT_DELIMITERS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "SHEETDIFF_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "sheetdiff.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetdiffConfig {
    /// Characters splitting set-valued cells, in addition to `,` and `，`
    pub set_delimiters: Vec<char>,
    pub sort_by_key: bool,
    pub preview_rows: usize,
    /// Fill colour for mismatched cells in exported workbooks, as `RRGGBB`
    pub highlight_color: String,
    /// Header fragments that identify the material code column in `bom`
    pub key_column_hints: Vec<String>,
    /// Header fragments that identify the position number column in `bom`
    pub set_column_hints: Vec<String>,
    /// Worksheet to read from workbooks; first sheet when unset
    pub sheet: Option<String>,
}

impl Default for SheetdiffConfig {
    fn default() -> Self {
        Self {
            set_delimiters: DEFAULT_DELIMITERS.to_vec(),
            sort_by_key: false,
            preview_rows: 10,
            highlight_color: "FFC7CE".to_string(),
            key_column_hints: vec!["编码".to_string(), "code".to_string()],
            set_column_hints: vec!["位置号".to_string(), "position".to_string()],
            sheet: None,
        }
    }
}

impl SheetdiffConfig {
    /// Resolve the config file: explicit path, then `SHEETDIFF_CONFIG`, then `./sheetdiff.json`.
    /// An explicit path must exist; the fallbacks are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(SheetdiffError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let candidate = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if candidate.exists() {
            Self::from_file(&candidate)
        } else {
            log::debug!("No config file at {}, using defaults", candidate.display());
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text)
            .map_err(|e| SheetdiffError::config(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Self::parse(text).map_err(|e| SheetdiffError::config(e))
    }

    fn parse(text: &str) -> std::result::Result<Self, String> {
        let config: Self = serde_json::from_str(text).map_err(|e| format!("invalid config: {}", e))?;
        let color = config.highlight_color.trim_start_matches('#');
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "highlight_color must be a RRGGBB hex colour, got '{}'",
                config.highlight_color
            ));
        }
        if config.preview_rows == 0 {
            return Err("preview_rows must be at least 1".to_string());
        }
        Ok(config)
    }

    /// `highlight_color` as a 24-bit RGB value
    pub fn highlight_rgb(&self) -> u32 {
        u32::from_str_radix(self.highlight_color.trim_start_matches('#'), 16).unwrap_or(0xFFC7CE)
    }
}
